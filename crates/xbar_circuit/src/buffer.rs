//! SRAM and register-file buffers at tile and chip level.

use crate::cost::BufferCost;
use crate::technology::{LogicCell, Technology};
use xbar_common::{log2_ceil, Frequency};
use xbar_config::BufferKind;

/// Periphery overhead of an SRAM macro relative to its bit cells.
const SRAM_PERIPHERY_FACTOR: f64 = 1.3;

/// SRAM bit-cell footprint in F².
const SRAM_BIT_AREA_F2: f64 = 146.0;

/// A buffer of `num_bit` bits accessed `interface_width` bits at a time.
#[derive(Debug, Clone)]
pub struct Buffer {
    num_bit: usize,
    interface_width: usize,
    kind: BufferKind,
    clock: Frequency,
    tech: Technology,
}

impl Buffer {
    /// Creates a buffer.
    pub fn new(
        num_bit: usize,
        interface_width: usize,
        kind: BufferKind,
        clock: Frequency,
        tech: Technology,
    ) -> Self {
        Self {
            num_bit: num_bit.max(1),
            interface_width: interface_width.max(1),
            kind,
            clock,
            tech,
        }
    }

    /// Capacity in bits.
    pub fn num_bit(&self) -> usize {
        self.num_bit
    }

    fn access_time(&self) -> f64 {
        match self.kind {
            BufferKind::RegisterFile => self.clock.period(),
            BufferKind::Sram => {
                let rows = self.num_bit / self.interface_width;
                let decode = log2_ceil(rows.max(1)) as f64 * self.tech.cell(LogicCell::Nand2).delay;
                self.clock.period().max(decode + self.tech.cell(LogicCell::SramBit).delay)
            }
        }
    }

    fn energy_per_bit(&self) -> f64 {
        match self.kind {
            BufferKind::RegisterFile => self.tech.cell(LogicCell::Dff).energy,
            BufferKind::Sram => {
                // bitline length grows with the square root of the capacity
                let pitch = SRAM_BIT_AREA_F2.sqrt() * self.tech.feature_size;
                self.tech.cell(LogicCell::SramBit).energy
                    + self.tech.wire_energy((self.num_bit as f64).sqrt() * pitch)
            }
        }
    }

    /// Cost of `num_read` reads of `num_bit_read` bits and `num_write` writes
    /// of `num_bit_write` bits.
    pub fn calculate(
        &self,
        num_bit_read: f64,
        num_read: f64,
        num_bit_write: f64,
        num_write: f64,
    ) -> BufferCost {
        let width = self.interface_width as f64;
        let access = self.access_time();
        let per_bit = self.energy_per_bit();
        BufferCost {
            read_latency: num_read * (num_bit_read / width).ceil() * access,
            write_latency: num_write * (num_bit_write / width).ceil() * access,
            read_energy: num_bit_read * num_read * per_bit,
            write_energy: num_bit_write * num_write * per_bit,
        }
    }

    /// Layout area (m²).
    pub fn area(&self) -> f64 {
        let f2 = self.tech.feature_size * self.tech.feature_size;
        match self.kind {
            BufferKind::Sram => self.num_bit as f64 * SRAM_BIT_AREA_F2 * f2 * SRAM_PERIPHERY_FACTOR,
            BufferKind::RegisterFile => self.num_bit as f64 * self.tech.cell(LogicCell::Dff).area,
        }
    }

    /// Leakage power (W).
    pub fn leakage(&self) -> f64 {
        let cell = match self.kind {
            BufferKind::Sram => LogicCell::SramBit,
            BufferKind::RegisterFile => LogicCell::Dff,
        };
        self.num_bit as f64 * self.tech.cell(cell).leakage
    }
}
