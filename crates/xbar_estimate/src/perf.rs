//! The latency/energy accumulator passed up the hierarchy by value.

use serde::Serialize;
use std::ops::{Add, AddAssign};
use xbar_circuit::{ModuleCost, SubArrayCost};

/// A quantity split into ADC, accumulation and other-periphery shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Breakdown {
    /// ADCs (sense amplifiers and precharge for SRAM).
    pub adc: f64,
    /// Shift-add, adder trees and accumulation units.
    pub accumulation: f64,
    /// Decoders, muxes, buffers, interconnect, activation and pooling.
    pub other: f64,
}

impl Breakdown {
    /// All shares zero.
    pub const ZERO: Breakdown = Breakdown {
        adc: 0.0,
        accumulation: 0.0,
        other: 0.0,
    };

    /// Sum of the three shares.
    pub fn total(&self) -> f64 {
        self.adc + self.accumulation + self.other
    }

    /// Share-wise maximum.
    pub fn max(self, other: Breakdown) -> Breakdown {
        Breakdown {
            adc: self.adc.max(other.adc),
            accumulation: self.accumulation.max(other.accumulation),
            other: self.other.max(other.other),
        }
    }

    /// Every share multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Breakdown {
        Breakdown {
            adc: self.adc * factor,
            accumulation: self.accumulation * factor,
            other: self.other * factor,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut f64 {
        match bucket {
            Bucket::Adc => &mut self.adc,
            Bucket::Accumulation => &mut self.accumulation,
            Bucket::Other => &mut self.other,
        }
    }
}

impl Add for Breakdown {
    type Output = Breakdown;

    fn add(self, rhs: Breakdown) -> Breakdown {
        Breakdown {
            adc: self.adc + rhs.adc,
            accumulation: self.accumulation + rhs.accumulation,
            other: self.other + rhs.other,
        }
    }
}

impl AddAssign for Breakdown {
    fn add_assign(&mut self, rhs: Breakdown) {
        *self = *self + rhs;
    }
}

/// Which share of the breakdown a module's cost is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// ADC share.
    Adc,
    /// Accumulation share.
    Accumulation,
    /// Everything else.
    Other,
}

/// Latency, energy and leakage of one unit of the hierarchy.
///
/// `read_latency` and `read_dynamic_energy` are the totals; buffer and
/// interconnect costs are included in them and additionally reported on
/// their own. Every level builds a fresh value and hands it to its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Performance {
    /// Total read latency (s).
    pub read_latency: f64,
    /// Total read dynamic energy (J).
    pub read_dynamic_energy: f64,
    /// Leakage power (W).
    pub leakage: f64,
    /// Buffer latency (s), included in `read_latency`.
    pub buffer_latency: f64,
    /// Buffer energy (J), included in `read_dynamic_energy`.
    pub buffer_dynamic_energy: f64,
    /// Interconnect latency (s), included in `read_latency`.
    pub ic_latency: f64,
    /// Interconnect energy (J), included in `read_dynamic_energy`.
    pub ic_dynamic_energy: f64,
    /// Latency breakdown (s).
    pub latency: Breakdown,
    /// Dynamic energy breakdown (J).
    pub energy: Breakdown,
}

impl Performance {
    /// Combines a unit operating in parallel with this one.
    ///
    /// Latencies take the maximum, energies add. Leakage is left alone: the
    /// owner of the units accounts for it from its own geometry.
    pub fn merge_parallel(&mut self, other: &Performance) {
        self.read_latency = self.read_latency.max(other.read_latency);
        self.read_dynamic_energy += other.read_dynamic_energy;
        self.buffer_latency = self.buffer_latency.max(other.buffer_latency);
        self.buffer_dynamic_energy += other.buffer_dynamic_energy;
        self.ic_latency = self.ic_latency.max(other.ic_latency);
        self.ic_dynamic_energy += other.ic_dynamic_energy;
        self.latency = self.latency.max(other.latency);
        self.energy += other.energy;
    }

    /// Combines a unit operating after this one: everything adds.
    pub fn merge_sequential(&mut self, other: &Performance) {
        self.read_latency += other.read_latency;
        self.read_dynamic_energy += other.read_dynamic_energy;
        self.buffer_latency += other.buffer_latency;
        self.buffer_dynamic_energy += other.buffer_dynamic_energy;
        self.ic_latency += other.ic_latency;
        self.ic_dynamic_energy += other.ic_dynamic_energy;
        self.latency += other.latency;
        self.energy += other.energy;
    }

    /// Divides every latency by a speed-up factor.
    ///
    /// Factors below one are treated as one.
    pub fn divide_latency(&mut self, factor: f64) {
        let factor = factor.max(1.0);
        self.read_latency /= factor;
        self.buffer_latency /= factor;
        self.ic_latency /= factor;
        self.latency = self.latency.scaled(1.0 / factor);
    }

    /// Charges a module on the critical path to one bucket.
    pub fn add_module(&mut self, cost: ModuleCost, bucket: Bucket) {
        self.read_latency += cost.latency;
        self.read_dynamic_energy += cost.dynamic_energy;
        *self.latency.bucket_mut(bucket) += cost.latency;
        *self.energy.bucket_mut(bucket) += cost.dynamic_energy;
    }

    /// Charges a buffer access.
    pub fn add_buffer(&mut self, cost: ModuleCost) {
        self.add_module(cost, Bucket::Other);
        self.buffer_latency += cost.latency;
        self.buffer_dynamic_energy += cost.dynamic_energy;
    }

    /// Charges an interconnect transfer.
    pub fn add_interconnect(&mut self, cost: ModuleCost) {
        self.add_module(cost, Bucket::Other);
        self.ic_latency += cost.latency;
        self.ic_dynamic_energy += cost.dynamic_energy;
    }

    /// Charges one subarray read.
    pub fn add_subarray_read(&mut self, cost: &SubArrayCost) {
        self.read_latency += cost.latency();
        self.read_dynamic_energy += cost.dynamic_energy();
        self.latency += Breakdown {
            adc: cost.latency_adc,
            accumulation: cost.latency_accumulation,
            other: cost.latency_other,
        };
        self.energy += Breakdown {
            adc: cost.energy_adc,
            accumulation: cost.energy_accumulation,
            other: cost.energy_other,
        };
    }

    /// Latency excluding buffer and interconnect charges.
    pub fn compute_latency(&self) -> f64 {
        self.read_latency - self.buffer_latency - self.ic_latency
    }
}
