//! Dense weight and input matrices with block slicing.

/// Row-major matrix of cell conductances (S).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl WeightMatrix {
    /// Creates a matrix from row-major data; returns `None` if the length disagrees.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// A matrix with every cell at the same conductance.
    pub fn filled(rows: usize, cols: usize, conductance: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![conductance; rows * cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Conductance at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copies the block starting at `(row, col)`, clamped to the matrix bounds.
    pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> WeightMatrix {
        let row_end = (row + rows).min(self.rows);
        let col_end = (col + cols).min(self.cols);
        let row = row.min(row_end);
        let col = col.min(col_end);
        let mut data = Vec::with_capacity((row_end - row) * (col_end - col));
        for r in row..row_end {
            data.extend_from_slice(&self.row(r)[col..col_end]);
        }
        WeightMatrix {
            rows: row_end - row,
            cols: col_end - col,
            data,
        }
    }
}

/// Binary input matrix: one row per weight row, one column per input vector.
///
/// Multi-bit activations are streamed one bit per vector, so a layer with `P`
/// output positions at `b`-bit precision has `P × b` vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct InputMatrix {
    rows: usize,
    vectors: usize,
    data: Vec<u8>,
}

impl InputMatrix {
    /// Creates a matrix from row-major bits; returns `None` if the length disagrees.
    pub fn from_vec(rows: usize, vectors: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == rows * vectors).then_some(Self {
            rows,
            vectors,
            data: data.into_iter().map(|b| u8::from(b != 0)).collect(),
        })
    }

    /// A matrix with every bit set to `bit`.
    pub fn filled(rows: usize, vectors: usize, bit: bool) -> Self {
        Self {
            rows,
            vectors,
            data: vec![u8::from(bit); rows * vectors],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of input vectors.
    pub fn vectors(&self) -> usize {
        self.vectors
    }

    /// Bit at `(row, vector)`.
    pub fn get(&self, row: usize, vector: usize) -> u8 {
        self.data[row * self.vectors + vector]
    }

    /// Copies `rows` rows starting at `start`, clamped to the matrix bounds.
    pub fn slice_rows(&self, start: usize, rows: usize) -> InputMatrix {
        let end = (start + rows).min(self.rows);
        let start = start.min(end);
        InputMatrix {
            rows: end - start,
            vectors: self.vectors,
            data: self.data[start * self.vectors..end * self.vectors].to_vec(),
        }
    }

    /// One input vector (column).
    pub fn vector(&self, vector: usize) -> Vec<u8> {
        (0..self.rows).map(|r| self.get(r, vector)).collect()
    }

    /// Fraction of set bits in one input vector.
    pub fn activity(&self, vector: usize) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        let ones = (0..self.rows).filter(|&r| self.get(r, vector) != 0).count();
        ones as f64 / self.rows as f64
    }
}
