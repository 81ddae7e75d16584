//! Construction and rank of binary matrices over GF(2).
//!
//! A matrix is sampled row-wise from a bitstream: row 0 of matrix k starts
//! at bit `k * rows * cols`. Rank is determined by forward elimination with
//! partial pivoting in column order; in GF(2) a row operation is an XOR.

/// A dense 0/1 matrix with up to 64 columns, one `u64` mask per row.
#[derive(Clone, Debug)]
pub struct BinaryMatrix {
    rows: Vec<u64>,
    cols: usize,
}

impl BinaryMatrix {
    /// Build a `rows` x `cols` matrix from consecutive bits (one byte per
    /// bit, row-major). `bits` must hold at least `rows * cols` entries and
    /// `cols` must fit a `u64` row mask.
    pub fn from_bits(bits: &[u8], rows: usize, cols: usize) -> Self {
        assert!(cols <= u64::BITS as usize, "row does not fit a u64 mask");
        assert!(bits.len() >= rows * cols, "not enough bits for the matrix");

        let rows = (0..rows)
            .map(|r| {
                bits[r * cols..(r + 1) * cols]
                    .iter()
                    .fold(0_u64, |row, &bit| (row << 1) | (bit as u64))
            })
            .collect();

        Self { rows, cols }
    }

    /// The rank of the matrix over GF(2): the number of nonzero rows after
    /// forward elimination.
    pub fn rank(mut self) -> usize {
        let row_count = self.rows.len();
        let mut pivot_row = 0;

        for col in 0..self.cols {
            let mask = 1_u64 << (self.cols - col - 1);

            // search for a row at or below the pivot with a 1 in this column
            let Some(found) = (pivot_row..row_count).find(|&r| self.rows[r] & mask != 0) else {
                continue;
            };
            self.rows.swap(pivot_row, found);

            // clear the column below the pivot
            for r in (pivot_row + 1)..row_count {
                if self.rows[r] & mask != 0 {
                    self.rows[r] ^= self.rows[pivot_row];
                }
            }

            pivot_row += 1;
            if pivot_row == row_count {
                break;
            }
        }

        self.rows.iter().filter(|&&row| row != 0).count()
    }
}
