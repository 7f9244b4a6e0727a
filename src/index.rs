// Mapping between flat indices and (row, col) pairs of a 2D array

use crate::error::{EvolutionError, Result};

/// Flattening convention for a rows x cols array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorOrder {
    /// Consecutive indices walk along a row
    Row,
    /// Consecutive indices walk down a column
    Column,
}

impl MajorOrder {
    /// Parses the single-letter flag ('R' or 'C')
    pub fn from_flag(flag: char) -> Result<Self> {
        match flag {
            'R' | 'r' => Ok(MajorOrder::Row),
            'C' | 'c' => Ok(MajorOrder::Column),
            other => Err(EvolutionError::UnsupportedOrder(other)),
        }
    }
}

/// Converts a flat index into (row, col)
///
/// # Arguments
/// * `index` - Position in the flattened array
/// * `rows` - Number of rows
/// * `cols` - Number of columns
/// * `order` - Flattening convention
///
/// # Returns
/// * `(row, col)` or `IndexOutOfRange` if `index >= rows * cols`
pub fn to_2d(index: usize, rows: usize, cols: usize, order: MajorOrder) -> Result<(usize, usize)> {
    let len = rows * cols;
    if index >= len {
        return Err(EvolutionError::IndexOutOfRange { index, len });
    }
    Ok(match order {
        MajorOrder::Row => (index / cols, index % cols),
        MajorOrder::Column => (index % rows, index / rows),
    })
}

/// Converts (row, col) into a flat index, inverse of [`to_2d`]
pub fn to_1d(row: usize, col: usize, rows: usize, cols: usize, order: MajorOrder) -> Result<usize> {
    let len = rows * cols;
    if row >= rows {
        return Err(EvolutionError::IndexOutOfRange { index: row, len: rows });
    }
    if col >= cols {
        return Err(EvolutionError::IndexOutOfRange { index: col, len: cols });
    }
    let index = match order {
        MajorOrder::Row => row * cols + col,
        MajorOrder::Column => col * rows + row,
    };
    debug_assert!(index < len);
    Ok(index)
}
