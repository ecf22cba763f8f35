//! In-place broadcast helpers over owned temporaries.
//!
//! Each helper mutates the buffer it is given and hands the same buffer back,
//! so call sites can chain them without extra allocations. They are never
//! applied to caller-owned inputs.

use ndarray::{Array1, Array2, Axis, Zip};
use num_traits::Float;

/// Multiplies column `j` of `arr` by `row[j]`.
pub fn muli_row_vector<T>(mut arr: Array2<T>, row: &Array1<T>) -> Array2<T>
where
    T: Float,
{
    debug_assert_eq!(arr.ncols(), row.len());
    Zip::from(arr.rows_mut()).for_each(|mut r| {
        r.zip_mut_with(row, |a, &w| *a = *a * w);
    });
    arr
}

/// Multiplies row `i` of `arr` by `column[[i, 0]]`.
pub fn muli_column_vector<T>(mut arr: Array2<T>, column: &Array2<T>) -> Array2<T>
where
    T: Float,
{
    debug_assert_eq!(column.dim(), (arr.nrows(), 1));
    Zip::from(arr.rows_mut())
        .and(column.column(0))
        .for_each(|mut r, &m| r.mapv_inplace(|a| a * m));
    arr
}

/// Sums each row, keeping the result as an (N x 1) column.
pub fn row_sum<T>(arr: &Array2<T>) -> Array2<T>
where
    T: Float,
{
    arr.sum_axis(Axis(1)).insert_axis(Axis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_muli_row_vector() {
        let arr = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let out = muli_row_vector(arr, &array![1.0, 0.5, -1.0]);
        assert_eq!(out, array![[1.0, 1.0, -3.0], [4.0, 2.5, -6.0]]);
    }

    #[test]
    fn test_muli_column_vector() {
        let arr = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let out = muli_column_vector(arr, &array![[2.0], [0.0], [-1.0]]);
        assert_eq!(out, array![[2.0, 4.0], [0.0, 0.0], [-5.0, -6.0]]);
    }

    #[test]
    fn test_row_sum() {
        let arr = array![[1.0, 2.0, 3.0], [-1.0, 0.5, 0.5]];
        assert_eq!(row_sum(&arr), array![[6.0], [0.0]]);
    }
}
