//! Dense LU with partial pivoting.
//!
//! Pure math, no solver state. The augmented equation-of-motion matrix is
//! symmetric indefinite (zero block on the constraint diagonal), so Cholesky
//! does not apply; row-pivoted LU handles it and reports rank deficiency
//! through the pivot-magnitude check.

use nalgebra::{DMatrix, DVector};

/// Marker for a rank-deficient factorization. Callers attach time and step
/// context when converting this into their own error type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Singular;

/// Factor A = P·L·U in place. Stores L (unit lower) and U (upper) in `a`,
/// the pivot permutation in `piv`. O(n³/3).
///
/// # Errors
///
/// Returns [`Singular`] if any pivot magnitude is below `1e-30`.
pub(crate) fn lu_factor_in_place(a: &mut DMatrix<f64>, piv: &mut [usize]) -> Result<(), Singular> {
    let n = a.nrows();
    for k in 0..n {
        // Partial pivot: largest |a[i,k]| for i in k..n.
        let mut max_val = a[(k, k)].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let v = a[(i, k)].abs();
            if v > max_val {
                max_val = v;
                max_row = i;
            }
        }
        if max_val < 1e-30 {
            return Err(Singular);
        }
        piv[k] = max_row;

        if max_row != k {
            a.swap_rows(k, max_row);
        }

        for i in (k + 1)..n {
            a[(i, k)] /= a[(k, k)];
            for j in (k + 1)..n {
                a[(i, j)] -= a[(i, k)] * a[(k, j)];
            }
        }
    }
    Ok(())
}

/// Solve P·L·U·x = b using precomputed factors. Non-destructive on `a` and
/// `piv`; reusable across right-hand sides.
#[allow(clippy::needless_range_loop)]
pub(crate) fn lu_solve_factored(a: &DMatrix<f64>, piv: &[usize], x: &mut DVector<f64>) {
    let n = a.nrows();

    for k in 0..n {
        if piv[k] != k {
            x.swap_rows(k, piv[k]);
        }
    }

    // Forward substitution (L·y = P·b).
    for i in 1..n {
        for k in 0..i {
            x[i] -= a[(i, k)] * x[k];
        }
    }

    // Back substitution (U·x = y).
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            x[i] -= a[(i, k)] * x[k];
        }
        x[i] /= a[(i, i)];
    }
}
