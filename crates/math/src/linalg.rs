//! Dense linear algebra on `ndarray` matrices.
//!
//! Small, allocation-light kernels used by the state-space code: in-place
//! Cholesky, triangular solves, a partially pivoted Gaussian solver and a
//! few block helpers working on sub-views.

use ndarray::{Array1, Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::MathError;

/// Relative size under which a pivot is treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-13;

fn check_square(a: &ArrayView2<f64>) -> Result<usize, MathError> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(MathError::NotSquare { rows, cols });
    }
    Ok(rows)
}

/// Overwrites the lower triangle of `a` with its Cholesky factor `L`
/// (`a = L L'`) and zeroes the strict upper triangle.
///
/// # Errors
///
/// [`MathError::NotSquare`] or [`MathError::NotPositiveDefinite`].
pub fn cholesky(mut a: ArrayViewMut2<f64>) -> Result<(), MathError> {
    let n = check_square(&a.view())?;
    for j in 0..n {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= a[[j, k]] * a[[j, k]];
        }
        if !(d > 0.0) {
            return Err(MathError::NotPositiveDefinite { index: j });
        }
        let d = d.sqrt();
        a[[j, j]] = d;
        for i in j + 1..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= a[[i, k]] * a[[j, k]];
            }
            a[[i, j]] = v / d;
        }
        for k in j + 1..n {
            a[[j, k]] = 0.0;
        }
    }
    Ok(())
}

/// Solves `L x = b` in place for lower-triangular `L`.
pub fn solve_lower(l: ArrayView2<f64>, mut b: ArrayViewMut1<f64>) -> Result<(), MathError> {
    let n = check_square(&l)?;
    if b.len() != n {
        return Err(MathError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l[[i, k]] * b[k];
        }
        if l[[i, i]] == 0.0 {
            return Err(MathError::Singular { index: i });
        }
        b[i] = v / l[[i, i]];
    }
    Ok(())
}

/// Solves `U x = b` in place for upper-triangular `U`.
pub fn solve_upper(u: ArrayView2<f64>, mut b: ArrayViewMut1<f64>) -> Result<(), MathError> {
    let n = check_square(&u)?;
    if b.len() != n {
        return Err(MathError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    for i in (0..n).rev() {
        let mut v = b[i];
        for k in i + 1..n {
            v -= u[[i, k]] * b[k];
        }
        if u[[i, i]] == 0.0 {
            return Err(MathError::Singular { index: i });
        }
        b[i] = v / u[[i, i]];
    }
    Ok(())
}

/// Solves `L' x = b` in place, reading only the lower triangle of `l`.
pub fn solve_lower_transpose(
    l: ArrayView2<f64>,
    mut b: ArrayViewMut1<f64>,
) -> Result<(), MathError> {
    let n = check_square(&l)?;
    if b.len() != n {
        return Err(MathError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    for i in (0..n).rev() {
        let mut v = b[i];
        for k in i + 1..n {
            v -= l[[k, i]] * b[k];
        }
        if l[[i, i]] == 0.0 {
            return Err(MathError::Singular { index: i });
        }
        b[i] = v / l[[i, i]];
    }
    Ok(())
}

/// Solves `A x = b` for a symmetric positive definite `A` via Cholesky.
pub fn solve_spd(a: ArrayView2<f64>, b: &[f64]) -> Result<Array1<f64>, MathError> {
    let mut l = a.to_owned();
    cholesky(l.view_mut())?;
    let mut x = Array1::from(b.to_vec());
    solve_lower(l.view(), x.view_mut())?;
    solve_lower_transpose(l.view(), x.view_mut())?;
    Ok(x)
}

/// Solves the general square system `A x = b` by Gaussian elimination with
/// partial pivoting.
///
/// A pivot smaller than `1e-13` times the largest absolute entry of `A` is
/// reported as singular.
///
/// # Errors
///
/// [`MathError::NotSquare`], [`MathError::DimensionMismatch`] or
/// [`MathError::Singular`].
pub fn solve(a: ArrayView2<f64>, b: &[f64]) -> Result<Array1<f64>, MathError> {
    let n = check_square(&a)?;
    if b.len() != n {
        return Err(MathError::DimensionMismatch {
            expected: n,
            got: b.len(),
        });
    }
    let mut m = a.to_owned();
    let mut x = Array1::from(b.to_vec());
    let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tol = PIVOT_TOLERANCE * scale.max(f64::MIN_POSITIVE);

    for col in 0..n {
        let (pivot_row, pivot) = (col..n)
            .map(|r| (r, m[[r, col]].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if !(pivot > tol) {
            return Err(MathError::Singular { index: col });
        }
        if pivot_row != col {
            for k in 0..n {
                m.swap([col, k], [pivot_row, k]);
            }
            x.swap(col, pivot_row);
        }
        let d = m[[col, col]];
        for r in col + 1..n {
            let f = m[[r, col]] / d;
            if f == 0.0 {
                continue;
            }
            for k in col..n {
                m[[r, k]] -= f * m[[col, k]];
            }
            x[r] -= f * x[col];
        }
    }
    solve_upper(m.view(), x.view_mut())?;
    Ok(x)
}

/// Replaces `a` by `(a + a') / 2`.
pub fn symmetrize(mut a: ArrayViewMut2<f64>) {
    let n = a.nrows().min(a.ncols());
    for i in 0..n {
        for j in 0..i {
            let v = 0.5 * (a[[i, j]] + a[[j, i]]);
            a[[i, j]] = v;
            a[[j, i]] = v;
        }
    }
}

/// Copies the `rows x cols` block starting at `(r0, c0)`.
pub fn extract_block(a: ArrayView2<f64>, r0: usize, c0: usize, rows: usize, cols: usize) -> Array2<f64> {
    a.slice(s![r0..r0 + rows, c0..c0 + cols]).to_owned()
}

/// Writes `block` into `a` with its top-left corner at `(r0, c0)`.
pub fn set_block(mut a: ArrayViewMut2<f64>, r0: usize, c0: usize, block: ArrayView2<f64>) {
    let (rows, cols) = block.dim();
    a.slice_mut(s![r0..r0 + rows, c0..c0 + cols]).assign(&block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn cholesky_reconstructs() {
        let a = array![[4.0, 2.0, 0.4], [2.0, 5.0, 1.0], [0.4, 1.0, 3.0]];
        let mut l = a.clone();
        cholesky(l.view_mut()).unwrap();
        let back = l.dot(&l.t());
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
        }
        assert_eq!(l[[0, 1]], 0.0);
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let mut a = array![[1.0, 2.0], [2.0, 1.0]];
        assert_eq!(
            cholesky(a.view_mut()),
            Err(MathError::NotPositiveDefinite { index: 1 })
        );
    }

    #[test]
    fn spd_solve() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let x = solve_spd(a.view(), &[1.0, 2.0]).unwrap();
        let r = a.dot(&x);
        assert_abs_diff_eq!(r[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn pivoted_solve_needs_row_swap() {
        let a = array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        let b = [3.0, 2.0, 4.0];
        let x = solve(a.view(), &b).unwrap();
        let r = a.dot(&x);
        for i in 0..3 {
            assert_abs_diff_eq!(r[i], b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn singular_is_reported() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(matches!(
            solve(a.view(), &[1.0, 2.0]),
            Err(MathError::Singular { .. })
        ));
    }

    #[test]
    fn shape_errors() {
        let a = Array2::<f64>::zeros((2, 3));
        assert_eq!(
            solve(a.view(), &[1.0, 2.0]),
            Err(MathError::NotSquare { rows: 2, cols: 3 })
        );
        let b = Array2::<f64>::eye(2);
        assert_eq!(
            solve(b.view(), &[1.0]),
            Err(MathError::DimensionMismatch { expected: 2, got: 1 })
        );
    }

    #[test]
    fn triangular_solves() {
        let l = array![[2.0, 0.0], [1.0, 4.0]];
        let mut b = Array1::from(vec![2.0, 9.0]);
        solve_lower(l.view(), b.view_mut()).unwrap();
        assert_abs_diff_eq!(b[0], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(b[1], 2.0, epsilon = 1e-15);

        let mut c = Array1::from(vec![4.0, 8.0]);
        solve_lower_transpose(l.view(), c.view_mut()).unwrap();
        // L' = [[2, 1], [0, 4]]
        assert_abs_diff_eq!(c[1], 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(c[0], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn blocks_round_trip() {
        let mut a = Array2::<f64>::zeros((4, 4));
        let blk = array![[1.0, 2.0], [3.0, 4.0]];
        set_block(a.view_mut(), 1, 2, blk.view());
        assert_eq!(a[[2, 3]], 4.0);
        assert_eq!(extract_block(a.view(), 1, 2, 2, 2), blk);
    }

    #[test]
    fn symmetrize_averages() {
        let mut a = array![[1.0, 2.0], [4.0, 1.0]];
        symmetrize(a.view_mut());
        assert_eq!(a, array![[1.0, 3.0], [3.0, 1.0]]);
    }
}
