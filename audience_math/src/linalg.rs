//! Dense least squares for small designs

use crate::{MathError, Result};

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Solve `A x = b` for symmetric positive definite `A` via Cholesky.
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Expected a {}x{} system matrix",
            n, n
        )));
    }

    // A = L L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                // Pivots within rounding noise of zero count as singular
                if !sum.is_finite() || sum <= PIVOT_TOLERANCE * a[i][i].abs().max(1.0) {
                    return Err(MathError::CalculationError(format!(
                        "Matrix is singular or not positive definite (pivot {} = {})",
                        i, sum
                    )));
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L' x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Ok(x)
}

/// Penalized least squares: minimise `|y - X b|^2 + sum_j penalties[j] * b_j^2`.
///
/// `rows` is the design matrix in row-major order. A zero penalty leaves the
/// matching coefficient unregularized.
pub fn ridge_least_squares(rows: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if rows.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            rows.len(),
            y.len()
        )));
    }
    let k = penalties.len();
    if let Some(bad) = rows.iter().position(|r| r.len() != k) {
        return Err(MathError::InvalidInput(format!(
            "Design row {} has {} columns, expected {}",
            bad,
            rows[bad].len(),
            k
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y.iter()) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        xtx[i][i] += penalties[i];
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    solve_symmetric(&xtx, &xty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_two_by_two() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let x = solve_symmetric(&a, &[2.0, 1.0]).unwrap();
        assert!((4.0 * x[0] + 2.0 * x[1] - 2.0).abs() < 1e-12);
        assert!((2.0 * x[0] + 3.0 * x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert!(matches!(
            solve_symmetric(&a, &[1.0, 1.0]),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_ridge_recovers_line() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let beta = ridge_least_squares(&rows, &y, &[0.0, 0.0]).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_makes_collinear_design_solvable() {
        // Third column duplicates the intercept
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64, 1.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| 1.0 + i as f64).collect();
        assert!(ridge_least_squares(&rows, &y, &[0.0, 0.0, 0.0]).is_err());
        assert!(ridge_least_squares(&rows, &y, &[0.0, 0.0, 1.0]).is_ok());
    }
}
