//! Regularised matrix inversion

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Cholesky, Matrix3, Vector3};

// Internal
use super::{AdaptiveRegulariser, NumStabError, Regularised, RegularisationParams};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Relative tolerance used when deciding if a matrix is symmetric enough to
/// be Cholesky factorised.
const SYMMETRY_TOL: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Inverts and solves against matrices after regularising them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatrixInverter {
    regulariser: AdaptiveRegulariser,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MatrixInverter {

    /// Create a new inverter using the given regularisation parameters.
    pub fn new(params: RegularisationParams) -> Result<Self, NumStabError> {
        Ok(Self {
            regulariser: AdaptiveRegulariser::new(params)?,
        })
    }

    /// Get the underlying regulariser.
    pub fn regulariser(&self) -> &AdaptiveRegulariser {
        &self.regulariser
    }

    /// Invert the matrix after regularising it.
    pub fn invert(&self, matrix: &Matrix3<f64>) -> Result<Matrix3<f64>, NumStabError> {
        self.invert_with_info(matrix).map(|(inv, _)| inv)
    }

    /// Invert the matrix after regularising it, also returning information on
    /// the regularisation that was applied.
    pub fn invert_with_info(
        &self,
        matrix: &Matrix3<f64>
    ) -> Result<(Matrix3<f64>, Regularised), NumStabError> {
        let reg = self.regulariser.regularise(matrix)?;

        let inv = match cholesky(&reg.matrix) {
            Some(chol) => chol.inverse(),
            None => {
                trace!("Cholesky factorisation unavailable, falling back to LU");
                reg.matrix.lu().try_inverse().ok_or(NumStabError::InversionFailed)?
            }
        };

        if inv.iter().any(|v| !v.is_finite()) {
            return Err(NumStabError::InversionFailed);
        }

        Ok((inv, reg))
    }

    /// Solve `matrix * x = rhs` for `x` after regularising the matrix.
    pub fn solve(
        &self,
        matrix: &Matrix3<f64>,
        rhs: &Vector3<f64>
    ) -> Result<Vector3<f64>, NumStabError> {
        if rhs.iter().any(|v| !v.is_finite()) {
            return Err(NumStabError::NonFinite);
        }

        let reg = self.regulariser.regularise(matrix)?;

        let x = match cholesky(&reg.matrix) {
            Some(chol) => chol.solve(rhs),
            None => reg.matrix.lu().solve(rhs).ok_or(NumStabError::InversionFailed)?
        };

        if x.iter().any(|v| !v.is_finite()) {
            return Err(NumStabError::InversionFailed);
        }

        Ok(x)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Cholesky factorise the matrix if it is symmetric positive definite.
///
/// `Cholesky::new` only reads the lower triangle, so asymmetric matrices must
/// be excluded explicitly.
fn cholesky(matrix: &Matrix3<f64>) -> Option<Cholesky<f64, nalgebra::U3>> {
    if !is_symmetric(matrix) {
        return None;
    }

    Cholesky::new(*matrix)
}

fn is_symmetric(matrix: &Matrix3<f64>) -> bool {
    let scale = matrix.amax().max(1.0);

    for i in 0..3 {
        for j in (i + 1)..3 {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > SYMMETRY_TOL * scale {
                return false;
            }
        }
    }

    true
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn spd() -> Matrix3<f64> {
        Matrix3::new(
            4.0, 1.0, 0.5,
            1.0, 3.0, 0.2,
            0.5, 0.2, 2.0,
        )
    }

    #[test]
    fn test_invert_spd() {
        let inv = MatrixInverter::default();
        let m = spd();

        let m_inv = inv.invert(&m).unwrap();

        assert!((m * m_inv - Matrix3::identity()).amax() < 1e-8);
    }

    #[test]
    fn test_invert_asymmetric_uses_lu() {
        let inv = MatrixInverter::default();
        let m = Matrix3::new(
            2.0, 1.0, 0.0,
            0.0, 1.0, 3.0,
            1.0, 0.0, 1.0,
        );

        let m_inv = inv.invert(&m).unwrap();

        assert!((m * m_inv - Matrix3::identity()).amax() < 1e-8);
    }

    #[test]
    fn test_solve() {
        let inv = MatrixInverter::default();
        let m = spd();
        let x = Vector3::new(1.0, -2.0, 0.5);

        let solved = inv.solve(&m, &(m * x)).unwrap();

        assert!((solved - x).amax() < 1e-8);
    }

    #[test]
    fn test_fails_closed() {
        let inv = MatrixInverter::default();

        assert!(inv.invert(&Matrix3::zeros()).is_err());
        assert!(inv.solve(&spd(), &Vector3::new(std::f64::NAN, 0.0, 0.0)).is_err());

        let mut m = spd();
        m[(2, 2)] = std::f64::NAN;
        assert_eq!(inv.invert(&m), Err(NumStabError::NonFinite));
    }
}
