//! Inertia, Coriolis and gravity terms

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::{DynamicsVariant, PlantCoeffs};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The matrices of the equations of motion evaluated at one state.
///
/// This is a value type recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DynamicsMatrices {
    /// Inertia matrix `M(q)`, symmetric positive definite.
    pub m: Matrix3<f64>,

    /// Coriolis, centrifugal and viscous damping matrix `C(q, q_dot)`.
    pub c: Matrix3<f64>,

    /// Gravity vector `G(q)`.
    pub g: Vector3<f64>,
}

impl DynamicsMatrices {
    /// The combined forcing `F = C q_dot + G`.
    pub fn forcing(&self, q_dot: &Vector3<f64>) -> Vector3<f64> {
        self.c * q_dot + self.g
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the inertia matrix for the given joint angles.
///
/// The matrix is built symmetric, only the upper triangle is computed. A
/// positive link angle leans the link towards negative `x`, hence the
/// negative cart to link coupling.
pub fn inertia_matrix(
    coeffs: &PlantCoeffs,
    variant: DynamicsVariant,
    theta_1: f64,
    theta_2: f64
) -> Matrix3<f64> {
    let m12 = -coeffs.moment_1 * theta_1.cos();
    let m13 = -coeffs.moment_2 * theta_2.cos();
    let m23 = match variant {
        DynamicsVariant::Full => coeffs.coupling_12 * (theta_1 - theta_2).cos(),
        DynamicsVariant::Simplified => coeffs.coupling_12,
    };

    Matrix3::new(
        coeffs.total_mass, m12,              m13,
        m12,               coeffs.inertia_1, m23,
        m13,               m23,              coeffs.inertia_2,
    )
}

/// Compute the Coriolis/centrifugal matrix, including viscous friction on
/// the diagonal.
pub fn coriolis_matrix(
    coeffs: &PlantCoeffs,
    variant: DynamicsVariant,
    theta_1: f64,
    theta_2: f64,
    q_dot: &Vector3<f64>
) -> Matrix3<f64> {
    let theta_1_dot = q_dot[1];
    let theta_2_dot = q_dot[2];

    let c12 = coeffs.moment_1 * theta_1.sin() * theta_1_dot;
    let c13 = coeffs.moment_2 * theta_2.sin() * theta_2_dot;

    let (c23, c32) = match variant {
        DynamicsVariant::Full => {
            let s12 = (theta_1 - theta_2).sin();
            (
                coeffs.coupling_12 * s12 * theta_2_dot,
                -coeffs.coupling_12 * s12 * theta_1_dot,
            )
        },
        DynamicsVariant::Simplified => (0.0, 0.0),
    };

    Matrix3::new(
        coeffs.friction[0], c12,                c13,
        0.0,                coeffs.friction[1], c23,
        0.0,                c32,                coeffs.friction[2],
    )
}

/// Compute the gravity vector.
///
/// Angles are measured from the upright, so gravity drives the links away
/// from `theta = 0`.
pub fn gravity_vector(coeffs: &PlantCoeffs, theta_1: f64, theta_2: f64) -> Vector3<f64> {
    Vector3::new(
        0.0,
        -coeffs.moment_1 * coeffs.gravity * theta_1.sin(),
        -coeffs.moment_2 * coeffs.gravity * theta_2.sin(),
    )
}

/// Compute all matrices of the equations of motion at once.
pub fn compute_matrices(
    coeffs: &PlantCoeffs,
    variant: DynamicsVariant,
    q: &Vector3<f64>,
    q_dot: &Vector3<f64>
) -> DynamicsMatrices {
    DynamicsMatrices {
        m: inertia_matrix(coeffs, variant, q[1], q[2]),
        c: coriolis_matrix(coeffs, variant, q[1], q[2], q_dot),
        g: gravity_vector(coeffs, q[1], q[2]),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::DynamicsParams;

    #[test]
    fn test_inertia_symmetric_positive_definite() {
        let coeffs = DynamicsParams::default().coeffs();

        for variant in [DynamicsVariant::Simplified, DynamicsVariant::Full].iter() {
            for &(t1, t2) in [(0.0, 0.0), (0.3, -1.2), (std::f64::consts::PI, 0.0), (2.0, 5.0)].iter() {
                let m = inertia_matrix(&coeffs, *variant, t1, t2);

                assert_eq!(m, m.transpose());
                assert!(m.cholesky().is_some(), "M not SPD at ({}, {})", t1, t2);
            }
        }
    }

    #[test]
    fn test_variants_agree_when_links_aligned() {
        let coeffs = DynamicsParams::default().coeffs();
        let q = Vector3::new(0.0, 0.4, 0.4);
        let q_dot = Vector3::new(0.0, 0.0, 0.0);

        let full = compute_matrices(&coeffs, DynamicsVariant::Full, &q, &q_dot);
        let simple = compute_matrices(&coeffs, DynamicsVariant::Simplified, &q, &q_dot);

        assert!((full.m - simple.m).amax() < 1e-12);
        assert_eq!(full.g, simple.g);
    }

    #[test]
    fn test_gravity_zero_at_equilibria() {
        let coeffs = DynamicsParams::default().coeffs();

        assert_eq!(gravity_vector(&coeffs, 0.0, 0.0), Vector3::zeros());
        assert!(gravity_vector(&coeffs, std::f64::consts::PI, 0.0).amax() < 1e-12);

        // Small positive lean is pushed further away from the upright
        let g = gravity_vector(&coeffs, 0.1, 0.0);
        assert!(g[1] < 0.0);
    }

    #[test]
    fn test_forcing_at_rest_is_gravity() {
        let coeffs = DynamicsParams::default().coeffs();
        let q = Vector3::new(0.5, 0.2, -0.3);
        let q_dot = Vector3::zeros();

        let mats = compute_matrices(&coeffs, DynamicsVariant::Full, &q, &q_dot);

        assert_eq!(mats.forcing(&q_dot), mats.g);
    }
}
