//! Dynamics engine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

// Internal
use super::{
    compute_matrices, coriolis_matrix, gravity_vector, inertia_matrix,
    CacheStats, DynamicsError, DynamicsMatrices, DynamicsParams, DynamicsVariant,
    MatrixCache, PlantCoeffs,
};
use crate::num_stab::{MatrixInverter, RegularisationParams};
use crate::state_vector::{self, StateVector};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Direction in which the control force acts, on the cart coordinate only.
pub const CONTROL_INPUT: [f64; 3] = [1.0, 0.0, 0.0];

/// RK4 sample weights.
const RK4_WEIGHTS: [f64; 4] = [1.0 / 6.0, 2.0 / 6.0, 2.0 / 6.0, 1.0 / 6.0];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Evaluates the double inverted pendulum dynamics and integrates them.
///
/// The engine is `Send` and `Sync`. With the inertia cache enabled, threads
/// sharing an engine serialise on the cache lock, so tuning workers should
/// share a cache-disabled engine or own a clone each.
#[derive(Debug)]
pub struct DynamicsEngine {
    params: DynamicsParams,
    coeffs: PlantCoeffs,
    inverter: MatrixInverter,
    cache: Mutex<MatrixCache>,
}

/// Energy breakdown at one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Energy {
    /// Units: joules
    pub kinetic_j: f64,

    /// Units: joules
    pub potential_j: f64,

    /// Units: joules
    pub total_j: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Clone for DynamicsEngine {
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            coeffs: self.coeffs,
            inverter: self.inverter,
            cache: Mutex::new(self.cache().clone()),
        }
    }
}

impl DynamicsEngine {

    /// Create a new engine from validated parameters.
    pub fn new(params: DynamicsParams) -> Result<Self, DynamicsError> {
        params.validate()?;

        let mut cache = MatrixCache::default();
        if params.enable_cache {
            cache.enable();
        }

        Ok(Self {
            coeffs: params.coeffs(),
            inverter: MatrixInverter::new(params.regularisation)?,
            cache: Mutex::new(cache),
            params,
        })
    }

    pub fn params(&self) -> &DynamicsParams {
        &self.params
    }

    pub fn variant(&self) -> DynamicsVariant {
        self.params.variant
    }

    pub fn inverter(&self) -> &MatrixInverter {
        &self.inverter
    }

    // ---- MUTATORS ----

    /// Replace the physical parameters.
    ///
    /// The cache is invalidated, the cache enable flag of the new parameters
    /// is ignored in favour of the current setting.
    pub fn set_params(&mut self, params: DynamicsParams) -> Result<(), DynamicsError> {
        params.validate()?;

        self.inverter = MatrixInverter::new(params.regularisation)?;
        self.coeffs = params.coeffs();
        let enable_cache = self.cache().is_enabled();
        self.params = DynamicsParams {
            enable_cache,
            ..params
        };
        self.cache().invalidate();

        Ok(())
    }

    /// Switch between the simplified and full formulation.
    pub fn set_variant(&mut self, variant: DynamicsVariant) {
        self.params.variant = variant;
        self.cache().invalidate();
    }

    /// Replace the regularisation used for solving the accelerations.
    pub fn set_regularisation(
        &mut self,
        regularisation: RegularisationParams
    ) -> Result<(), DynamicsError> {
        self.inverter = MatrixInverter::new(regularisation)?;
        self.params.regularisation = regularisation;
        self.cache().invalidate();

        Ok(())
    }

    // ---- CACHE ----

    /// Enable the inertia matrix cache.
    pub fn enable_cache(&mut self) {
        self.params.enable_cache = true;
        self.cache().enable();
    }

    /// Disable the inertia matrix cache, dropping its contents.
    pub fn disable_cache(&mut self) {
        self.params.enable_cache = false;
        self.cache().disable();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Lock the cache. The cache holds no invariant a panicking holder could
    /// break, so a poisoned lock is recovered.
    fn cache(&self) -> MutexGuard<'_, MatrixCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner()
        }
    }

    // ---- MATRICES ----

    /// Get the inertia matrix for the given state, using the cache if
    /// enabled.
    pub fn inertia(&self, state: &StateVector) -> Matrix3<f64> {
        let theta_1 = state[state_vector::IDX_THETA_1];
        let theta_2 = state[state_vector::IDX_THETA_2];

        let mut cache = self.cache();
        if !cache.is_enabled() {
            return inertia_matrix(&self.coeffs, self.params.variant, theta_1, theta_2);
        }

        let key = MatrixCache::key(theta_1, theta_2);
        match cache.get(key) {
            Some(m) => m,
            None => {
                let m = inertia_matrix(&self.coeffs, self.params.variant, theta_1, theta_2);
                cache.insert(key, m);
                m
            }
        }
    }

    /// Compute the inertia, Coriolis and gravity terms at the given state.
    pub fn get_matrices(&self, state: &StateVector) -> DynamicsMatrices {
        let q = state_vector::positions(state);
        let q_dot = state_vector::velocities(state);
        let cached = self.cache().is_enabled();

        if cached {
            DynamicsMatrices {
                m: self.inertia(state),
                c: coriolis_matrix(&self.coeffs, self.params.variant, q[1], q[2], &q_dot),
                g: gravity_vector(&self.coeffs, q[1], q[2]),
            }
        }
        else {
            compute_matrices(&self.coeffs, self.params.variant, &q, &q_dot)
        }
    }

    /// Compute the inertia matrix and the combined forcing `F = C q_dot + G`.
    pub fn mass_and_forcing(&self, state: &StateVector) -> (Matrix3<f64>, Vector3<f64>) {
        let mats = self.get_matrices(state);

        (mats.m, mats.forcing(&state_vector::velocities(state)))
    }

    // ---- DERIVATIVE AND INTEGRATION ----

    /// Compute the time derivative of the state under the control force `u`.
    ///
    /// The derivative is returned in the state layout, i.e. the components of
    /// `[q_dot; M^-1 (B u - F)]` placed in their state slots. If the inertia
    /// matrix cannot be inverted the accelerations degrade to zero.
    pub fn compute_state_derivative(
        &self,
        state: &StateVector,
        u: f64
    ) -> Result<StateVector, DynamicsError> {
        check_inputs(state, u)?;

        let q_dot = state_vector::velocities(state);
        let (m, f) = self.mass_and_forcing(state);
        let rhs = Vector3::from(CONTROL_INPUT) * u - f;

        let q_ddot = match self.inverter.solve(&m, &rhs) {
            Ok(a) => a,
            Err(e) => {
                warn!(
                    "Could not solve for the accelerations ({}), using zero acceleration",
                    e
                );
                Vector3::zeros()
            }
        };

        Ok(state_vector::from_coords(&q_dot, &q_ddot))
    }

    /// Advance the state by one explicit Euler step.
    pub fn step_euler(
        &self,
        state: &StateVector,
        u: f64,
        dt: f64
    ) -> Result<StateVector, DynamicsError> {
        check_time_step(dt)?;

        let k1 = self.compute_state_derivative(state, u)?;

        Ok(state + k1 * dt)
    }

    /// Advance the state by one classical fourth order Runge-Kutta step.
    ///
    /// The control is held constant over the step.
    pub fn step_rk4(
        &self,
        state: &StateVector,
        u: f64,
        dt: f64
    ) -> Result<StateVector, DynamicsError> {
        check_time_step(dt)?;

        let k1 = self.compute_state_derivative(state, u)?;
        let k2 = self.compute_state_derivative(&(state + k1 * (0.5 * dt)), u)?;
        let k3 = self.compute_state_derivative(&(state + k2 * (0.5 * dt)), u)?;
        let k4 = self.compute_state_derivative(&(state + k3 * dt), u)?;

        let increment = k1 * RK4_WEIGHTS[0]
            + k2 * RK4_WEIGHTS[1]
            + k3 * RK4_WEIGHTS[2]
            + k4 * RK4_WEIGHTS[3];

        let next = state + increment * dt;

        if !state_vector::is_finite(&next) {
            debug!("RK4 step produced a non-finite state from {:?}", state);
        }

        Ok(next)
    }

    // ---- ENERGY ----

    /// Kinetic energy, `0.5 q_dot^T M q_dot`, always using the full inertia
    /// matrix regardless of the configured variant.
    pub fn kinetic_energy(&self, state: &StateVector) -> f64 {
        let q_dot = state_vector::velocities(state);
        let m = inertia_matrix(
            &self.coeffs,
            DynamicsVariant::Full,
            state[state_vector::IDX_THETA_1],
            state[state_vector::IDX_THETA_2]
        );

        0.5 * q_dot.dot(&(m * q_dot))
    }

    /// Potential energy relative to the height of the cart.
    pub fn potential_energy(&self, state: &StateVector) -> f64 {
        self.coeffs.gravity * (
            self.coeffs.moment_1 * state[state_vector::IDX_THETA_1].cos()
            + self.coeffs.moment_2 * state[state_vector::IDX_THETA_2].cos()
        )
    }

    /// Full energy breakdown.
    pub fn energy(&self, state: &StateVector) -> Energy {
        let kinetic_j = self.kinetic_energy(state);
        let potential_j = self.potential_energy(state);

        Energy {
            kinetic_j,
            potential_j,
            total_j: kinetic_j + potential_j,
        }
    }

    pub fn total_energy(&self, state: &StateVector) -> f64 {
        self.energy(state).total_j
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_inputs(state: &StateVector, u: f64) -> Result<(), DynamicsError> {
    if !state_vector::is_finite(state) {
        return Err(DynamicsError::InvalidInput(format!(
            "state contains non-finite elements: {:?}", state.as_slice()
        )));
    }
    if !u.is_finite() {
        return Err(DynamicsError::InvalidInput(format!("control is not finite: {}", u)));
    }

    Ok(())
}

fn check_time_step(dt: f64) -> Result<(), DynamicsError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    }
    else {
        Err(DynamicsError::InvalidTimeStep(dt))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    fn engine(variant: DynamicsVariant) -> DynamicsEngine {
        DynamicsEngine::new(DynamicsParams {
            variant,
            ..Default::default()
        }).unwrap()
    }

    #[test]
    fn test_rk4_zero_state_is_fixed_point() {
        let eng = engine(DynamicsVariant::Simplified);
        let zero = StateVector::zeros();

        let next = eng.step_rk4(&zero, 0.0, 0.01).unwrap();

        assert_eq!(next, zero);
    }

    #[test]
    fn test_hanging_equilibrium_is_fixed_point() {
        let eng = engine(DynamicsVariant::Full);
        let down = StateVector::new(0.0, 0.0, PI, 0.0, PI, 0.0);

        let next = eng.step_rk4(&down, 0.0, 0.01).unwrap();

        assert!((next - down).amax() < 1e-12);
    }

    #[test]
    fn test_upright_is_unstable() {
        let eng = engine(DynamicsVariant::Full);
        let state = StateVector::new(0.0, 0.0, 0.05, 0.0, 0.05, 0.0);

        let d = eng.compute_state_derivative(&state, 0.0).unwrap();

        // Links accelerate further away from the upright
        assert!(d[state_vector::IDX_THETA_1_DOT] > 0.0 || d[state_vector::IDX_THETA_2_DOT] > 0.0);
    }

    #[test]
    fn test_derivative_layout() {
        let eng = engine(DynamicsVariant::Simplified);
        let state = StateVector::new(0.3, 1.0, 0.1, -2.0, 0.2, 3.0);

        let d = eng.compute_state_derivative(&state, 1.5).unwrap();

        assert_eq!(d[state_vector::IDX_X], 1.0);
        assert_eq!(d[state_vector::IDX_THETA_1], -2.0);
        assert_eq!(d[state_vector::IDX_THETA_2], 3.0);
    }

    #[test]
    fn test_force_accelerates_cart() {
        let eng = engine(DynamicsVariant::Full);

        let d = eng.compute_state_derivative(&StateVector::zeros(), 10.0).unwrap();

        assert!(d[state_vector::IDX_X_DOT] > 0.0);
    }

    #[test]
    fn test_euler_matches_derivative() {
        let eng = engine(DynamicsVariant::Simplified);
        let state = StateVector::new(0.0, 0.1, 0.2, 0.0, -0.1, 0.0);
        let dt = 1e-3;

        let next = eng.step_euler(&state, 2.0, dt).unwrap();
        let d = eng.compute_state_derivative(&state, 2.0).unwrap();

        assert!((next - (state + d * dt)).amax() < 1e-15);
    }

    #[test]
    fn test_rk4_conserves_energy_without_friction() {
        let eng = DynamicsEngine::new(DynamicsParams {
            variant: DynamicsVariant::Full,
            ..DynamicsParams::frictionless()
        }).unwrap();

        let mut state = StateVector::new(0.0, 0.0, 0.3, 0.0, -0.2, 0.0);
        let e0 = eng.total_energy(&state);

        for _ in 0..200 {
            state = eng.step_rk4(&state, 0.0, 1e-3).unwrap();
        }

        let e1 = eng.total_energy(&state);
        assert!((e1 - e0).abs() < 1e-6 * e0.abs().max(1.0), "drift {}", e1 - e0);
    }

    #[test]
    fn test_energy_breakdown() {
        let eng = engine(DynamicsVariant::Simplified);
        let c = eng.params().coeffs();

        let upright = eng.energy(&StateVector::zeros());
        assert_eq!(upright.kinetic_j, 0.0);
        assert!((upright.potential_j - c.gravity * (c.moment_1 + c.moment_2)).abs() < 1e-12);

        let moving = StateVector::new(0.0, 2.0, 0.0, 0.0, 0.0, 0.0);
        assert!((eng.kinetic_energy(&moving) - 0.5 * c.total_mass * 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_inputs() {
        let eng = engine(DynamicsVariant::Simplified);
        let zero = StateVector::zeros();

        assert!(matches!(eng.step_rk4(&zero, 0.0, 0.0), Err(DynamicsError::InvalidTimeStep(_))));
        assert!(matches!(eng.step_euler(&zero, 0.0, -1.0), Err(DynamicsError::InvalidTimeStep(_))));
        assert!(matches!(
            eng.step_rk4(&zero, std::f64::NAN, 0.01),
            Err(DynamicsError::InvalidInput(_))
        ));

        let mut bad = zero;
        bad[2] = std::f64::INFINITY;
        assert!(matches!(
            eng.compute_state_derivative(&bad, 0.0),
            Err(DynamicsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cache() {
        let mut eng = engine(DynamicsVariant::Full);
        let state = StateVector::new(0.0, 0.0, 0.1, 0.0, 0.2, 0.0);

        // Off by default
        let m_uncached = eng.get_matrices(&state).m;
        assert_eq!(eng.cache_stats().misses, 0);

        eng.enable_cache();
        let m1 = eng.get_matrices(&state).m;
        let m2 = eng.get_matrices(&state).m;
        assert_eq!(m1, m_uncached);
        assert_eq!(m2, m_uncached);
        assert_eq!(eng.cache_stats().hits, 1);
        assert_eq!(eng.cache_stats().misses, 1);

        // Switching variant invalidates
        eng.set_variant(DynamicsVariant::Simplified);
        assert_eq!(eng.cache_stats().len, 0);
        let m_simple = eng.get_matrices(&state).m;
        assert!(m_simple != m_uncached);

        eng.disable_cache();
        assert_eq!(eng.cache_stats().len, 0);
    }

    #[test]
    fn test_mutators_invalidate_cache() {
        let mut eng = engine(DynamicsVariant::Full);
        eng.enable_cache();

        let fill = |eng: &DynamicsEngine| {
            eng.get_matrices(&StateVector::new(0.0, 0.0, 0.1, 0.0, 0.2, 0.0));
            eng.get_matrices(&StateVector::new(0.0, 0.0, -0.3, 0.0, 0.4, 0.0));
            assert_eq!(eng.cache_stats().len, 2);
        };

        fill(&eng);
        eng.set_params(DynamicsParams {
            cart_mass_kg: 3.0,
            ..Default::default()
        }).unwrap();
        assert_eq!(eng.cache_stats().len, 0);
        assert_eq!(eng.cache_stats().misses, 0);

        // The cache stays enabled across set_params
        fill(&eng);
        eng.set_regularisation(RegularisationParams {
            regularisation_alpha: 1e-3,
            ..Default::default()
        }).unwrap();
        assert_eq!(eng.cache_stats().len, 0);
        assert_eq!(eng.params().regularisation.regularisation_alpha, 1e-3);

        // A rejected regularisation leaves the engine untouched
        fill(&eng);
        assert!(eng.set_regularisation(RegularisationParams {
            max_condition_number: 0.0,
            ..Default::default()
        }).is_err());
        assert_eq!(eng.cache_stats().len, 2);
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DynamicsEngine>();

        let eng = std::sync::Arc::new(engine(DynamicsVariant::Full));
        let state = StateVector::new(0.0, 0.0, 0.1, 0.0, -0.1, 0.0);
        let expected = eng.compute_state_derivative(&state, 1.0).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let eng = eng.clone();
                std::thread::spawn(move || eng.compute_state_derivative(&state, 1.0).unwrap())
            })
            .collect();

        for w in workers {
            assert_eq!(w.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_set_params() {
        let mut eng = engine(DynamicsVariant::Simplified);

        let heavier = DynamicsParams {
            cart_mass_kg: 5.0,
            ..Default::default()
        };
        eng.set_params(heavier).unwrap();
        assert!((eng.inertia(&StateVector::zeros())[(0, 0)] - 5.46).abs() < 1e-12);

        let bad = DynamicsParams {
            pend_2_length_m: -1.0,
            ..Default::default()
        };
        assert!(eng.set_params(bad).is_err());
    }
}
