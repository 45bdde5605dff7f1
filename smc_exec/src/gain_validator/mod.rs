//! # Gain validator module
//!
//! Checks candidate gain vectors against the per-controller bound tables and
//! the algebraic stability conditions of each controller. Validation never
//! fails with an error, it returns a report listing every problem found so
//! that a tuner can reject a candidate cheaply.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod bounds;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Internal
pub use bounds::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The sliding mode controller variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmcKind {
    Classical,
    Adaptive,
    SuperTwisting,
    Hybrid,
}

/// A single bound violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GainViolation {
    WrongCount {
        expected: usize,
        found: usize,
    },

    NonFinite {
        name: &'static str,
        value: f64,
    },

    OutOfBounds {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// How serious a stability issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueSeverity {
    /// Convergence is not guaranteed but the gains may still work.
    Warning,

    /// The gains cannot be stable.
    Critical,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of checking a gain vector against its bound table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<GainViolation>,
}

/// One failed or marginal stability condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityIssue {
    pub severity: IssueSeverity,
    pub description: String,
}

/// Result of checking the stability conditions of a gain vector.
///
/// `stable` is false if any issue is critical, warnings alone do not reject
/// the gains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    pub stable: bool,
    pub issues: Vec<StabilityIssue>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Check every gain against the bound table of the controller.
pub fn validate_gains(gains: &[f64], kind: SmcKind) -> ValidationReport {
    let table = kind.bounds();
    let mut violations = Vec::new();

    if gains.len() != table.len() {
        violations.push(GainViolation::WrongCount {
            expected: table.len(),
            found: gains.len(),
        });
    }

    for (bound, &value) in table.iter().zip(gains.iter()) {
        if !value.is_finite() {
            violations.push(GainViolation::NonFinite {
                name: bound.name,
                value,
            });
        }
        else if !bound.contains(value) {
            violations.push(GainViolation::OutOfBounds {
                name: bound.name,
                value,
                min: bound.min,
                max: bound.max,
            });
        }
    }

    ValidationReport {
        valid: violations.is_empty(),
        violations,
    }
}

/// Check the controller specific stability conditions.
///
/// - Classical and hybrid: all surface gains strictly positive.
/// - Adaptive: surface gains positive and `0 < gamma`, with `gamma > 1`
///   flagged as a risk.
/// - Super-twisting: surface gains positive and `K1 > K2 > 0`.
pub fn validate_stability_conditions(gains: &[f64], kind: SmcKind) -> StabilityReport {
    let mut issues = Vec::new();

    if gains.len() != kind.num_gains() {
        issues.push(critical(format!(
            "{} expects {} gains, found {}", kind, kind.num_gains(), gains.len()
        )));
        return StabilityReport::from_issues(issues);
    }

    if let Some((i, v)) = gains.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        issues.push(critical(format!(
            "gain {} is not finite ({})", kind.gain_name(i).unwrap_or("?"), v
        )));
        return StabilityReport::from_issues(issues);
    }

    let surface_range = match kind {
        SmcKind::Classical | SmcKind::Adaptive => 0..4,
        SmcKind::SuperTwisting => 2..6,
        SmcKind::Hybrid => 0..4,
    };
    for i in surface_range {
        if gains[i] <= 0.0 {
            issues.push(critical(format!(
                "surface gain {} must be strictly positive for the surface to converge, found {}",
                kind.gain_name(i).unwrap_or("?"), gains[i]
            )));
        }
    }

    match kind {
        SmcKind::Classical => {
            if gains[4] <= 0.0 {
                issues.push(critical(format!(
                    "switching gain K must be strictly positive, found {}", gains[4]
                )));
            }
            if gains[5] < 0.0 {
                issues.push(critical(format!(
                    "damping gain kd must be non-negative, found {}", gains[5]
                )));
            }
        },
        SmcKind::Adaptive => {
            let gamma = gains[4];
            if gamma <= 0.0 {
                issues.push(critical(format!(
                    "adaptation rate gamma must be strictly positive, found {}", gamma
                )));
            }
            else if gamma > 1.0 {
                issues.push(StabilityIssue {
                    severity: IssueSeverity::Warning,
                    description: format!(
                        "adaptation rate gamma = {} exceeds 1, boundedness of the adapted gain is not guaranteed",
                        gamma
                    ),
                });
            }
        },
        SmcKind::SuperTwisting => {
            let (k1, k2) = (gains[0], gains[1]);
            if !(k2 > 0.0) {
                issues.push(critical(format!(
                    "twisting gain K2 must be strictly positive, found {}", k2
                )));
            }
            if !(k1 > k2) {
                issues.push(critical(format!(
                    "finite time convergence requires K1 > K2, found K1 = {}, K2 = {}", k1, k2
                )));
            }
        },
        SmcKind::Hybrid => (),
    }

    StabilityReport::from_issues(issues)
}

/// The documented bound table as a map from gain name to `(min, max)`.
pub fn get_recommended_ranges(kind: SmcKind) -> BTreeMap<&'static str, (f64, f64)> {
    kind.bounds()
        .iter()
        .map(|b| (b.name, (b.min, b.max)))
        .collect()
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl fmt::Display for SmcKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SmcKind::Classical => "classical SMC",
            SmcKind::Adaptive => "adaptive SMC",
            SmcKind::SuperTwisting => "super-twisting SMC",
            SmcKind::Hybrid => "hybrid adaptive super-twisting SMC",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for GainViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GainViolation::WrongCount { expected, found } =>
                write!(f, "expected {} gains, found {}", expected, found),
            GainViolation::NonFinite { name, value } =>
                write!(f, "{} is not finite ({})", name, value),
            GainViolation::OutOfBounds { name, value, min, max } =>
                write!(f, "{} = {} is outside [{}, {}]", name, value, min, max),
        }
    }
}

impl ValidationReport {
    /// Join every violation into one human readable line.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl StabilityReport {
    fn from_issues(issues: Vec<StabilityIssue>) -> Self {
        Self {
            stable: !issues.iter().any(|i| i.severity == IssueSeverity::Critical),
            issues,
        }
    }

    /// Join every critical issue into one human readable line.
    pub fn critical_summary(&self) -> String {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Critical)
            .map(|i| i.description.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn critical(description: String) -> StabilityIssue {
    StabilityIssue {
        severity: IssueSeverity::Critical,
        description,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    const KINDS: [SmcKind; 4] = [
        SmcKind::Classical,
        SmcKind::Adaptive,
        SmcKind::SuperTwisting,
        SmcKind::Hybrid,
    ];

    #[test]
    fn test_valid_gains() {
        assert!(validate_gains(&[5.0, 3.0, 10.0, 8.0, 20.0, 0.0], SmcKind::Classical).valid);
        assert!(validate_gains(&[5.0, 3.0, 10.0, 8.0, 0.5], SmcKind::Adaptive).valid);
        assert!(validate_gains(&[5.0, 4.0, 10.0, 5.0, 8.0, 3.0], SmcKind::SuperTwisting).valid);
        assert!(validate_gains(&[5.0, 3.0, 10.0, 8.0], SmcKind::Hybrid).valid);
    }

    #[test]
    fn test_violations_are_enumerated() {
        let report = validate_gains(&[0.0, 3.0, std::f64::NAN, 8.0, 2000.0, 1.0], SmcKind::Classical);

        assert!(!report.valid);
        assert_eq!(report.violations.len(), 3);
        assert_eq!(
            report.violations[0],
            GainViolation::OutOfBounds { name: "k1", value: 0.0, min: 0.1, max: 1000.0 }
        );
        assert!(matches!(report.violations[1], GainViolation::NonFinite { name: "lambda_1", .. }));
        assert!(matches!(report.violations[2], GainViolation::OutOfBounds { name: "K", .. }));
        assert!(report.summary().contains("K = 2000"));
    }

    #[test]
    fn test_wrong_count() {
        let report = validate_gains(&[5.0, 3.0, 10.0], SmcKind::Hybrid);

        assert!(!report.valid);
        assert_eq!(report.violations[0], GainViolation::WrongCount { expected: 4, found: 3 });
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate_gains(&[0.1, 1000.0, 0.1, 1000.0, 0.01], SmcKind::Adaptive).valid);
        assert!(!validate_gains(&[0.1, 1000.0, 0.1, 1000.0, 10.5], SmcKind::Adaptive).valid);
    }

    #[test]
    fn test_super_twisting_stability() {
        let stable = validate_stability_conditions(&[5.0, 4.0, 10.0, 5.0, 8.0, 3.0], SmcKind::SuperTwisting);
        assert!(stable.stable);
        assert!(stable.issues.is_empty());

        let unstable = validate_stability_conditions(&[4.0, 5.0, 10.0, 5.0, 8.0, 3.0], SmcKind::SuperTwisting);
        assert!(!unstable.stable);
        assert!(unstable.critical_summary().contains("K1 > K2"));
    }

    #[test]
    fn test_adaptive_gamma() {
        let risky = validate_stability_conditions(&[5.0, 3.0, 10.0, 8.0, 2.0], SmcKind::Adaptive);
        assert!(risky.stable);
        assert_eq!(risky.issues.len(), 1);
        assert_eq!(risky.issues[0].severity, IssueSeverity::Warning);

        let bad = validate_stability_conditions(&[5.0, 3.0, 10.0, 8.0, 0.0], SmcKind::Adaptive);
        assert!(!bad.stable);
    }

    #[test]
    fn test_surface_positivity() {
        assert!(!validate_stability_conditions(&[5.0, -3.0, 10.0, 8.0, 20.0, 1.0], SmcKind::Classical).stable);
        assert!(!validate_stability_conditions(&[5.0, 3.0, 0.0, 8.0], SmcKind::Hybrid).stable);
        assert!(!validate_stability_conditions(&[5.0, 3.0, 10.0], SmcKind::Hybrid).stable);
        assert!(!validate_stability_conditions(&[5.0, 3.0, std::f64::INFINITY, 8.0], SmcKind::Hybrid).stable);
    }

    #[test]
    fn test_recommended_ranges() {
        let ranges = get_recommended_ranges(SmcKind::SuperTwisting);

        assert_eq!(ranges.len(), 6);
        assert_eq!(ranges["K1"], (1.0, 1000.0));
        assert_eq!(ranges["lambda_2"], (0.1, 1000.0));
        assert_eq!(get_recommended_ranges(SmcKind::Classical)["kd"], (0.0, 1000.0));
    }

    proptest! {
        #[test]
        fn interior_gains_are_valid(
            idx in 0..4usize,
            seed in prop::collection::vec(0.0..1.0f64, 6)
        ) {
            let kind = KINDS[idx];
            let gains: Vec<f64> = kind
                .bounds()
                .iter()
                .zip(seed.iter())
                .map(|(b, t)| b.min + (b.max - b.min) * (0.001 + 0.998 * t))
                .collect();

            prop_assert!(validate_gains(&gains, kind).valid);
        }

        #[test]
        fn bad_entry_is_rejected(
            idx in 0..4usize,
            pos in 0..4usize,
            bad in prop::sample::select(vec![-1.0, std::f64::NAN, std::f64::INFINITY, std::f64::NEG_INFINITY])
        ) {
            let kind = KINDS[idx];
            let mut gains: Vec<f64> = kind.bounds().iter().map(|b| 0.5 * (b.min + b.max)).collect();
            gains[pos] = bad;

            prop_assert!(!validate_gains(&gains, kind).valid);
        }
    }
}
