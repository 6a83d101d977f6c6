// src/error.rs
use thiserror::Error;

/// Error kinds raised by the pricers and estimators.
///
/// Every failure is local and input-driven: nothing here is transient or
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum McError {
    /// A market or model parameter is outside its admissible domain
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameter {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Zero samples, or an odd count where paired sampling is required
    #[error("Invalid sample count {count}: {reason}")]
    InvalidSampleCount { count: usize, reason: String },

    /// Importance-sampling proposal density vanished where the original did not
    #[error(
        "Degenerate proposal at x = {x}: original density is {original_density:e} but proposal density is zero"
    )]
    DegenerateProposal { x: f64, original_density: f64 },

    /// A non-finite intermediate value appeared during a computation
    #[error("Numeric overflow in {method}: {reason}")]
    NumericOverflow { method: String, reason: String },

    /// Inconsistent configuration, e.g. a draw source the estimator cannot use
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },
}

/// Result type alias for fast-mc operations
pub type McResult<T> = Result<T, McError>;

impl McError {
    pub fn overflow(method: impl Into<String>, reason: impl Into<String>) -> Self {
        McError::NumericOverflow {
            method: method.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        McError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validation utilities
pub mod validation {
    use super::{McError, McResult};

    /// Upper bound on simulated samples per call
    pub const MAX_PATHS: usize = 1_000_000_000;

    /// Upper bound on time steps per path or lattice
    pub const MAX_STEPS: usize = 100_000;

    fn invalid(name: &str, value: f64, constraint: impl Into<String>) -> McError {
        McError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: constraint.into(),
        }
    }

    /// Validate that a parameter is finite and strictly positive
    pub fn validate_positive(name: &str, value: f64) -> McResult<()> {
        validate_finite(name, value)?;
        if value <= 0.0 {
            Err(invalid(name, value, "must be positive (> 0)"))
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is finite and non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> McResult<()> {
        validate_finite(name, value)?;
        if value < 0.0 {
            Err(invalid(name, value, "must be non-negative (≥ 0)"))
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is within a closed range
    pub fn validate_range(name: &str, value: f64, min: f64, max: f64) -> McResult<()> {
        if !(min..=max).contains(&value) {
            Err(invalid(
                name,
                value,
                format!("must be in range [{}, {}]", min, max),
            ))
        } else {
            Ok(())
        }
    }

    /// Validate a probability level strictly between 0 and 1
    pub fn validate_confidence_level(value: f64) -> McResult<()> {
        if value > 0.0 && value < 1.0 {
            Ok(())
        } else {
            Err(invalid(
                "confidence_level",
                value,
                "must lie strictly between 0 and 1",
            ))
        }
    }

    /// Validate correlation parameter
    pub fn validate_correlation(name: &str, rho: f64) -> McResult<()> {
        validate_range(name, rho, -1.0, 1.0)
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> McResult<()> {
        if !value.is_finite() {
            Err(invalid(name, value, "must be finite (not NaN or infinite)"))
        } else {
            Ok(())
        }
    }

    /// Validate sample count
    pub fn validate_paths(paths: usize) -> McResult<()> {
        if paths == 0 {
            Err(McError::InvalidSampleCount {
                count: paths,
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > MAX_PATHS {
            Err(McError::InvalidSampleCount {
                count: paths,
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a sample count can be split into antithetic pairs
    pub fn validate_even_paths(paths: usize) -> McResult<()> {
        validate_paths(paths)?;
        if paths % 2 != 0 {
            Err(McError::InvalidSampleCount {
                count: paths,
                reason: "antithetic sampling needs an even number of samples".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> McResult<()> {
        if steps == 0 {
            Err(McError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > MAX_STEPS {
            Err(McError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("sigma", 0.2).is_ok());
        assert!(validate_positive("sigma", 0.0).is_err());
        assert!(validate_positive("sigma", -0.1).is_err());
        assert!(validate_positive("sigma", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_correlation() {
        assert!(validate_correlation("rho", 0.5).is_ok());
        assert!(validate_correlation("rho", -1.0).is_ok());
        assert!(validate_correlation("rho", 1.0).is_ok());
        assert!(validate_correlation("rho", 1.1).is_err());
        assert!(validate_correlation("rho", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_confidence_level() {
        assert!(validate_confidence_level(0.95).is_ok());
        assert!(validate_confidence_level(0.0).is_err());
        assert!(validate_confidence_level(1.0).is_err());
        assert!(validate_confidence_level(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
        assert!(validate_finite("value", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_even_paths() {
        assert!(validate_even_paths(10).is_ok());
        assert!(matches!(
            validate_even_paths(11),
            Err(McError::InvalidSampleCount { count: 11, .. })
        ));
        assert!(matches!(
            validate_even_paths(0),
            Err(McError::InvalidSampleCount { count: 0, .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let error = McError::InvalidParameter {
            parameter: "sigma".to_string(),
            value: -0.1,
            constraint: "must be positive".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("sigma"));
        assert!(display.contains("-0.1"));
        assert!(display.contains("positive"));
    }

    #[test]
    fn test_degenerate_proposal_display() {
        let error = McError::DegenerateProposal {
            x: -40.0,
            original_density: 1e-300,
        };
        let display = format!("{}", error);
        assert!(display.contains("-40"));
        assert!(display.contains("proposal density is zero"));
    }
}
