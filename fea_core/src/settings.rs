//! # Model Settings
//!
//! Numeric settings shared by every part of a model: the precision used to
//! build geometric node keys, the global tolerance, and whether overlapping
//! nodes are allowed.
//!
//! Defaults can be overridden from the environment:
//!
//! | variable               | field              |
//! |------------------------|--------------------|
//! | `FEA_PRECISION`        | `precision`        |
//! | `FEA_GLOBAL_TOLERANCE` | `global_tolerance` |
//! | `FEA_POINT_OVERLAP`    | `point_overlap`    |

use serde::{Deserialize, Serialize};

use crate::errors::{FeaError, FeaResult};

/// Environment variable for the geometric key precision
pub const ENV_PRECISION: &str = "FEA_PRECISION";
/// Environment variable for the global tolerance
pub const ENV_GLOBAL_TOLERANCE: &str = "FEA_GLOBAL_TOLERANCE";
/// Environment variable for the point overlap flag
pub const ENV_POINT_OVERLAP: &str = "FEA_POINT_OVERLAP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Decimal places used in geometric keys and coordinate output
    pub precision: usize,
    /// Tolerance for coordinate lookups
    pub global_tolerance: f64,
    /// When false, new parts reject nodes that overlap an existing one
    pub point_overlap: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            precision: 3,
            global_tolerance: 1.0,
            point_overlap: true,
        }
    }
}

impl ModelSettings {
    /// Defaults with `FEA_*` environment overrides applied.
    pub fn from_env() -> FeaResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides taken from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FeaResult<Self> {
        let mut settings = ModelSettings::default();

        if let Some(raw) = lookup(ENV_PRECISION) {
            settings.precision = raw
                .trim()
                .parse()
                .map_err(|_| FeaError::invalid_input(ENV_PRECISION, raw.clone(), "Expected a non-negative integer"))?;
        }

        if let Some(raw) = lookup(ENV_GLOBAL_TOLERANCE) {
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| FeaError::invalid_input(ENV_GLOBAL_TOLERANCE, raw.clone(), "Expected a number"))?;
            if value.is_nan() || value <= 0.0 {
                return Err(FeaError::invalid_input(ENV_GLOBAL_TOLERANCE, raw, "Tolerance must be positive"));
            }
            settings.global_tolerance = value;
        }

        if let Some(raw) = lookup(ENV_POINT_OVERLAP) {
            settings.point_overlap = parse_flag(&raw)
                .ok_or_else(|| FeaError::invalid_input(ENV_POINT_OVERLAP, raw.clone(), "Expected true/false"))?;
        }

        Ok(settings)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let settings = ModelSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, ModelSettings::default());
        assert_eq!(settings.precision, 3);
    }

    #[test]
    fn test_overrides_applied() {
        let settings = ModelSettings::from_lookup(lookup(&[
            (ENV_PRECISION, "5"),
            (ENV_GLOBAL_TOLERANCE, "0.01"),
            (ENV_POINT_OVERLAP, "false"),
        ]))
        .unwrap();
        assert_eq!(settings.precision, 5);
        assert_eq!(settings.global_tolerance, 0.01);
        assert!(!settings.point_overlap);
    }

    #[test]
    fn test_malformed_override_is_invalid_input() {
        let err = ModelSettings::from_lookup(lookup(&[(ENV_PRECISION, "three")])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(ModelSettings::from_lookup(lookup(&[(ENV_GLOBAL_TOLERANCE, "-1")])).is_err());
        assert!(ModelSettings::from_lookup(lookup(&[(ENV_POINT_OVERLAP, "maybe")])).is_err());
    }
}
