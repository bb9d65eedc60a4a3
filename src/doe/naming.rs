use serde::{Deserialize, Serialize};

use super::{DesignPoint, ParameterAxis};
use crate::error::ConfigError;

pub const DEFAULT_PRECISION: usize = 2;

/// Maps design points to file names of the form
/// `<prefix>_<label1><value1>_<label2><value2>.gds`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NamingScheme {
    prefix: String,
    precision: usize,
}

fn check_component(s: &str) -> Result<(), ConfigError> {
    if s.is_empty() || s.contains(['/', '\\']) {
        return Err(ConfigError::InvalidName(s.to_string()));
    }
    Ok(())
}

impl NamingScheme {
    pub fn new(prefix: impl Into<String>, precision: usize) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        check_component(&prefix)?;
        Ok(Self { prefix, precision })
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn format_value(&self, value: f64) -> String {
        // Avoid `-0.00` for values that round to zero from below.
        let s = format!("{:.*}", self.precision, value);
        match s.strip_prefix('-') {
            Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
            _ => s,
        }
    }

    /// Checks that the axis label is usable and that no two values of the axis
    /// format identically.
    pub fn check_axis(&self, axis: &ParameterAxis) -> Result<(), ConfigError> {
        check_component(axis.label())?;
        let formatted: Vec<_> = axis.values().iter().map(|&v| self.format_value(v)).collect();
        for (i, a) in formatted.iter().enumerate() {
            if let Some(j) = formatted[i + 1..].iter().position(|b| b == a) {
                return Err(ConfigError::ValueCollision {
                    axis: axis.name().to_string(),
                    first: axis.values()[i],
                    second: axis.values()[i + 1 + j],
                    formatted: a.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn stem(&self, point: &DesignPoint) -> String {
        let mut stem = self.prefix.clone();
        for param in point.params() {
            stem.push('_');
            stem.push_str(&param.label);
            stem.push_str(&self.format_value(param.value));
        }
        stem
    }

    pub fn file_name(&self, point: &DesignPoint) -> String {
        format!("{}.gds", self.stem(point))
    }
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            prefix: "mmi".to_string(),
            precision: DEFAULT_PRECISION,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::doe::DesignGrid;

    fn grid(widths: &[f64], lengths: &[f64]) -> DesignGrid {
        DesignGrid::new(vec![
            ParameterAxis::new("width_mmi", widths.iter().copied()).with_label("w"),
            ParameterAxis::new("length_mmi", lengths.iter().copied()).with_label("L"),
        ])
        .unwrap()
    }

    #[test]
    fn test_file_names_3x3() {
        let naming = NamingScheme::default();
        let grid = grid(&[2.0, 3.0, 4.0], &[20.0, 30.0, 40.0]);
        let names: Vec<_> = grid.points().map(|p| naming.file_name(&p)).collect();
        assert_eq!(
            names,
            vec![
                "mmi_w2.00_L20.00.gds",
                "mmi_w2.00_L30.00.gds",
                "mmi_w2.00_L40.00.gds",
                "mmi_w3.00_L20.00.gds",
                "mmi_w3.00_L30.00.gds",
                "mmi_w3.00_L40.00.gds",
                "mmi_w4.00_L20.00.gds",
                "mmi_w4.00_L30.00.gds",
                "mmi_w4.00_L40.00.gds",
            ]
        );
    }

    #[test]
    fn test_file_names_are_stable_and_unique() {
        let naming = NamingScheme::default();
        let grid = grid(&[2.0, 2.5, 3.0, 3.5, 4.0], &[20.0, 30.0, 40.0]);
        let first: Vec<_> = grid.points().map(|p| naming.file_name(&p)).collect();
        let second: Vec<_> = grid.points().map(|p| naming.file_name(&p)).collect();
        assert_eq!(first, second);

        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), 15);
    }

    #[test]
    fn test_format_value() {
        let naming = NamingScheme::new("x", 3).unwrap();
        assert_eq!(naming.format_value(0.2), "0.200");
        assert_eq!(naming.format_value(-0.0001), "0.000");
        assert_eq!(naming.format_value(-1.5), "-1.500");
    }

    #[test]
    fn test_value_collision_detected() {
        let naming = NamingScheme::default();
        let axis = ParameterAxis::new("gap_mmi", [0.2, 0.201, 0.3]);
        match naming.check_axis(&axis) {
            Err(ConfigError::ValueCollision {
                first,
                second,
                formatted,
                ..
            }) => {
                assert_eq!(first, 0.2);
                assert_eq!(second, 0.201);
                assert_eq!(formatted, "0.20");
            }
            other => panic!("expected a value collision, got {other:?}"),
        }

        let finer = NamingScheme::new("mmi", 3).unwrap();
        finer.check_axis(&axis).unwrap();
    }

    #[test]
    fn test_invalid_names() {
        assert!(NamingScheme::new("", 2).is_err());
        assert!(NamingScheme::new("a/b", 2).is_err());
        NamingScheme::new("mmi_doe", 2).unwrap();

        let naming = NamingScheme::default();
        naming
            .check_axis(&ParameterAxis::new("width_mmi", [1.0]))
            .unwrap();
        assert!(matches!(
            naming.check_axis(&ParameterAxis::new("width_mmi", [1.0]).with_label("")),
            Err(ConfigError::InvalidName(_))
        ));
    }
}
