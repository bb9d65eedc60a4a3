use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blocks::mmi::MmiParams;
use crate::doe::naming::DEFAULT_PRECISION;
use crate::doe::{FailurePolicy, ParameterAxis};
use crate::error::ConfigError;
use crate::Result;

pub const DEFAULT_CONFIG_PATH: &str = "mmigen.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "gds/mmi_doe_gds";

/// Evenly spaced values, both ends included.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Linspace {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
}

/// One `[[axes]]` entry. Exactly one of `values` and `linspace` must be given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    pub name: String,
    /// Short name used in output file names. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linspace: Option<Linspace>,
}

impl AxisConfig {
    pub fn to_axis(&self) -> std::result::Result<ParameterAxis, ConfigError> {
        let axis = match (&self.values, &self.linspace) {
            (Some(values), None) => ParameterAxis::new(&self.name, values.iter().copied()),
            (None, Some(Linspace { start, stop, num })) => {
                if *num == 0 {
                    return Err(ConfigError::EmptyAxis(self.name.clone()));
                }
                ParameterAxis::linspace(&self.name, *start, *stop, *num)
            }
            _ => return Err(ConfigError::AmbiguousValues(self.name.clone())),
        };
        Ok(match &self.label {
            Some(label) => axis.with_label(label),
            None => axis,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoeConfig {
    /// Leading component of every output file name.
    pub prefix: String,
    pub output_dir: PathBuf,
    /// Decimal places used for values in file names.
    pub precision: usize,
    pub on_failure: FailurePolicy,
    /// Whether to write a JSON manifest next to the layouts.
    pub manifest: bool,
    /// Parameters shared by every design point.
    pub base: MmiParams,
    pub axes: Vec<AxisConfig>,
}

impl Default for DoeConfig {
    fn default() -> Self {
        Self {
            prefix: "mmi".to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            precision: DEFAULT_PRECISION,
            on_failure: FailurePolicy::default(),
            manifest: true,
            base: MmiParams::default(),
            axes: default_axes(),
        }
    }
}

/// A 3x3 sweep of MMI width over [2, 4] and length over [20, 40].
pub fn default_axes() -> Vec<AxisConfig> {
    vec![
        AxisConfig {
            name: "width_mmi".to_string(),
            label: Some("w".to_string()),
            values: None,
            linspace: Some(Linspace {
                start: 2.0,
                stop: 4.0,
                num: 3,
            }),
        },
        AxisConfig {
            name: "length_mmi".to_string(),
            label: Some("L".to_string()),
            values: None,
            linspace: Some(Linspace {
                start: 20.0,
                stop: 40.0,
                num: 3,
            }),
        },
    ]
}

impl DoeConfig {
    pub fn from_toml(contents: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn axes(&self) -> std::result::Result<Vec<ParameterAxis>, ConfigError> {
        self.axes.iter().map(AxisConfig::to_axis).collect()
    }
}

pub fn parse_doe_config(path: impl AsRef<Path>) -> Result<DoeConfig> {
    let contents = fs::read_to_string(path)?;
    Ok(DoeConfig::from_toml(&contents)?)
}
