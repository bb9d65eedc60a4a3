//! Design-of-experiments grids.
//!
//! A [`DesignGrid`] is the Cartesian product of its [`ParameterAxis`] values.
//! Points are produced lazily, in declaration order: the first axis is the
//! outermost loop and the last axis varies fastest.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub mod naming;

pub use naming::NamingScheme;

/// What to do when a single design point fails to build.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the sweep at the first failure.
    Abort,
    /// Log the failure, leave no file for that point and keep going.
    #[default]
    Skip,
}

/// `num` evenly spaced values over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterAxis {
    name: String,
    label: String,
    values: Vec<f64>,
}

impl ParameterAxis {
    /// Creates an axis whose file name label is the axis name itself.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            values: values.into_iter().collect(),
        }
    }

    pub fn linspace(name: impl Into<String>, start: f64, stop: f64, num: usize) -> Self {
        Self::new(name, linspace(start, stop, num))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::EmptyAxis(self.name.clone()));
        }
        if let Some(&value) = self.values.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                axis: self.name.clone(),
                value,
            });
        }
        Ok(())
    }
}

/// One value of a design point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(skip)]
    pub label: String,
    pub value: f64,
}

/// One concrete combination of swept values, one per axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignPoint {
    index: usize,
    params: Vec<Param>,
}

impl DesignPoint {
    /// Position of this point in the sweep order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignGrid {
    axes: Vec<ParameterAxis>,
}

impl DesignGrid {
    pub fn new(axes: Vec<ParameterAxis>) -> Result<Self, ConfigError> {
        if axes.is_empty() {
            return Err(ConfigError::NoAxes);
        }
        let mut names = HashSet::with_capacity(axes.len());
        for axis in axes.iter() {
            axis.validate()?;
            if !names.insert(axis.name()) {
                return Err(ConfigError::DuplicateAxis(axis.name().to_string()));
            }
        }
        Ok(Self { axes })
    }

    #[inline]
    pub fn axes(&self) -> &[ParameterAxis] {
        &self.axes
    }

    /// Number of design points: the product of the axis cardinalities.
    pub fn len(&self) -> usize {
        self.axes.iter().map(ParameterAxis::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> impl Iterator<Item = DesignPoint> + '_ {
        self.axes
            .iter()
            .map(|axis| axis.values().iter().copied())
            .multi_cartesian_product()
            .enumerate()
            .map(move |(index, values)| DesignPoint {
                index,
                params: self
                    .axes
                    .iter()
                    .zip(values)
                    .map(|(axis, value)| Param {
                        name: axis.name.clone(),
                        label: axis.label.clone(),
                        value,
                    })
                    .collect(),
            })
    }
}
