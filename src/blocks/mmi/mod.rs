use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::doe::DesignPoint;
use crate::error::{BuildError, ConfigError};
use crate::layout::{Cell, Layer, LayoutBuilder};

pub mod layout;

/// Parameters of a 2x2 MMI beamsplitter. All lengths are in micrometres.
#[derive(Debug, Copy, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default, deny_unknown_fields)]
pub struct MmiParams {
    /// Width of the multimode region.
    pub width_mmi: f64,
    /// Length of the multimode region.
    pub length_mmi: f64,
    pub input_width: f64,
    pub output_width: f64,
    /// Length of each of the four access tapers.
    pub taper_length: f64,
    /// Gap between the two tapers where they meet the multimode region.
    pub gap_mmi: f64,
    pub layer: Layer,
}

impl Default for MmiParams {
    fn default() -> Self {
        Self {
            width_mmi: 3.0,
            length_mmi: 30.0,
            input_width: 0.5,
            output_width: 0.5,
            taper_length: 10.0,
            gap_mmi: 0.2,
            layer: Layer::new(1, 0),
        }
    }
}

impl MmiParams {
    /// Names of the fields a sweep axis may vary.
    pub const SWEEPABLE: [&'static str; 6] = [
        "width_mmi",
        "length_mmi",
        "input_width",
        "output_width",
        "taper_length",
        "gap_mmi",
    ];

    #[inline]
    pub fn builder() -> MmiParamsBuilder {
        MmiParamsBuilder::default()
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        Some(match name {
            "width_mmi" => &mut self.width_mmi,
            "length_mmi" => &mut self.length_mmi,
            "input_width" => &mut self.input_width,
            "output_width" => &mut self.output_width,
            "taper_length" => &mut self.taper_length,
            "gap_mmi" => &mut self.gap_mmi,
            _ => return None,
        })
    }

    /// Returns a copy of `self` with every swept value of `point` applied.
    pub fn with_point(mut self, point: &DesignPoint) -> Result<Self, BuildError> {
        for param in point.params() {
            let field = self.field_mut(&param.name).ok_or_else(|| {
                BuildError::InvalidParams(format!("unknown MMI parameter `{}`", param.name))
            })?;
            *field = param.value;
        }
        Ok(self)
    }

    /// Width of each taper where it meets the multimode region.
    #[inline]
    pub fn taper_width(&self) -> f64 {
        (self.width_mmi - self.gap_mmi) / 2.0
    }

    /// Centre-to-centre spacing of the two taper entries.
    #[inline]
    pub fn pitch(&self) -> f64 {
        self.gap_mmi + self.taper_width()
    }

    #[inline]
    pub fn total_length(&self) -> f64 {
        2.0 * self.taper_length + self.length_mmi
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        let lengths = [
            ("width_mmi", self.width_mmi),
            ("length_mmi", self.length_mmi),
            ("input_width", self.input_width),
            ("output_width", self.output_width),
            ("taper_length", self.taper_length),
            ("gap_mmi", self.gap_mmi),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(BuildError::InvalidParams(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.gap_mmi >= self.width_mmi {
            return Err(BuildError::InvalidParams(format!(
                "gap_mmi ({}) must be smaller than width_mmi ({})",
                self.gap_mmi, self.width_mmi
            )));
        }
        Ok(())
    }
}

/// Builds one MMI cell per design point, starting from a set of base parameters.
#[derive(Debug, Default, Clone)]
pub struct MmiBuilder {
    base: MmiParams,
}

impl MmiBuilder {
    pub fn new(base: MmiParams) -> Self {
        Self { base }
    }

    #[inline]
    pub fn base(&self) -> &MmiParams {
        &self.base
    }
}

impl LayoutBuilder for MmiBuilder {
    type Output = Cell;

    fn build(&self, point: &DesignPoint) -> Result<Cell, BuildError> {
        let params = self.base.with_point(point)?;
        layout::draw_mmi_2x2(&params)
    }

    fn check_axis(&self, name: &str) -> Result<(), ConfigError> {
        if MmiParams::SWEEPABLE.contains(&name) {
            Ok(())
        } else {
            Err(ConfigError::UnknownParameter {
                axis: name.to_string(),
                expected: MmiParams::SWEEPABLE.join(", "),
            })
        }
    }
}
