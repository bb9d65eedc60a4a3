//! A minimal flat layout model.
//!
//! Cells hold polygons and optical ports in micrometres. Conversion to GDS
//! database units happens only at export time (see [`gds`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::doe::DesignPoint;
use crate::error::{BuildError, ConfigError};

pub mod gds;

/// Something that can be serialized to a GDS file.
pub trait Layout {
    fn write_gds(&self, path: &Path) -> Result<(), BuildError>;
}

/// Produces one layout per design point.
///
/// Closures of the form `Fn(&DesignPoint) -> Result<L, BuildError>` implement
/// this trait and accept every axis.
pub trait LayoutBuilder {
    type Output: Layout;

    fn build(&self, point: &DesignPoint) -> Result<Self::Output, BuildError>;

    /// Rejects axes this builder does not know how to apply.
    fn check_axis(&self, _name: &str) -> Result<(), ConfigError> {
        Ok(())
    }
}

impl<F, L> LayoutBuilder for F
where
    F: Fn(&DesignPoint) -> Result<L, BuildError>,
    L: Layout,
{
    type Output = L;

    fn build(&self, point: &DesignPoint) -> Result<L, BuildError> {
        self(point)
    }
}

/// A GDS layer/datatype pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "(i16, i16)", into = "(i16, i16)")]
pub struct Layer {
    pub layer: i16,
    pub datatype: i16,
}

impl Layer {
    pub const fn new(layer: i16, datatype: i16) -> Self {
        Self { layer, datatype }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl From<(i16, i16)> for Layer {
    fn from((layer, datatype): (i16, i16)) -> Self {
        Self::new(layer, datatype)
    }
}

impl From<Layer> for (i16, i16) {
    fn from(value: Layer) -> Self {
        (value.layer, value.datatype)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A simple polygon. The point list is open; the closing edge is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub layer: Layer,
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(layer: Layer, points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        Self {
            layer,
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    /// An axis-aligned rectangle spanning `p0` to `p1`.
    pub fn rect(layer: Layer, p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let (p0, p1) = (p0.into(), p1.into());
        Self::new(
            layer,
            [
                (p0.x, p0.y),
                (p1.x, p0.y),
                (p1.x, p1.y),
                (p0.x, p1.y),
            ],
        )
    }

    /// A horizontal taper starting at `start` (centre of the narrow/wide end)
    /// and running `length` in +x, going from `width1` to `width2`.
    pub fn taper(layer: Layer, start: Point, length: f64, width1: f64, width2: f64) -> Self {
        let x1 = start.x + length;
        Self::new(
            layer,
            [
                (start.x, start.y - width1 / 2.0),
                (x1, start.y - width2 / 2.0),
                (x1, start.y + width2 / 2.0),
                (start.x, start.y + width1 / 2.0),
            ],
        )
    }

    pub fn bbox(&self) -> Option<Rect> {
        Rect::bounding(self.points.iter().copied())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub p0: Point,
    pub p1: Point,
}

impl Rect {
    fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Rect>, p| {
            Some(match acc {
                None => Rect { p0: p, p1: p },
                Some(r) => Rect {
                    p0: Point::new(r.p0.x.min(p.x), r.p0.y.min(p.y)),
                    p1: Point::new(r.p1.x.max(p.x), r.p1.y.max(p.y)),
                },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }

    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }
}

/// An optical port. `orientation` is the outward direction in degrees
/// (0 = east, 180 = west).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub name: String,
    pub center: Point,
    pub width: f64,
    pub orientation: f64,
    pub layer: Layer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    name: String,
    polygons: Vec<Polygon>,
    ports: Vec<Port>,
}

impl Cell {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            polygons: Vec::new(),
            ports: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    #[inline]
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn add_polygon(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    pub fn add_port(&mut self, port: Port) -> Result<(), BuildError> {
        if self.port(&port.name).is_some() {
            return Err(BuildError::InvalidParams(format!(
                "cell `{}` already has a port named `{}`",
                self.name, port.name
            )));
        }
        self.ports.push(port);
        Ok(())
    }

    pub fn bbox(&self) -> Option<Rect> {
        Rect::bounding(self.polygons.iter().flat_map(|p| p.points.iter().copied()))
    }
}

impl Layout for Cell {
    fn write_gds(&self, path: &Path) -> Result<(), BuildError> {
        gds::save(self, path)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_taper_bbox() {
        let taper = Polygon::taper(Layer::default(), Point::new(0.0, 1.0), 10.0, 0.5, 1.5);
        let bbox = taper.bbox().unwrap();
        assert_relative_eq!(bbox.width(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.height(), 1.5, epsilon = 1e-9);
        assert_relative_eq!(bbox.p0.y, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let mut cell = Cell::new("dup");
        let port = Port {
            name: "o1".to_string(),
            center: Point::default(),
            width: 0.5,
            orientation: 180.0,
            layer: Layer::default(),
        };
        cell.add_port(port.clone()).unwrap();
        assert!(matches!(
            cell.add_port(port),
            Err(BuildError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_layer_from_tuple() {
        #[derive(Deserialize)]
        struct Wrapper {
            layer: Layer,
        }

        let wrapper: Wrapper = toml::from_str("layer = [3, 2]").unwrap();
        assert_eq!(wrapper.layer, Layer::new(3, 2));
    }
}
