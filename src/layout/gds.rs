use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use gds21::{
    GdsBoundary, GdsDateTimes, GdsElement, GdsLibrary, GdsPoint, GdsStruct, GdsTextElem,
};
use log::debug;

use super::{Cell, Point, Polygon, Port};
use crate::error::BuildError;

/// Database units per micrometre (1 nm grid, the `gds21` default units).
pub const DB_UNITS_PER_UM: f64 = 1_000.0;

/// Texttype used for port name labels.
pub const PORT_TEXTTYPE: i16 = 10;

pub const LIBRARY_NAME: &str = "mmigen";

/// Modification and access time written into every library and structure.
///
/// `gds21` stamps the current time by default; a fixed value keeps the bytes
/// of a file a function of the cell alone.
pub fn fixed_dates() -> GdsDateTimes {
    let t: NaiveDateTime = DateTime::<Utc>::UNIX_EPOCH.naive_utc();
    GdsDateTimes {
        modified: t,
        accessed: t,
    }
}

fn to_db(v: f64) -> Result<i32, BuildError> {
    let db = (v * DB_UNITS_PER_UM).round();
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&db) {
        return Err(BuildError::CoordinateOutOfRange { value: v });
    }
    Ok(db as i32)
}

#[inline]
fn gds_point(p: Point) -> Result<GdsPoint, BuildError> {
    Ok(GdsPoint::new(to_db(p.x)?, to_db(p.y)?))
}

fn boundary(polygon: &Polygon) -> Result<GdsElement, BuildError> {
    let mut xy = polygon
        .points
        .iter()
        .copied()
        .map(gds_point)
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(first) = xy.first().cloned() {
        xy.push(first);
    }
    Ok(GdsElement::GdsBoundary(GdsBoundary {
        layer: polygon.layer.layer,
        datatype: polygon.layer.datatype,
        xy,
        ..Default::default()
    }))
}

fn port_label(port: &Port) -> Result<GdsElement, BuildError> {
    Ok(GdsElement::GdsTextElem(GdsTextElem {
        string: port.name.clone(),
        layer: port.layer.layer,
        texttype: PORT_TEXTTYPE,
        xy: gds_point(port.center)?,
        ..Default::default()
    }))
}

/// Converts a cell into a single-structure GDS library.
pub fn to_library(cell: &Cell) -> Result<GdsLibrary, BuildError> {
    let mut s = GdsStruct::new(cell.name());
    s.dates = fixed_dates();
    for polygon in cell.polygons() {
        s.elems.push(boundary(polygon)?);
    }
    for port in cell.ports() {
        s.elems.push(port_label(port)?);
    }

    let mut lib = GdsLibrary::new(LIBRARY_NAME);
    lib.dates = fixed_dates();
    lib.structs.push(s);
    Ok(lib)
}

pub fn save(cell: &Cell, path: &Path) -> Result<(), BuildError> {
    debug!("exporting cell `{}` to {:?}", cell.name(), path);
    to_library(cell)?
        .save(path)
        .map_err(|e| BuildError::Gds {
            path: path.to_path_buf(),
            message: format!("{e:?}"),
        })
}
