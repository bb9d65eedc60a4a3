use log::trace;

use super::MmiParams;
use crate::error::BuildError;
use crate::layout::{Cell, Point, Polygon, Port};

fn dim_tag(v: f64) -> String {
    format!("{v:.3}").replace('.', "p").replace('-', "m")
}

/// Cell name encoding every geometric parameter.
pub fn cell_name(params: &MmiParams) -> String {
    format!(
        "MMI_2x2_W{}_L{}_G{}_T{}_I{}_O{}",
        dim_tag(params.width_mmi),
        dim_tag(params.length_mmi),
        dim_tag(params.gap_mmi),
        dim_tag(params.taper_length),
        dim_tag(params.input_width),
        dim_tag(params.output_width),
    )
}

/// Draws a 2x2 MMI: two input tapers, the multimode rectangle and two output
/// tapers, symmetric about y = 0, with the inputs starting at x = 0.
///
/// Ports `in1`/`out1` sit at y = -pitch/2 and `in2`/`out2` at y = +pitch/2.
pub fn draw_mmi_2x2(params: &MmiParams) -> Result<Cell, BuildError> {
    params.validate()?;

    let &MmiParams {
        width_mmi,
        length_mmi,
        input_width,
        output_width,
        taper_length,
        layer,
        ..
    } = params;
    let taper_width = params.taper_width();
    let offsets = [-params.pitch() / 2.0, params.pitch() / 2.0];
    let x_mmi_end = taper_length + length_mmi;
    let x_out = params.total_length();

    let mut cell = Cell::new(cell_name(params));
    trace!("drawing {}", cell.name());

    for y in offsets {
        cell.add_polygon(Polygon::taper(
            layer,
            Point::new(0.0, y),
            taper_length,
            input_width,
            taper_width,
        ));
    }

    cell.add_polygon(Polygon::rect(
        layer,
        (taper_length, -width_mmi / 2.0),
        (x_mmi_end, width_mmi / 2.0),
    ));

    for y in offsets {
        cell.add_polygon(Polygon::taper(
            layer,
            Point::new(x_mmi_end, y),
            taper_length,
            taper_width,
            output_width,
        ));
    }

    for (i, y) in offsets.into_iter().enumerate() {
        cell.add_port(Port {
            name: format!("in{}", i + 1),
            center: Point::new(0.0, y),
            width: input_width,
            orientation: 180.0,
            layer,
        })?;
        cell.add_port(Port {
            name: format!("out{}", i + 1),
            center: Point::new(x_out, y),
            width: output_width,
            orientation: 0.0,
            layer,
        })?;
    }

    Ok(cell)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use gds21::{GdsElement, GdsLibrary};

    use super::*;
    use crate::layout::Layout;

    #[test]
    fn test_mmi_geometry() {
        let params = MmiParams::default();
        let cell = draw_mmi_2x2(&params).unwrap();

        assert_eq!(cell.polygons().len(), 5);
        assert_eq!(cell.ports().len(), 4);

        let bbox = cell.bbox().unwrap();
        assert_relative_eq!(bbox.width(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.height(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.p0.x, 0.0, epsilon = 1e-9);

        let in1 = cell.port("in1").unwrap();
        assert_relative_eq!(in1.center.y, -0.8, epsilon = 1e-9);
        assert_relative_eq!(in1.orientation, 180.0, epsilon = 1e-9);
        let out2 = cell.port("out2").unwrap();
        assert_relative_eq!(out2.center.x, 50.0, epsilon = 1e-9);
        assert_relative_eq!(out2.center.y, 0.8, epsilon = 1e-9);
        assert_relative_eq!(out2.width, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_tapers_meet_mmi_edges() {
        let params = MmiParams::builder()
            .width_mmi(4.0)
            .length_mmi(20.0)
            .build()
            .unwrap();
        let cell = draw_mmi_2x2(&params).unwrap();

        // The two wide taper ends together with the gap span the MMI width.
        let lower = cell.polygons()[0].bbox().unwrap();
        let upper = cell.polygons()[1].bbox().unwrap();
        assert_relative_eq!(lower.p0.y, -2.0, epsilon = 1e-9);
        assert_relative_eq!(upper.p1.y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(upper.p0.y - lower.p1.y, params.gap_mmi, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = MmiParams {
            gap_mmi: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            draw_mmi_2x2(&params),
            Err(BuildError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_cell_names_differ() {
        let a = MmiParams::default();
        let b = MmiParams {
            width_mmi: 3.5,
            ..a
        };
        assert_ne!(cell_name(&a), cell_name(&b));
        assert_eq!(
            cell_name(&a),
            "MMI_2x2_W3p000_L30p000_G0p200_T10p000_I0p500_O0p500"
        );
    }

    #[test]
    fn test_write_gds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mmi.gds");
        let cell = draw_mmi_2x2(&MmiParams::default()).unwrap();
        cell.write_gds(&path).unwrap();

        let lib = GdsLibrary::load(&path).unwrap();
        assert_eq!(lib.structs.len(), 1);
        let elems = &lib.structs[0].elems;
        let boundaries = elems
            .iter()
            .filter(|e| matches!(e, GdsElement::GdsBoundary(_)))
            .count();
        let labels = elems
            .iter()
            .filter(|e| matches!(e, GdsElement::GdsTextElem(_)))
            .count();
        assert_eq!(boundaries, 5);
        assert_eq!(labels, 4);
    }

    #[test]
    fn test_oversized_mmi_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mmi.gds");
        let params = MmiParams {
            length_mmi: 3.0e6,
            ..Default::default()
        };
        let cell = draw_mmi_2x2(&params).unwrap();
        assert!(matches!(
            cell.write_gds(&path),
            Err(BuildError::CoordinateOutOfRange { .. })
        ));
        assert!(!path.exists());
    }
}
