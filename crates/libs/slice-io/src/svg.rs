//! SVG layer visualizer (§4.I), grounded on `svg_out` in `e3d-svg.c`: one
//! Inkscape layer `<g>` per slice (all but the first hidden by default),
//! color-coded region fills and extrude-path strokes, and the anchor/border
//! overlay on the first layer only. The Y axis is flipped at output time —
//! everything upstream works in a Y-up frame, SVG is Y-down.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use slice_core::model::{ExtrudeKind, Stl, EXTRUDE_KINDS};
use slice_core::SliceError;
use slice_geometry::{Dim, Dir, Polygon};

pub fn write_svg(path: &Path, stl: &Stl, width: Dim) -> Result<(), SliceError> {
    let mut file = File::create(path)?;
    write_svg_to(&mut file, stl, width)?;
    Ok(())
}

pub fn write_svg_to<W: Write>(out: &mut W, stl: &Stl, width: Dim) -> io::Result<()> {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>")?;
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\" version=\"1.1\" width=\"{}\" height=\"{}\">",
        stl.bbox.max.x.format(3),
        stl.bbox.max.y.format(3),
    )?;

    let max_y = stl.bbox.max.y;
    for (i, slice) in stl.slices.iter().enumerate() {
        let hidden = if i > 0 { " style=\"display:none\"" } else { "" };
        writeln!(out, "<g inkscape:label=\"{}\" inkscape:groupmode=\"layer\"{}>", slice.z.format(3), hidden)?;

        outpath(out, &slice.outline, "fill:#ff8;stroke:none;fill-opacity:0.5", None, max_y)?;
        outpath(out, &slice.solid, "fill:#f88;stroke:none;fill-opacity:0.5", None, max_y)?;
        outpath(out, &slice.infill, "fill:#8ff;stroke:none;fill-opacity:0.5", None, max_y)?;
        outpath(out, &slice.flying, "fill:#f8f;stroke:none;fill-opacity:0.5", None, max_y)?;
        let fill_style = format!(
            "fill:none;stroke:black;stroke-width:{};stroke-linecap:round;stroke-linejoin:round;",
            (width / 10).format(3)
        );
        outpath(out, &slice.fill, &fill_style, None, max_y)?;

        for (e, kind) in EXTRUDE_KINDS.iter().enumerate() {
            let style = format!(
                "fill:none;stroke:#{:x}8f;stroke-width:{};stroke-linecap:round;stroke-linejoin:round;stroke-opacity:0.5",
                e * 4,
                (width * 9i64 / 10).format(3)
            );
            let poly = slice.extrude_ref(*kind);
            outpath(out, poly, &style, Some(Dir::Cw), max_y)?;
            outpath(out, poly, &style, Some(Dir::Ccw), max_y)?;
        }

        if i == 0 {
            let anchor_style = format!(
                "fill:none;stroke:#84f;stroke-width:{};stroke-linecap:round;stroke-linejoin:round;stroke-opacity:0.5",
                (width * 9i64 / 10).format(3)
            );
            outpath(out, &stl.anchor, &anchor_style, None, max_y)?;
            let join_style = format!(
                "fill:none;stroke:#8cf;stroke-width:{};stroke-linecap:round;stroke-linejoin:round;stroke-opacity:0.5",
                (width * 9i64 / 10).format(3)
            );
            outpath(out, &stl.anchor_join, &join_style, None, max_y)?;
            let border_style = format!(
                "fill:none;stroke:green;stroke-width:{};stroke-linecap:round;stroke-linejoin:round;",
                (width / 10).format(3)
            );
            outpath(out, &stl.border, &border_style, Some(Dir::Cw), max_y)?;
        }

        writeln!(out, "</g>")?;
    }

    writeln!(out, "</svg>")?;
    Ok(())
}

fn outpath<W: Write>(out: &mut W, poly: &Polygon, style: &str, only: Option<Dir>, max_y: Dim) -> io::Result<()> {
    if poly.is_empty() {
        return Ok(());
    }
    write!(out, "<path style=\"{style}\" d=\"")?;
    for contour in &poly.contours {
        if contour.is_empty() {
            continue;
        }
        if let Some(dir) = only {
            if contour.dir != dir {
                continue;
            }
        }
        let mut cmd = 'M';
        for v in &contour.vertices {
            write!(out, " {cmd}")?;
            cmd = 'L';
            write!(out, " {} {}", v.x.format(3), (max_y - v.y).format(3))?;
        }
        write!(out, " Z")?;
    }
    writeln!(out, "\"/>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_core::model::{BBox, Point3, Slice};

    fn square(side: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(0.0, 0.0), (0.0, side), (side, side), (side, 0.0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn emits_one_layer_group_per_slice() {
        let mut stl = Stl::new("part".into());
        stl.bbox = BBox {
            min: Point3::default(),
            max: Point3::new(Dim::from_real(10.0), Dim::from_real(10.0), Dim::from_real(0.4)),
        };
        for z in [0.2, 0.4] {
            let mut s = Slice::new(Dim::from_real(z));
            s.outline = square(10.0);
            stl.slices.push(s);
        }

        let mut buf = Vec::new();
        write_svg_to(&mut buf, &stl, Dim::from_real(0.4)).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.matches("inkscape:groupmode=\"layer\"").count(), 2);
        assert_eq!(text.matches("display:none").count(), 1);
        assert!(text.contains("</svg>"));
    }

    #[test]
    fn empty_polygon_emits_no_path() {
        let mut buf = Vec::new();
        outpath(&mut buf, &Polygon::new(), "fill:none", None, Dim::ZERO).unwrap();
        assert!(buf.is_empty());
    }
}
