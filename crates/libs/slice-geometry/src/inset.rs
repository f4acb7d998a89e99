//! Uniform-offset inset/outset, built on top of [`crate::clip`].
//!
//! Grounded on `poly_inset` in the original `poly.c`: rather than offsetting
//! each edge and stitching the result directly (which needs special-casing
//! for concave corners), every directed edge grows a "fat sausage" octagon
//! of half-width `|d|` and the sausages are unioned into a `border`. For an
//! inset that border is subtracted from the source and intersected back
//! with it; for an outset it's simply unioned with the source.

use crate::clip::{clip, Op};
use crate::dim::Dim;
use crate::polygon::Polygon;
use crate::vertex::Vertex;

/// `sqrt(3)/2`, matching the original's `866/1000` fixed-point octagon
/// corner constant.
const COS30: f64 = 0.866_025_403_784_438_6;

/// Shrink `poly` by `d` (grow it if `d` is negative), returning a new
/// polygon. `poly` is read-only.
pub fn inset(poly: &Polygon, d: Dim) -> Polygon {
    if poly.is_empty() {
        return Polygon::new();
    }
    let width = d.abs();
    let mut source = poly.clone();
    source.tidy(width / 20);
    if source.is_empty() {
        return Polygon::new();
    }

    let mut border = Polygon::new();
    for contour in &source.contours {
        let n = contour.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = contour.vertices[i];
            let b = contour.vertices[(i + 1) % n];
            add_sausage(&mut border, a, b, width);
        }
    }

    let mut result = if d < Dim::ZERO {
        clip(Op::Union, &[&border, &source])
    } else {
        let thick = clip(Op::Union, &[&border]);
        let diff = clip(Op::Difference(2), &[&thick, &source]);
        clip(Op::Intersect(2), &[&diff, &source])
    };
    result.tidy(width / 20);
    result
}

/// Append an octagonal capsule of half-width `width` around directed edge
/// `A -> B`, tagged with `A`'s flag (the source edge's flag, carried through
/// inset like every other boolean operation).
fn add_sausage(border: &mut Polygon, a: Vertex, b: Vertex, width: Dim) {
    let (ax, ay) = (a.x.to_real(), a.y.to_real());
    let (bx, by) = (b.x.to_real(), b.y.to_real());
    let w = width.to_real();
    let ex = bx - ax;
    let ey = by - ay;
    let len = (ex * ex + ey * ey).sqrt();
    if len == 0.0 {
        return;
    }
    let dx = w * ex / len;
    let dy = w * ey / len;
    let flag = a.flag;
    border.start();
    for (x, y) in [
        (bx - dy, by + dx),
        (bx - dy / 2.0 + dx * COS30, by + dx / 2.0 + dy * COS30),
        (bx + dy / 2.0 + dx * COS30, by - dx / 2.0 + dy * COS30),
        (bx + dy, by - dx),
        (ax + dy, ay - dx),
        (ax + dy / 2.0 - dx * COS30, ay - dx / 2.0 - dy * COS30),
        (ax - dy / 2.0 - dx * COS30, ay + dx / 2.0 - dy * COS30),
        (ax - dy, ay + dx),
    ] {
        border.add(Dim::from_real(x), Dim::from_real(y), flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Dir;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(x0, y0), (x0, y1), (x1, y1), (x1, y0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn s5_inset_square() {
        let sq = square(0.0, 0.0, 100.0, 100.0);
        let shrunk = inset(&sq, Dim::from_real(10.0));
        assert_eq!(shrunk.contours.len(), 1);
        assert_eq!(shrunk.contours[0].dir, Dir::Cw);
        let (minx, miny, maxx, maxy) = shrunk.contours[0].bbox().unwrap();
        assert!((minx.to_real() - 10.0).abs() < 1e-6);
        assert!((miny.to_real() - 10.0).abs() < 1e-6);
        assert!((maxx.to_real() - 90.0).abs() < 1e-6);
        assert!((maxy.to_real() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn s5_outset_square() {
        let sq = square(0.0, 0.0, 100.0, 100.0);
        let grown = inset(&sq, Dim::from_real(-10.0));
        assert_eq!(grown.contours.len(), 1);
        let (minx, miny, maxx, maxy) = grown.contours[0].bbox().unwrap();
        assert!((minx.to_real() - -10.0).abs() < 1e-6);
        assert!((miny.to_real() - -10.0).abs() < 1e-6);
        assert!((maxx.to_real() - 110.0).abs() < 1e-6);
        assert!((maxy.to_real() - 110.0).abs() < 1e-6);
    }

    #[test]
    fn inset_then_outset_stays_inside_original() {
        let sq = square(0.0, 0.0, 100.0, 100.0);
        let shrunk = inset(&sq, Dim::from_real(10.0));
        let roundtrip = inset(&shrunk, Dim::from_real(-10.0));
        assert!(!roundtrip.is_empty());
        let orig_area = sq.total_area().abs();
        let rt_area = roundtrip.total_area().abs();
        assert!(rt_area <= orig_area + 1.0);
    }
}
