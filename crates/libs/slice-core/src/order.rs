//! Path-ordering driver (§4.E): after the fill planner finishes, rotate each
//! slice's fill-class extrude bins into nearest-first contour order, carrying
//! a single pen position across the whole slice list.
//!
//! Grounded on the original's top-level driver loop in `e3d.c`, which calls
//! `poly_order` on every bin after `fill_extrude` and threads the pen
//! position between slices rather than resetting it each layer.

use slice_geometry::Dim;

use crate::model::{ExtrudeKind, Slice};

/// Reorder every fill-class extrude bin (`Fill`, `Flying`; `Perimeter` is
/// already ordered by [`crate::fill::perimeter`], `Reserved` is never
/// populated) of every slice in place, advancing a single pen position
/// `(x, y)` across the whole print.
pub fn order(slices: &mut [Slice]) {
    let mut x = Dim::ZERO;
    let mut y = Dim::ZERO;
    for slice in slices {
        for kind in [ExtrudeKind::Fill, ExtrudeKind::Flying] {
            slice.extrude_mut(kind).order(&mut x, &mut y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_geometry::Polygon;

    fn square_at(x0: f64, y0: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [
            (x0, y0),
            (x0, y0 + 10.0),
            (x0 + 10.0, y0 + 10.0),
            (x0 + 10.0, y0),
        ] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn pen_position_carries_across_slices() {
        let mut a = Slice::new(Dim::ZERO);
        *a.extrude_mut(ExtrudeKind::Fill) = square_at(0.0, 0.0);
        let mut b = Slice::new(Dim::from_real(0.2));
        *b.extrude_mut(ExtrudeKind::Fill) = square_at(100.0, 100.0);
        let mut slices = vec![a, b];
        order(&mut slices);
        // The second slice's chosen start vertex should be the one nearest
        // to wherever the first slice's single contour ended, not (0, 0).
        let first_end = slices[0].extrude_ref(ExtrudeKind::Fill).contours[0]
            .vertices
            .last()
            .copied()
            .unwrap();
        let second_start = slices[1].extrude_ref(ExtrudeKind::Fill).contours[0].vertices[0];
        let d = |a: (f64, f64), b: (f64, f64)| {
            let dx = a.0 - b.0;
            let dy = a.1 - b.1;
            dx * dx + dy * dy
        };
        let chosen = (second_start.x.to_real(), second_start.y.to_real());
        let pen = (first_end.x.to_real(), first_end.y.to_real());
        for v in &slices[1].extrude_ref(ExtrudeKind::Fill).contours[0].vertices {
            let cand = (v.x.to_real(), v.y.to_real());
            assert!(d(pen, chosen) <= d(pen, cand) + 1e-9);
        }
    }
}
