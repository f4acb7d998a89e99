//! Perimeter loop construction (§4.D.1), grounded on `fill_perimeter` in
//! `e3d-fill.c`.

use slice_geometry::{inset, Contour, Dim, Polygon};

use crate::model::{ExtrudeKind, Slice};

/// Build `loops` nested perimeter rings inward from `slice.outline`, leaving
/// the innermost polygon as `slice.fill` and appending the perimeter
/// extrude contours innermost-to-outermost (matching the source's reverse
/// walk over its loop array).
pub fn perimeter(slice: &mut Slice, w: Dim, loops: u32, fast: bool) {
    if loops == 0 {
        slice.fill = slice.outline.clone();
        return;
    }

    let mut q = inset(&slice.outline, w / 2);
    let mut rings: Vec<Polygon> = Vec::with_capacity(loops as usize);
    for l in 0..loops {
        rings.push(q.clone());
        let step = if l + 1 < loops { w } else { w / 2 };
        q = inset(&q, step);
        if fast {
            q.tidy(w / 10);
        }
    }
    slice.fill = q;

    let mut accumulated: Vec<Contour> = Vec::new();
    for ring in rings.into_iter().rev() {
        for contour in ring.contours {
            append_nearest(&mut accumulated, contour);
        }
    }
    let mut result = Polygon::new();
    result.contours = accumulated;
    *slice.extrude_mut(ExtrudeKind::Perimeter) = result;
}

/// Insert `contour` right after whichever already-accumulated contour's
/// start vertex is nearest to its own — outer and inner rings of the same
/// feature end up adjacent, keeping travel moves between perimeter loops
/// short.
fn append_nearest(accumulated: &mut Vec<Contour>, contour: Contour) {
    if contour.is_empty() {
        return;
    }
    if accumulated.is_empty() {
        accumulated.push(contour);
        return;
    }
    let start = contour.vertices[0];
    let mut best_i = 0usize;
    let mut best_d = f64::INFINITY;
    for (i, c) in accumulated.iter().enumerate() {
        if c.is_empty() {
            continue;
        }
        let d = c.vertices[0].dist2(&start);
        if d < best_d {
            best_d = d;
            best_i = i;
        }
    }
    accumulated.insert(best_i + 1, contour);
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_geometry::Dir;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(x0, y0), (x0, y1), (x1, y1), (x1, y0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn perimeter_of_square_has_two_rings_and_a_fill() {
        let mut s = Slice::new(Dim::ZERO);
        s.outline = square(0.0, 0.0, 10.0, 10.0);
        perimeter(&mut s, Dim::from_real(0.5), 2, false);

        let extrude = s.extrude_ref(ExtrudeKind::Perimeter);
        assert_eq!(extrude.contours.len(), 2);
        for c in &extrude.contours {
            assert_eq!(c.dir, Dir::Cw);
        }
        let bboxes: Vec<f64> = extrude
            .contours
            .iter()
            .map(|c| c.bbox().unwrap().0.to_real())
            .collect();
        assert!(bboxes.contains(&0.25));
        assert!(bboxes.contains(&0.75));

        let fill_bbox = s.fill.contours[0].bbox().unwrap();
        assert!((fill_bbox.0.to_real() - 1.0).abs() < 1e-6);
        assert!((fill_bbox.2.to_real() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn zero_loops_uses_outline_as_fill() {
        let mut s = Slice::new(Dim::ZERO);
        s.outline = square(0.0, 0.0, 10.0, 10.0);
        perimeter(&mut s, Dim::from_real(0.5), 0, false);
        assert_eq!(s.fill.contours.len(), 1);
        assert!(s.extrude_ref(ExtrudeKind::Perimeter).is_empty());
    }
}
