//! First-layer anchor skirt (§4.D.4), grounded on `fill_anchor` in
//! `e3d-fill.c`.
//!
//! Every ring here is, like `outline`/`fill`/`solid`, a filled silhouette
//! polygon rather than a pre-built annulus — its *contour* is what the
//! G-code emitter later traces as a single perimeter-width loop, the same
//! convention `perimeter::perimeter` uses for the part's own loops. The
//! "radial barbs" are small diamonds straddling each ring's boundary at
//! regular arc-length intervals; subtracting their union out of the ring
//! bites a scalloped notch out of the contour at each sample, and what
//! survives *between* consecutive notches is the barb: a row of comb teeth
//! along the ring that key it to the part. See `DESIGN.md`.

use slice_geometry::{clip, inset, subtract, Dim, Op, Polygon};

use crate::model::Stl;

/// Build the anchor skirt for `stl`'s first slice: `loops` nested rings at
/// pitch `w`, the innermost barbed onto the part every `step` units at
/// perpendicular offset `offset`. No-op if the mesh produced no slices.
pub fn anchor(stl: &mut Stl, loops: u32, w: Dim, offset: Dim, step: Dim) {
    if loops == 0 || stl.slices.is_empty() {
        return;
    }
    let outline0 = stl.slices[0].outline.clone();
    let inner = inset(&outline0, w / 2);
    let ol = outset(&inner, w + offset);
    if ol.is_empty() {
        return;
    }

    let safety_ring = stl
        .slices
        .get(1)
        .map(|s1| outset(&inset(&s1.outline, w / 2), w));

    let barbs = build_barbs(&ol, w, offset, step);
    let mut join = subtract(&ol, &barbs);
    if let Some(safety) = &safety_ring {
        join = clip(Op::Union, &[&join, safety]);
    }
    stl.anchor_join = join;

    let mut ring = ol.clone();
    let mut rings = Vec::new();
    for _ in 1..loops {
        ring = outset(&ring, w);
        if let Some(safety) = &safety_ring {
            ring = clip(Op::Union, &[&ring, safety]);
        }
        ring.tidy(w / 8);
        if ring.is_empty() {
            break;
        }
        rings.push(ring.clone());
    }

    let mut anchor_poly = Polygon::new();
    for r in rings.iter().rev() {
        anchor_poly.contours.extend(r.contours.clone());
    }
    stl.anchor = anchor_poly;

    let outermost = rings.last().unwrap_or(&ol);
    stl.border = clip(Op::Union, &[&stl.border, outermost]);

    tracing::debug!(loops, rings = rings.len(), "anchor skirt built");
}

fn outset(p: &Polygon, d: Dim) -> Polygon {
    inset(p, Dim::ZERO - d)
}

/// Diamonds (4-vertex squares of side `2*offset`, rotated 45° into the
/// contour's local tangent/normal frame) every `step` arc-length units
/// around every contour of `ring`, centered at perpendicular distance
/// `offset` from the original outline — i.e. pulled back from `ring`'s own
/// boundary by `w/2`, since `ring` sits `w/2 + offset` outside the outline.
fn build_barbs(ring: &Polygon, w: Dim, offset: Dim, step: Dim) -> Polygon {
    let step_len = step.to_real().max(1e-6);
    let pullback = w.to_real() / 2.0;
    let half_diag = offset.to_real() * std::f64::consts::SQRT_2;
    let mut barbs = Polygon::new();

    for contour in &ring.contours {
        let pts: Vec<(f64, f64)> = contour
            .vertices
            .iter()
            .map(|v| (v.x.to_real(), v.y.to_real()))
            .collect();
        let n = pts.len();
        if n < 3 {
            continue;
        }
        let seg_len = |i: usize| -> f64 {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
        };
        let total: f64 = (0..n).map(seg_len).sum();
        if total <= 0.0 {
            continue;
        }

        let mut target = 0.0_f64;
        let mut i = 0usize;
        let mut acc = 0.0_f64;
        while target < total && i < n {
            while i < n && acc + seg_len(i) < target {
                acc += seg_len(i);
                i += 1;
            }
            if i >= n {
                break;
            }
            let a = pts[i];
            let b = pts[(i + 1) % n];
            let sl = seg_len(i).max(1e-12);
            let t = ((target - acc) / sl).clamp(0.0, 1.0);
            let (px, py) = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            let (dx, dy) = (b.0 - a.0, b.1 - a.1);
            let len = (dx * dx + dy * dy).sqrt().max(1e-12);
            let (tx, ty) = (dx / len, dy / len);
            let (nx, ny) = (-ty, tx);
            let (cx, cy) = (px - nx * pullback, py - ny * pullback);

            barbs.start();
            for (vx, vy) in [
                (cx + tx * half_diag, cy + ty * half_diag),
                (cx + nx * half_diag, cy + ny * half_diag),
                (cx - tx * half_diag, cy - ty * half_diag),
                (cx - nx * half_diag, cy - ny * half_diag),
            ] {
                barbs.add(Dim::from_real(vx), Dim::from_real(vy), 0);
            }
            target += step_len;
        }
    }
    barbs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Slice;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(x0, y0), (x0, y1), (x1, y1), (x1, y0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn anchor_builds_join_and_rings() {
        let mut stl = Stl::new("test".into());
        let mut s0 = Slice::new(Dim::ZERO);
        s0.outline = square(0.0, 0.0, 10.0, 10.0);
        stl.slices.push(s0);

        anchor(
            &mut stl,
            3,
            Dim::from_real(0.4),
            Dim::from_real(1.0),
            Dim::from_real(4.0),
        );

        assert!(!stl.anchor_join.is_empty());
        assert!(!stl.anchor.is_empty());
        assert!(!stl.border.is_empty());
    }

    #[test]
    fn single_loop_has_no_extra_rings_but_has_join() {
        let mut stl = Stl::new("test".into());
        let mut s0 = Slice::new(Dim::ZERO);
        s0.outline = square(0.0, 0.0, 10.0, 10.0);
        stl.slices.push(s0);

        anchor(
            &mut stl,
            1,
            Dim::from_real(0.4),
            Dim::from_real(1.0),
            Dim::from_real(4.0),
        );

        assert!(stl.anchor.is_empty());
        assert!(!stl.anchor_join.is_empty());
    }

    #[test]
    fn no_slices_is_a_no_op() {
        let mut stl = Stl::new("empty".into());
        anchor(
            &mut stl,
            2,
            Dim::from_real(0.4),
            Dim::from_real(1.0),
            Dim::from_real(4.0),
        );
        assert!(stl.anchor_join.is_empty());
    }
}
