//! Crosshatch zig-zag raster synthesis (§4.D.3), grounded on `fill_extrude`
//! in `e3d-fill.c`.
//!
//! The original walks a band of parallelogram "strips" across a region,
//! clips each against the region boundary, and keeps a tagged subsegment of
//! what survives as the actual extrusion stroke. This port keeps that
//! strip-and-clip structure but recovers each clipped strip's centerline by
//! projecting its surviving vertices onto the strip's own direction vector
//! rather than by re-reading edge flags off the clip output — flag
//! provenance degrades across `tidy`'s collinearity merges, while the
//! min/max-projection spine is exact for any convex sliver the clip leaves
//! behind. See `DESIGN.md`.

use slice_geometry::{clip, inset, Contour, Dim, Dir, Op, Polygon, Vertex};

use crate::model::{ExtrudeKind, Slice};

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Flag tag for a strip's long rails (parallel to the raster direction).
const FLAG_SIDE: i32 = 1;
/// Flag tag for a strip's short end caps.
const FLAG_TOP: i32 = 2;

/// Build the fill-class extrude contours for one slice: zig-zag rasters for
/// `solid` (density 1, flow 1) and `infill` (density `density`, flow `flow`)
/// into `extrude[Fill]`, and an outside-in inset spiral for `flying` into
/// `extrude[Flying]`.
///
/// `layer` is the slice's bottom-up index; it alternates the raster angle
/// between layers the way the original varies `dir` per call.
pub fn fill_extrude(slice: &mut Slice, w: Dim, density: f64, flow: f64, layer: i64) {
    let mut strokes = Vec::new();
    zigzag_region(&slice.solid, w, 1.0, 1.0, layer, &mut strokes);
    zigzag_region(&slice.infill, w, density, flow, layer, &mut strokes);
    let strokes = join_open_contours(strokes);
    let mut fill = Polygon::new();
    fill.contours = strokes;
    *slice.extrude_mut(ExtrudeKind::Fill) = fill;

    *slice.extrude_mut(ExtrudeKind::Flying) = flying_spiral(&slice.flying, w);
}

/// Outside-in inset spiral: start at `inset(flying, w/2)` and keep shrinking
/// by `w` until the ring collapses, appending each ring as a closed extrude
/// contour — a raster shape suited to overhangs, where a straight zig-zag
/// would span unsupported air on every pass.
fn flying_spiral(flying: &Polygon, w: Dim) -> Polygon {
    let mut rings = Vec::new();
    let mut ring = inset(flying, w / 2);
    while !ring.is_empty() {
        rings.extend(ring.contours.clone());
        ring = inset(&ring, w);
    }
    let mut out = Polygon::new();
    out.contours = rings;
    out
}

/// Raster `region` with a crosshatch of diagonal strips, appending the
/// resulting open contours to `out`. `density` in `(0, 1]`; `1.0` is solid,
/// anything less is sparse and runs two half-phase passes whose half-teeth
/// reassemble into a continuous zig-zag once [`join_open_contours`] runs.
fn zigzag_region(region: &Polygon, w: Dim, density: f64, flow: f64, layer: i64, out: &mut Vec<Contour>) {
    let q = inset(region, w / 2);
    let Some((minx, miny, maxx, maxy)) = q.bbox() else {
        return;
    };
    let d = w.to_real() * SQRT_2;
    let sparse = density < 1.0 - 1e-9;
    let dy = if sparse {
        2.0 * d / density * flow
    } else {
        2.0 * d
    };
    if dy <= 0.0 {
        return;
    }

    let parity = (layer & 1) != 0;
    let y0 = miny.to_real() - (maxx.to_real() - minx.to_real());
    let y1 = maxy.to_real() + dy;

    let passes: &[f64] = if sparse { &[0.0, 0.5] } else { &[0.0] };
    for (pass_idx, phase_frac) in passes.iter().enumerate() {
        let phase = phase_frac * dy;
        let mut y = y0 + phase;
        while y <= y1 {
            let strip = diagonal_strip(minx.to_real(), maxx.to_real(), y, d, parity);
            let clipped = clip(Op::Intersect(2), &[&strip, &q]);
            for contour in &clipped.contours {
                if let Some(stroke) = stroke_from_sliver(contour, parity, sparse, pass_idx) {
                    out.push(stroke);
                }
            }
            y += dy;
        }
    }
}

/// A parallelogram of perpendicular width `d` around the 45`°` line through
/// `(minx, y)` with slope `+1` (even layers) or `-1` (odd layers), long
/// enough along that diagonal to cover `[minx, maxx]` with margin.
fn diagonal_strip(minx: f64, maxx: f64, y: f64, d: f64, parity: bool) -> Polygon {
    let sign = if parity { -1.0 } else { 1.0 };
    let margin = (maxx - minx).abs() + d + 1.0;
    let dirv = (1.0 / SQRT_2, sign / SQRT_2);
    let normv = (-sign / SQRT_2, 1.0 / SQRT_2);
    let origin = (minx, y);
    let t0 = -margin;
    let t1 = (maxx - minx) + margin;
    let along = |t: f64| (origin.0 + dirv.0 * t, origin.1 + dirv.1 * t);
    let offset = |p: (f64, f64), s: f64| (p.0 + normv.0 * s, p.1 + normv.1 * s);

    let c1 = offset(along(t0), d / 2.0);
    let c2 = offset(along(t1), d / 2.0);
    let c3 = offset(along(t1), -d / 2.0);
    let c4 = offset(along(t0), -d / 2.0);

    let mut p = Polygon::new();
    p.start();
    p.add(Dim::from_real(c1.0), Dim::from_real(c1.1), FLAG_SIDE);
    p.add(Dim::from_real(c2.0), Dim::from_real(c2.1), FLAG_TOP);
    p.add(Dim::from_real(c3.0), Dim::from_real(c3.1), FLAG_SIDE);
    p.add(Dim::from_real(c4.0), Dim::from_real(c4.1), FLAG_TOP);
    p
}

/// Recover the centerline of a clipped strip sliver by projecting its
/// vertices onto the strip's own direction vector and averaging whichever
/// vertices sit at the projection extremes. For sparse fill, keep only the
/// half nearest the pass's phase (the "top" or "bottom" half-tee); the other
/// half comes from the companion pass and the two are reunited by
/// [`join_open_contours`].
fn stroke_from_sliver(contour: &Contour, parity: bool, sparse: bool, pass_idx: usize) -> Option<Contour> {
    if contour.len() < 3 {
        return None;
    }
    let sign = if parity { -1.0 } else { 1.0 };
    let dirv = (1.0 / SQRT_2, sign / SQRT_2);
    let project = |v: &Vertex| v.x.to_real() * dirv.0 + v.y.to_real() * dirv.1;

    let mut tmin = f64::INFINITY;
    let mut tmax = f64::NEG_INFINITY;
    for v in &contour.vertices {
        let t = project(v);
        tmin = tmin.min(t);
        tmax = tmax.max(t);
    }
    if !(tmax > tmin) {
        return None;
    }
    let avg_at = |target: f64| -> Vertex {
        let tol = (tmax - tmin) * 1e-6 + 1e-9;
        let mut sx = 0.0;
        let mut sy = 0.0;
        let mut n = 0.0;
        for v in &contour.vertices {
            if (project(v) - target).abs() <= tol {
                sx += v.x.to_real();
                sy += v.y.to_real();
                n += 1.0;
            }
        }
        if n == 0.0 {
            // Fall back to the nearest single vertex.
            let nearest = contour
                .vertices
                .iter()
                .min_by(|a, b| (project(a) - target).abs().total_cmp(&(project(b) - target).abs()))
                .unwrap();
            return Vertex::new(nearest.x, nearest.y, 0);
        }
        Vertex::new(Dim::from_real(sx / n), Dim::from_real(sy / n), 0)
    };

    let lo = avg_at(tmin);
    let hi = avg_at(tmax);
    let (from, to) = if sparse {
        let mid_t = (tmin + tmax) / 2.0;
        let mid = avg_at(mid_t);
        if pass_idx == 0 {
            (mid, hi)
        } else {
            (lo, mid)
        }
    } else {
        (lo, hi)
    };
    if from == to {
        return None;
    }
    Some(Contour {
        vertices: vec![from, to],
        dir: Dir::Open,
    })
}

/// Repeatedly join pairs of open contours whose free endpoints coincide
/// (the head of one matches the tail of another) until a full pass makes no
/// further join, turning the half-teeth left over from sparse fill's two
/// passes back into continuous zig-zag strokes.
fn join_open_contours(mut contours: Vec<Contour>) -> Vec<Contour> {
    loop {
        let mut joined_any = false;
        let mut i = 0;
        'outer: while i < contours.len() {
            let tail = *contours[i].vertices.last().unwrap();
            for j in 0..contours.len() {
                if i == j {
                    continue;
                }
                if contours[j].vertices[0] == tail {
                    let mut extra = contours.remove(j).vertices;
                    extra.remove(0);
                    contours[i].vertices.extend(extra);
                    joined_any = true;
                    continue 'outer;
                }
            }
            i += 1;
        }
        if !joined_any {
            break;
        }
    }
    contours
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(x0, y0), (x0, y1), (x1, y1), (x1, y0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn solid_fill_produces_open_strokes() {
        let mut s = Slice::new(Dim::ZERO);
        s.solid = square(0.0, 0.0, 10.0, 10.0);
        s.infill = Polygon::new();
        s.flying = Polygon::new();
        fill_extrude(&mut s, Dim::from_real(0.4), 1.0, 1.0, 0);
        let fill = s.extrude_ref(ExtrudeKind::Fill);
        assert!(!fill.contours.is_empty());
        for c in &fill.contours {
            assert_eq!(c.dir, Dir::Open);
            assert!(c.len() >= 2);
        }
    }

    #[test]
    fn sparse_infill_also_produces_strokes() {
        let mut s = Slice::new(Dim::ZERO);
        s.solid = Polygon::new();
        s.infill = square(0.0, 0.0, 20.0, 20.0);
        s.flying = Polygon::new();
        fill_extrude(&mut s, Dim::from_real(0.4), 0.2, 1.0, 1);
        let fill = s.extrude_ref(ExtrudeKind::Fill);
        assert!(!fill.contours.is_empty());
    }

    #[test]
    fn empty_regions_produce_no_strokes() {
        let mut s = Slice::new(Dim::ZERO);
        fill_extrude(&mut s, Dim::from_real(0.4), 0.2, 1.0, 0);
        assert!(s.extrude_ref(ExtrudeKind::Fill).is_empty());
        assert!(s.extrude_ref(ExtrudeKind::Flying).is_empty());
    }

    #[test]
    fn flying_spiral_nests_inward() {
        let mut s = Slice::new(Dim::ZERO);
        s.flying = square(0.0, 0.0, 10.0, 10.0);
        fill_extrude(&mut s, Dim::from_real(0.4), 1.0, 1.0, 0);
        let flying = s.extrude_ref(ExtrudeKind::Flying);
        assert!(flying.contours.len() >= 2);
    }
}
