use crate::contour::{Contour, Dir};
use crate::dim::Dim;
use crate::vertex::Vertex;

/// An unordered bag of contours, plus a build cursor used only while the
/// polygon is being populated by [`Polygon::start`]/[`Polygon::add`].
///
/// Invariant after any public operation returns: the cursor is `None`.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    pub contours: Vec<Contour>,
    pub(crate) cursor: Option<usize>,
}

impl Polygon {
    pub fn new() -> Polygon {
        Polygon {
            contours: Vec::new(),
            cursor: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Open a new contour, which becomes the head of the contour list and
    /// the target of subsequent [`Polygon::add`] calls.
    ///
    /// Closes off whatever contour the cursor was previously on (via
    /// [`Polygon::finish`]) so that every contour except the one currently
    /// being built always has its `dir` resolved — a caller that wants an
    /// explicitly open (`dir = Open`) contour sets that field itself after
    /// construction, as the zig-zag stitcher does.
    pub fn start(&mut self) {
        self.finish();
        self.contours.insert(0, Contour::new());
        self.cursor = Some(0);
    }

    /// Append a vertex to the current contour, auto-starting one if none is
    /// open.
    pub fn add(&mut self, x: Dim, y: Dim, flag: i32) {
        if self.cursor.is_none() {
            self.start();
        }
        let idx = self.cursor.unwrap();
        self.contours[idx].vertices.push(Vertex::new(x, y, flag));
    }

    /// Close off the build cursor, computing the just-built contour's `dir`
    /// from its vertex order.
    pub fn finish(&mut self) {
        if let Some(idx) = self.cursor.take() {
            if let Some(c) = self.contours.get_mut(idx) {
                c.dir = Dir::Cw;
                c.recompute_dir();
            }
        }
    }

    pub fn total_area(&self) -> f64 {
        self.contours.iter().map(|c| c.signed_area()).sum()
    }

    /// Bounding box across every contour, or `None` for an empty polygon.
    pub fn bbox(&self) -> Option<(Dim, Dim, Dim, Dim)> {
        self.contours.iter().filter_map(|c| c.bbox()).fold(None, |acc, (minx, miny, maxx, maxy)| {
            Some(match acc {
                None => (minx, miny, maxx, maxy),
                Some((amnx, amny, amxx, amxy)) => (
                    amnx.min(minx),
                    amny.min(miny),
                    amxx.max(maxx),
                    amxy.max(maxy),
                ),
            })
        })
    }

    /// Drop dead-end/redundant vertices and degenerate contours.
    ///
    /// Pass 1 removes a middle vertex `B` whenever `A-B-C` is collinear (or
    /// `B == C`). Pass 2, only when `tolerance > 0`, additionally removes
    /// `B` when its perpendicular offset from line `A-C` is under
    /// `tolerance`, accumulating the signed dropped offset so a long run of
    /// tiny same-sided deviations is not silently collapsed into a single
    /// large one.
    pub fn tidy(&mut self, tolerance: Dim) {
        self.finish();
        for contour in &mut self.contours {
            tidy_contour(contour, tolerance);
        }
        self.contours.retain(|c| c.len() >= 3);
        for c in &mut self.contours {
            c.recompute_dir();
        }
    }

    /// Reorder contours (after the first) so each is chosen by nearest
    /// start-vertex to the current pen position `(x, y)`; rotates the
    /// chosen contour so its closest vertex becomes its first, then
    /// advances `(x, y)` to its last vertex. Open contours consider only
    /// their first endpoint.
    pub fn order(&mut self, x: &mut Dim, y: &mut Dim) {
        if self.contours.is_empty() {
            return;
        }
        let mut remaining: Vec<Contour> = self.contours.drain(..).collect();
        let mut ordered = Vec::with_capacity(remaining.len());
        let mut pen = Vertex::new(*x, *y, 0);
        while !remaining.is_empty() {
            let mut best_i = 0usize;
            let mut best_j = 0usize;
            let mut best_d = f64::INFINITY;
            for (i, c) in remaining.iter().enumerate() {
                if c.is_empty() {
                    continue;
                }
                let limit = if c.is_open() { 1 } else { c.len() };
                for j in 0..limit {
                    let d = c.vertices[j].dist2(&pen);
                    if d < best_d {
                        best_d = d;
                        best_i = i;
                        best_j = j;
                    }
                }
            }
            let mut chosen = remaining.remove(best_i);
            if !chosen.is_open() {
                chosen.rotate_to(best_j);
            }
            pen = *chosen.vertices.last().unwrap();
            ordered.push(chosen);
        }
        self.contours = ordered;
        *x = pen.x;
        *y = pen.y;
    }
}

fn tidy_contour(contour: &mut Contour, tolerance: Dim) {
    if contour.is_open() {
        tidy_open(contour, tolerance);
        return;
    }
    dedupe_pass(contour);
    if tolerance > Dim::ZERO {
        tolerance_pass(contour, tolerance);
        dedupe_pass(contour);
    }
}

fn tidy_open(contour: &mut Contour, tolerance: Dim) {
    // Same collinearity/duplicate-vertex rules, but never wrap past the
    // endpoints: an open path's first and last vertices are load-bearing
    // (they're the free ends later stitching joins on).
    let tol = Dim::epsilon(max_abs_coord(&contour.vertices));
    loop {
        let v = &mut contour.vertices;
        if v.len() <= 2 {
            return;
        }
        let mut removed = false;
        let mut i = 1;
        while i + 1 < v.len() {
            if is_collinear_or_duplicate(v[i - 1], v[i], v[i + 1], tol) {
                v.remove(i);
                removed = true;
            } else {
                i += 1;
            }
        }
        let _ = tolerance;
        if !removed {
            return;
        }
    }
}

/// Repeatedly scan the (cyclic) vertex list removing collinear/duplicate
/// middles until a full pass makes no change.
fn dedupe_pass(contour: &mut Contour) {
    let tol = Dim::epsilon(max_abs_coord(&contour.vertices));
    loop {
        let v = &mut contour.vertices;
        if v.len() < 3 {
            return;
        }
        let n = v.len();
        let mut keep = Vec::with_capacity(n);
        let mut removed = false;
        for i in 0..n {
            let a = v[(i + n - 1) % n];
            let b = v[i];
            let c = v[(i + 1) % n];
            if is_collinear_or_duplicate(a, b, c, tol) {
                removed = true;
            } else {
                keep.push(b);
            }
        }
        *v = keep;
        if !removed || v.len() < 3 {
            return;
        }
    }
}

fn max_abs_coord(v: &[Vertex]) -> Dim {
    let m = v
        .iter()
        .map(|p| p.x.abs().to_real().max(p.y.abs().to_real()))
        .fold(0.0_f64, f64::max)
        .max(1.0);
    Dim::from_real(m)
}

fn is_collinear_or_duplicate(a: Vertex, b: Vertex, c: Vertex, tol: Dim) -> bool {
    if a.x == b.x && a.y == b.y {
        return true;
    }
    if b.x == c.x && b.y == c.y {
        return true;
    }
    match crate::geom::intersect_point(a, c, b) {
        None => true, // a == c: a degenerate two-point loop
        Some(hit) => hit.perp2 <= tol.to_real() * tol.to_real(),
    }
}

/// Perpendicular-offset simplification: drop `B` when its distance from
/// line `A-C` is below `tolerance`, accumulating the signed offset of
/// consecutive drops so a long shallow arc isn't collapsed to a single
/// chord (reset on direction change or any kept vertex).
fn tolerance_pass(contour: &mut Contour, tolerance: Dim) {
    let tol = tolerance.to_real();
    if contour.vertices.len() < 4 {
        return;
    }
    let mut acc = 0.0_f64;
    let mut acc_sign = 0i32;
    let mut i = 0usize;
    loop {
        let v = &mut contour.vertices;
        let n = v.len();
        if n < 3 || i >= n {
            return;
        }
        let a = v[(i + n - 1) % n];
        let b = v[i];
        let c = v[(i + 1) % n];
        let Some(hit) = crate::geom::intersect_point(a, c, b) else {
            i += 1;
            continue;
        };
        let side_sign = hit.side.partial_cmp(&0.0).map(|o| o as i32).unwrap_or(0);
        let fresh_start = acc_sign == 0 && hit.side.abs() < tol;
        let continues_run = side_sign != 0 && side_sign == acc_sign && acc + hit.side.abs() < tol;
        if fresh_start || continues_run {
            acc += hit.side.abs();
            acc_sign = side_sign;
            v.remove(i);
            // stay at the same index: the next vertex has shifted into it
        } else {
            acc = 0.0;
            acc_sign = 0;
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sq() -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn tidy_drops_collinear_midpoint() {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(0.0, 0.0), (50.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p.tidy(Dim::ZERO);
        assert_eq!(p.contours[0].len(), 4);
    }

    #[test]
    fn tidy_drops_short_contours() {
        let mut p = Polygon::new();
        p.start();
        p.add(Dim::from_real(0.0), Dim::from_real(0.0), 0);
        p.add(Dim::from_real(1.0), Dim::from_real(0.0), 0);
        p.tidy(Dim::ZERO);
        assert!(p.contours.is_empty());
    }

    #[test]
    fn order_rotates_to_nearest_vertex_and_advances_pen() {
        let mut p = sq();
        p.tidy(Dim::ZERO);
        let mut x = Dim::from_real(100.0);
        let mut y = Dim::from_real(100.0);
        p.order(&mut x, &mut y);
        assert_eq!(p.contours[0].vertices[0].x.to_real(), 100.0);
        assert_eq!(p.contours[0].vertices[0].y.to_real(), 100.0);
    }
}
