//! Area decomposition into flying/solid/infill regions (§4.D.2), grounded on
//! `fill_area` in `e3d-fill.c`.

use slice_geometry::{clip, inset, subtract, Dim, Op, Polygon};

use crate::model::Slice;

/// Classify `fill` into `flying`/`solid`/`infill` for every slice, bottom-up,
/// accumulating the global `border` as the union of every outline.
///
/// `layers` is the solid-skin thickness: the number of slices above and
/// below that must all still contain a point before it is treated as
/// interior (sparse) infill rather than a top/bottom skin.
pub fn area(slices: &mut [Slice], border: &mut Polygon, w: Dim, layers: usize) {
    let outlines: Vec<Polygon> = slices.iter().map(|s| s.outline.clone()).collect();
    let fills: Vec<Polygon> = slices.iter().map(|s| s.fill.clone()).collect();

    for i in 0..slices.len() {
        *border = clip(Op::Union, &[border, &outlines[i]]);

        let fill = &fills[i];
        let flying = if i == 0 {
            Polygon::new()
        } else {
            let unsupported = subtract(fill, &outlines[i - 1]);
            let bridged = inset(&unsupported, -(w + w));
            clip(Op::Intersect(2), &[fill, &bridged])
        };

        let base = support_base(&fills, i, layers);
        let mut solid = subtract(&subtract(fill, &base), &flying);
        solid = inset(&solid, w);
        solid = inset(&solid, Dim::ZERO - w);
        solid = clip(Op::Intersect(2), &[&solid, fill]);

        let infill = subtract(&subtract(fill, &solid), &flying);

        let s = &mut slices[i];
        s.flying = flying;
        s.solid = solid;
        s.infill = infill;
    }
}

/// Intersection of `fill` across the `2*layers+1`-slice window centred on
/// `i`, skipping `i` itself. Empty if fewer than that many slices exist
/// above or below — those slices are fully solid, never sparse infill.
///
/// `layers == 0` is a one-slice window (`i` only, skipped), so there's no
/// neighbour to take a support base from: the base is the slice's own
/// `fill`, which makes `solid`/`infill` fall out as entirely sparse (not
/// entirely solid — an empty base would invert that), matching a `layers*2+1
/// == 1` window in the original.
fn support_base(fills: &[Polygon], i: usize, layers: usize) -> Polygon {
    if layers == 0 {
        return fills[i].clone();
    }
    if i < layers || i + layers >= fills.len() {
        return Polygon::new();
    }
    let mut acc = fills[i - layers].clone();
    for k in (i - layers)..=(i + layers) {
        if k == i {
            continue;
        }
        acc = clip(Op::Intersect(2), &[&acc, &fills[k]]);
    }
    acc
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
    fn single_slice_has_no_support_base() {
        let mut s = Slice::new(Dim::ZERO);
        s.outline = square(0.0, 0.0, 10.0, 10.0);
        s.fill = s.outline.clone();
        let mut slices = vec![s];
        let mut border = Polygon::new();
        area(&mut slices, &mut border, Dim::from_real(0.4), 2);
        // With no neighbours above/below, the base is empty so everything
        // not flying falls to solid.
        assert!(!slices[0].solid.is_empty() || !slices[0].infill.is_empty());
    }

    #[test]
    fn base_slice_is_not_flying() {
        let mut s = Slice::new(Dim::ZERO);
        s.outline = square(0.0, 0.0, 10.0, 10.0);
        s.fill = s.outline.clone();
        let mut slices = vec![s];
        let mut border = Polygon::new();
        area(&mut slices, &mut border, Dim::from_real(0.4), 0);
        assert!(slices[0].flying.is_empty());
        // With `layers == 0` the support base is the slice's own fill, so
        // everything falls to sparse infill, not solid.
        assert!(slices[0].solid.is_empty());
        assert!(!slices[0].infill.is_empty());
    }
}
