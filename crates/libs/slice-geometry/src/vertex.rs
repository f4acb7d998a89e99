use crate::dim::Dim;
use std::cmp::Ordering;

/// A single point of a contour, plus the flag carried by the directed edge
/// that starts here (this vertex to the next one in the contour).
///
/// Booleans add the flags of overlapping input edges into the output edge,
/// so `flag` is user-defined metadata rather than anything the geometry
/// kernel interprets itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vertex {
    pub x: Dim,
    pub y: Dim,
    pub flag: i32,
}

impl Vertex {
    pub fn new(x: Dim, y: Dim, flag: i32) -> Vertex {
        Vertex { x, y, flag }
    }

    /// Lexicographic order by `(x, y)`, used to canonicalize segment
    /// endpoints as `A <= B` during clip's segment-extraction phase.
    pub fn lex_cmp(&self, other: &Vertex) -> Ordering {
        self.x.cmp_total(other.x).then(self.y.cmp_total(other.y))
    }

    /// Squared distance as a machine float: lengths are one of the two
    /// places (the other is trig) where the kernel steps outside `Dim`.
    pub fn dist2(&self, other: &Vertex) -> f64 {
        let dx = (self.x - other.x).to_real();
        let dy = (self.y - other.y).to_real();
        dx * dx + dy * dy
    }
}

// `Dim` only derives `Ord` in the fixed-point build; expose a total-order
// helper here so vertex code is agnostic to which `Dim` variant is active.
trait TotalOrd {
    fn cmp_total(&self, other: Self) -> Ordering;
}

impl TotalOrd for Dim {
    fn cmp_total(&self, other: Dim) -> Ordering {
        self.to_real()
            .partial_cmp(&other.to_real())
            .unwrap_or(Ordering::Equal)
    }
}
