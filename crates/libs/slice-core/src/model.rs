//! The mesh and per-slice data model (§3 `STL`, `Slice`, `Facet`).

use slice_geometry::{Dim, Polygon};

/// One triangular facet of the input mesh. The facet normal from the STL
/// file is discarded at parse time — nothing downstream needs it.
#[derive(Debug, Clone, Copy)]
pub struct Facet {
    pub vertices: [Point3; 3],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Point3 {
    pub x: Dim,
    pub y: Dim,
    pub z: Dim,
}

impl Point3 {
    pub fn new(x: Dim, y: Dim, z: Dim) -> Point3 {
        Point3 { x, y, z }
    }
}

/// The four extrude bins a slice's fill planner populates, in the order the
/// original source enumerates them. `Reserved` is carried but never
/// populated — see `DESIGN.md` for the disposition of the source's
/// unused fourth bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrudeKind {
    Perimeter,
    Fill,
    Flying,
    Reserved,
}

pub const EXTRUDE_KINDS: [ExtrudeKind; 4] = [
    ExtrudeKind::Perimeter,
    ExtrudeKind::Fill,
    ExtrudeKind::Flying,
    ExtrudeKind::Reserved,
];

/// Everything derived for a single horizontal layer.
#[derive(Debug, Clone, Default)]
pub struct Slice {
    pub z: Dim,
    /// Cross-section outline straight from the slicer.
    pub outline: Polygon,
    /// Innermost perimeter loop — what the fill planner decomposes.
    pub fill: Polygon,
    pub solid: Polygon,
    pub infill: Polygon,
    pub flying: Polygon,
    pub extrude: [Polygon; 4],
}

impl Slice {
    pub fn new(z: Dim) -> Slice {
        Slice {
            z,
            ..Default::default()
        }
    }

    pub fn extrude_mut(&mut self, kind: ExtrudeKind) -> &mut Polygon {
        &mut self.extrude[kind as usize]
    }

    pub fn extrude_ref(&self, kind: ExtrudeKind) -> &Polygon {
        &self.extrude[kind as usize]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

/// The loaded mesh plus every aggregate the pipeline builds on top of it.
#[derive(Debug, Clone, Default)]
pub struct Stl {
    pub name: String,
    pub facets: Vec<Facet>,
    pub bbox: BBox,
    pub slices: Vec<Slice>,
    /// Union of every layer's outline, dilated to cover the anchor rings.
    pub border: Polygon,
    /// Anchor skirt rings beyond the innermost one (layer 0 only).
    pub anchor: Polygon,
    /// The innermost anchor ring, including the barbs joining it to the part.
    pub anchor_join: Polygon,
}

impl Stl {
    pub fn new(name: String) -> Stl {
        Stl {
            name,
            ..Default::default()
        }
    }

    /// Recompute `bbox` from `facets`. Called once after parsing.
    pub fn recompute_bbox(&mut self) {
        let mut it = self.facets.iter().flat_map(|f| f.vertices.iter());
        let Some(first) = it.next() else {
            self.bbox = BBox::default();
            return;
        };
        let mut min = *first;
        let mut max = *first;
        for v in it {
            if v.x < min.x {
                min.x = v.x;
            }
            if v.x > max.x {
                max.x = v.x;
            }
            if v.y < min.y {
                min.y = v.y;
            }
            if v.y > max.y {
                max.y = v.y;
            }
            if v.z < min.z {
                min.z = v.z;
            }
            if v.z > max.z {
                max.z = v.z;
            }
        }
        self.bbox = BBox { min, max };
    }

    /// Shift every facet so the bounding box minimum sits at the origin.
    pub fn shift_to_origin(&mut self) {
        let (dx, dy, dz) = (self.bbox.min.x, self.bbox.min.y, self.bbox.min.z);
        for f in &mut self.facets {
            for v in &mut f.vertices {
                v.x = v.x - dx;
                v.y = v.y - dy;
                v.z = v.z - dz;
            }
        }
        self.bbox.max.x = self.bbox.max.x - dx;
        self.bbox.max.y = self.bbox.max.y - dy;
        self.bbox.max.z = self.bbox.max.z - dz;
        self.bbox.min = Point3::default();
        tracing::debug!(
            max_x = %self.bbox.max.x,
            max_y = %self.bbox.max.y,
            max_z = %self.bbox.max.z,
            "origin adjusted"
        );
    }
}
