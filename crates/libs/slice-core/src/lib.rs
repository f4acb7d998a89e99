//! Mesh model, horizontal slicer, fill planner, path ordering and the
//! pipeline driver that ties them together into one pass over a mesh.

pub mod fill;
pub mod model;
pub mod order;
pub mod pipeline;
pub mod slicer;

pub use model::{BBox, ExtrudeKind, Facet, Point3, Slice, Stl, EXTRUDE_KINDS};
pub use pipeline::{run, PrintConfig, SliceError};
pub use slicer::slice;
