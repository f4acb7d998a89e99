//! Planar polygon algebra used by the slicer and fill planner: a
//! multi-contour `Polygon` data model plus winding-number boolean clip,
//! capsule-kernel inset/outset, collinearity/tolerance tidy, and
//! nearest-neighbour contour ordering.
//!
//! This crate is the shared engine — it has no notion of a 3D mesh, a
//! G-code program, or a CLI; those live in `slice-core`/`slice-io`.

pub mod clip;
pub mod contour;
pub mod dim;
pub mod geom;
pub mod inset;
pub mod polygon;
pub mod vertex;

pub use clip::{clip, subtract, Op};
pub use contour::{Contour, Dir};
pub use dim::Dim;
pub use inset::inset;
pub use polygon::Polygon;
pub use vertex::Vertex;
