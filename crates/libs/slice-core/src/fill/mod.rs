//! Per-slice decomposition into perimeter/solid/infill/flying regions, plus
//! the zig-zag crosshatch and anchor-skirt synthesis that turn those regions
//! into extrudable contours (§4.D).

mod anchor;
mod area;
mod perimeter;
mod zigzag;

pub use anchor::anchor;
pub use area::area;
pub use perimeter::perimeter;
pub use zigzag::fill_extrude;
