//! External collaborators (§4.G–I): the ASCII STL reader, the G-code
//! emitter and the SVG visualizer. Thin shells around `slice-core`'s
//! pipeline — none of these hold geometry logic of their own.

pub mod gcode;
pub mod stl;
pub mod svg;

pub use gcode::write_gcode;
pub use stl::{read_stl_file, read_stl_str};
pub use svg::write_svg;
