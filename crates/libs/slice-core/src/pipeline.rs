//! The pipeline driver (§4.F): composes the mesh model, slicer, fill planner
//! and path orderer over a loaded [`Stl`] into the final per-slice extrude
//! bins, anchor and border.
//!
//! Grounded on the top-level driver loop in `e3d.c`. `SliceError` is kept as
//! a hand-rolled `enum` rather than a `thiserror` derive, matching the
//! geometry layer's own style (`thiserror` is reserved for the CLI/IO
//! boundary in `slicecli`, per `SPEC_FULL.md` §3.1).

use std::fmt;

use slice_geometry::Dim;

use crate::fill;
use crate::model::{Facet, Stl};
use crate::order;
use crate::slicer;

/// Every user-facing parameter the pipeline driver needs (§6 CLI surface),
/// threaded explicitly rather than read off process-wide globals.
#[derive(Debug, Clone)]
pub struct PrintConfig {
    pub layer_height: Dim,
    /// Extrusion width as a multiple of `layer_height`; `width()` applies it.
    pub width_ratio: f64,
    pub start_z: Dim,
    pub end_z: Dim,
    /// Perimeter loop count for layer 0.
    pub skins0: u32,
    /// Perimeter loop count for every other layer.
    pub skins: u32,
    /// Add one extra skin on odd layers (helps vertical wall strength on
    /// some filaments).
    pub alt_skins: bool,
    /// Solid-skin thickness: consecutive slices above/below that must all
    /// contain a point before it counts as sparse interior infill.
    pub solid_layers: usize,
    /// Sparse-infill density in `(0, 1]`.
    pub fill_density: f64,
    pub fill_flow: f64,
    pub anchor_loops: u32,
    /// Perpendicular offset of the anchor's bonding barbs from the outline.
    pub anchor_gap: Dim,
    pub anchor_step: Dim,
    pub anchor_flow: f64,
    pub filament_diameter: Dim,
    pub packing: f64,
    pub speed_normal: f64,
    pub speed_first_layer: f64,
    pub speed_z_max: f64,
    pub hop: Dim,
    pub retract_length: Dim,
    pub extruder_places: u32,
    pub temp_bed: f64,
    pub temp_nozzle: f64,
    pub fast: bool,
    pub mirror: bool,
}

impl PrintConfig {
    /// Extrusion width `w`, derived from layer height and `width_ratio`.
    pub fn width(&self) -> Dim {
        self.layer_height * self.width_ratio
    }

    /// Reject parameter combinations that can never produce a valid print,
    /// independent of any particular mesh.
    pub fn validate(&self) -> Result<(), SliceError> {
        if self.layer_height.to_real() <= 0.0 {
            return Err(SliceError::InvalidConfig("layer_height must be positive".into()));
        }
        if self.end_z < self.start_z {
            return Err(SliceError::InvalidConfig("end_z must not be less than start_z".into()));
        }
        if self.width_ratio <= 0.0 {
            return Err(SliceError::InvalidConfig("width_ratio must be positive".into()));
        }
        if self.fill_density <= 0.0 || self.fill_density > 1.0 {
            return Err(SliceError::InvalidConfig("fill_density must be in (0, 1]".into()));
        }
        Ok(())
    }
}

/// Errors the geometry/pipeline core itself can raise. I/O and malformed-STL
/// parse errors are produced by `slice-io`'s reader and threaded through
/// here unchanged; `slicecli`'s `PipelineError` wraps this one alongside CLI
/// argument validation.
#[derive(Debug)]
pub enum SliceError {
    /// A malformed line in an ASCII STL file, 1-based per §6.
    Parse { line: usize, message: String },
    /// The mesh produced no slice outlines at all across `[start_z, end_z]`.
    EmptyMesh,
    Io(std::io::Error),
    InvalidConfig(String),
}

impl fmt::Display for SliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceError::Parse { line, message } => write!(f, "line {line}: {message}"),
            SliceError::EmptyMesh => write!(f, "mesh produced no slices in the requested z range"),
            SliceError::Io(e) => write!(f, "I/O error: {e}"),
            SliceError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SliceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SliceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SliceError {
    fn from(e: std::io::Error) -> SliceError {
        SliceError::Io(e)
    }
}

/// Run the full pipeline over a freshly-parsed mesh: origin-shift, slice
/// every layer, build perimeters then area regions then extrude paths,
/// optionally the anchor skirt, then path-order every slice.
///
/// Any slice height with no crossing facets is skipped silently (§7); the
/// only hard failure is an empty result across the whole requested range.
pub fn run(mut stl: Stl, config: &PrintConfig) -> Result<Stl, SliceError> {
    config.validate()?;
    stl.recompute_bbox();
    stl.shift_to_origin();

    let w = config.width();
    let tolerance = config.layer_height / 20;

    let mut z = config.start_z;
    while z <= config.end_z {
        if let Some(slice) = slicer::slice(&stl.facets, z, tolerance) {
            stl.slices.push(slice);
        }
        z += config.layer_height;
    }
    if stl.slices.is_empty() {
        return Err(SliceError::EmptyMesh);
    }

    for (i, slice) in stl.slices.iter_mut().enumerate() {
        let loops = loops_for_layer(config, i);
        fill::perimeter(slice, w, loops, config.fast);
    }

    fill::area(&mut stl.slices, &mut stl.border, w, config.solid_layers);

    for (i, slice) in stl.slices.iter_mut().enumerate() {
        fill::fill_extrude(slice, w, config.fill_density, config.fill_flow, i as i64);
    }

    if config.anchor_loops > 0 {
        fill::anchor(&mut stl, config.anchor_loops, w, config.anchor_gap, config.anchor_step);
    }

    order::order(&mut stl.slices);

    tracing::debug!(slices = stl.slices.len(), "pipeline complete");
    Ok(stl)
}

fn loops_for_layer(config: &PrintConfig, index: usize) -> u32 {
    if index == 0 {
        return config.skins0;
    }
    if config.alt_skins && index % 2 == 1 {
        config.skins + 1
    } else {
        config.skins
    }
}

/// Facets and bbox alone are what a reader needs to hand `run` a usable
/// [`Stl`] — re-exported here so `slice-io` doesn't need to depend on
/// `model` internals beyond `Facet`.
pub fn new_stl(name: String, facets: Vec<Facet>) -> Stl {
    let mut stl = Stl::new(name);
    stl.facets = facets;
    stl.recompute_bbox();
    stl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PrintConfig {
        PrintConfig {
            layer_height: Dim::from_real(0.2),
            width_ratio: 2.0,
            start_z: Dim::from_real(0.1),
            end_z: Dim::from_real(9.9),
            skins0: 3,
            skins: 2,
            alt_skins: false,
            solid_layers: 2,
            fill_density: 0.3,
            fill_flow: 1.0,
            anchor_loops: 2,
            anchor_gap: Dim::from_real(1.0),
            anchor_step: Dim::from_real(4.0),
            anchor_flow: 1.2,
            filament_diameter: Dim::from_real(1.75),
            packing: 1.0,
            speed_normal: 60.0,
            speed_first_layer: 20.0,
            speed_z_max: 5.0,
            hop: Dim::from_real(0.4),
            retract_length: Dim::from_real(1.0),
            extruder_places: 4,
            temp_bed: 60.0,
            temp_nozzle: 200.0,
            fast: false,
            mirror: false,
        }
    }

    fn cube_facets(s: f64) -> Vec<Facet> {
        use crate::model::Point3;
        let p = |x: f64, y: f64, z: f64| Point3::new(Dim::from_real(x), Dim::from_real(y), Dim::from_real(z));
        let corners = [
            p(0.0, 0.0, 0.0),
            p(s, 0.0, 0.0),
            p(s, s, 0.0),
            p(0.0, s, 0.0),
            p(0.0, 0.0, s),
            p(s, 0.0, s),
            p(s, s, s),
            p(0.0, s, s),
        ];
        let tris: [[usize; 3]; 12] = [
            [0, 1, 2],
            [0, 2, 3],
            [4, 6, 5],
            [4, 7, 6],
            [0, 4, 5],
            [0, 5, 1],
            [1, 5, 6],
            [1, 6, 2],
            [2, 6, 7],
            [2, 7, 3],
            [3, 7, 4],
            [3, 4, 0],
        ];
        tris
            .into_iter()
            .map(|[a, b, c]| Facet {
                vertices: [corners[a], corners[b], corners[c]],
            })
            .collect()
    }

    #[test]
    fn rejects_end_before_start() {
        let mut config = test_config();
        config.end_z = config.start_z - Dim::from_real(1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_layer_height() {
        let mut config = test_config();
        config.layer_height = Dim::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn pipeline_runs_over_a_cube() {
        let stl = new_stl("cube".into(), cube_facets(10.0));
        let config = test_config();
        let result = run(stl, &config).unwrap();
        assert!(!result.slices.is_empty());
        for slice in &result.slices {
            assert!(!slice.outline.is_empty());
        }
        assert!(!result.anchor_join.is_empty());
    }
}
