//! G-code emitter (§4.H / §6), grounded on the `gcode_out` driver in
//! `e3d-gcode.c`: a metric/absolute prelude, one border pass, the anchor
//! skirt in both winding directions, then every slice's extrude bins in
//! fixed order (perimeter, fill, flying — `Reserved` is never emitted, see
//! `DESIGN.md`), a shutdown retraction, and a fan/heater-off postlude.
//!
//! E-axis position is tracked as a running filament length, advanced by the
//! printed segment's cross-sectional area divided by the filament's own
//! circular cross-section — `flowrate` in the original, `packing` here.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use slice_core::model::{ExtrudeKind, Stl};
use slice_core::pipeline::PrintConfig;
use slice_core::SliceError;
use slice_geometry::{Contour, Dim, Dir, Polygon};

const HOP_TRIGGER_FACTOR: i64 = 5;

struct Writer<'a, W: Write> {
    out: &'a mut W,
    config: &'a PrintConfig,
    cx: Dim,
    cy: Dim,
    px: Dim,
    py: Dim,
    pe: f64,
    last: Option<(Dim, Dim, Dim, f64, f64)>,
    z: Dim,
}

/// Write the full G-code program for `stl` (already run through the
/// pipeline) to `path`.
pub fn write_gcode(path: &Path, stl: &Stl, config: &PrintConfig) -> Result<(), SliceError> {
    let mut file = File::create(path)?;
    write_gcode_to(&mut file, stl, config)?;
    Ok(())
}

/// As [`write_gcode`], but to any `Write` sink — used directly by tests.
pub fn write_gcode_to<W: Write>(out: &mut W, stl: &Stl, config: &PrintConfig) -> io::Result<()> {
    let cx = (stl.bbox.min.x + stl.bbox.max.x) / 2;
    let cy = (stl.bbox.min.y + stl.bbox.max.y) / 2;

    let mut w = Writer {
        out,
        config,
        cx,
        cy,
        px: Dim::ZERO,
        py: Dim::ZERO,
        pe: 0.0,
        last: None,
        z: Dim::ZERO,
    };

    writeln!(w.out, "G21             ; metric")?;
    writeln!(w.out, "G90             ; absolute")?;
    writeln!(w.out, "G92 Z0 E0       ; reset Z and E")?;
    writeln!(w.out, "M104 S{:.0}      ; nozzle heating", config.temp_nozzle)?;
    writeln!(w.out, "M140 S{:.0}      ; bed heating", config.temp_bed)?;
    writeln!(w.out, "M109 S{:.0}      ; wait for nozzle", config.temp_nozzle)?;
    writeln!(w.out, "M190 S{:.0}      ; wait for bed", config.temp_bed)?;
    writeln!(w.out, "M106            ; fan on")?;
    writeln!(w.out, "G1 Z2 F60       ; up")?;
    writeln!(w.out, "G1 Z0.1         ; down")?;
    writeln!(w.out, "G92 Z0          ; origin")?;
    writeln!(w.out, "G92 X{} Y{}", cx.format(3), cy.format(3))?;

    let flowrate = config.packing;
    // With no anchor skirt the border is the only thing primed before the
    // first real perimeter, so it gets real flow; with an anchor, the
    // border is a dry travel loop only (keeps the end-stops honest) and the
    // anchor itself does the priming.
    let border_flowrate = if stl.anchor_join.is_empty() { flowrate } else { 0.0 };

    w.plot_loops(&stl.border, config.speed_normal, border_flowrate, Some(Dir::Cw))?;
    w.plot_loops(&stl.anchor_join, config.speed_first_layer, flowrate * config.anchor_flow, Some(Dir::Cw))?;
    w.plot_loops(&stl.anchor, config.speed_first_layer, flowrate * config.anchor_flow, Some(Dir::Cw))?;
    w.plot_loops(&stl.anchor, config.speed_first_layer, flowrate * config.anchor_flow, Some(Dir::Ccw))?;

    let mut speed = config.speed_first_layer;
    for slice in &stl.slices {
        w.z = slice.z;
        w.plot_loops(slice.extrude_ref(ExtrudeKind::Perimeter), speed, flowrate, Some(Dir::Cw))?;
        w.plot_loops(slice.extrude_ref(ExtrudeKind::Perimeter), speed, flowrate, Some(Dir::Ccw))?;
        w.plot_loops(slice.extrude_ref(ExtrudeKind::Fill), speed, flowrate, None)?;
        w.plot_loops(slice.extrude_ref(ExtrudeKind::Flying), speed, flowrate, Some(Dir::Ccw))?;
        w.plot_loops(slice.extrude_ref(ExtrudeKind::Flying), speed, flowrate, Some(Dir::Cw))?;
        speed = config.speed_normal;
    }

    let hop = config.hop;
    let back = config.retract_length.to_real();
    w.move_to(w.px, w.py, w.z + hop, back)?;
    w.move_to(cx, cy, w.z + hop, back)?;
    w.move_to(cx, cy, w.z + config.layer_height * 10i64, back)?;
    w.move_to(cx, cy, w.z + config.layer_height * 20i64, 0.0)?;

    writeln!(w.out, "M104 S0         ; cool nozzle")?;
    writeln!(w.out, "M140 S0         ; cool bed")?;
    writeln!(w.out, "M84             ; disable steppers")?;
    writeln!(w.out, "M107            ; fan off")?;
    Ok(())
}

impl<'a, W: Write> Writer<'a, W> {
    /// Every contour in `poly` whose `dir` matches `only` (or every contour,
    /// when `only` is `None`), traced as a hop-travel to its start followed
    /// by an extrude stroke around (and, for closed loops, back to) its
    /// first vertex.
    fn plot_loops(&mut self, poly: &Polygon, speed: f64, flowrate: f64, only: Option<Dir>) -> io::Result<()> {
        for contour in &poly.contours {
            if contour.is_empty() {
                continue;
            }
            if let Some(dir) = only {
                if contour.dir != dir {
                    continue;
                }
            }
            self.plot_contour(contour, speed, flowrate)?;
        }
        Ok(())
    }

    fn plot_contour(&mut self, contour: &Contour, speed: f64, flowrate: f64) -> io::Result<()> {
        let first = contour.vertices[0];
        let d = ((self.px - first.x).to_real().powi(2) + (self.py - first.y).to_real().powi(2)).sqrt();
        let hop_threshold = self.config.layer_height.to_real() * HOP_TRIGGER_FACTOR as f64;
        if self.pe != 0.0 && d > hop_threshold {
            let back = self.config.retract_length.to_real();
            let (px, py) = (self.px, self.py);
            self.move_to(px, py, self.z + self.config.hop, back)?;
            self.move_to(first.x, first.y, self.z + self.config.hop, back)?;
        }
        self.move_to(first.x, first.y, self.z, 0.0)?;
        for v in &contour.vertices[1..] {
            self.extrude_to(v.x, v.y, speed, flowrate)?;
        }
        if !contour.is_open() {
            self.extrude_to(first.x, first.y, speed, flowrate)?;
        }
        Ok(())
    }

    fn move_to(&mut self, x: Dim, y: Dim, z: Dim, back: f64) -> io::Result<()> {
        self.px = x;
        self.py = y;
        let e = self.pe - back;
        self.g1(x, y, z, e, self.config.speed_normal)
    }

    fn extrude_to(&mut self, x: Dim, y: Dim, speed: f64, flowrate: f64) -> io::Result<()> {
        let d = ((x - self.px).to_real().powi(2) + (y - self.py).to_real().powi(2)).sqrt();
        let section = self.config.width().to_real() * self.config.layer_height.to_real();
        let filament_area = std::f64::consts::PI * (self.config.filament_diameter.to_real() / 2.0).powi(2);
        let de = d * section * flowrate / filament_area.max(1e-9);
        self.px = x;
        self.py = y;
        self.pe += de;
        let e = self.pe;
        self.g1(x, y, self.z, e, speed)
    }

    fn g1(&mut self, x: Dim, y: Dim, z: Dim, e: f64, feed: f64) -> io::Result<()> {
        let mirrored_x = if self.config.mirror { self.cx * 2i64 - x } else { x };

        let mut feed = feed;
        if let Some((lx, ly, lz, le, lf)) = self.last {
            if mirrored_x == lx && y == ly && z == lz && e == le && feed == lf {
                return Ok(());
            }
            if z != lz && self.config.speed_z_max > 0.0 {
                let dz = (lz - z).abs().to_real();
                let d = ((mirrored_x - lx).to_real().powi(2)
                    + (y - ly).to_real().powi(2)
                    + dz.powi(2)
                    + (e - le).powi(2))
                .sqrt();
                if dz > 0.0 && d * self.config.speed_z_max < dz * feed {
                    feed = d * self.config.speed_z_max / dz;
                }
            }
        }

        write!(self.out, "G1")?;
        let moved_x = self.last.map(|(lx, ..)| lx != mirrored_x).unwrap_or(true);
        let moved_y = self.last.map(|(_, ly, ..)| ly != y).unwrap_or(true);
        let moved_z = self.last.map(|(_, _, lz, ..)| lz != z).unwrap_or(true);
        let moved_e = self.last.map(|(_, _, _, le, _)| le != e).unwrap_or(true);
        let moved_f = self.last.map(|(_, _, _, _, lf)| lf != feed).unwrap_or(true);
        if moved_x {
            write!(self.out, " X{}", mirrored_x.format(3))?;
        }
        if moved_y {
            write!(self.out, " Y{}", y.format(3))?;
        }
        if moved_z {
            write!(self.out, " Z{}", z.format(3))?;
        }
        if moved_e {
            write!(self.out, " E{:.*}", self.config.extruder_places as usize, e)?;
        }
        if moved_f {
            write!(self.out, " F{:.0}", feed * 60.0)?;
        }
        writeln!(self.out)?;

        self.pe = e;
        self.last = Some((mirrored_x, y, z, e, feed));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_core::model::{BBox, Point3, Slice};

    fn config() -> PrintConfig {
        PrintConfig {
            layer_height: Dim::from_real(0.2),
            width_ratio: 2.0,
            start_z: Dim::ZERO,
            end_z: Dim::from_real(1.0),
            skins0: 2,
            skins: 1,
            alt_skins: false,
            solid_layers: 2,
            fill_density: 0.3,
            fill_flow: 1.0,
            anchor_loops: 0,
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

    fn square(side: f64) -> Polygon {
        let mut p = Polygon::new();
        p.start();
        for (x, y) in [(0.0, 0.0), (0.0, side), (side, side), (side, 0.0)] {
            p.add(Dim::from_real(x), Dim::from_real(y), 0);
        }
        p
    }

    #[test]
    fn emits_prelude_and_extrude_moves() {
        let mut stl = Stl::new("cube".into());
        stl.bbox = BBox {
            min: Point3::default(),
            max: Point3::new(Dim::from_real(10.0), Dim::from_real(10.0), Dim::from_real(1.0)),
        };
        let mut slice = Slice::new(Dim::from_real(0.2));
        *slice.extrude_mut(ExtrudeKind::Perimeter) = square(10.0);
        stl.slices.push(slice);

        let mut buf = Vec::new();
        write_gcode_to(&mut buf, &stl, &config()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("G21"));
        assert!(text.contains("G1 X0 Y0"));
        assert!(text.contains(" E"));
        assert!(text.trim_end().ends_with("M107            ; fan off"));
    }

    #[test]
    fn repeated_identical_moves_are_suppressed() {
        let stl = Stl::new("empty".into());
        let mut buf = Vec::new();
        write_gcode_to(&mut buf, &stl, &config()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("G92 X0 Y0"));
    }
}
