//! ASCII STL reader (§4.G / §6), grounded on the `e3d-stl.c` state machine:
//! `solid` → repeated `facet normal / outer loop / vertex×3 / endloop /
//! endfacet` → `endsolid`. Keywords are matched case-insensitively; blank
//! lines and surrounding whitespace are ignored; anything else is a fatal
//! parse error citing the 1-based source line.

use std::fs;
use std::path::Path;

use slice_core::model::{Facet, Point3};
use slice_core::pipeline::new_stl;
use slice_core::{SliceError, Stl};
use slice_geometry::Dim;

/// Read and parse an ASCII STL file from disk.
pub fn read_stl_file(path: &Path) -> Result<Stl, SliceError> {
    let text = fs::read_to_string(path)?;
    read_stl_str(&text)
}

/// Parse ASCII STL text already in memory (used directly by tests and by
/// [`read_stl_file`]).
pub fn read_stl_str(text: &str) -> Result<Stl, SliceError> {
    let mut lines = Lines::new(text);

    let (line, l) = lines
        .next()
        .ok_or_else(|| parse_err(1, "empty file, expected 'solid'"))?;
    let mut tokens = l.split_whitespace();
    let kw = tokens.next().unwrap_or("");
    if !kw.eq_ignore_ascii_case("solid") {
        return Err(parse_err(line, format!("expected 'solid', found {l:?}")));
    }
    let name = tokens.collect::<Vec<_>>().join(" ");

    let mut facets = Vec::new();
    loop {
        let (line, l) = lines
            .peek()
            .ok_or_else(|| parse_err(lines.eof_line(), "unexpected end of file, expected 'facet' or 'endsolid'"))?;
        let kw = l.split_whitespace().next().unwrap_or("");
        if kw.eq_ignore_ascii_case("endsolid") {
            lines.next();
            break;
        }
        if !kw.eq_ignore_ascii_case("facet") {
            return Err(parse_err(line, format!("expected 'facet' or 'endsolid', found {l:?}")));
        }
        facets.push(parse_facet(&mut lines, line, l)?);
    }

    if facets.is_empty() {
        return Err(SliceError::EmptyMesh);
    }
    tracing::debug!(name = %name, facets = facets.len(), "parsed STL");
    Ok(new_stl(name, facets))
}

fn parse_facet(lines: &mut Lines, facet_line: usize, facet_text: &str) -> Result<Facet, SliceError> {
    lines.next();
    let mut tok = facet_text.split_whitespace();
    tok.next(); // "facet"
    let kw2 = tok.next().unwrap_or("");
    if !kw2.eq_ignore_ascii_case("normal") {
        return Err(parse_err(facet_line, format!("expected 'normal' after 'facet', found {facet_text:?}")));
    }

    let (oline, ol) = lines
        .next()
        .ok_or_else(|| parse_err(lines.eof_line(), "unexpected end of file, expected 'outer loop'"))?;
    let mut ot = ol.split_whitespace();
    let (k1, k2) = (ot.next().unwrap_or(""), ot.next().unwrap_or(""));
    if !(k1.eq_ignore_ascii_case("outer") && k2.eq_ignore_ascii_case("loop")) {
        return Err(parse_err(oline, format!("expected 'outer loop', found {ol:?}")));
    }

    let mut vertices = [Point3::default(); 3];
    for slot in vertices.iter_mut() {
        *slot = parse_vertex(lines)?;
    }

    expect_keyword(lines, "endloop")?;
    expect_keyword(lines, "endfacet")?;

    Ok(Facet { vertices })
}

fn parse_vertex(lines: &mut Lines) -> Result<Point3, SliceError> {
    let (line, l) = lines
        .next()
        .ok_or_else(|| parse_err(lines.eof_line(), "unexpected end of file, expected 'vertex'"))?;
    let mut tok = l.split_whitespace();
    let kw = tok.next().unwrap_or("");
    if !kw.eq_ignore_ascii_case("vertex") {
        return Err(parse_err(line, format!("expected 'vertex', found {l:?}")));
    }
    let coords: Vec<&str> = tok.collect();
    if coords.len() != 3 {
        return Err(parse_err(line, format!("expected 3 coordinates after 'vertex', found {}", coords.len())));
    }
    let parse_f = |s: &str| -> Result<f64, SliceError> {
        s.parse::<f64>().map_err(|_| parse_err(line, format!("invalid number {s:?}")))
    };
    Ok(Point3::new(
        Dim::from_real(parse_f(coords[0])?),
        Dim::from_real(parse_f(coords[1])?),
        Dim::from_real(parse_f(coords[2])?),
    ))
}

fn expect_keyword(lines: &mut Lines, expected: &str) -> Result<(), SliceError> {
    let (line, l) = lines
        .next()
        .ok_or_else(|| parse_err(lines.eof_line(), format!("unexpected end of file, expected '{expected}'")))?;
    let kw = l.split_whitespace().next().unwrap_or("");
    if !kw.eq_ignore_ascii_case(expected) {
        return Err(parse_err(line, format!("expected '{expected}', found {l:?}")));
    }
    Ok(())
}

fn parse_err(line: usize, message: impl Into<String>) -> SliceError {
    SliceError::Parse {
        line,
        message: message.into(),
    }
}

/// Non-blank, trimmed lines with their original 1-based line numbers.
struct Lines<'a> {
    items: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Lines<'a> {
        let items = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();
        Lines { items, pos: 0 }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let item = self.items.get(self.pos).copied();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.items.get(self.pos).copied()
    }

    fn eof_line(&self) -> usize {
        self.items.last().map(|(n, _)| *n + 1).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = "
        solid cube
          facet normal 0 0 -1
            outer loop
              vertex 0 0 0
              vertex 0 10 0
              vertex 10 10 0
            endloop
          endfacet
          facet normal 0 0 -1
            outer loop
              vertex 0 0 0
              vertex 10 10 0
              vertex 10 0 0
            endloop
          endfacet
        endsolid cube
    ";

    #[test]
    fn parses_minimal_solid() {
        let stl = read_stl_str(CUBE).unwrap();
        assert_eq!(stl.name, "cube");
        assert_eq!(stl.facets.len(), 2);
    }

    #[test]
    fn rejects_missing_endloop_with_line_number() {
        let bad = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendfacet\nendsolid x\n";
        let err = read_stl_str(bad).unwrap_err();
        match err {
            SliceError::Parse { line, .. } => assert_eq!(line, 7),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_keyword() {
        let bad = "solid x\nfrobnicate\nendsolid x\n";
        let err = read_stl_str(bad).unwrap_err();
        assert!(matches!(err, SliceError::Parse { line: 2, .. }));
    }
}
