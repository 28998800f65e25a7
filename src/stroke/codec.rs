//! Text format for stroke lists
//!
//! ```text
//! x,y;x,y|color|width|isEraser|layer#x,y;...|...
//! ```
//!
//! Colors are signed 32-bit decimals, flags are `0`/`1`, and an empty list is
//! written as `[]`. Parsing never fails: bad fields take defaults and records
//! that cannot yield a stroke are dropped.

use super::{Stroke, DEFAULT_COLOR, DEFAULT_WIDTH};
use crate::core::config::DEFAULT_LAYER;
use crate::geometry::{normalize_points, Point};
use std::fmt::Write;

const EMPTY_LIST: &str = "[]";
const STROKE_SEP: char = '#';
const FIELD_SEP: char = '|';
const POINT_SEP: char = ';';
const COORD_SEP: char = ',';

pub fn serialize_strokes<S: AsRef<Stroke>>(strokes: &[S]) -> String {
    if strokes.is_empty() {
        return EMPTY_LIST.to_string();
    }

    let mut out = String::new();
    for (i, stroke) in strokes.iter().enumerate() {
        let stroke = stroke.as_ref();
        if i > 0 {
            out.push(STROKE_SEP);
        }

        for (j, p) in stroke.points().iter().enumerate() {
            if j > 0 {
                out.push(POINT_SEP);
            }
            out.push_str(&format_float(p.x));
            out.push(COORD_SEP);
            out.push_str(&format_float(p.y));
        }

        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{sep}{color}{sep}{width}{sep}{eraser}{sep}{layer}",
            sep = FIELD_SEP,
            color = stroke.color() as i32,
            width = format_float(stroke.width()),
            eraser = if stroke.is_eraser() { "1" } else { "0" },
            layer = stroke.layer(),
        );
    }
    out
}

pub fn deserialize_strokes(data: &str) -> Vec<Stroke> {
    let data = data.trim();
    if data.is_empty() || data == EMPTY_LIST {
        return Vec::new();
    }

    let strokes: Vec<Stroke> = data
        .split(STROKE_SEP)
        .filter(|record| !record.trim().is_empty())
        .filter_map(parse_stroke)
        .collect();

    tracing::debug!("Deserialized {} strokes", strokes.len());
    strokes
}

fn parse_stroke(record: &str) -> Option<Stroke> {
    let fields: Vec<&str> = record.split(FIELD_SEP).collect();
    if fields.len() < 3 {
        tracing::debug!("Dropping stroke record with {} fields", fields.len());
        return None;
    }

    let points: Vec<Point> = fields[0].split(POINT_SEP).filter_map(parse_point).collect();
    let color = parse_color(fields[1]);
    let width = fields[2].trim().parse::<f32>().unwrap_or(DEFAULT_WIDTH);
    let is_eraser = fields.get(3).is_some_and(|f| f.trim() == "1");
    let layer = fields
        .get(4)
        .and_then(|f| f.trim().parse::<i32>().ok())
        .unwrap_or(DEFAULT_LAYER as i32);

    Stroke::new(normalize_points(points), color, width, is_eraser, layer)
}

fn parse_point(pair: &str) -> Option<Point> {
    let (x, y) = pair.split_once(COORD_SEP)?;
    let x = x.trim().parse::<f32>().ok()?;
    let y = y.trim().parse::<f32>().ok()?;
    Some(Point::new(x, y))
}

fn parse_color(field: &str) -> u32 {
    let field = field.trim();
    field
        .parse::<i32>()
        .map(|c| c as u32)
        .or_else(|_| field.parse::<u32>())
        .unwrap_or(DEFAULT_COLOR)
}

/// Shortest round-trip decimal, always with a fractional part for integers.
pub(crate) fn format_float(value: f32) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}
