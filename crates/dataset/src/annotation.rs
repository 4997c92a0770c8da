//! YOLO label lines: `class_id x_center y_center width height`.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
    pub class_id: u64,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum AnnotationDefect {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),
    #[error("{field} is not a number: {raw:?}")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field} out of range [0, 1]: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("invalid class id: {0:?}")]
    ClassId(String),
}

/// Field count is checked before anything is parsed, so short or long lines
/// never reach the numeric conversion.
pub fn parse_annotation_line(line: &str) -> Result<AnnotationRecord, AnnotationDefect> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [class_id, x, y, w, h] = parts[..] else {
        return Err(AnnotationDefect::FieldCount(parts.len()));
    };

    let x_center = unit_interval("x_center", x)?;
    let y_center = unit_interval("y_center", y)?;
    let width = unit_interval("width", w)?;
    let height = unit_interval("height", h)?;

    Ok(AnnotationRecord {
        class_id: parse_class_id(class_id)?,
        x_center,
        y_center,
        width,
        height,
    })
}

fn unit_interval(field: &'static str, raw: &str) -> Result<f64, AnnotationDefect> {
    let value: f64 = raw.parse().map_err(|_| AnnotationDefect::NotANumber {
        field,
        raw: raw.to_string(),
    })?;
    // NaN fails the range test too
    if !(0.0..=1.0).contains(&value) {
        return Err(AnnotationDefect::OutOfRange { field, value });
    }
    Ok(value)
}

// digits only: rejects "-1", "+1" and "1.0". Ids above u64::MAX are rejected.
fn parse_class_id(raw: &str) -> Result<u64, AnnotationDefect> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AnnotationDefect::ClassId(raw.to_string()));
    }
    raw.parse().map_err(|_| AnnotationDefect::ClassId(raw.to_string()))
}
