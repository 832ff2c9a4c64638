//! Seat layout import.
//!
//! Layout files are comma separated with a header row followed by one
//! `name,direction,x,y` row per seat. Directions are compass letters.

use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use crate::seating::Seat;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Layout is empty, expected a header row")]
    MissingHeader,

    #[error("Line {line}: expected 4 columns, found {found}")]
    ColumnCount { line: usize, found: usize },

    #[error("Line {line}: invalid direction {value:?}")]
    InvalidDirection { line: usize, value: String },

    #[error("Line {line}: invalid {field} {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: duplicate seat {name}")]
    DuplicateSeat { line: usize, name: String },

    #[error("Failed to read layout: {0}")]
    Io(#[from] std::io::Error),
}

/// Maps a compass letter to the angle an occupant faces.
pub fn direction_to_angle(direction: &str) -> Option<f64> {
    match direction {
        "N" => Some(FRAC_PI_2),
        "S" => Some(-FRAC_PI_2),
        "E" => Some(0.0),
        "W" => Some(PI),
        _ => None,
    }
}

pub fn parse_layout<R: BufRead>(reader: R) -> Result<Vec<Seat>, LayoutError> {
    let mut lines = reader.lines().enumerate();

    match lines.next() {
        Some((_, header)) => {
            header?;
        }
        None => return Err(LayoutError::MissingHeader),
    }

    let mut seats = Vec::new();
    let mut names = HashSet::new();

    for (index, line) in lines {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [name, direction, x, y] = fields.as_slice() else {
            return Err(LayoutError::ColumnCount {
                line: line_no,
                found: fields.len(),
            });
        };

        let angle = direction_to_angle(direction).ok_or_else(|| LayoutError::InvalidDirection {
            line: line_no,
            value: direction.to_string(),
        })?;
        let x = parse_coordinate(line_no, "x", x)?;
        let y = parse_coordinate(line_no, "y", y)?;

        if !names.insert(name.to_string()) {
            return Err(LayoutError::DuplicateSeat {
                line: line_no,
                name: name.to_string(),
            });
        }

        seats.push(Seat::new(*name, x, y, angle));
    }

    Ok(seats)
}

pub fn load_layout(path: impl AsRef<Path>) -> Result<Vec<Seat>, LayoutError> {
    let file = File::open(path)?;
    parse_layout(BufReader::new(file))
}

fn parse_coordinate(line: usize, field: &'static str, value: &str) -> Result<f64, LayoutError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LayoutError::InvalidNumber {
            line,
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layout() {
        let csv = "name,direction,x,y\nA0,N,0.5,0.5\nA1, E ,1.5,0.5\n\nB0,W,0.5,2\n";
        let seats = parse_layout(csv.as_bytes()).unwrap();

        assert_eq!(seats.len(), 3);
        assert_eq!(seats[0], Seat::new("A0", 0.5, 0.5, FRAC_PI_2));
        assert_eq!(seats[1].angle, 0.0);
        assert_eq!(seats[2].angle, PI);
        assert!(seats.iter().all(|s| !s.occupied));
    }

    #[test]
    fn test_direction_table() {
        assert_eq!(direction_to_angle("S"), Some(-FRAC_PI_2));
        assert_eq!(direction_to_angle("NE"), None);
        assert_eq!(direction_to_angle("n"), None);
    }

    #[test]
    fn test_bad_direction_names_line() {
        let err = parse_layout("h\nA0,N,0,0\nA1,Q,1,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidDirection { line: 3, .. }));
    }

    #[test]
    fn test_bad_coordinate_rejected() {
        let err = parse_layout("h\nA0,N,zero,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidNumber { field: "x", .. }));

        let err = parse_layout("h\nA0,N,0,NaN\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidNumber { field: "y", .. }));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(parse_layout("".as_bytes()), Err(LayoutError::MissingHeader)));
        assert!(matches!(
            parse_layout("h\nA0,N,0\n".as_bytes()),
            Err(LayoutError::ColumnCount { line: 2, found: 3 })
        ));
        assert!(matches!(
            parse_layout("h\nA0,N,0,0\nA0,S,1,1\n".as_bytes()),
            Err(LayoutError::DuplicateSeat { line: 3, .. })
        ));
    }

    #[test]
    fn test_header_only_is_empty_roster() {
        assert!(parse_layout("name,direction,x,y\n".as_bytes()).unwrap().is_empty());
    }
}
