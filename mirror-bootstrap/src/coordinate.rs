use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors raised when a captured log coordinate is malformed.
#[derive(Debug, Error)]
pub enum CoordinateError {
    #[error("binlog file name cannot be empty")]
    EmptyFile,

    #[error("binlog position cannot be negative, got {0}")]
    NegativePosition(i64),
}

/// A point in the source's binlog stream, identified by file name and byte
/// position within that file.
///
/// On a single-writer source the coordinate is strictly monotone: binlog file
/// names carry a zero-padded sequence number, so `(file, position)` ordering
/// matches the order in which changes were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLogCoordinate {
    /// Binlog file name, e.g. `binlog.000042`.
    pub file: String,
    /// Byte position within the file.
    pub position: u64,
}

impl SourceLogCoordinate {
    /// Creates a coordinate, rejecting an empty file name.
    ///
    /// The position needs no further validation: the unsigned type already
    /// encodes the non-negativity requirement.
    pub fn new(file: impl Into<String>, position: u64) -> Result<Self, CoordinateError> {
        let file = file.into();
        if file.trim().is_empty() {
            return Err(CoordinateError::EmptyFile);
        }

        Ok(Self { file, position })
    }

    /// Creates a coordinate from a raw status row, where the wire protocol
    /// hands the position over as a signed integer.
    pub fn from_status(file: impl Into<String>, position: i64) -> Result<Self, CoordinateError> {
        let position =
            u64::try_from(position).map_err(|_| CoordinateError::NegativePosition(position))?;

        Self::new(file, position)
    }
}

impl fmt::Display for SourceLogCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.position)
    }
}

impl PartialOrd for SourceLogCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceLogCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.file, self.position).cmp(&(&other.file, other.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_rejects_empty_file() {
        assert!(matches!(
            SourceLogCoordinate::new("", 0),
            Err(CoordinateError::EmptyFile)
        ));
        assert!(matches!(
            SourceLogCoordinate::new("   ", 42),
            Err(CoordinateError::EmptyFile)
        ));
    }

    #[test]
    fn test_from_status_rejects_negative_position() {
        assert!(matches!(
            SourceLogCoordinate::from_status("binlog.000001", -1),
            Err(CoordinateError::NegativePosition(-1))
        ));
    }

    #[test]
    fn test_coordinate_accepts_zero_position() {
        let coordinate = SourceLogCoordinate::new("binlog.000001", 0).unwrap();
        assert_eq!(coordinate.position, 0);
    }

    #[test]
    fn test_coordinate_ordering_within_file() {
        let earlier = SourceLogCoordinate::new("binlog.000001", 100).unwrap();
        let later = SourceLogCoordinate::new("binlog.000001", 200).unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_coordinate_ordering_across_files() {
        let earlier = SourceLogCoordinate::new("binlog.000009", 9000).unwrap();
        let later = SourceLogCoordinate::new("binlog.000010", 4).unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_coordinate_display() {
        let coordinate = SourceLogCoordinate::new("binlog.000042", 1234).unwrap();
        assert_eq!(coordinate.to_string(), "binlog.000042:1234");
    }
}
