//! Target size parsing.
//!
//! A target size is written as `<digits><unit>` where the unit is one of
//! `K`, `M` or `G` (case-insensitive). Units are binary: `1K` is 1024 bytes.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Errors produced while parsing a target size string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeSpecError {
    #[error("target size is required (e.g. '500K', '5M', '2G')")]
    Missing,

    #[error("invalid target size '{0}': expected digits followed by K, M or G")]
    Malformed(String),

    #[error("target size '{0}' must be greater than zero")]
    Zero(String),

    #[error("target size '{0}' is too large")]
    Overflow(String),
}

/// Size unit multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Kibi,
    Mebi,
    Gibi,
}

impl SizeUnit {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'K' => Some(SizeUnit::Kibi),
            'M' => Some(SizeUnit::Mebi),
            'G' => Some(SizeUnit::Gibi),
            _ => None,
        }
    }

    /// Number of bytes in one unit.
    pub fn multiplier(&self) -> u64 {
        match self {
            SizeUnit::Kibi => KIB,
            SizeUnit::Mebi => MIB,
            SizeUnit::Gibi => GIB,
        }
    }

    fn suffix(&self) -> char {
        match self {
            SizeUnit::Kibi => 'K',
            SizeUnit::Mebi => 'M',
            SizeUnit::Gibi => 'G',
        }
    }
}

/// A positive byte count parsed from a human-friendly size string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    amount: u64,
    unit: SizeUnit,
    bytes: u64,
}

impl SizeSpec {
    /// Parse an optional size string. `None` is an error, never a default.
    pub fn parse_opt(input: Option<&str>) -> Result<Self, SizeSpecError> {
        match input {
            Some(s) => s.parse(),
            None => Err(SizeSpecError::Missing),
        }
    }

    /// Total size in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn unit(&self) -> SizeUnit {
        self.unit
    }
}

impl FromStr for SizeSpec {
    type Err = SizeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SizeSpecError::Missing);
        }

        let mut chars = trimmed.chars();
        let unit = chars
            .next_back()
            .and_then(SizeUnit::from_char)
            .ok_or_else(|| SizeSpecError::Malformed(s.to_string()))?;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SizeSpecError::Malformed(s.to_string()));
        }

        let amount: u64 = digits
            .parse()
            .map_err(|_| SizeSpecError::Overflow(s.to_string()))?;
        if amount == 0 {
            return Err(SizeSpecError::Zero(s.to_string()));
        }

        let bytes = amount
            .checked_mul(unit.multiplier())
            .ok_or_else(|| SizeSpecError::Overflow(s.to_string()))?;

        tracing::debug!("Parsed target size: {} -> {} bytes", trimmed, bytes);

        Ok(Self {
            amount,
            unit,
            bytes,
        })
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

/// Format a byte count for report lines (e.g. `1.50 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_binary_units() {
        assert_eq!("500K".parse::<SizeSpec>().unwrap().bytes(), 500 * 1024);
        assert_eq!("5M".parse::<SizeSpec>().unwrap().bytes(), 5 * 1024 * 1024);
        assert_eq!(
            "2G".parse::<SizeSpec>().unwrap().bytes(),
            2 * 1024 * 1024 * 1024
        );
    }

    #[test]
    fn unit_is_case_insensitive() {
        assert_eq!("5m".parse::<SizeSpec>().unwrap().bytes(), 5 * MIB);
        assert_eq!(" 64k ".parse::<SizeSpec>().unwrap().bytes(), 64 * KIB);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<SizeSpec>(), Err(SizeSpecError::Missing));
        assert!(matches!(
            "5".parse::<SizeSpec>(),
            Err(SizeSpecError::Malformed(_))
        ));
        assert!(matches!(
            "5X".parse::<SizeSpec>(),
            Err(SizeSpecError::Malformed(_))
        ));
        assert!(matches!(
            "1.5M".parse::<SizeSpec>(),
            Err(SizeSpecError::Malformed(_))
        ));
        assert!(matches!(
            "M".parse::<SizeSpec>(),
            Err(SizeSpecError::Malformed(_))
        ));
        assert!(matches!(
            "-5M".parse::<SizeSpec>(),
            Err(SizeSpecError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_missing_and_zero() {
        assert_eq!(SizeSpec::parse_opt(None), Err(SizeSpecError::Missing));
        assert!(matches!(
            "0K".parse::<SizeSpec>(),
            Err(SizeSpecError::Zero(_))
        ));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            "99999999999999999999G".parse::<SizeSpec>(),
            Err(SizeSpecError::Overflow(_))
        ));
        assert!(matches!(
            "17179869184G".parse::<SizeSpec>(),
            Err(SizeSpecError::Overflow(_))
        ));
    }

    #[test]
    fn display_round_trips_the_input_form() {
        let spec: SizeSpec = "2m".parse().unwrap();
        assert_eq!(spec.to_string(), "2M");
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * MIB / 2), "1.50 MiB");
    }
}
