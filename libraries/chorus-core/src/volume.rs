//! Volume range validation
//!
//! The backend owns the actual level; this module only decides whether a
//! requested level may be applied.

use crate::error::{ChorusError, Result};
use serde::{Deserialize, Serialize};

/// Inclusive range of volumes participants may request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeRange {
    /// Lowest accepted level (default: 0.01)
    pub lowest: f32,

    /// Highest accepted level (default: 0.8)
    pub highest: f32,
}

impl VolumeRange {
    pub fn new(lowest: f32, highest: f32) -> Self {
        Self { lowest, highest }
    }

    pub fn contains(&self, level: f32) -> bool {
        level >= self.lowest && level <= self.highest
    }

    /// Parse a participant's argument into an accepted level
    ///
    /// Unparsable and out-of-range input both report the range.
    pub fn parse(&self, input: &str) -> Result<f32> {
        match input.trim().parse::<f32>() {
            Ok(level) if self.contains(level) => Ok(level),
            _ => Err(self.out_of_range()),
        }
    }

    fn out_of_range(&self) -> ChorusError {
        ChorusError::VolumeOutOfRange {
            lowest: self.lowest,
            highest: self.highest,
        }
    }
}

impl Default for VolumeRange {
    fn default() -> Self {
        Self {
            lowest: 0.01,
            highest: 0.8,
        }
    }
}
