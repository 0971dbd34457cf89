//! Duration settings as entered by the user, in whole minutes.
//!
//! This is the only place duration bounds are enforced. The engine itself
//! accepts any positive number of seconds.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const FOCUS_MINUTES: RangeInclusive<u32> = 1..=60;
pub const BREAK_MINUTES: RangeInclusive<u32> = 1..=30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSettings {
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

impl DurationSettings {
    pub fn new(focus_minutes: u32, break_minutes: u32) -> Self {
        Self {
            focus_minutes,
            break_minutes,
        }
    }

    /// Check both values against their ranges, focus first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check("Focus time", self.focus_minutes, FOCUS_MINUTES)?;
        check("Break time", self.break_minutes, BREAK_MINUTES)?;
        Ok(())
    }

    /// Validate and convert to `(focus_secs, break_secs)`.
    pub fn to_seconds(&self) -> Result<(u64, u64), ValidationError> {
        self.validate()?;
        Ok((
            u64::from(self.focus_minutes) * 60,
            u64::from(self.break_minutes) * 60,
        ))
    }
}

impl Default for DurationSettings {
    fn default() -> Self {
        Self::new(25, 5)
    }
}

fn check(field: &'static str, value: u32, range: RangeInclusive<u32>) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
