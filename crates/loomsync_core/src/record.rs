//! Shift records.

use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::span::RunSpan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Work shift of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    /// Day shift.
    Day,
    /// Night shift.
    Night,
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::Day => write!(f, "Day"),
            Shift::Night => write!(f, "Night"),
        }
    }
}

impl FromStr for Shift {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Day" => Ok(Shift::Day),
            "Night" => Ok(Shift::Night),
            other => Err(CoreError::InvalidShift {
                value: other.into(),
            }),
        }
    }
}

/// One shift observation for one machine.
///
/// The id is assigned once, by the device that created the record, and
/// never changes afterwards; every other field is mutable via update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable record identity.
    pub id: RecordId,
    /// Calendar date of the shift.
    pub date: NaiveDate,
    /// Day or night shift.
    pub shift: Shift,
    /// Machine identifier as shown on the factory floor.
    pub machine_no: String,
    /// Number of machine stops during the shift.
    pub stops: u32,
    /// Woven cloth length in meters.
    pub weft_meter: f64,
    /// Total elapsed shift time.
    pub total: RunSpan,
    /// Productive run time.
    pub run: RunSpan,
}

impl Record {
    /// Builds a record from a draft, assigning it the given id.
    #[must_use]
    pub fn from_draft(id: RecordId, draft: RecordDraft) -> Self {
        Self {
            id,
            date: draft.date,
            shift: draft.shift,
            machine_no: draft.machine_no,
            stops: draft.stops,
            weft_meter: draft.weft_meter,
            total: draft.total,
            run: draft.run,
        }
    }

    /// Validates field invariants that serde cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns an error if the cloth length is negative or not finite.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.weft_meter.is_finite() || self.weft_meter < 0.0 {
            return Err(CoreError::invalid_row(format!(
                "weft meter must be a non-negative number, got {}",
                self.weft_meter
            )));
        }
        Ok(())
    }
}

/// The caller-supplied fields of a new record, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Calendar date of the shift.
    pub date: NaiveDate,
    /// Day or night shift.
    pub shift: Shift,
    /// Machine identifier.
    pub machine_no: String,
    /// Number of machine stops.
    pub stops: u32,
    /// Woven cloth length in meters.
    pub weft_meter: f64,
    /// Total elapsed shift time.
    pub total: RunSpan,
    /// Productive run time.
    pub run: RunSpan,
}
