// 🕒 Environment - as-of date and process identifier
//
// Both values are read once per pass and stamped on every output row of
// that pass.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Per-pass values taken from the host environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStamp {
    pub as_of_date: NaiveDate,
    pub process_id: u32,
}

pub trait EnvironmentProvider {
    /// Current date
    fn as_of_date(&self) -> NaiveDate;

    /// Identifier of the running process
    fn process_id(&self) -> u32;

    /// Snapshot both values at once
    fn stamp(&self) -> RunStamp {
        RunStamp {
            as_of_date: self.as_of_date(),
            process_id: self.process_id(),
        }
    }
}

/// Local wall clock and OS process id
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn as_of_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }
}

/// Fixed values, for reproducible runs and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedEnvironment {
    pub stamp: RunStamp,
}

impl FixedEnvironment {
    pub fn new(as_of_date: NaiveDate, process_id: u32) -> Self {
        FixedEnvironment {
            stamp: RunStamp {
                as_of_date,
                process_id,
            },
        }
    }
}

impl EnvironmentProvider for FixedEnvironment {
    fn as_of_date(&self) -> NaiveDate {
        self.stamp.as_of_date
    }

    fn process_id(&self) -> u32 {
        self.stamp.process_id
    }
}
