use std::fmt;

use crate::error::AppError;

/// Appointment date as entered on the command line: `MM-DD-YYYY`,
/// zero-padded to widths 2/2/4.
///
/// Validation is shape-only: month 1-12, day 1-31, year nonzero. There is
/// deliberately no full calendar check (02-31 passes), matching the wire
/// contract of the scheduling commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDate {
    pub month: u32,
    pub day: u32,
    pub year: u32,
}

impl ScheduleDate {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let bad = || AppError::Validation(format!("date must be MM-DD-YYYY, got '{input}'"));

        let fields: Vec<&str> = input.split('-').collect();
        if fields.len() != 3 {
            return Err(bad());
        }
        if fields[0].len() != 2 || fields[1].len() != 2 || fields[2].len() != 4 {
            return Err(bad());
        }

        let month: u32 = fields[0].parse().map_err(|_| bad())?;
        let day: u32 = fields[1].parse().map_err(|_| bad())?;
        let year: u32 = fields[2].parse().map_err(|_| bad())?;

        if month == 0 || day == 0 || year == 0 {
            return Err(bad());
        }
        if month > 12 || day > 31 {
            return Err(bad());
        }

        Ok(Self { month, day, year })
    }

    /// Canonical storage key, `YYYY-MM-DD`. Dates are compared by string
    /// equality in the database, so every path must go through this.
    pub fn storage_key(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for ScheduleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.month, self.day, self.year)
    }
}
