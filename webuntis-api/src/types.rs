//! Holds small types that describe where and when to query, rather than what WebUntis returns.

use std::fmt;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::util::untis_date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institution {
    server: String,
    school: String,
}

impl Institution {
    pub fn new(server: String, school: String) -> Self {
        Self { server, school }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn school(&self) -> &str {
        &self.school
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} on {}", self.school, self.server)
    }
}

/// Inclusive range of calendar days that absence and event queries cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("reporting window starts on {start}, after it ends on {end}");
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub(crate) fn rpc_params(&self) -> Value {
        json!({
            "startDate": untis_date(self.start),
            "endDate": untis_date(self.end),
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}
