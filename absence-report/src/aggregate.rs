//! Turning one student's absences and class register events into a report row.
//!
//! Hours are summed over every absence record, even several on the same day. Days are counted as
//! distinct dates, tracked separately for excused and unexcused records; a date that has both
//! counts once towards the total. Late arrivals add penalty days to both day counts: the 8th late
//! arrival adds one day, and so does every 6th one after that.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use webuntis_api::absence::Absence;
use webuntis_api::event::ClassregEvent;

/// Number of late arrivals that first adds an unexcused day.
pub const FIRST_PENALTY_AT: usize = 8;
/// Further late arrivals needed for each additional unexcused day.
pub const PENALTY_INTERVAL: usize = 6;

pub const TARDY_STEM: &str = "verspät";

/// Decides whether a class register entry records a late arrival.
pub trait TardinessRule {
    fn is_tardy(&self, event: &ClassregEvent) -> bool;
}

impl<F: Fn(&ClassregEvent) -> bool> TardinessRule for F {
    fn is_tardy(&self, event: &ClassregEvent) -> bool {
        self(event)
    }
}

/// Case-insensitive substring match on the entry text.
#[derive(Debug, Clone)]
pub struct TextContains {
    needle: String,
}

impl TextContains {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }
}

impl Default for TextContains {
    fn default() -> Self {
        Self::new(TARDY_STEM)
    }
}

impl TardinessRule for TextContains {
    fn is_tardy(&self, event: &ClassregEvent) -> bool {
        event.text().to_lowercase().contains(&self.needle)
    }
}

pub fn penalty_days(tardies: usize) -> usize {
    if tardies < FIRST_PENALTY_AT {
        0
    } else {
        1 + (tardies - FIRST_PENALTY_AT) / PENALTY_INTERVAL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    name: String,
    total_hours: i64,
    unexcused_hours: i64,
    total_days: usize,
    unexcused_days: usize,
    tardies: usize,
}

impl StudentSummary {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_hours(&self) -> i64 {
        self.total_hours
    }

    pub fn unexcused_hours(&self) -> i64 {
        self.unexcused_hours
    }

    pub fn total_days(&self) -> usize {
        self.total_days
    }

    pub fn unexcused_days(&self) -> usize {
        self.unexcused_days
    }

    pub fn tardies(&self) -> usize {
        self.tardies
    }

    pub(crate) fn cells(&self) -> [String; 6] {
        [
            self.name.clone(),
            self.total_hours.to_string(),
            self.unexcused_hours.to_string(),
            self.total_days.to_string(),
            self.unexcused_days.to_string(),
            self.tardies.to_string(),
        ]
    }
}

#[derive(Debug, Default)]
struct Tally {
    hours: i64,
    days: BTreeSet<NaiveDate>,
}

impl Tally {
    fn add(&mut self, absence: &Absence) {
        self.hours += absence.lesson_count();
        self.days.insert(absence.date());
    }
}

pub fn summarize(
    name: String,
    absences: &[Absence],
    events: &[ClassregEvent],
    rule: &impl TardinessRule,
) -> StudentSummary {
    let mut excused = Tally::default();
    let mut unexcused = Tally::default();
    for absence in absences {
        if absence.is_unexcused() {
            unexcused.add(absence);
        } else {
            excused.add(absence);
        }
    }

    let tardies = events.iter().filter(|event| rule.is_tardy(event)).count();
    let penalty = penalty_days(tardies);
    let absent_days = excused.days.union(&unexcused.days).count();

    StudentSummary {
        name,
        total_hours: excused.hours + unexcused.hours,
        unexcused_hours: unexcused.hours,
        total_days: absent_days + penalty,
        unexcused_days: unexcused.days.len() + penalty,
        tardies,
    }
}
