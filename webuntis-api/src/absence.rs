use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::serde_as;

use crate::util::UntisDate;

/// One absence entry of a student: some lessons missed on one day.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    #[serde_as(as = "UntisDate")]
    date: NaiveDate,
    lesson_count: i64,
    #[serde(default)]
    excuse_status: ExcuseStatus,
}

impl Absence {
    pub fn new(date: NaiveDate, lesson_count: i64, excuse_status: ExcuseStatus) -> Self {
        Self {
            date,
            lesson_count,
            excuse_status,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn lesson_count(&self) -> i64 {
        self.lesson_count
    }

    pub fn excuse_status(&self) -> &ExcuseStatus {
        &self.excuse_status
    }

    pub fn is_unexcused(&self) -> bool {
        self.excuse_status.is_unexcused()
    }
}

/// Free-text excuse status. Only [`ExcuseStatus::UNEXCUSED`] is distinguished; any other value,
/// including none at all, counts as excused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ExcuseStatus {
    status: Option<String>,
}

impl ExcuseStatus {
    pub const UNEXCUSED: &'static str = "unentschuldigt";

    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
        }
    }

    pub fn unexcused() -> Self {
        Self::new(Self::UNEXCUSED)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_unexcused(&self) -> bool {
        self.as_str() == Some(Self::UNEXCUSED)
    }
}
