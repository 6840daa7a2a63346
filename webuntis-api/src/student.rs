use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::absence::Absence;
use crate::client::Client;
use crate::event::ClassregEvent;
use crate::services::untis_service::UntisService;
use crate::types::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Student {
    id: StudentId,
    #[serde(rename = "longName")]
    surname: String,
    #[serde(rename = "foreName")]
    forename: String,
}

impl Student {
    pub fn id(&self) -> &StudentId {
        &self.id
    }

    /// `surname, forename`, the form used to sort and label report rows.
    pub fn full_name(&self) -> String {
        format!("{}, {}", self.surname, self.forename)
    }
}

pub struct StudentClient<'a, Service> {
    untis: &'a Client<Service>,
    student: &'a Student,
}

impl<'a, Service: UntisService> StudentClient<'a, Service> {
    pub fn new(untis: &'a Client<Service>, student: &'a Student) -> Self {
        Self { untis, student }
    }

    pub fn student(&self) -> &'a Student {
        self.student
    }

    pub async fn absences(&self, window: &DateRange) -> Result<Vec<Absence>> {
        self.untis.get_absences(self.student.id(), window).await
    }

    pub async fn events(&self, window: &DateRange) -> Result<Vec<ClassregEvent>> {
        self.untis.get_events(self.student.id(), window).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId {
    id: u64,
}

impl StudentId {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn as_u64(self) -> u64 {
        self.id
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.id.fmt(f)
    }
}
