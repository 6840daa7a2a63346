use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::services::untis_service::UntisService;
use crate::student::{Student, StudentClient};

/// A school class ("Klasse") as listed by WebUntis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Class {
    id: ClassId,
    name: String,
    #[serde(rename = "longName", default)]
    long_name: String,
}

impl Class {
    pub fn new(id: ClassId, name: String, long_name: String) -> Self {
        Self {
            id,
            name,
            long_name,
        }
    }

    pub fn id(&self) -> &ClassId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Label shown when picking a class, e.g. `5a (12)`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug)]
pub struct ClassClient<'a, Service> {
    untis: &'a Client<Service>,
    class: &'a Class,
}

impl<'a, Service> Clone for ClassClient<'a, Service> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, Service> Copy for ClassClient<'a, Service> {}

impl<'a, Service: UntisService> ClassClient<'a, Service> {
    pub fn new(untis: &'a Client<Service>, class: &'a Class) -> Self {
        Self { untis, class }
    }

    pub fn with_student<'s>(&self, student: &'s Student) -> StudentClient<'s, Service>
    where
        'a: 's,
    {
        StudentClient::new(self.untis, student)
    }

    pub async fn students(&self) -> Result<Vec<Student>> {
        self.untis.get_students(self.class.id()).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId {
    id: u64,
}

impl ClassId {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn as_u64(self) -> u64 {
        self.id
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.id.fmt(f)
    }
}
