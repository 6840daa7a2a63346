use std::fmt;

use serde_json::{Value, json};

use crate::util::CLIENT_NAME;

#[derive(Clone)]
pub struct Creds {
    user: String,
    password: String,
}

impl Creds {
    pub fn new(user: String, password: String) -> Self {
        Self { user, password }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn authenticate_params(&self) -> Value {
        json!({
            "user": self.user,
            "password": self.password,
            "client": CLIENT_NAME,
        })
    }
}

impl fmt::Debug for Creds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creds")
            .field("user", &self.user)
            .field("password", &"<hidden>")
            .finish()
    }
}
