use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::FieldError;

pub const MIN_PASSWORD_LEN: usize = 8;

const PASSWORD_MASK: &str = "***";

/// User entity.
///
/// The primary key is generated by the store since a user may change
/// their email address. Email is unique amongst all users. Password is
/// expected to arrive already hashed (base64 digest), only its length
/// is checked here.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl User {
    /// New record, id assigned on save.
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            firstname: firstname.into(),
            lastname: lastname.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Rehydrate a stored record.
    pub fn with_id(
        id: i64,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(firstname, lastname, email, password)
        }
    }

    /// Checks every field constraint and reports all violations at once.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.firstname.is_empty() {
            errors.push(FieldError::new("firstname", "may not be empty"));
        }
        if self.lastname.is_empty() {
            errors.push(FieldError::new("lastname", "may not be empty"));
        }
        if self.email.is_empty() {
            errors.push(FieldError::new("email", "may not be empty"));
        } else if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "not a well-formed email address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("length must be at least {MIN_PASSWORD_LEN}"),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

// id is left out: the same logical user is compared before and after the
// store assigns one.
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.firstname == other.firstname
            && self.lastname == other.lastname
            && self.email == other.email
            && self.password == other.password
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
        self.firstname.hash(state);
        self.lastname.hash(state);
        self.password.hash(state);
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("password", &PASSWORD_MASK)
            .finish()
    }
}
