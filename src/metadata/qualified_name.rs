use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Identifier characters accepted by the catalog for database and object names
static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_$]+$").expect("identifier pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Empty {0} name")]
    Empty(&'static str),
    #[error("Invalid {part} name '{name}'")]
    InvalidIdentifier { part: &'static str, name: String },
    #[error("Too many name parts in '{0}'")]
    TooManyParts(String),
    #[error("Name '{0}' is not qualified with a database")]
    MissingDatabase(String),
}

/// A `(database, object)` pair identifying one catalog object.
///
/// Both parts are lowercased on construction so that lookups against the
/// catalog and the registry agree regardless of how a statement spelled them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    database: String,
    object: String,
}

impl QualifiedName {
    pub fn new(database: &str, object: &str) -> Result<Self, NameError> {
        Ok(Self {
            database: normalize("database", database)?,
            object: normalize("object", object)?,
        })
    }

    /// Parse `db.name` or a bare `name`, resolving the latter against `default_database`
    pub fn parse(name: &str, default_database: &str) -> Result<Self, NameError> {
        let mut parts = name.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(object), None, None) => Self::new(default_database, object),
            (Some(database), Some(object), None) => Self::new(database, object),
            _ => Err(NameError::TooManyParts(name.to_string())),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn object(&self) -> &str {
        &self.object
    }
}

fn normalize(part: &'static str, raw: &str) -> Result<String, NameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty(part));
    }
    if !IDENTIFIER_REGEX.is_match(trimmed) {
        return Err(NameError::InvalidIdentifier {
            part,
            name: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_ascii_lowercase())
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.object)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let Some((database, object)) = value.split_once('.') else {
            return Err(NameError::MissingDatabase(value));
        };
        Self::new(database, object)
    }
}
