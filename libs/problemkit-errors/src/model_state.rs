//! Per-request validation state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Validation errors collected while binding a request, keyed by field path.
///
/// Serializes as a plain object mapping each field to its messages, e.g.
/// `{"email": ["Email is required"]}`. Messages keep insertion order per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelState {
    errors: BTreeMap<String, Vec<String>>,
}

impl ModelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error message for `field` ("email", "user.email", ...).
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Builder-style variant of [`ModelState::add_error`].
    #[must_use]
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add_error(field, message);
        self
    }

    /// True when no field has recorded an error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn errors_for(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    #[must_use]
    pub fn into_errors(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }
}

impl From<BTreeMap<String, Vec<String>>> for ModelState {
    fn from(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self { errors }
    }
}
