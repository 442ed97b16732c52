// Form flows
//
// Each form validates locally first - field-level messages block submission
// before any network call - and then runs its submit sequence through the
// shared API client and token provider. Errors land in local UI state, never
// in a global handler.

pub mod login;
pub mod payment;
pub mod signup;

use std::collections::BTreeMap;

/// Field-level validation and backend errors, keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field, keeping the first message per field
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Whether the form may be submitted
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<BTreeMap<String, String>> for FieldErrors {
    fn from(errors: BTreeMap<String, String>) -> Self {
        Self { errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.insert("password", "too short");
        errors.insert("password", "needs a digit");
        assert_eq!(errors.get("password"), Some("too short"));
    }

    #[test]
    fn empty_means_submittable() {
        let errors = FieldErrors::new();
        assert!(errors.is_empty());
        assert_eq!(errors.get("anything"), None);
    }
}
