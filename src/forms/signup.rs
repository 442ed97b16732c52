// Sign-up form
//
// Client-side rules mirror the server's serializer so most rejections never
// leave the terminal. Serializer errors that do come back are merged into
// the same field-error map the local rules use.

use super::FieldErrors;
use crate::api::csrf::{self, CsrfToken};
use crate::api::models::{SignupOutcome, SignupRequest};
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// Pre-flight validation; any entry blocks submission
pub fn validate(form: &SignupForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.username.trim().is_empty() {
        errors.insert("username", "Username is required");
    } else if form.username.len() < 3 {
        errors.insert("username", "Username must be at least 3 characters");
    }

    if !form.email.contains('@') {
        errors.insert("email", "Please enter a valid email address");
    }

    if form.password.len() < 8 {
        errors.insert("password", "Password must be at least 8 characters");
    } else if !form.password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.insert("password", "Password must contain at least one uppercase letter");
    } else if !form.password.chars().any(|c| c.is_ascii_digit()) {
        errors.insert("password", "Password must contain at least one number");
    } else if !form.password.chars().any(|c| "!@#$%^&*".contains(c)) {
        errors.insert("password", "Password must contain at least one special character");
    }

    if form.password != form.password2 {
        errors.insert("password2", "Passwords do not match");
    }

    errors
}

/// Outcome of a submit attempt that reached the server
#[derive(Debug)]
pub enum SignupResult {
    /// Account created; the user can sign in now
    Created,
    /// The serializer rejected specific fields
    Rejected(FieldErrors),
}

/// Submit the form; email is lowercased on the wire like the web client does
pub async fn submit(
    api: &ApiClient,
    token: &CsrfToken,
    form: &SignupForm,
) -> Result<SignupResult, ApiError> {
    let request = SignupRequest {
        username: form.username.clone(),
        email: form.email.to_lowercase(),
        password: form.password.clone(),
        password2: form.password2.clone(),
    };

    let outcome = csrf::with_token(token, api, |t| {
        let request = &request;
        async move { api.signup(request, &t).await }
    })
    .await?;

    Ok(match outcome {
        SignupOutcome::Created => SignupResult::Created,
        SignupOutcome::FieldErrors(fields) => SignupResult::Rejected(fields.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> SignupForm {
        SignupForm {
            username: "reviewer".into(),
            email: "user@example.com".into(),
            password: "Sup3rSecret!".into(),
            password2: "Sup3rSecret!".into(),
        }
    }

    #[test]
    fn accepts_a_conforming_form() {
        assert!(validate(&valid_form()).is_empty());
    }

    #[test]
    fn username_rules() {
        let mut form = valid_form();
        form.username = "  ".into();
        assert_eq!(validate(&form).get("username"), Some("Username is required"));

        form.username = "ab".into();
        assert_eq!(
            validate(&form).get("username"),
            Some("Username must be at least 3 characters")
        );
    }

    #[test]
    fn password_rules_fire_in_order() {
        let mut form = valid_form();

        form.password = "short".into();
        form.password2 = form.password.clone();
        assert!(validate(&form).get("password").unwrap().contains("8 characters"));

        form.password = "alllowercase1!".into();
        form.password2 = form.password.clone();
        assert!(validate(&form).get("password").unwrap().contains("uppercase"));

        form.password = "NoDigitsHere!".into();
        form.password2 = form.password.clone();
        assert!(validate(&form).get("password").unwrap().contains("number"));

        form.password = "NoSpecials123".into();
        form.password2 = form.password.clone();
        assert!(validate(&form).get("password").unwrap().contains("special"));
    }

    #[test]
    fn mismatched_confirmation_is_flagged() {
        let mut form = valid_form();
        form.password2 = "Different1!".into();
        assert_eq!(
            validate(&form).get("password2"),
            Some("Passwords do not match")
        );
    }
}
