// Card-payment form
//
// Validation matches the card fields the service expects; only the last four
// digits of the card number are ever sent. The submit sequence is strictly
// sequential: validate-payment, update-payment, local latch, then a short
// user-visible confirmation pause before navigating on.

use super::FieldErrors;
use crate::api::csrf::{self, CsrfToken};
use crate::api::models::{BillingAddress, UpdatePaymentRequest, ValidatePaymentRequest};
use crate::api::{ApiClient, ApiError};
use crate::store::SelectionStore;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Subscription price charged on this form
const PLAN_AMOUNT: f64 = 29.00;

/// Confirmation pause after a successful payment, before navigation
pub const CONFIRMATION_PAUSE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Default)]
pub struct PaymentForm {
    pub cardholder_name: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvc: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

fn card_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{16}$").unwrap())
}

fn expiry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0[1-9]|1[0-2])/?([0-9]{2})$").unwrap())
}

fn cvc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{3,4}$").unwrap())
}

/// Pre-flight validation; any entry blocks submission
pub fn validate(form: &PaymentForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.cardholder_name.trim().is_empty() {
        errors.insert("cardholder_name", "Cardholder name is required");
    }

    let digits: String = form.card_number.chars().filter(|c| !c.is_whitespace()).collect();
    if !card_number_re().is_match(&digits) {
        errors.insert("card_number", "Valid card number required");
    }

    if !expiry_re().is_match(&form.expiry_date) {
        errors.insert("expiry_date", "MM/YY format required");
    }

    if !cvc_re().is_match(&form.cvc) {
        errors.insert("cvc", "Valid CVC required");
    }

    if form.address_line.trim().is_empty() {
        errors.insert("address_line", "Address is required");
    }
    if form.city.trim().is_empty() {
        errors.insert("city", "City is required");
    }
    if form.postal_code.trim().is_empty() {
        errors.insert("postal_code", "Postal code is required");
    }

    errors
}

/// Submit the payment
///
/// On success the payment flag is latched locally so later loads skip the
/// status round trip. The caller records the payment on the gate, waits
/// CONFIRMATION_PAUSE, and then navigates to app selection.
pub async fn submit(
    api: &ApiClient,
    token: &CsrfToken,
    store: &SelectionStore,
    form: &PaymentForm,
) -> Result<(), ApiError> {
    let digits: String = form.card_number.chars().filter(|c| !c.is_whitespace()).collect();
    let request = ValidatePaymentRequest {
        // Digits are ASCII, byte slicing is safe
        card_last_four: digits[digits.len().saturating_sub(4)..].to_string(),
        amount: PLAN_AMOUNT,
        cardholder_name: form.cardholder_name.clone(),
        billing_address: BillingAddress {
            address_line: form.address_line.clone(),
            city: form.city.clone(),
            state: form.state.clone(),
            postal_code: form.postal_code.clone(),
        },
    };

    let result = csrf::with_token(token, api, |t| {
        let request = &request;
        async move { api.validate_payment(request, &t).await }
    })
    .await?;

    if !result.success {
        return Err(ApiError::Http {
            status: 402,
            message: result
                .message
                .unwrap_or_else(|| "Payment validation failed".to_string()),
        });
    }

    let update = UpdatePaymentRequest {
        payment_successful: true,
        payment_amount: PLAN_AMOUNT,
        payment_date: chrono::Utc::now().to_rfc3339(),
    };
    csrf::with_token(token, api, |t| {
        let update = &update;
        async move { api.update_payment(update, &t).await }
    })
    .await?;

    // Latch locally so subsequent loads skip the status round trip
    if let Err(e) = store.set_payment_successful() {
        tracing::warn!("Could not persist payment flag: {}", e);
    }
    tracing::info!("Payment successful");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> PaymentForm {
        PaymentForm {
            cardholder_name: "Ada Lovelace".into(),
            card_number: "4242 4242 4242 4242".into(),
            expiry_date: "04/27".into(),
            cvc: "123".into(),
            address_line: "1 Analytical Way".into(),
            city: "London".into(),
            state: "".into(),
            postal_code: "N1 7AA".into(),
        }
    }

    #[test]
    fn accepts_a_conforming_form() {
        assert!(validate(&valid_form()).is_empty());
    }

    #[test]
    fn card_number_ignores_spaces_but_requires_16_digits() {
        let mut form = valid_form();
        form.card_number = "4242424242424242".into();
        assert!(validate(&form).is_empty());

        form.card_number = "4242 4242 4242".into();
        assert_eq!(
            validate(&form).get("card_number"),
            Some("Valid card number required")
        );
    }

    #[test]
    fn expiry_accepts_mm_yy_with_or_without_slash() {
        let mut form = valid_form();
        form.expiry_date = "1227".into();
        assert!(validate(&form).is_empty());

        form.expiry_date = "13/27".into();
        assert_eq!(
            validate(&form).get("expiry_date"),
            Some("MM/YY format required")
        );

        form.expiry_date = "00/27".into();
        assert!(validate(&form).get("expiry_date").is_some());
    }

    #[test]
    fn cvc_must_be_three_or_four_digits() {
        let mut form = valid_form();
        form.cvc = "12".into();
        assert!(validate(&form).get("cvc").is_some());

        form.cvc = "1234".into();
        assert!(validate(&form).is_empty());
    }

    #[test]
    fn billing_fields_are_required_except_state() {
        let mut form = valid_form();
        form.address_line = " ".into();
        form.city = "".into();
        form.postal_code = "".into();

        let errors = validate(&form);
        assert!(errors.get("address_line").is_some());
        assert!(errors.get("city").is_some());
        assert!(errors.get("postal_code").is_some());
        // State stays optional
        assert!(errors.get("state").is_none());
    }
}
