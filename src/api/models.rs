// Wire types for the analytics service
//
// Request bodies match what the server expects field-for-field (including the
// camelCase keys on the user-apps and feature endpoints). Response types are
// lenient: analytics fields are optional or defaulted so a partial payload
// deserializes instead of failing the page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An app as returned by catalog search and stored as a selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub icon: String,
}

// ── Auth ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// Result of a signup attempt
///
/// A 400 with serializer errors is a normal outcome of the form flow, not an
/// ApiError: the field messages are surfaced next to their inputs.
#[derive(Debug)]
pub enum SignupOutcome {
    Created,
    FieldErrors(BTreeMap<String, String>),
}

/// Collect {"field": ["msg", ...]} pairs from a serializer error body
///
/// Keys that carry a form-wide message (message/error/detail/non_field_errors)
/// are left for the generic extractor.
pub fn extract_field_errors(body: &serde_json::Value) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let Some(map) = body.as_object() else {
        return fields;
    };

    for (key, value) in map {
        if matches!(
            key.as_str(),
            "message" | "error" | "detail" | "non_field_errors"
        ) {
            continue;
        }
        let message = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(list) => list
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            _ => continue,
        };
        if !message.is_empty() {
            fields.insert(key.clone(), message);
        }
    }
    fields
}

// ── Payment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub payment_successful: bool,
}

#[derive(Debug, Serialize)]
pub struct BillingAddress {
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Card and billing fields sent for validation
///
/// Only the last four card digits leave the client.
#[derive(Debug, Serialize)]
pub struct ValidatePaymentRequest {
    pub card_last_four: String,
    pub amount: f64,
    pub cardholder_name: String,
    pub billing_address: BillingAddress,
}

#[derive(Debug, Deserialize)]
pub struct ValidatePaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdatePaymentRequest {
    pub payment_successful: bool,
    pub payment_amount: f64,
    /// RFC 3339 timestamp of the successful charge
    pub payment_date: String,
}

// ── User apps ───────────────────────────────────────────────────────────────

/// Body of the user-apps POST; the server expects camelCase `appId`
#[derive(Debug, Serialize)]
pub struct UserAppRequest {
    #[serde(rename = "appId")]
    pub app_id: i64,
    pub name: String,
    pub icon: String,
    pub publisher: String,
    /// Always true: a user has at most one current app
    pub replace_previous: bool,
}

impl UserAppRequest {
    pub fn replace(app: &AppEntry) -> Self {
        Self {
            app_id: app.id,
            name: app.name.clone(),
            icon: app.icon.clone(),
            publisher: app.publisher.clone(),
            replace_previous: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserAppDeleteRequest {
    #[serde(rename = "appId")]
    pub app_id: i64,
}

// ── Analytics envelopes ─────────────────────────────────────────────────────

/// All three analytics endpoints wrap their payload in {"data": ...}
#[derive(Debug, Deserialize)]
pub struct Envelope<T: Default> {
    #[serde(default)]
    pub data: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingBucket {
    #[serde(default)]
    pub ratings_count: Option<u64>,
    #[serde(default)]
    pub perc: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentBucket {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub cnt: Option<u64>,
    #[serde(default)]
    pub perc: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthBucket {
    #[serde(default)]
    pub month_abbrev: String,
    #[serde(default)]
    pub cnt: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireReview {
    #[serde(default)]
    pub review_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub review_created_at: String,
    #[serde(default)]
    pub ratings: u8,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sentiment: String,
}

/// Dashboard endpoint payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardData {
    /// Server sets this when real review data is attached
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub total_reviews: Option<u64>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub app_summary: Option<String>,
    /// Five buckets ordered 5-star to 1-star
    #[serde(default)]
    pub ratings_distribution: Vec<RatingBucket>,
    /// Three buckets ordered negative, neutral, positive
    #[serde(default)]
    pub sentiment_distribution: Vec<SentimentBucket>,
    #[serde(default)]
    pub monthly_distribution: Vec<MonthBucket>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordCount {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordFrequency {
    #[serde(default)]
    pub positive: Vec<WordCount>,
    #[serde(default)]
    pub neutral: Vec<WordCount>,
    #[serde(default)]
    pub negative: Vec<WordCount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassAverages {
    #[serde(default)]
    pub positive: Option<f64>,
    #[serde(default)]
    pub neutral: Option<f64>,
    #[serde(default)]
    pub negative: Option<f64>,
}

/// Sentiment-analysis endpoint payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentData {
    /// Three buckets ordered negative, neutral, positive; each tagged with
    /// its class name for order-independent lookup
    #[serde(default)]
    pub sentiments: Vec<SentimentBucket>,
    #[serde(default)]
    pub total_reviews: Option<u64>,
    #[serde(default)]
    pub word_frequency: Option<WordFrequency>,
    #[serde(default)]
    pub average_rating: Option<ClassAverages>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingFeature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub change: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub votes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BugReportMonth {
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub crashes: u64,
    #[serde(default)]
    pub bugs: u64,
}

/// Feature-identification endpoint payload (server uses camelCase keys)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureData {
    #[serde(rename = "totalFeatures", default)]
    pub total_features: Option<u64>,
    #[serde(rename = "trendingFeatures", default)]
    pub trending_features: Vec<TrendingFeature>,
    #[serde(rename = "featureRequests", default)]
    pub feature_requests: Vec<FeatureRequest>,
    /// Rows keyed by "month" plus one dynamic key per tracked feature
    #[serde(rename = "featureTrends", default)]
    pub feature_trends: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(rename = "bugReports", default)]
    pub bug_reports: Vec<BugReportMonth>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_tolerates_missing_icon() {
        let raw = r#"[{"id": 42, "name": "My App", "publisher": "Acme"}]"#;
        let apps: Vec<AppEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(apps[0].id, 42);
        assert_eq!(apps[0].icon, "");
    }

    #[test]
    fn user_app_request_uses_camel_case_and_replaces() {
        let app = AppEntry {
            id: 7,
            name: "Notes".into(),
            publisher: "Acme".into(),
            icon: "🗒".into(),
        };
        let body = serde_json::to_value(UserAppRequest::replace(&app)).unwrap();
        assert_eq!(body["appId"], 7);
        assert_eq!(body["replace_previous"], true);
    }

    #[test]
    fn dashboard_envelope_with_partial_payload() {
        let raw = r#"{"data": {"flag": true, "total_reviews": 120,
            "monthly_distribution": [{"month_abbrev": "Jan", "cnt": 40}]}}"#;
        let envelope: Envelope<DashboardData> = serde_json::from_str(raw).unwrap();
        assert!(envelope.data.flag);
        assert_eq!(envelope.data.total_reviews, Some(120));
        assert_eq!(envelope.data.monthly_distribution.len(), 1);
        // Absent fields deserialize to their defaults rather than failing
        assert!(envelope.data.reviews.is_empty());
        assert_eq!(envelope.data.average_rating, None);
    }

    #[test]
    fn empty_envelope_is_all_defaults() {
        let envelope: Envelope<SentimentData> = serde_json::from_str("{}").unwrap();
        assert!(envelope.data.sentiments.is_empty());
        assert_eq!(envelope.data.total_reviews, None);
    }

    #[test]
    fn feature_data_reads_camel_case_keys() {
        let raw = r#"{"totalFeatures": 10,
            "trendingFeatures": [{"name": "Dark Mode", "count": 5, "change": 1.5}],
            "featureTrends": [{"month": "Jan", "Dark Mode": 200}]}"#;
        let data: FeatureData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.total_features, Some(10));
        assert_eq!(data.trending_features[0].name, "Dark Mode");
        assert_eq!(data.feature_trends[0]["Dark Mode"], 200);
    }

    #[test]
    fn field_errors_extracted_from_serializer_body() {
        let body = serde_json::json!({
            "username": ["A user with that username already exists."],
            "password": ["This password is too short.", "This password is too common."],
            "detail": "ignored here"
        });
        let fields = extract_field_errors(&body);
        assert_eq!(fields.len(), 2);
        assert!(fields["password"].contains("too short"));
        assert!(!fields.contains_key("detail"));
    }
}
