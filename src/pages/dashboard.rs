// Dashboard page controller
//
// Headline metrics for the current app: review volume, average rating,
// rating and sentiment distributions, monthly review counts, recent
// reviews, and the top requested features.

use super::{load_page, PageState, SampleData};
use crate::api::models::{AppEntry, DashboardData};
use crate::api::ApiClient;

/// One bucket of the 5-star rating breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSlice {
    pub label: &'static str,
    pub count: u64,
    pub percent: f64,
}

/// Sentiment percentages across all reviews
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentSplit {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthCount {
    pub month: String,
    pub reviews: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub time: String,
    pub source: String,
    pub rating: u8,
    pub text: String,
    pub sentiment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTally {
    pub name: String,
    pub count: u64,
}

/// Dashboard view model
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    pub total_reviews: u64,
    pub average_rating: f64,
    pub summary: String,
    pub ratings: Vec<RatingSlice>,
    pub sentiment: SentimentSplit,
    pub monthly: Vec<MonthCount>,
    pub reviews: Vec<Review>,
    pub feature_requests: Vec<FeatureTally>,
}

const RATING_LABELS: [&str; 5] = ["5 Star", "4 Star", "3 Star", "2 Star", "1 Star"];

impl SampleData for DashboardMetrics {
    fn sample() -> Self {
        let sample_counts = [3200, 2100, 1200, 450, 315];
        let sample_percents = [55.2, 32.3, 8.5, 2.8, 1.2];
        let months = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        let month_reviews = [
            1200, 1900, 1500, 2100, 1800, 1800, 1800, 1800, 1800, 1800, 1800, 1800,
        ];

        Self {
            total_reviews: 7321,
            average_rating: 0.0,
            summary: "This dashboard provides comprehensive analytics for your selected apps. \
                      Monitor reviews, track sentiment trends, and identify key features \
                      requested by users."
                .to_string(),
            ratings: RATING_LABELS
                .into_iter()
                .zip(sample_counts)
                .zip(sample_percents)
                .map(|((label, count), percent)| RatingSlice {
                    label,
                    count,
                    percent,
                })
                .collect(),
            sentiment: SentimentSplit {
                positive: 68.0,
                neutral: 22.0,
                negative: 10.0,
            },
            monthly: months
                .iter()
                .zip(month_reviews)
                .map(|(month, reviews)| MonthCount {
                    month: month.to_string(),
                    reviews,
                })
                .collect(),
            reviews: vec![
                sample_review("b24bad8-47", "Natal Craig", "5 minutes ago", "Google Play", 4,
                    "This app has transformed how I manage my daily tasks. Highly recommended!",
                    "Positive"),
                sample_review("b21bace8-46", "Drew Cano", "10 minutes ago", "App Store", 3,
                    "Great features but could use some UI improvements.", "Neutral"),
                sample_review("d69ad8-420", "Andi Lane", "15 minutes ago", "Google Play", 1,
                    "Facing frequent crashes after the latest update.", "Negative"),
                sample_review("a12bc34-56", "Taylor Smith", "25 minutes ago", "App Store", 5,
                    "Absolutely love this app! The customer support is amazing too.", "Positive"),
                sample_review("e78fg90-12", "Jordan Lee", "1 hour ago", "Google Play", 2,
                    "Too many ads in the free version. Makes it hard to use.", "Negative"),
            ],
            feature_requests: vec![
                FeatureTally { name: "Dark Mode".into(), count: 1243 },
                FeatureTally { name: "Offline Support".into(), count: 892 },
                FeatureTally { name: "Export Data".into(), count: 756 },
            ],
        }
    }
}

fn sample_review(
    id: &str,
    author: &str,
    time: &str,
    source: &str,
    rating: u8,
    text: &str,
    sentiment: &str,
) -> Review {
    Review {
        id: id.to_string(),
        author: author.to_string(),
        time: time.to_string(),
        source: source.to_string(),
        rating,
        text: text.to_string(),
        sentiment: sentiment.to_string(),
    }
}

impl DashboardMetrics {
    /// Map the wire payload into the view model
    ///
    /// Fields the server omits fall back to the sample constants; the page
    /// tag (not the individual values) says whether the view is live.
    pub fn from_wire(data: DashboardData) -> Self {
        let sample = Self::sample();

        let ratings = RATING_LABELS
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let bucket = data.ratings_distribution.get(i);
                RatingSlice {
                    label,
                    count: bucket
                        .and_then(|b| b.ratings_count)
                        .unwrap_or(sample.ratings[i].count),
                    percent: bucket
                        .and_then(|b| b.perc)
                        .unwrap_or(sample.ratings[i].percent),
                }
            })
            .collect();

        // Wire order is negative, neutral, positive
        let pct = |i: usize, fallback: f64| {
            data.sentiment_distribution
                .get(i)
                .and_then(|b| b.perc)
                .unwrap_or(fallback)
        };
        let sentiment = SentimentSplit {
            positive: pct(2, sample.sentiment.positive),
            neutral: pct(1, sample.sentiment.neutral),
            negative: pct(0, sample.sentiment.negative),
        };

        let monthly = if data.monthly_distribution.is_empty() {
            sample.monthly
        } else {
            data.monthly_distribution
                .into_iter()
                .map(|m| MonthCount {
                    month: m.month_abbrev,
                    reviews: m.cnt,
                })
                .collect()
        };

        // The server only attaches review rows when flag is set
        let reviews = if data.flag && !data.reviews.is_empty() {
            data.reviews
                .into_iter()
                .map(|r| Review {
                    id: r.review_id,
                    author: r.user_name,
                    time: r.review_created_at,
                    source: "Google Play".to_string(),
                    rating: r.ratings,
                    text: r.content,
                    sentiment: r.sentiment,
                })
                .collect()
        } else {
            sample.reviews
        };

        Self {
            total_reviews: data.total_reviews.unwrap_or(sample.total_reviews),
            average_rating: data.average_rating.unwrap_or(sample.average_rating),
            summary: data.app_summary.unwrap_or(sample.summary),
            ratings,
            sentiment,
            monthly,
            reviews,
            // The dashboard endpoint carries no feature tallies; the feature
            // page owns the live version of this list
            feature_requests: sample.feature_requests,
        }
    }
}

/// Load the dashboard for the current app (sample data when none selected)
pub async fn load(api: &ApiClient, app: Option<&AppEntry>) -> PageState<DashboardMetrics> {
    load_page("dashboard", app, |id| async move {
        api.dashboard(id).await.map(DashboardMetrics::from_wire)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{MonthBucket, RatingBucket, SentimentBucket, WireReview};

    #[test]
    fn sample_has_five_rating_buckets_and_twelve_months() {
        let sample = DashboardMetrics::sample();
        assert_eq!(sample.ratings.len(), 5);
        assert_eq!(sample.ratings[0].label, "5 Star");
        assert_eq!(sample.monthly.len(), 12);
        assert_eq!(sample.total_reviews, 7321);
    }

    #[test]
    fn from_wire_maps_live_fields() {
        let data = DashboardData {
            flag: true,
            total_reviews: Some(500),
            average_rating: Some(4.4),
            app_summary: Some("Live summary".into()),
            ratings_distribution: vec![RatingBucket {
                ratings_count: Some(300),
                perc: Some(60.0),
            }],
            sentiment_distribution: vec![
                SentimentBucket { sentiment: None, cnt: None, perc: Some(5.0) },
                SentimentBucket { sentiment: None, cnt: None, perc: Some(15.0) },
                SentimentBucket { sentiment: None, cnt: None, perc: Some(80.0) },
            ],
            monthly_distribution: vec![MonthBucket {
                month_abbrev: "Jan".into(),
                cnt: 42,
            }],
            reviews: vec![WireReview {
                review_id: "r1".into(),
                user_name: "Sam".into(),
                review_created_at: "2025-06-01".into(),
                ratings: 5,
                content: "Great".into(),
                sentiment: "Positive".into(),
            }],
        };

        let metrics = DashboardMetrics::from_wire(data);
        assert_eq!(metrics.total_reviews, 500);
        assert_eq!(metrics.average_rating, 4.4);
        assert_eq!(metrics.summary, "Live summary");
        assert_eq!(metrics.ratings[0].count, 300);
        // Wire order negative/neutral/positive maps onto the named fields
        assert_eq!(metrics.sentiment.positive, 80.0);
        assert_eq!(metrics.sentiment.negative, 5.0);
        assert_eq!(metrics.monthly.len(), 1);
        assert_eq!(metrics.reviews[0].author, "Sam");
    }

    #[test]
    fn from_wire_backfills_missing_fields_with_sample_values() {
        let metrics = DashboardMetrics::from_wire(DashboardData::default());
        let sample = DashboardMetrics::sample();
        assert_eq!(metrics.total_reviews, sample.total_reviews);
        assert_eq!(metrics.ratings, sample.ratings);
        // flag unset: review rows stay at the placeholder list
        assert_eq!(metrics.reviews, sample.reviews);
    }
}
