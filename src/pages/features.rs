// Feature-identification page controller
//
// What users ask for and complain about: trending features, raw feature
// requests with representative reviews, monthly mention trends per feature,
// and crash/bug report counts.

use super::{load_page, PageState, SampleData};
use crate::api::models::{AppEntry, FeatureData};
use crate::api::ApiClient;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingFeature {
    pub name: String,
    pub count: u64,
    /// Month-over-month change, percent
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRequest {
    pub name: String,
    pub review: String,
    pub votes: u64,
}

/// Monthly mention counts for one tracked feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries {
    pub name: String,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BugMonth {
    pub month: String,
    pub crashes: u64,
    pub bugs: u64,
}

/// Feature-identification view model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMetrics {
    pub total_features: u64,
    pub trending: Vec<TrendingFeature>,
    pub requests: Vec<FeatureRequest>,
    /// Shared month axis for the trend series
    pub trend_months: Vec<String>,
    pub trend_series: Vec<FeatureSeries>,
    pub bug_reports: Vec<BugMonth>,
}

impl SampleData for FeatureMetrics {
    fn sample() -> Self {
        let months = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
        Self {
            total_features: 3421,
            trending: vec![
                trending("Dark Mode", 1243, 12.5),
                trending("Offline Support", 892, 8.2),
                trending("Export Data", 756, 5.7),
                trending("Custom Themes", 432, 4.3),
                trending("Multi-language", 398, 3.8),
            ],
            requests: vec![
                request(
                    "Dark Mode",
                    "Please add dark mode to reduce eye strain at night",
                    1243,
                ),
                request(
                    "Offline Support",
                    "The app should work without internet connection",
                    892,
                ),
                request(
                    "Export Data",
                    "I need to export my data to CSV for analysis",
                    756,
                ),
            ],
            trend_months: months.iter().map(|m| m.to_string()).collect(),
            trend_series: vec![
                series("Dark Mode", &[200, 300, 450, 600, 800, 1000]),
                series("Offline Support", &[150, 180, 220, 300, 400, 500]),
                series("Export Data", &[120, 140, 180, 220, 280, 350]),
            ],
            bug_reports: vec![
                bug_month("Jan", 45, 32),
                bug_month("Feb", 38, 28),
                bug_month("Mar", 52, 41),
                bug_month("Apr", 29, 23),
                bug_month("May", 35, 30),
                bug_month("Jun", 42, 35),
            ],
        }
    }
}

fn trending(name: &str, count: u64, change: f64) -> TrendingFeature {
    TrendingFeature {
        name: name.to_string(),
        count,
        change,
    }
}

fn request(name: &str, review: &str, votes: u64) -> FeatureRequest {
    FeatureRequest {
        name: name.to_string(),
        review: review.to_string(),
        votes,
    }
}

fn series(name: &str, counts: &[u64]) -> FeatureSeries {
    FeatureSeries {
        name: name.to_string(),
        counts: counts.to_vec(),
    }
}

fn bug_month(month: &str, crashes: u64, bugs: u64) -> BugMonth {
    BugMonth {
        month: month.to_string(),
        crashes,
        bugs,
    }
}

impl FeatureMetrics {
    /// Map the wire payload into the view model
    ///
    /// The trend rows arrive keyed by "month" plus one dynamic key per
    /// feature; they are pivoted here into per-feature series over a shared
    /// month axis.
    pub fn from_wire(data: FeatureData) -> Self {
        let sample = Self::sample();

        let (trend_months, trend_series) = if data.feature_trends.is_empty() {
            (sample.trend_months, sample.trend_series)
        } else {
            pivot_trends(&data.feature_trends)
        };

        let trending = if data.trending_features.is_empty() {
            sample.trending
        } else {
            data.trending_features
                .into_iter()
                .map(|f| TrendingFeature {
                    name: f.name,
                    count: f.count,
                    change: f.change,
                })
                .collect()
        };

        let requests = if data.feature_requests.is_empty() {
            sample.requests
        } else {
            data.feature_requests
                .into_iter()
                .map(|f| FeatureRequest {
                    name: f.name,
                    review: f.review,
                    votes: f.votes,
                })
                .collect()
        };

        let bug_reports = if data.bug_reports.is_empty() {
            sample.bug_reports
        } else {
            data.bug_reports
                .into_iter()
                .map(|b| BugMonth {
                    month: b.month,
                    crashes: b.crashes,
                    bugs: b.bugs,
                })
                .collect()
        };

        Self {
            total_features: data.total_features.unwrap_or(sample.total_features),
            trending,
            requests,
            trend_months,
            trend_series,
            bug_reports,
        }
    }
}

/// Pivot month-keyed rows into per-feature series
///
/// Feature names come from the first row's keys, so a feature absent from
/// the first row is dropped; missing cells in later rows count as zero.
fn pivot_trends(
    rows: &[serde_json::Map<String, serde_json::Value>],
) -> (Vec<String>, Vec<FeatureSeries>) {
    let months = rows
        .iter()
        .map(|row| {
            row.get("month")
                .and_then(|v| v.as_str())
                .unwrap_or("?")
                .to_string()
        })
        .collect::<Vec<_>>();

    let names: Vec<String> = rows
        .first()
        .map(|row| row.keys().filter(|k| *k != "month").cloned().collect())
        .unwrap_or_default();

    let series = names
        .into_iter()
        .map(|name| {
            let counts = rows
                .iter()
                .map(|row| row.get(&name).and_then(|v| v.as_u64()).unwrap_or(0))
                .collect();
            FeatureSeries { name, counts }
        })
        .collect();

    (months, series)
}

/// Load feature analytics for the current app
pub async fn load(api: &ApiClient, app: Option<&AppEntry>) -> PageState<FeatureMetrics> {
    load_page("feature-analysis", app, |id| async move {
        api.feature_analysis(id).await.map(FeatureMetrics::from_wire)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_series_share_the_month_axis() {
        let sample = FeatureMetrics::sample();
        for series in &sample.trend_series {
            assert_eq!(series.counts.len(), sample.trend_months.len());
        }
    }

    #[test]
    fn pivot_turns_rows_into_series() {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(
            r#"[
                {"month": "Jan", "Dark Mode": 200, "Offline Support": 150},
                {"month": "Feb", "Dark Mode": 300, "Offline Support": 180}
            ]"#,
        )
        .unwrap();

        let (months, series) = pivot_trends(&rows);
        assert_eq!(months, vec!["Jan", "Feb"]);
        assert_eq!(series.len(), 2);

        let dark = series.iter().find(|s| s.name == "Dark Mode").unwrap();
        assert_eq!(dark.counts, vec![200, 300]);
    }

    #[test]
    fn pivot_counts_missing_cells_as_zero() {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(
            r#"[
                {"month": "Jan", "Dark Mode": 200},
                {"month": "Feb"}
            ]"#,
        )
        .unwrap();

        let (_, series) = pivot_trends(&rows);
        assert_eq!(series[0].counts, vec![200, 0]);
    }

    #[test]
    fn from_wire_keeps_samples_for_empty_sections() {
        let metrics = FeatureMetrics::from_wire(FeatureData::default());
        let sample = FeatureMetrics::sample();
        assert_eq!(metrics.total_features, sample.total_features);
        assert_eq!(metrics.trending.len(), 5);
        assert_eq!(metrics.bug_reports.len(), 6);
    }
}
