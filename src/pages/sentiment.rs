// Sentiment-analysis page controller
//
// Per-class sentiment scores and counts, per-class average ratings, and the
// most frequent words in each review class.

use super::{load_page, PageState, SampleData};
use crate::api::models::{AppEntry, SentimentData};
use crate::api::ApiClient;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassStat {
    /// Share of reviews in this class, 0-100
    pub percent: f64,
    pub count: u64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordTally {
    pub word: String,
    pub count: u64,
}

/// Sentiment view model, one stat block per review class
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentMetrics {
    pub total_reviews: u64,
    pub positive: ClassStat,
    pub neutral: ClassStat,
    pub negative: ClassStat,
    pub positive_words: Vec<WordTally>,
    pub neutral_words: Vec<WordTally>,
    pub negative_words: Vec<WordTally>,
}

impl SampleData for SentimentMetrics {
    fn sample() -> Self {
        Self {
            total_reviews: 1250,
            positive: ClassStat {
                percent: 82.0,
                count: 0,
                average_rating: 4.5,
            },
            neutral: ClassStat {
                percent: 65.0,
                count: 0,
                average_rating: 3.2,
            },
            negative: ClassStat {
                percent: 38.0,
                count: 0,
                average_rating: 1.8,
            },
            positive_words: tallies(&[("excellent", 120), ("great", 95), ("love", 85)]),
            neutral_words: tallies(&[("app", 200), ("use", 150), ("feature", 120)]),
            negative_words: tallies(&[("bad", 110), ("worst", 90), ("terrible", 80)]),
        }
    }
}

fn tallies(pairs: &[(&str, u64)]) -> Vec<WordTally> {
    pairs
        .iter()
        .map(|(word, count)| WordTally {
            word: word.to_string(),
            count: *count,
        })
        .collect()
}

impl SentimentMetrics {
    /// Map the wire payload into the view model
    ///
    /// Class buckets are matched by their tag when present; the wire order
    /// (negative, neutral, positive) is the fallback for untagged buckets.
    pub fn from_wire(data: SentimentData) -> Self {
        let sample = Self::sample();

        let class = |name: &str, index: usize| {
            data.sentiments
                .iter()
                .find(|b| b.sentiment.as_deref() == Some(name))
                .or_else(|| data.sentiments.get(index))
        };

        let averages = data.average_rating.unwrap_or_default();
        let stat = |name: &str, index: usize, fallback: &ClassStat, average: Option<f64>| {
            let bucket = class(name, index);
            ClassStat {
                percent: bucket.and_then(|b| b.perc).unwrap_or(fallback.percent),
                count: bucket.and_then(|b| b.cnt).unwrap_or(fallback.count),
                average_rating: average.unwrap_or(fallback.average_rating),
            }
        };

        let words = data.word_frequency.unwrap_or_default();
        let word_list = |wire: Vec<crate::api::models::WordCount>, fallback: &[WordTally]| {
            if wire.is_empty() {
                fallback.to_vec()
            } else {
                wire.into_iter()
                    .map(|w| WordTally {
                        word: w.word,
                        count: w.count,
                    })
                    .collect()
            }
        };

        Self {
            total_reviews: data.total_reviews.unwrap_or(sample.total_reviews),
            positive: stat("positive", 2, &sample.positive, averages.positive),
            neutral: stat("neutral", 1, &sample.neutral, averages.neutral),
            negative: stat("negative", 0, &sample.negative, averages.negative),
            positive_words: word_list(words.positive, &sample.positive_words),
            neutral_words: word_list(words.neutral, &sample.neutral_words),
            negative_words: word_list(words.negative, &sample.negative_words),
        }
    }
}

/// Load sentiment analytics for the current app
pub async fn load(api: &ApiClient, app: Option<&AppEntry>) -> PageState<SentimentMetrics> {
    load_page("sentiment-analysis", app, |id| async move {
        api.sentiment(id).await.map(SentimentMetrics::from_wire)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ClassAverages, SentimentBucket, WordCount, WordFrequency};

    fn bucket(sentiment: &str, cnt: u64, perc: f64) -> SentimentBucket {
        SentimentBucket {
            sentiment: Some(sentiment.to_string()),
            cnt: Some(cnt),
            perc: Some(perc),
        }
    }

    #[test]
    fn from_wire_matches_classes_by_tag() {
        let data = SentimentData {
            // Deliberately shuffled: tags must win over position
            sentiments: vec![
                bucket("positive", 900, 72.0),
                bucket("negative", 100, 8.0),
                bucket("neutral", 250, 20.0),
            ],
            total_reviews: Some(1250),
            word_frequency: None,
            average_rating: Some(ClassAverages {
                positive: Some(4.7),
                neutral: None,
                negative: Some(1.5),
            }),
        };

        let metrics = SentimentMetrics::from_wire(data);
        assert_eq!(metrics.positive.count, 900);
        assert_eq!(metrics.positive.percent, 72.0);
        assert_eq!(metrics.positive.average_rating, 4.7);
        assert_eq!(metrics.negative.percent, 8.0);
        // Missing per-class average falls back to the sample value
        assert_eq!(metrics.neutral.average_rating, 3.2);
    }

    #[test]
    fn from_wire_falls_back_to_position_for_untagged_buckets() {
        let untagged = |cnt: u64, perc: f64| SentimentBucket {
            sentiment: None,
            cnt: Some(cnt),
            perc: Some(perc),
        };
        let data = SentimentData {
            sentiments: vec![untagged(50, 10.0), untagged(150, 30.0), untagged(300, 60.0)],
            ..Default::default()
        };

        let metrics = SentimentMetrics::from_wire(data);
        assert_eq!(metrics.negative.count, 50);
        assert_eq!(metrics.neutral.count, 150);
        assert_eq!(metrics.positive.count, 300);
    }

    #[test]
    fn live_word_lists_replace_samples_wholesale() {
        let data = SentimentData {
            word_frequency: Some(WordFrequency {
                positive: vec![WordCount {
                    word: "smooth".into(),
                    count: 40,
                }],
                neutral: vec![],
                negative: vec![],
            }),
            ..Default::default()
        };

        let metrics = SentimentMetrics::from_wire(data);
        assert_eq!(metrics.positive_words.len(), 1);
        assert_eq!(metrics.positive_words[0].word, "smooth");
        // Empty wire lists keep the placeholder tallies
        assert_eq!(metrics.neutral_words.len(), 3);
    }
}
