// Competitor-analysis page controller
//
// Side-by-side view of the current app against a user-chosen competitor.
// There is no dedicated analytics endpoint for this page: the names come
// from the persisted store and the comparison figures are the sample set
// until the services grow a comparison endpoint.

use crate::api::models::AppEntry;
use crate::store::SelectionStore;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureParity {
    pub feature: String,
    pub my_app: bool,
    pub competitor: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthComparison {
    pub month: String,
    pub my_app: u64,
    pub competitor: u64,
}

/// Competitor view model
///
/// `competitor` is None until one has been selected on the add-sources page
/// in competitor context; the view prompts for a selection in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorView {
    pub my_app: Option<AppEntry>,
    pub competitor: Option<AppEntry>,
    pub my_rating: f64,
    pub competitor_rating: f64,
    pub feature_matrix: Vec<FeatureParity>,
    pub monthly: Vec<MonthComparison>,
}

impl CompetitorView {
    /// Build the view from the persisted selections
    pub fn from_store(store: &SelectionStore) -> Self {
        let parity = |feature: &str, my_app: bool, competitor: bool| FeatureParity {
            feature: feature.to_string(),
            my_app,
            competitor,
        };
        let month = |name: &str, mine: u64, theirs: u64| MonthComparison {
            month: name.to_string(),
            my_app: mine,
            competitor: theirs,
        };

        Self {
            my_app: store.current_app(),
            competitor: store.competitor(),
            my_rating: 4.5,
            competitor_rating: 4.2,
            feature_matrix: vec![
                parity("Dark Mode", true, true),
                parity("Offline Support", true, false),
                parity("Export Data", true, true),
                parity("AI Features", false, true),
                parity("Cloud Sync", true, false),
            ],
            monthly: vec![
                month("Jan", 1200, 1800),
                month("Feb", 1900, 2100),
                month("Mar", 2100, 1900),
                month("Apr", 2400, 2200),
                month("May", 2600, 2300),
                month("Jun", 2800, 2400),
            ],
        }
    }

    /// Display name for the "my app" column
    pub fn my_app_name(&self) -> &str {
        self.my_app.as_ref().map(|a| a.name.as_str()).unwrap_or("My App")
    }

    /// Display name for the competitor column
    pub fn competitor_name(&self) -> &str {
        self.competitor
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("Competitor A")
    }

    /// Whether a real competitor has been chosen
    pub fn has_competitor(&self) -> bool {
        self.competitor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SelectionStore) {
        let dir = TempDir::new().unwrap();
        let store = SelectionStore::open(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn app(id: i64, name: &str) -> AppEntry {
        AppEntry {
            id,
            name: name.to_string(),
            publisher: String::new(),
            icon: String::new(),
        }
    }

    #[test]
    fn placeholder_names_before_any_selection() {
        let (_dir, store) = store();
        let view = CompetitorView::from_store(&store);
        assert_eq!(view.my_app_name(), "My App");
        assert_eq!(view.competitor_name(), "Competitor A");
        assert!(!view.has_competitor());
    }

    #[test]
    fn names_follow_the_persisted_slots() {
        let (_dir, store) = store();
        store.set_current_app(&app(1, "Mine")).unwrap();
        store.set_competitor(&app(2, "Rival")).unwrap();

        let view = CompetitorView::from_store(&store);
        assert_eq!(view.my_app_name(), "Mine");
        assert_eq!(view.competitor_name(), "Rival");
        assert!(view.has_competitor());
    }

    #[test]
    fn clearing_the_competitor_does_not_touch_my_app() {
        let (_dir, store) = store();
        store.set_current_app(&app(1, "Mine")).unwrap();
        store.set_competitor(&app(2, "Rival")).unwrap();
        store.clear_competitor().unwrap();

        let view = CompetitorView::from_store(&store);
        assert_eq!(view.my_app_name(), "Mine");
        assert!(!view.has_competitor());
    }
}
