// ── Monthly energy consumption ──
//
// One-shot batch read of `consumption`, a map of month label to kW.

use serde::Serialize;
use tracing::{debug, info};

use super::report;
use crate::error::CoreError;
use crate::model::{StorePath, Value};
use crate::sync::Synchronizer;

pub const CONSUMPTION_PATH: &str = "consumption";

/// Readings strictly above this raise the high-consumption alert.
pub const THRESHOLD_KW: f64 = 80.0;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyUsage {
    pub month: String,
    pub kw: f64,
}

/// The first month over [`THRESHOLD_KW`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionAlert {
    pub month: String,
    pub kw: f64,
}

impl ConsumptionAlert {
    pub fn message(&self) -> String {
        format!(
            "Consumption has exceeded {THRESHOLD_KW:.0} kW! Current: {:.2} kW",
            self.kw
        )
    }
}

pub struct ConsumptionPanel {
    sync: Synchronizer,
    entries: Vec<MonthlyUsage>,
}

impl ConsumptionPanel {
    pub fn new(sync: Synchronizer) -> Self {
        Self {
            sync,
            entries: Vec::new(),
        }
    }

    /// Fetch the whole map once. Non-numeric entries are skipped.
    pub async fn load(&mut self) {
        let path = StorePath::new(CONSUMPTION_PATH);
        let Some(value) = self.sync.read_once(path.clone()).await else {
            debug!("no consumption data");
            return;
        };
        let Some(map) = value.as_map() else {
            report(&CoreError::decode(
                &path,
                format!("expected map, found {}", value.kind()),
            ));
            return;
        };

        self.entries = map
            .iter()
            .filter_map(|(month, v)| match v {
                Value::Number(kw) => Some(MonthlyUsage {
                    month: month.clone(),
                    kw: *kw,
                }),
                other => {
                    report(&CoreError::decode(
                        &path.join(month),
                        format!("expected number, found {}", other.kind()),
                    ));
                    None
                }
            })
            .collect();

        if let Some(alert) = self.alert() {
            info!(month = %alert.month, kw = alert.kw, "{}", alert.message());
        }
    }

    /// Entries in the order the store delivered them.
    pub fn entries(&self) -> &[MonthlyUsage] {
        &self.entries
    }

    /// First entry, in delivered order, above the threshold.
    pub fn alert(&self) -> Option<ConsumptionAlert> {
        self.entries
            .iter()
            .find(|u| u.kw > THRESHOLD_KW)
            .map(|u| ConsumptionAlert {
                month: u.month.clone(),
                kw: u.kw,
            })
    }

    /// Entries ordered by calendar month. Labels that are not month
    /// names go last, alphabetically.
    pub fn chart(&self) -> Vec<MonthlyUsage> {
        let mut series = self.entries.clone();
        series.sort_by_cached_key(|u| {
            (
                month_index(&u.month).unwrap_or(MONTHS.len()),
                u.month.clone(),
            )
        });
        series
    }
}

/// Zero-based calendar index for `Jan`, `january`, `MAR`, ...
fn month_index(label: &str) -> Option<usize> {
    let prefix = label
        .trim()
        .chars()
        .take(3)
        .collect::<String>()
        .to_lowercase();
    MONTHS.iter().position(|m| *m == prefix)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SyncOptions;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    async fn panel_with(json: serde_json::Value) -> ConsumptionPanel {
        let store = MemoryStore::new();
        if let Some(value) = Value::from_json(json) {
            store.set(CONSUMPTION_PATH, value);
        }
        let sync = Synchronizer::new(Arc::new(store), SyncOptions::default());
        let mut panel = ConsumptionPanel::new(sync);
        panel.load().await;
        panel
    }

    #[test]
    fn month_labels() {
        assert_eq!(month_index("Jan"), Some(0));
        assert_eq!(month_index("december"), Some(11));
        assert_eq!(month_index("Q1"), None);
    }

    #[tokio::test]
    async fn alert_uses_delivered_order() {
        let panel = panel_with(serde_json::json!({"Mar": 95, "Jan": 40, "Feb": 85})).await;
        let alert = panel.alert().unwrap();
        assert_eq!(alert.month, "Mar");
        assert_eq!(alert.message(), "Consumption has exceeded 80 kW! Current: 95.00 kW");
    }

    #[tokio::test]
    async fn exactly_threshold_does_not_alert() {
        let panel = panel_with(serde_json::json!({"Jan": 80, "Feb": 12.5})).await;
        assert_eq!(panel.alert(), None);
    }

    #[tokio::test]
    async fn chart_is_calendar_ordered() {
        let panel = panel_with(serde_json::json!({
            "Total": 300, "Mar": 60, "Jan": 40, "Feb": 85
        }))
        .await;
        let months: Vec<String> = panel.chart().into_iter().map(|u| u.month).collect();
        assert_eq!(months, vec!["Jan", "Feb", "Mar", "Total"]);
    }

    #[tokio::test]
    async fn non_numeric_entries_are_skipped() {
        let panel = panel_with(serde_json::json!({"Jan": "lots", "Feb": 10})).await;
        assert_eq!(
            panel.entries(),
            &[MonthlyUsage {
                month: "Feb".into(),
                kw: 10.0
            }]
        );
    }

    #[tokio::test]
    async fn absent_data_is_empty() {
        let panel = panel_with(serde_json::Value::Null).await;
        assert!(panel.entries().is_empty());
        assert!(panel.chart().is_empty());
    }
}
