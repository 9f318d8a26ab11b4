//! Saved-roast history: listing labels and multi-roast comparison overlays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::live::{padded_range, EMPTY_Y_RANGE, Y_PADDING};
use crate::recording::{MilestoneKind, SessionRecord};
use crate::store::{RoastId, RoastStore, RoastSummary};
use crate::units::{reference_lines, ReferenceLine, TemperatureUnit};

/// Characters of bean info shown in the listing
const LIST_BEAN_CHARS: usize = 10;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One selectable row of the history listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RoastId,
    pub start_time: DateTime<Utc>,
    pub bean_info: Option<String>,
    pub label: String,
}

/// A milestone drawn on a compared roast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestonePoint {
    pub kind: MilestoneKind,
    pub label: String,
    pub elapsed_seconds: f64,
    pub temperature: f64,
}

/// One roast in a comparison overlay; temperatures in °F
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySeries {
    pub id: RoastId,
    pub legend: String,
    pub elapsed_seconds: Vec<f64>,
    pub temperatures: Vec<f64>,
    pub milestones: Vec<MilestonePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryComparison {
    /// Oldest roast first
    pub series: Vec<OverlaySeries>,
    /// Common range across every series
    pub y_range: [f64; 2],
    pub reference_lines: Vec<ReferenceLine>,
    /// Requested ids with no saved roast
    pub missing: Vec<RoastId>,
}

/// Listing label: `"YYYY-MM-DD HH:MM - <first 10 chars of bean info>"`
pub fn list_label(summary: &RoastSummary) -> String {
    let mut label = summary.start_time.format(TIME_FORMAT).to_string();
    if let Some(bean) = summary.bean_info.as_deref().filter(|b| !b.is_empty()) {
        label.push_str(" - ");
        label.extend(bean.chars().take(LIST_BEAN_CHARS));
    }
    label
}

/// Legend label: `"YYYY-MM-DD HH:MM - <bean info>"`
pub fn legend_label(start_time: DateTime<Utc>, bean_info: Option<&str>) -> String {
    let time = start_time.format(TIME_FORMAT);
    match bean_info.filter(|b| !b.is_empty()) {
        Some(bean) => format!("{} - {}", time, bean),
        None => time.to_string(),
    }
}

/// Saved roasts newest first, with display labels
pub fn list_history(store: &dyn RoastStore) -> Result<Vec<HistoryEntry>, StoreError> {
    Ok(store
        .list_summaries()?
        .into_iter()
        .map(|summary| HistoryEntry {
            label: list_label(&summary),
            id: summary.id,
            start_time: summary.start_time,
            bean_info: summary.bean_info,
        })
        .collect())
}

fn overlay(id: RoastId, record: &SessionRecord) -> OverlaySeries {
    let milestones = MilestoneKind::ALL
        .iter()
        .filter_map(|kind| {
            record
                .milestone(*kind)
                .map(|(elapsed_seconds, temperature)| MilestonePoint {
                    kind: *kind,
                    label: kind.label().to_string(),
                    elapsed_seconds,
                    temperature,
                })
        })
        .collect();

    OverlaySeries {
        id,
        legend: legend_label(record.start_time, record.bean_info.as_deref()),
        elapsed_seconds: record.elapsed_seconds.clone(),
        temperatures: record.temperatures.clone(),
        milestones,
    }
}

/// Load the selected roasts as overlay series.
///
/// Unknown ids are skipped with a warning and reported in `missing`; any
/// other store failure aborts the comparison.
pub fn compare_roasts(
    store: &dyn RoastStore,
    ids: &[RoastId],
) -> Result<HistoryComparison, StoreError> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let mut loaded = Vec::with_capacity(unique.len());
    let mut missing = Vec::new();
    for id in unique {
        match store.load(id) {
            Ok(record) => loaded.push((id, record)),
            Err(StoreError::NotFound { id }) => {
                log::warn!("[History] Roast {} not found, skipping", id);
                missing.push(id);
            }
            Err(err) => return Err(err),
        }
    }
    loaded.sort_by(|(a_id, a), (b_id, b)| {
        a.start_time.cmp(&b.start_time).then_with(|| a_id.cmp(b_id))
    });

    let y_range = padded_range(
        loaded
            .iter()
            .flat_map(|(_, record)| record.temperatures.iter().copied()),
        Y_PADDING,
    )
    .unwrap_or(EMPTY_Y_RANGE);

    Ok(HistoryComparison {
        series: loaded
            .iter()
            .map(|(id, record)| overlay(*id, record))
            .collect(),
        y_range,
        reference_lines: reference_lines(TemperatureUnit::Fahrenheit),
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    fn record(start: DateTime<Utc>, bean: Option<&str>, temps: Vec<f64>) -> SessionRecord {
        SessionRecord {
            start_time: start,
            elapsed_seconds: (0..temps.len()).map(|i| i as f64).collect(),
            temperatures: temps,
            bean_info: bean.map(str::to_string),
            first_crack_elapsed_seconds: None,
            first_crack_temp: None,
            second_crack_elapsed_seconds: None,
            second_crack_temp: None,
            tasting_comments: None,
        }
    }

    #[test]
    fn test_list_label_truncates_bean_info() {
        let summary = RoastSummary {
            id: 1,
            start_time: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 42).unwrap(),
            bean_info: Some("Colombia Huila washed".to_string()),
        };
        assert_eq!(list_label(&summary), "2024-03-09 07:05 - Colombia H");

        let bare = RoastSummary {
            bean_info: None,
            ..summary
        };
        assert_eq!(list_label(&bare), "2024-03-09 07:05");
    }

    #[test]
    fn test_legend_label_keeps_full_bean_info() {
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(
            legend_label(start, Some("Colombia Huila washed")),
            "2024-03-09 07:05 - Colombia Huila washed"
        );
    }

    #[test]
    fn test_list_history_newest_first() {
        let store = InMemoryStore::new();
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        store.save(&record(early, Some("Brazil"), vec![300.0])).unwrap();
        store.save(&record(late, Some("Kenya"), vec![310.0])).unwrap();

        let entries = list_history(&store).unwrap();
        assert_eq!(entries[0].label, "2024-02-01 08:00 - Kenya");
        assert_eq!(entries[1].id, 1);
    }

    #[test]
    fn test_compare_orders_oldest_first_with_common_range() {
        let store = InMemoryStore::new();
        let late = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let late_id = store.save(&record(late, None, vec![350.0, 440.0])).unwrap();
        let mut with_crack = record(early, Some("Sumatra"), vec![300.0, 400.0]);
        with_crack.first_crack_elapsed_seconds = Some(1.0);
        with_crack.first_crack_temp = Some(400.0);
        let early_id = store.save(&with_crack).unwrap();

        let comparison = compare_roasts(&store, &[late_id, early_id, 99]).unwrap();

        let ids: Vec<RoastId> = comparison.series.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![early_id, late_id]);
        assert_eq!(comparison.y_range, [295.0, 445.0]);
        assert_eq!(comparison.missing, vec![99]);
        assert_eq!(comparison.series[0].legend, "2024-05-01 09:00 - Sumatra");
        assert_eq!(comparison.series[0].milestones.len(), 1);
        assert_eq!(comparison.series[0].milestones[0].elapsed_seconds, 1.0);
        assert!(comparison.series[1].milestones.is_empty());
    }

    #[test]
    fn test_compare_nothing_selected() {
        let store = InMemoryStore::new();
        let comparison = compare_roasts(&store, &[]).unwrap();
        assert!(comparison.series.is_empty());
        assert_eq!(comparison.y_range, EMPTY_Y_RANGE);
    }
}
