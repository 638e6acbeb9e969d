use crate::domain::models::LogEntry;
use std::cmp::Ordering;

pub const HISTORY_DEPTH: usize = 3;

/// Historical `WorkoutLog` rows, queried per exercise variant.
#[derive(Debug, Clone, Default)]
pub struct PreviousPerformanceIndex {
    entries: Vec<LogEntry>,
}

impl PreviousPerformanceIndex {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// Builds the index from raw log rows. The header row is skipped and rows
    /// that do not parse are ignored.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let entries = rows
            .iter()
            .skip(1)
            .enumerate()
            .filter_map(|(position, row)| match LogEntry::from_row(row) {
                Ok(entry) => Some(entry),
                Err(reason) => {
                    tracing::debug!(row = position + 2, %reason, "skipping unreadable log row");
                    None
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entries for exactly this variant; a missing secondary name
    /// only matches entries without one.
    pub fn recent(&self, exercise_name: &str, secondary_name: Option<&str>) -> Vec<&LogEntry> {
        let mut matches = self
            .entries
            .iter()
            .filter(|entry| {
                entry.exercise_name == exercise_name
                    && entry.secondary_name.as_deref() == secondary_name
            })
            .collect::<Vec<_>>();
        // `sort_by` is stable, so equal dates keep log order.
        matches.sort_by(|left, right| match (left.parsed_date(), right.parsed_date()) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        matches.truncate(HISTORY_DEPTH);
        matches
    }

    pub fn lookup(&self, exercise_name: &str, secondary_name: Option<&str>) -> Option<String> {
        let recent = self.recent(exercise_name, secondary_name);
        if recent.is_empty() {
            return None;
        }
        Some(
            recent
                .iter()
                .map(|entry| format_performance(entry.weight, entry.reps))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

pub fn format_performance(weight: f64, reps: u32) -> String {
    format!("{weight}kg × {reps}")
}
