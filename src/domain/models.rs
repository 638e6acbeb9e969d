use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved between the exercise and variant names of an [`ExerciseKey`] token.
pub const KEY_SEPARATOR: char = '|';
pub const DEFAULT_SETS: u32 = 3;
/// Larger `defaultSets` cells are treated as unparseable.
pub const MAX_DEFAULT_SETS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExerciseKey {
    pub exercise_name: String,
    pub secondary_name: Option<String>,
}

impl ExerciseKey {
    pub fn new(exercise_name: impl Into<String>, secondary_name: Option<&str>) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            secondary_name: secondary_name
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned),
        }
    }

    pub fn token(&self) -> String {
        match &self.secondary_name {
            Some(secondary) => format!("{}{KEY_SEPARATOR}{secondary}", self.exercise_name),
            None => self.exercise_name.clone(),
        }
    }

    pub fn parse(token: &str) -> Result<Self, String> {
        let mut parts = token.split(KEY_SEPARATOR);
        let exercise = parts.next().unwrap_or_default();
        let secondary = parts.next();
        if parts.next().is_some() {
            return Err(format!("exercise key '{token}' has more than one separator"));
        }
        validate_non_empty(exercise, "exercise key")?;
        Ok(Self::new(exercise, secondary))
    }
}

impl fmt::Display for ExerciseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary_name {
            Some(secondary) => write!(f, "{} ({secondary})", self.exercise_name),
            None => f.write_str(&self.exercise_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutineEntry {
    pub routine_name: String,
    pub exercise_name: String,
    pub secondary_name: Option<String>,
    pub notes: String,
    pub default_sets: u32,
}

impl RoutineEntry {
    /// Parses a `Routines` row: `[routineName, exerciseName, secondaryName, notes, defaultSets]`.
    pub fn from_row(row: &[String]) -> Result<Self, String> {
        let routine_name = cell(row, 0).trim().to_string();
        let exercise_name = cell(row, 1).trim().to_string();
        validate_non_empty(&routine_name, "routine.routine_name")?;
        validate_name(&exercise_name, "routine.exercise_name")?;
        let secondary = cell(row, 2).trim();
        if !secondary.is_empty() {
            validate_name(secondary, "routine.secondary_name")?;
        }
        let default_sets = cell(row, 4)
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|sets| (1..=MAX_DEFAULT_SETS).contains(sets))
            .unwrap_or(DEFAULT_SETS);

        Ok(Self {
            routine_name,
            exercise_name,
            secondary_name: (!secondary.is_empty()).then(|| secondary.to_string()),
            notes: cell(row, 3).trim().to_string(),
            default_sets,
        })
    }

    pub fn key(&self) -> ExerciseKey {
        ExerciseKey::new(self.exercise_name.clone(), self.secondary_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Weight,
    Reps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub completed: bool,
}

impl SetRecord {
    pub fn has_values(&self) -> bool {
        self.weight.is_some() && self.reps.is_some()
    }

    pub fn is_loggable(&self) -> bool {
        self.completed && self.has_values()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub date: String,
    pub routine: String,
    pub exercise_name: String,
    pub secondary_name: Option<String>,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub notes: String,
}

impl LogEntry {
    /// Parses a `WorkoutLog` row:
    /// `[date, routine, exerciseName, secondaryName, setNumber, weight, reps, notes]`.
    pub fn from_row(row: &[String]) -> Result<Self, String> {
        let exercise_name = cell(row, 2).trim().to_string();
        validate_non_empty(&exercise_name, "log.exercise_name")?;
        let secondary = cell(row, 3).trim();
        let set_number = cell(row, 4)
            .trim()
            .parse::<u32>()
            .map_err(|_| "log.set_number must be a positive integer".to_string())?;
        let weight = cell(row, 5)
            .trim()
            .parse::<f64>()
            .map_err(|_| "log.weight must be a number".to_string())?;
        let reps = cell(row, 6)
            .trim()
            .parse::<u32>()
            .map_err(|_| "log.reps must be a non-negative integer".to_string())?;

        Ok(Self {
            date: cell(row, 0).trim().to_string(),
            routine: cell(row, 1).trim().to_string(),
            exercise_name,
            secondary_name: (!secondary.is_empty()).then(|| secondary.to_string()),
            set_number,
            weight,
            reps,
            notes: cell(row, 7).to_string(),
        })
    }

    pub fn to_row(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::Value::from(self.date.clone()),
            serde_json::Value::from(self.routine.clone()),
            serde_json::Value::from(self.exercise_name.clone()),
            serde_json::Value::from(self.secondary_name.clone().unwrap_or_default()),
            serde_json::Value::from(self.set_number),
            serde_json::Value::from(self.weight),
            serde_json::Value::from(self.reps),
            serde_json::Value::from(self.notes.clone()),
        ]
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWriteRecord {
    pub routine_name: String,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at_epoch_millis: i64,
}

impl TokenInfo {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_epoch_millis <= now.timestamp_millis() || self.access_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub calories: i64,
    /// 1-based sheet row; `None` when the append response could not be read.
    pub remote_row_index: Option<u32>,
}

impl CalorieEntry {
    pub fn is_deletable(&self) -> bool {
        self.remote_row_index.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCalorieEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub calories: i64,
}

impl PendingCalorieEntry {
    pub fn to_row(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::Value::from(self.id.clone()),
            serde_json::Value::from(self.timestamp.to_rfc3339()),
            serde_json::Value::from(self.description.clone()),
            serde_json::Value::from(self.calories),
        ]
    }

    pub fn into_entry(self, remote_row_index: Option<u32>) -> CalorieEntry {
        CalorieEntry {
            id: self.id,
            timestamp: self.timestamp,
            description: self.description,
            calories: self.calories,
            remote_row_index,
        }
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or_default()
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_name(value: &str, field_name: &str) -> Result<(), String> {
    validate_non_empty(value, field_name)?;
    if value.contains(KEY_SEPARATOR) {
        return Err(format!("{field_name} must not contain '{KEY_SEPARATOR}'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn exercise_key_token_roundtrip_keeps_absent_variant_distinct() {
        let plain = ExerciseKey::new("Bench Press", None);
        let barbell = ExerciseKey::new("Bench Press", Some("Barbell"));

        assert_eq!(plain.token(), "Bench Press");
        assert_eq!(barbell.token(), "Bench Press|Barbell");
        assert_eq!(ExerciseKey::parse(&plain.token()).expect("parse"), plain);
        assert_eq!(ExerciseKey::parse(&barbell.token()).expect("parse"), barbell);
        assert_ne!(plain, barbell);
        assert!(ExerciseKey::parse("a|b|c").is_err());
    }

    #[test]
    fn blank_secondary_name_means_no_variant() {
        assert_eq!(ExerciseKey::new("Squat", Some("  ")), ExerciseKey::new("Squat", None));
    }

    #[test]
    fn routine_row_defaults_sets_and_rejects_reserved_separator() {
        let entry = RoutineEntry::from_row(&row(&["Push", "Bench Press", "Barbell", "", "x"]))
            .expect("valid row");
        assert_eq!(entry.default_sets, DEFAULT_SETS);
        assert_eq!(entry.secondary_name.as_deref(), Some("Barbell"));

        let short = RoutineEntry::from_row(&row(&["Push", "Dips"])).expect("short row");
        assert_eq!(short.secondary_name, None);
        assert_eq!(short.default_sets, DEFAULT_SETS);

        let oversized = RoutineEntry::from_row(&row(&["Push", "Dips", "", "", "4000000000"]))
            .expect("oversized sets row");
        assert_eq!(oversized.default_sets, DEFAULT_SETS);
        let capped = RoutineEntry::from_row(&row(&["Push", "Dips", "", "", "20"]))
            .expect("max sets row");
        assert_eq!(capped.default_sets, MAX_DEFAULT_SETS);

        assert!(RoutineEntry::from_row(&row(&["Push", "Bench|Press", "", "", "3"])).is_err());
        assert!(RoutineEntry::from_row(&row(&["", "Bench Press"])).is_err());
    }

    #[test]
    fn log_entry_row_roundtrip_through_sheet_cells() {
        let entry = LogEntry::from_row(&row(&[
            "2026-03-01",
            "Push",
            "Bench Press",
            "",
            "2",
            "102.5",
            "5",
            "felt heavy",
        ]))
        .expect("valid log row");
        assert_eq!(entry.secondary_name, None);
        assert_eq!(entry.weight, 102.5);
        assert_eq!(entry.parsed_date(), NaiveDate::from_ymd_opt(2026, 3, 1));

        let cells = entry.to_row();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[3], serde_json::Value::from(""));
        assert_eq!(cells[4], serde_json::Value::from(2));
    }

    #[test]
    fn unpadded_log_dates_still_parse() {
        let entry = LogEntry::from_row(&row(&["2026-3-5", "Push", "Dips", "", "1", "0", "12"]))
            .expect("valid log row");
        assert_eq!(entry.parsed_date(), NaiveDate::from_ymd_opt(2026, 3, 5));
    }

    #[test]
    fn set_record_is_loggable_only_when_complete_with_values() {
        let mut set = SetRecord {
            weight: Some(100.0),
            reps: None,
            completed: true,
        };
        assert!(!set.is_loggable());
        set.reps = Some(5);
        assert!(set.is_loggable());
        set.completed = false;
        assert!(!set.is_loggable());
    }

    #[test]
    fn token_with_blank_access_token_counts_as_expired() {
        let now = Utc::now();
        let token = TokenInfo {
            access_token: " ".to_string(),
            expires_at_epoch_millis: now.timestamp_millis() + 60_000,
        };
        assert!(token.is_expired_at(now));
    }
}
