use crate::application::previous_performance::PreviousPerformanceIndex;
use crate::domain::models::{
    ExerciseKey, LogEntry, PendingWriteRecord, RoutineEntry, SetField, SetRecord,
};
use crate::infrastructure::error::TrackerError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestRequested {
    pub seconds: i64,
}

/// Every session mutation enters through [`WorkoutSessionEngine::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SelectRoutine { name: String },
    SetField { key: ExerciseKey, set_index: usize, field: SetField, value: String },
    AddSet { key: ExerciseKey },
    ToggleComplete { key: ExerciseKey, set_index: usize },
    SetNotes { key: ExerciseKey, text: String },
    SwitchVariant { group: String, secondary_name: Option<String> },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    RoutineSelected { routine_name: String, exercise_count: usize },
    FieldUpdated { key: String, set_index: usize },
    SetAdded { key: String, set_number: usize },
    CompletionToggled { key: String, set_index: usize, completed: bool },
    RestRequested { seconds: i64 },
    NotesUpdated { key: String },
    VariantSwitched { group: String, key: String },
    SessionReset,
}

#[derive(Debug, Clone)]
struct VariantGroup {
    name: String,
    variants: Vec<ExerciseKey>,
    active: usize,
}

#[derive(Debug, Clone)]
struct WorkoutSession {
    routine_name: String,
    groups: Vec<VariantGroup>,
    sets: HashMap<ExerciseKey, Vec<SetRecord>>,
    notes: HashMap<ExerciseKey, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantView {
    pub key: String,
    pub secondary_name: Option<String>,
    pub active: bool,
    pub routine_notes: String,
    pub notes: String,
    pub sets: Vec<SetRecord>,
    pub previous: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseView {
    pub exercise_name: String,
    pub variants: Vec<VariantView>,
}

/// Parses the `Routines` table. The header row is skipped; rows that fail
/// validation are dropped with a warning.
pub fn parse_routines(rows: &[Vec<String>]) -> Vec<RoutineEntry> {
    rows.iter()
        .skip(1)
        .enumerate()
        .filter_map(|(position, row)| match RoutineEntry::from_row(row) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                warn!(row = position + 2, %reason, "skipping routine row");
                None
            }
        })
        .collect()
}

pub struct WorkoutSessionEngine {
    routines: Vec<RoutineEntry>,
    rest_seconds: i64,
    session: Option<WorkoutSession>,
}

impl WorkoutSessionEngine {
    pub fn new(routines: Vec<RoutineEntry>, rest_seconds: i64) -> Self {
        Self {
            routines,
            rest_seconds,
            session: None,
        }
    }

    pub fn replace_routines(&mut self, routines: Vec<RoutineEntry>) {
        self.routines = routines;
    }

    pub fn set_rest_seconds(&mut self, rest_seconds: i64) {
        self.rest_seconds = rest_seconds;
    }

    /// Unique routine names in table order.
    pub fn routine_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.routines {
            if !names.contains(&entry.routine_name) {
                names.push(entry.routine_name.clone());
            }
        }
        names
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn routine_name(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.routine_name.as_str())
    }

    pub fn sets(&self, key: &ExerciseKey) -> Option<&[SetRecord]> {
        self.session
            .as_ref()
            .and_then(|session| session.sets.get(key))
            .map(Vec::as_slice)
    }

    pub fn notes(&self, key: &ExerciseKey) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.notes.get(key))
            .map(String::as_str)
    }

    pub fn active_variant(&self, group: &str) -> Option<&ExerciseKey> {
        let session = self.session.as_ref()?;
        let group = session.groups.iter().find(|candidate| candidate.name == group)?;
        group.variants.get(group.active)
    }

    pub fn apply(&mut self, command: SessionCommand) -> Result<Vec<SessionEvent>, TrackerError> {
        match command {
            SessionCommand::SelectRoutine { name } => {
                let exercise_count = self.select_routine(&name);
                Ok(vec![SessionEvent::RoutineSelected {
                    routine_name: name,
                    exercise_count,
                }])
            }
            SessionCommand::SetField {
                key,
                set_index,
                field,
                value,
            } => {
                self.set_field(&key, set_index, field, &value)?;
                Ok(vec![SessionEvent::FieldUpdated {
                    key: key.token(),
                    set_index,
                }])
            }
            SessionCommand::AddSet { key } => {
                let set_number = self.add_set(&key)?;
                Ok(vec![SessionEvent::SetAdded {
                    key: key.token(),
                    set_number,
                }])
            }
            SessionCommand::ToggleComplete { key, set_index } => {
                let rest = self.toggle_complete(&key, set_index)?;
                let completed = self
                    .sets(&key)
                    .and_then(|sets| sets.get(set_index))
                    .is_some_and(|set| set.completed);
                let mut events = vec![SessionEvent::CompletionToggled {
                    key: key.token(),
                    set_index,
                    completed,
                }];
                if let Some(rest) = rest {
                    events.push(SessionEvent::RestRequested {
                        seconds: rest.seconds,
                    });
                }
                Ok(events)
            }
            SessionCommand::SetNotes { key, text } => {
                self.set_notes(&key, text)?;
                Ok(vec![SessionEvent::NotesUpdated { key: key.token() }])
            }
            SessionCommand::SwitchVariant {
                group,
                secondary_name,
            } => {
                let key = self.switch_variant(&group, secondary_name.as_deref())?;
                Ok(vec![SessionEvent::VariantSwitched {
                    group,
                    key: key.token(),
                }])
            }
            SessionCommand::Reset => {
                self.reset();
                Ok(vec![SessionEvent::SessionReset])
            }
        }
    }

    /// Starts a fresh session for `name` and returns the number of variant
    /// groups. An unknown routine yields an empty session.
    pub fn select_routine(&mut self, name: &str) -> usize {
        let mut groups: Vec<VariantGroup> = Vec::new();
        let mut sets = HashMap::new();
        let mut notes = HashMap::new();

        for entry in self.routines.iter().filter(|entry| entry.routine_name == name) {
            let key = entry.key();
            if sets.contains_key(&key) {
                debug!(routine = name, key = %key, "ignoring duplicate routine entry");
                continue;
            }
            match groups
                .iter_mut()
                .find(|group| group.name == entry.exercise_name)
            {
                Some(group) => group.variants.push(key.clone()),
                None => groups.push(VariantGroup {
                    name: entry.exercise_name.clone(),
                    variants: vec![key.clone()],
                    active: 0,
                }),
            }
            sets.insert(
                key.clone(),
                vec![SetRecord::default(); entry.default_sets as usize],
            );
            notes.insert(key, String::new());
        }

        let exercise_count = groups.len();
        info!(routine = name, exercises = exercise_count, "selected routine");
        self.session = Some(WorkoutSession {
            routine_name: name.to_string(),
            groups,
            sets,
            notes,
        });
        exercise_count
    }

    /// Updates one field. Blank text clears it.
    pub fn set_field(
        &mut self,
        key: &ExerciseKey,
        set_index: usize,
        field: SetField,
        value: &str,
    ) -> Result<(), TrackerError> {
        let set = self.set_mut(key, set_index)?;
        let value = value.trim();
        match field {
            SetField::Weight => {
                set.weight = if value.is_empty() {
                    None
                } else {
                    Some(parse_weight(value)?)
                };
            }
            SetField::Reps => {
                set.reps = if value.is_empty() {
                    None
                } else {
                    Some(value.parse::<u32>().map_err(|_| {
                        TrackerError::Validation(format!("reps must be a whole number, got '{value}'"))
                    })?)
                };
            }
        }
        Ok(())
    }

    /// Appends an empty set and returns its 1-based number.
    pub fn add_set(&mut self, key: &ExerciseKey) -> Result<usize, TrackerError> {
        let sets = self.sets_mut(key)?;
        sets.push(SetRecord::default());
        Ok(sets.len())
    }

    pub fn toggle_complete(
        &mut self,
        key: &ExerciseKey,
        set_index: usize,
    ) -> Result<Option<RestRequested>, TrackerError> {
        let rest_seconds = self.rest_seconds;
        let set = self.set_mut(key, set_index)?;
        set.completed = !set.completed;
        Ok(set.is_loggable().then_some(RestRequested {
            seconds: rest_seconds,
        }))
    }

    pub fn set_notes(&mut self, key: &ExerciseKey, text: impl Into<String>) -> Result<(), TrackerError> {
        let session = self.session_mut()?;
        if !session.sets.contains_key(key) {
            return Err(TrackerError::NotFound(format!("exercise {key}")));
        }
        session.notes.insert(key.clone(), text.into());
        Ok(())
    }

    /// Marks a variant active for display. Set data of every variant is left
    /// untouched.
    pub fn switch_variant(
        &mut self,
        group: &str,
        secondary_name: Option<&str>,
    ) -> Result<ExerciseKey, TrackerError> {
        let target = ExerciseKey::new(group, secondary_name);
        let session = self.session_mut()?;
        let group_state = session
            .groups
            .iter_mut()
            .find(|candidate| candidate.name == group)
            .ok_or_else(|| TrackerError::NotFound(format!("exercise {group}")))?;
        let position = group_state
            .variants
            .iter()
            .position(|variant| *variant == target)
            .ok_or_else(|| TrackerError::NotFound(format!("variant {target}")))?;
        group_state.active = position;
        Ok(target)
    }

    pub fn reset(&mut self) {
        self.session = None;
    }

    /// Snapshots completed sets into a pending record and hands it to
    /// `persist`. The session is cleared only once `persist` succeeds.
    pub fn finish<F>(&mut self, today: NaiveDate, persist: F) -> Result<PendingWriteRecord, TrackerError>
    where
        F: FnOnce(&PendingWriteRecord) -> Result<(), TrackerError>,
    {
        let session = self.session.as_ref().ok_or(TrackerError::EmptySession)?;
        let date = today.format("%Y-%m-%d").to_string();
        let mut entries = Vec::new();
        for group in &session.groups {
            for key in &group.variants {
                let notes = session.notes.get(key).cloned().unwrap_or_default();
                let Some(sets) = session.sets.get(key) else {
                    continue;
                };
                for (index, set) in sets.iter().enumerate() {
                    let (true, Some(weight), Some(reps)) = (set.completed, set.weight, set.reps) else {
                        continue;
                    };
                    entries.push(LogEntry {
                        date: date.clone(),
                        routine: session.routine_name.clone(),
                        exercise_name: key.exercise_name.clone(),
                        secondary_name: key.secondary_name.clone(),
                        set_number: index as u32 + 1,
                        weight,
                        reps,
                        notes: notes.clone(),
                    });
                }
            }
        }
        if entries.is_empty() {
            return Err(TrackerError::EmptySession);
        }

        let record = PendingWriteRecord {
            routine_name: session.routine_name.clone(),
            entries,
        };
        persist(&record)?;
        self.session = None;
        info!(
            routine = %record.routine_name,
            entries = record.entries.len(),
            "finished workout"
        );
        Ok(record)
    }

    pub fn exercise_views(&self, previous: &PreviousPerformanceIndex) -> Vec<ExerciseView> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        session
            .groups
            .iter()
            .map(|group| ExerciseView {
                exercise_name: group.name.clone(),
                variants: group
                    .variants
                    .iter()
                    .enumerate()
                    .map(|(position, key)| VariantView {
                        key: key.token(),
                        secondary_name: key.secondary_name.clone(),
                        active: position == group.active,
                        routine_notes: self.routine_notes(&session.routine_name, key),
                        notes: session.notes.get(key).cloned().unwrap_or_default(),
                        sets: session.sets.get(key).cloned().unwrap_or_default(),
                        previous: previous
                            .lookup(&key.exercise_name, key.secondary_name.as_deref()),
                    })
                    .collect(),
            })
            .collect()
    }

    fn routine_notes(&self, routine_name: &str, key: &ExerciseKey) -> String {
        self.routines
            .iter()
            .find(|entry| entry.routine_name == routine_name && entry.key() == *key)
            .map(|entry| entry.notes.clone())
            .unwrap_or_default()
    }

    fn session_mut(&mut self) -> Result<&mut WorkoutSession, TrackerError> {
        self.session
            .as_mut()
            .ok_or_else(|| TrackerError::NotFound("active workout session".to_string()))
    }

    fn sets_mut(&mut self, key: &ExerciseKey) -> Result<&mut Vec<SetRecord>, TrackerError> {
        self.session_mut()?
            .sets
            .get_mut(key)
            .ok_or_else(|| TrackerError::NotFound(format!("exercise {key}")))
    }

    fn set_mut(&mut self, key: &ExerciseKey, set_index: usize) -> Result<&mut SetRecord, TrackerError> {
        let token = key.token();
        self.sets_mut(key)?
            .get_mut(set_index)
            .ok_or(TrackerError::UnknownSet {
                key: token,
                set_index,
            })
    }
}

fn parse_weight(value: &str) -> Result<f64, TrackerError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite() && *weight >= 0.0)
        .ok_or_else(|| TrackerError::Validation(format!("weight must be a non-negative number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn routine(routine: &str, exercise: &str, secondary: Option<&str>, sets: u32) -> RoutineEntry {
        RoutineEntry {
            routine_name: routine.to_string(),
            exercise_name: exercise.to_string(),
            secondary_name: secondary.map(str::to_string),
            notes: String::new(),
            default_sets: sets,
        }
    }

    fn push_day() -> WorkoutSessionEngine {
        WorkoutSessionEngine::new(
            vec![
                routine("Push", "Bench Press", Some("Barbell"), 3),
                routine("Push", "Bench Press", Some("Dumbbell"), 2),
                routine("Push", "Dips", None, 3),
                routine("Pull", "Row", None, 4),
            ],
            90,
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date")
    }

    fn fill(engine: &mut WorkoutSessionEngine, key: &ExerciseKey, index: usize, weight: &str, reps: &str) {
        engine
            .set_field(key, index, SetField::Weight, weight)
            .expect("set weight");
        engine
            .set_field(key, index, SetField::Reps, reps)
            .expect("set reps");
    }

    #[test]
    fn select_routine_groups_variants_in_first_seen_order() {
        let mut engine = push_day();
        assert_eq!(engine.routine_names(), vec!["Push", "Pull"]);
        assert_eq!(engine.select_routine("Push"), 2);

        let barbell = ExerciseKey::new("Bench Press", Some("Barbell"));
        let dumbbell = ExerciseKey::new("Bench Press", Some("Dumbbell"));
        assert_eq!(engine.sets(&barbell).map(<[SetRecord]>::len), Some(3));
        assert_eq!(engine.sets(&dumbbell).map(<[SetRecord]>::len), Some(2));
        assert_eq!(engine.active_variant("Bench Press"), Some(&barbell));
    }

    #[test]
    fn unknown_routine_yields_empty_session() {
        let mut engine = push_day();
        assert_eq!(engine.select_routine("Legs"), 0);
        assert!(engine.has_session());
        assert!(engine.exercise_views(&PreviousPerformanceIndex::default()).is_empty());
        assert!(matches!(
            engine.finish(today(), |_| Ok(())),
            Err(TrackerError::EmptySession)
        ));
    }

    #[test]
    fn finish_numbers_sets_by_position_not_completion_count() {
        let mut engine = push_day();
        engine.select_routine("Push");
        let dips = ExerciseKey::new("Dips", None);
        fill(&mut engine, &dips, 0, "100", "5");
        engine.toggle_complete(&dips, 0).expect("toggle");
        fill(&mut engine, &dips, 2, "110", "3");
        engine.toggle_complete(&dips, 2).expect("toggle");
        engine.set_notes(&dips, "slow negatives").expect("notes");

        let record = engine.finish(today(), |_| Ok(())).expect("finish");
        assert_eq!(record.routine_name, "Push");
        let numbers = record.entries.iter().map(|entry| entry.set_number).collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 3]);
        assert!(record.entries.iter().all(|entry| entry.date == "2026-10-15"));
        assert!(record.entries.iter().all(|entry| entry.notes == "slow negatives"));
        assert!(!engine.has_session());
    }

    #[test]
    fn failed_persist_keeps_session_intact() {
        let mut engine = push_day();
        engine.select_routine("Push");
        let dips = ExerciseKey::new("Dips", None);
        fill(&mut engine, &dips, 0, "20", "10");
        engine.toggle_complete(&dips, 0).expect("toggle");

        let result = engine.finish(today(), |_| Err(TrackerError::PendingWriteOutstanding("workout")));
        assert!(matches!(result, Err(TrackerError::PendingWriteOutstanding(_))));
        assert!(engine.has_session());
        assert!(engine.sets(&dips).expect("sets")[0].completed);
    }

    #[test]
    fn toggle_requests_rest_only_when_complete_with_values() {
        let mut engine = push_day();
        engine.select_routine("Push");
        let dips = ExerciseKey::new("Dips", None);

        engine
            .set_field(&dips, 0, SetField::Weight, "20")
            .expect("set weight");
        assert_eq!(engine.toggle_complete(&dips, 0).expect("toggle"), None);
        assert_eq!(engine.toggle_complete(&dips, 0).expect("toggle"), None);

        engine
            .set_field(&dips, 0, SetField::Reps, "8")
            .expect("set reps");
        assert_eq!(
            engine.toggle_complete(&dips, 0).expect("toggle"),
            Some(RestRequested { seconds: 90 })
        );
        assert_eq!(engine.toggle_complete(&dips, 0).expect("toggle"), None);
    }

    #[test]
    fn invalid_input_and_bad_indices_are_reported() {
        let mut engine = push_day();
        engine.select_routine("Push");
        let dips = ExerciseKey::new("Dips", None);

        assert!(matches!(
            engine.set_field(&dips, 0, SetField::Reps, "eight"),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            engine.set_field(&dips, 0, SetField::Weight, "-5"),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            engine.set_field(&dips, 3, SetField::Reps, "8"),
            Err(TrackerError::UnknownSet { set_index: 3, .. })
        ));
        assert!(matches!(
            engine.toggle_complete(&ExerciseKey::new("Squat", None), 0),
            Err(TrackerError::NotFound(_))
        ));

        fill(&mut engine, &dips, 0, "20", "8");
        engine
            .set_field(&dips, 0, SetField::Weight, "  ")
            .expect("clear weight");
        assert_eq!(engine.sets(&dips).expect("sets")[0].weight, None);
    }

    #[test]
    fn add_set_returns_new_set_number() {
        let mut engine = push_day();
        engine.select_routine("Push");
        let dips = ExerciseKey::new("Dips", None);
        assert_eq!(engine.add_set(&dips).expect("add set"), 4);
        fill(&mut engine, &dips, 3, "25", "6");
        engine.toggle_complete(&dips, 3).expect("toggle");
        let record = engine.finish(today(), |_| Ok(())).expect("finish");
        assert_eq!(record.entries[0].set_number, 4);
    }

    #[test]
    fn apply_routes_commands_and_emits_rest_request() {
        let mut engine = push_day();
        let dips = ExerciseKey::new("Dips", None);
        engine
            .apply(SessionCommand::SelectRoutine { name: "Push".to_string() })
            .expect("select");
        for (field, value) in [(SetField::Weight, "30"), (SetField::Reps, "10")] {
            engine
                .apply(SessionCommand::SetField {
                    key: dips.clone(),
                    set_index: 1,
                    field,
                    value: value.to_string(),
                })
                .expect("set field");
        }
        let events = engine
            .apply(SessionCommand::ToggleComplete { key: dips.clone(), set_index: 1 })
            .expect("toggle");
        assert_eq!(
            events,
            vec![
                SessionEvent::CompletionToggled {
                    key: "Dips".to_string(),
                    set_index: 1,
                    completed: true,
                },
                SessionEvent::RestRequested { seconds: 90 },
            ]
        );

        let events = engine.apply(SessionCommand::Reset).expect("reset");
        assert_eq!(events, vec![SessionEvent::SessionReset]);
        assert!(!engine.has_session());
    }

    #[test]
    fn exercise_views_attach_previous_performance_per_variant() {
        let mut engine = push_day();
        engine.select_routine("Push");
        let index = PreviousPerformanceIndex::new(vec![LogEntry {
            date: "2026-10-01".to_string(),
            routine: "Push".to_string(),
            exercise_name: "Bench Press".to_string(),
            secondary_name: Some("Dumbbell".to_string()),
            set_number: 1,
            weight: 32.5,
            reps: 10,
            notes: String::new(),
        }]);

        let views = engine.exercise_views(&index);
        assert_eq!(views.len(), 2);
        let bench = &views[0];
        assert_eq!(bench.variants.len(), 2);
        assert!(bench.variants[0].active);
        assert_eq!(bench.variants[0].previous, None);
        assert_eq!(bench.variants[1].previous.as_deref(), Some("32.5kg × 10"));
    }

    proptest! {
        #[test]
        fn finish_emits_one_entry_per_loggable_set(
            sets in proptest::collection::vec(
                (proptest::option::of(0u32..300), proptest::option::of(1u32..30), any::<bool>()),
                1..12,
            )
        ) {
            let mut engine = WorkoutSessionEngine::new(
                vec![routine("Legs", "Squat", None, sets.len() as u32)],
                60,
            );
            engine.select_routine("Legs");
            let key = ExerciseKey::new("Squat", None);
            for (index, (weight, reps, completed)) in sets.iter().enumerate() {
                let weight_text = weight.map(|value| value.to_string()).unwrap_or_default();
                let reps_text = reps.map(|value| value.to_string()).unwrap_or_default();
                engine.set_field(&key, index, SetField::Weight, &weight_text).expect("weight");
                engine.set_field(&key, index, SetField::Reps, &reps_text).expect("reps");
                if *completed {
                    engine.toggle_complete(&key, index).expect("toggle");
                }
            }

            let expected = sets
                .iter()
                .enumerate()
                .filter(|(_, (weight, reps, completed))| *completed && weight.is_some() && reps.is_some())
                .map(|(index, _)| index as u32 + 1)
                .collect::<Vec<_>>();

            match engine.finish(today(), |_| Ok(())) {
                Ok(record) => {
                    let numbers = record.entries.iter().map(|entry| entry.set_number).collect::<Vec<_>>();
                    prop_assert_eq!(numbers, expected);
                }
                Err(TrackerError::EmptySession) => prop_assert!(expected.is_empty()),
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }

        #[test]
        fn switching_variants_never_touches_set_data(
            weight in 1u32..300,
            reps in 1u32..30,
            switches in proptest::collection::vec(any::<bool>(), 1..8),
        ) {
            let mut engine = push_day();
            engine.select_routine("Push");
            let barbell = ExerciseKey::new("Bench Press", Some("Barbell"));
            let dumbbell = ExerciseKey::new("Bench Press", Some("Dumbbell"));
            fill(&mut engine, &barbell, 1, &weight.to_string(), &reps.to_string());
            let barbell_before = engine.sets(&barbell).expect("sets").to_vec();
            let dumbbell_before = engine.sets(&dumbbell).expect("sets").to_vec();

            for to_dumbbell in switches {
                let secondary = if to_dumbbell { "Dumbbell" } else { "Barbell" };
                engine.switch_variant("Bench Press", Some(secondary)).expect("switch");
            }

            prop_assert_eq!(engine.sets(&barbell).expect("sets"), barbell_before.as_slice());
            prop_assert_eq!(engine.sets(&dumbbell).expect("sets"), dumbbell_before.as_slice());
        }
    }
}
