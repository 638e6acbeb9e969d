use crate::infrastructure::error::TrackerError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

pub const ROUTINES_RANGE: &str = "Routines";
pub const WORKOUT_LOG_RANGE: &str = "WorkoutLog";
pub const CALORIE_LOG_RANGE: &str = "CalorieLog";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendResult {
    /// A1 range the backend wrote, e.g. `CalorieLog!A7:D7`.
    pub updated_range: Option<String>,
}

/// Read/append/clear against named ranges of the tabular backend.
///
/// Authorization failures are reported as [`TrackerError::AuthExpired`];
/// every other failure is a [`TrackerError::Transport`].
#[async_trait]
pub trait RemoteStoreGateway: Send + Sync {
    async fn read(&self, access_token: &str, range: &str) -> Result<Vec<Vec<String>>, TrackerError>;

    async fn append(
        &self,
        access_token: &str,
        range: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<AppendResult, TrackerError>;

    async fn clear(&self, access_token: &str, range: &str) -> Result<(), TrackerError>;
}

/// Extracts the first row number from an A1 range such as `'Calorie Log'!A12:D12`.
pub fn first_row_of_range(range: &str) -> Option<u32> {
    let cells = range.rsplit_once('!').map_or(range, |(_, cells)| cells);
    let first = cells.split(':').next()?;
    let digits = first.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$');
    digits.parse::<u32>().ok().filter(|row| *row > 0)
}

pub fn row_range(sheet: &str, row: u32, first_column: char, last_column: char) -> String {
    format!("{sheet}!{first_column}{row}:{last_column}{row}")
}

#[derive(Debug, Clone)]
pub struct ReqwestSheetsGateway {
    client: Client,
    spreadsheet_id: String,
}

#[derive(Debug, serde::Deserialize)]
struct ValueRangeResponse {
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, serde::Serialize)]
struct ValueRangeRequest {
    values: Vec<Vec<Value>>,
}

#[derive(Debug, serde::Deserialize)]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, serde::Deserialize)]
struct AppendUpdates {
    #[serde(rename = "updatedRange")]
    updated_range: Option<String>,
}

impl ReqwestSheetsGateway {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), TrackerError> {
        if value.trim().is_empty() {
            return Err(TrackerError::Transport(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn classify_http_error(status: StatusCode, body: &str) -> TrackerError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return TrackerError::AuthExpired;
        }
        if body.trim().is_empty() {
            TrackerError::Transport(format!("sheets api error: http {}", status.as_u16()))
        } else {
            TrackerError::Transport(format!(
                "sheets api error: http {}; body={body}",
                status.as_u16()
            ))
        }
    }

    /// `values/{range}` with an optional `:{action}` suffix on the last segment.
    fn values_endpoint(&self, range: &str, action: Option<&str>) -> Result<Url, TrackerError> {
        Self::ensure_non_empty(&self.spreadsheet_id, "spreadsheet id")?;
        Self::ensure_non_empty(range, "range")?;
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|error| TrackerError::Transport(format!("invalid sheets api base url: {error}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TrackerError::Transport("sheets api base URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.push("spreadsheets");
            segments.push(&self.spreadsheet_id);
            segments.push("values");
            match action {
                Some(action) => segments.push(&format!("{range}:{action}")),
                None => segments.push(range),
            };
        }
        Ok(url)
    }

    async fn read_body(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<String, TrackerError> {
        let status = response.status();
        let body = response.text().await.map_err(|error| {
            TrackerError::Transport(format!("failed reading {operation} response: {error}"))
        })?;
        if !status.is_success() {
            return Err(Self::classify_http_error(status, &body));
        }
        Ok(body)
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RemoteStoreGateway for ReqwestSheetsGateway {
    async fn read(&self, access_token: &str, range: &str) -> Result<Vec<Vec<String>>, TrackerError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.values_endpoint(range, None)?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| TrackerError::Transport(format!("network error while reading {range}: {error}")))?;
        let body = Self::read_body(response, "read").await?;

        let parsed: ValueRangeResponse = serde_json::from_str(&body).map_err(|error| {
            TrackerError::Transport(format!("invalid read payload: {error}; body={body}"))
        })?;
        let rows = parsed
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        debug!(range, rows = rows.len(), "read sheet range");
        Ok(rows)
    }

    async fn append(
        &self,
        access_token: &str,
        range: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<AppendResult, TrackerError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.values_endpoint(range, Some("append"))?;
        let row_count = rows.len();
        let response = self
            .client
            .post(endpoint)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .bearer_auth(access_token)
            .json(&ValueRangeRequest { values: rows })
            .send()
            .await
            .map_err(|error| TrackerError::Transport(format!("network error while appending to {range}: {error}")))?;
        let body = Self::read_body(response, "append").await?;

        let parsed: AppendResponse = serde_json::from_str(&body).map_err(|error| {
            TrackerError::Transport(format!("invalid append payload: {error}; body={body}"))
        })?;
        let updated_range = parsed.updates.and_then(|updates| updates.updated_range);
        debug!(range, rows = row_count, updated_range = ?updated_range, "appended sheet rows");
        Ok(AppendResult { updated_range })
    }

    async fn clear(&self, access_token: &str, range: &str) -> Result<(), TrackerError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.values_endpoint(range, Some("clear"))?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(access_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|error| TrackerError::Transport(format!("network error while clearing {range}: {error}")))?;
        Self::read_body(response, "clear").await?;
        debug!(range, "cleared sheet range");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_is_read_from_updated_range() {
        assert_eq!(first_row_of_range("CalorieLog!A7:D7"), Some(7));
        assert_eq!(first_row_of_range("'Calorie Log'!$A$12:$D$12"), Some(12));
        assert_eq!(first_row_of_range("A3"), Some(3));
        assert_eq!(first_row_of_range("CalorieLog!A:D"), None);
        assert_eq!(first_row_of_range(""), None);
    }

    #[test]
    fn row_range_targets_single_row() {
        assert_eq!(row_range(CALORIE_LOG_RANGE, 9, 'A', 'D'), "CalorieLog!A9:D9");
    }

    #[test]
    fn authorization_statuses_classify_as_auth_expired() {
        assert!(matches!(
            ReqwestSheetsGateway::classify_http_error(StatusCode::UNAUTHORIZED, ""),
            TrackerError::AuthExpired
        ));
        assert!(matches!(
            ReqwestSheetsGateway::classify_http_error(StatusCode::FORBIDDEN, "denied"),
            TrackerError::AuthExpired
        ));
        match ReqwestSheetsGateway::classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            TrackerError::Transport(message) => assert!(message.contains("500")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn values_endpoint_encodes_range_and_action() {
        let gateway = ReqwestSheetsGateway::new("sheet-123");
        let read = gateway.values_endpoint("WorkoutLog", None).expect("read url");
        assert_eq!(
            read.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/WorkoutLog"
        );
        let clear = gateway
            .values_endpoint("CalorieLog!A4:D4", Some("clear"))
            .expect("clear url");
        assert!(clear.as_str().ends_with("/values/CalorieLog!A4:D4:clear"));
    }

    #[test]
    fn missing_spreadsheet_id_is_rejected_before_network() {
        let gateway = ReqwestSheetsGateway::new("  ");
        assert!(gateway.values_endpoint("Routines", None).is_err());
    }

    #[test]
    fn cells_are_normalized_to_text() {
        assert_eq!(cell_to_string(Value::from("Bench")), "Bench");
        assert_eq!(cell_to_string(Value::from(5)), "5");
        assert_eq!(cell_to_string(Value::Null), "");
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub(crate) enum FakeAppendResponse {
        Success(Option<String>),
        AuthExpired,
        NetworkError,
    }

    /// Scripted gateway. Reads serve fixed tables; appends pop scripted
    /// responses and default to success without an updated range.
    #[derive(Debug, Default)]
    pub(crate) struct FakeGateway {
        pub tables: Mutex<HashMap<String, Vec<Vec<String>>>>,
        pub append_responses: Mutex<VecDeque<FakeAppendResponse>>,
        pub appended: Mutex<Vec<(String, Vec<Vec<Value>>)>>,
        pub cleared: Mutex<Vec<String>>,
        pub read_calls: AtomicUsize,
        pub append_calls: AtomicUsize,
        pub clear_calls: AtomicUsize,
        pub fail_clear_with_auth: AtomicBool,
    }

    impl FakeGateway {
        pub fn with_append_responses(responses: Vec<FakeAppendResponse>) -> Self {
            Self {
                append_responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        pub fn with_table(self, range: &str, rows: Vec<Vec<&str>>) -> Self {
            self.tables.lock().expect("tables lock poisoned").insert(
                range.to_string(),
                rows.into_iter()
                    .map(|row| row.into_iter().map(str::to_string).collect())
                    .collect(),
            );
            self
        }

        pub fn append_count(&self) -> usize {
            self.append_calls.load(Ordering::SeqCst)
        }

        pub fn appended_rows(&self) -> Vec<(String, Vec<Vec<Value>>)> {
            self.appended.lock().expect("appended lock poisoned").clone()
        }

        pub fn cleared_ranges(&self) -> Vec<String> {
            self.cleared.lock().expect("cleared lock poisoned").clone()
        }
    }

    #[async_trait]
    impl RemoteStoreGateway for FakeGateway {
        async fn read(&self, _access_token: &str, range: &str) -> Result<Vec<Vec<String>>, TrackerError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .tables
                .lock()
                .expect("tables lock poisoned")
                .get(range)
                .cloned()
                .unwrap_or_default())
        }

        async fn append(
            &self,
            _access_token: &str,
            range: &str,
            rows: Vec<Vec<Value>>,
        ) -> Result<AppendResult, TrackerError> {
            self.append_calls.fetch_add(1, Ordering::SeqCst);
            let response = self
                .append_responses
                .lock()
                .expect("append response lock poisoned")
                .pop_front()
                .unwrap_or(FakeAppendResponse::Success(None));
            match response {
                FakeAppendResponse::Success(updated_range) => {
                    self.appended
                        .lock()
                        .expect("appended lock poisoned")
                        .push((range.to_string(), rows));
                    Ok(AppendResult { updated_range })
                }
                FakeAppendResponse::AuthExpired => Err(TrackerError::AuthExpired),
                FakeAppendResponse::NetworkError => Err(TrackerError::Transport(format!(
                    "network error while appending to {range}"
                ))),
            }
        }

        async fn clear(&self, _access_token: &str, range: &str) -> Result<(), TrackerError> {
            self.clear_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_clear_with_auth.load(Ordering::SeqCst) {
                return Err(TrackerError::AuthExpired);
            }
            self.cleared
                .lock()
                .expect("cleared lock poisoned")
                .push(range.to_string());
            Ok(())
        }
    }
}
