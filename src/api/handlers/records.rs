//! Record endpoints. Every route here sits behind the session gateway.

use axum::{
    Json,
    extract::{Extension, Query, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

use super::auth::{
    clock::{Clock, SystemClock},
    types::MessageResponse,
};
use crate::records::{
    Record, RecordStore, RecordStoreError,
    reports::{self, InactiveProject, RecentEntry},
};

pub const DEFAULT_FOLLOWUP_CONTACTS: [&str; 2] = ["ash", "yvonne"];

/// Shared state for the record endpoints.
pub struct RecordsState {
    store: Arc<dyn RecordStore>,
    followup_contacts: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl RecordsState {
    /// An empty contact list falls back to [`DEFAULT_FOLLOWUP_CONTACTS`].
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, followup_contacts: Vec<String>) -> Self {
        Self::with_clock(store, followup_contacts, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        followup_contacts: Vec<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let followup_contacts: Vec<String> = followup_contacts
            .into_iter()
            .map(|contact| contact.trim().to_string())
            .filter(|contact| !contact.is_empty())
            .collect();
        let followup_contacts = if followup_contacts.is_empty() {
            DEFAULT_FOLLOWUP_CONTACTS.map(str::to_string).to_vec()
        } else {
            followup_contacts
        };
        Self {
            store,
            followup_contacts,
            clock,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn followup_contacts(&self) -> &[String] {
        &self.followup_contacts
    }

    /// Current local wall-clock time; dates in the sheet carry no zone.
    fn local_now(&self) -> NaiveDateTime {
        DateTime::from_timestamp_millis(self.clock.now_millis())
            .map_or_else(|| Local::now().naive_local(), |utc| {
                utc.with_timezone(&Local).naive_local()
            })
    }
}

impl IntoResponse for RecordStoreError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingIdentity => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(MessageResponse::failure(self.to_string()))).into_response()
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matched against ticker, project name and X handle.
    query: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct DaysQuery {
    /// Whole days; non-positive or invalid values use the default.
    days: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct MinutesQuery {
    /// Whole minutes; non-positive or invalid values use the default.
    minutes: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RecordsResponse {
    success: bool,
    data: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    message: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct InactiveResponse {
    success: bool,
    data: Vec<InactiveProject>,
    message: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TodayEntriesResponse {
    success: bool,
    data: Vec<Record>,
    entries_by_person: BTreeMap<String, Vec<Record>>,
    person_counts: BTreeMap<String, usize>,
    total_count: usize,
    message: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RecentEntriesResponse {
    success: bool,
    data: Vec<RecentEntry>,
    count: usize,
    message: String,
}

#[utoipa::path(
    post,
    path = "/api/add",
    request_body = Record,
    responses(
        (status = 200, description = "Record added", body = MessageResponse),
        (status = 400, description = "Malformed body, or ticker and project name missing", body = MessageResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Cross-origin request", body = MessageResponse),
        (status = 500, description = "Record store failure", body = MessageResponse)
    ),
    tag = "records"
)]
pub async fn add(
    records_state: Extension<Arc<RecordsState>>,
    payload: Result<Json<Record>, JsonRejection>,
) -> Response {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => {
            debug!("Invalid record payload: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::failure("Invalid record payload")),
            )
                .into_response();
        }
    };

    let label = if record.ticker.trim().is_empty() {
        record.project_name.clone()
    } else {
        record.ticker.clone()
    };

    match records_state.store().insert(record) {
        Ok(()) => {
            info!("Record added: {label}");
            (
                StatusCode::OK,
                Json(MessageResponse {
                    success: true,
                    message: "Record added successfully".to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching records", body = RecordsResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Cross-origin request", body = MessageResponse),
        (status = 500, description = "Record store failure", body = MessageResponse)
    ),
    tag = "records"
)]
pub async fn search(
    records_state: Extension<Arc<RecordsState>>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let rows = match records_state.store().rows() {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };
    let query = params.query.unwrap_or_default();
    let data = reports::search(rows, &query);
    let message = format!("Found {} matching record(s)", data.len());
    Json(RecordsResponse {
        success: true,
        data,
        count: None,
        message,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/api/inactive",
    params(DaysQuery),
    responses(
        (status = 200, description = "Projects without contact for the given number of days", body = InactiveResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Cross-origin request", body = MessageResponse),
        (status = 500, description = "Record store failure", body = MessageResponse)
    ),
    tag = "records"
)]
pub async fn inactive(
    records_state: Extension<Arc<RecordsState>>,
    Query(params): Query<DaysQuery>,
) -> Response {
    let rows = match records_state.store().rows() {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };
    let days = reports::positive_or(params.days.as_deref(), reports::DEFAULT_INACTIVE_DAYS);
    let today = records_state.local_now().date();
    let data = reports::inactive(rows, days, today);
    let message = format!(
        "Found {} project(s) inactive for {days}+ days",
        data.len()
    );
    Json(InactiveResponse {
        success: true,
        data,
        message,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/api/followup",
    params(DaysQuery),
    responses(
        (status = 200, description = "Records due for a follow-up", body = RecordsResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Cross-origin request", body = MessageResponse),
        (status = 500, description = "Record store failure", body = MessageResponse)
    ),
    tag = "records"
)]
pub async fn followup(
    records_state: Extension<Arc<RecordsState>>,
    Query(params): Query<DaysQuery>,
) -> Response {
    let rows = match records_state.store().rows() {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };
    let days = reports::positive_or(params.days.as_deref(), reports::DEFAULT_FOLLOWUP_DAYS);
    let today = records_state.local_now().date();
    let data = reports::follow_up(rows, days, records_state.followup_contacts(), today);
    let message = format!(
        "Found {} record(s) from {} contacted {days} days ago (±{} day)",
        data.len(),
        records_state.followup_contacts().join("/"),
        reports::FOLLOWUP_TOLERANCE_DAYS
    );
    Json(RecordsResponse {
        success: true,
        count: Some(data.len()),
        data,
        message,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/api/today-entries",
    responses(
        (status = 200, description = "Records first recorded today, grouped by contact person", body = TodayEntriesResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Cross-origin request", body = MessageResponse),
        (status = 500, description = "Record store failure", body = MessageResponse)
    ),
    tag = "records"
)]
pub async fn today_entries(records_state: Extension<Arc<RecordsState>>) -> Response {
    let rows = match records_state.store().rows() {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };
    let today = records_state.local_now().date();
    let entries = reports::today_entries(rows, today);
    let message = format!("Found {} entries made today", entries.total_count);
    Json(TodayEntriesResponse {
        success: true,
        data: entries.data,
        entries_by_person: entries.entries_by_person,
        person_counts: entries.person_counts,
        total_count: entries.total_count,
        message,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/api/new-entry",
    params(MinutesQuery),
    responses(
        (status = 200, description = "Entries recorded in the last minutes", body = RecentEntriesResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Cross-origin request", body = MessageResponse),
        (status = 500, description = "Record store failure", body = MessageResponse)
    ),
    tag = "records"
)]
pub async fn new_entry(
    records_state: Extension<Arc<RecordsState>>,
    Query(params): Query<MinutesQuery>,
) -> Response {
    let rows = match records_state.store().rows() {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };
    let minutes = reports::positive_or(params.minutes.as_deref(), reports::DEFAULT_RECENT_MINUTES);
    let data = reports::recent_entries(rows, minutes, records_state.local_now());
    let message = format!(
        "Found {} new entries in the last {minutes} minutes",
        data.len()
    );
    Json(RecentEntriesResponse {
        success: true,
        count: data.len(),
        data,
        message,
    })
    .into_response()
}
