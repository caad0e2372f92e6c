//! Read-only views over the record rows.
//!
//! Every report takes the rows plus the reference time explicitly, so results
//! are reproducible in tests.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::{
    Record,
    dates::{days_since, minutes_since},
};

pub const DEFAULT_INACTIVE_DAYS: i64 = 14;
pub const DEFAULT_FOLLOWUP_DAYS: i64 = 12;
pub const DEFAULT_RECENT_MINUTES: i64 = 60;
/// Only the newest rows are scanned for recent entries.
pub const RECENT_SCAN_LIMIT: usize = 50;
pub const FOLLOWUP_TOLERANCE_DAYS: i64 = 1;

#[derive(ToSchema, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InactiveProject {
    #[serde(flatten)]
    pub record: Record,
    pub days_inactive: i64,
}

#[derive(ToSchema, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    #[serde(flatten)]
    pub record: Record,
    pub minutes_ago: i64,
    /// Sheet row number, the header being row 1.
    pub row_index: usize,
}

#[derive(ToSchema, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodayEntries {
    pub data: Vec<Record>,
    pub entries_by_person: BTreeMap<String, Vec<Record>>,
    pub person_counts: BTreeMap<String, usize>,
    pub total_count: usize,
}

/// Case-insensitive substring match on ticker, project name and X handle.
#[must_use]
pub fn search(rows: Vec<Record>, query: &str) -> Vec<Record> {
    let needle = query.trim().to_lowercase();
    rows.into_iter()
        .filter(|row| {
            [&row.ticker, &row.project_name, &row.x_handle]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

fn in_extended_discussion(discussion: &str) -> bool {
    let lower = discussion.to_lowercase();
    lower.contains("in discussion") && lower.contains("month extension")
}

/// Projects whose last contact is at least `threshold_days` old, stalest first.
///
/// The discussion cell counts as the last contact whenever it is filled in;
/// the initial recording date is used otherwise.
#[must_use]
pub fn inactive(rows: Vec<Record>, threshold_days: i64, today: NaiveDate) -> Vec<InactiveProject> {
    let mut projects: Vec<InactiveProject> = rows
        .into_iter()
        .filter(|row| !in_extended_discussion(&row.discussion_date))
        .filter_map(|row| {
            let last_contact = if row.discussion_date.trim().is_empty() {
                &row.initial_recording_date
            } else {
                &row.discussion_date
            };
            let days_inactive = days_since(last_contact, today)?;
            (days_inactive >= threshold_days).then_some(InactiveProject {
                record: row,
                days_inactive,
            })
        })
        .collect();
    projects.sort_by(|a, b| b.days_inactive.cmp(&a.days_inactive));
    projects
}

/// Records owned by one of `contacts` and first recorded `target_days` ago,
/// give or take a day.
#[must_use]
pub fn follow_up(
    rows: Vec<Record>,
    target_days: i64,
    contacts: &[String],
    today: NaiveDate,
) -> Vec<Record> {
    let window = target_days.saturating_sub(FOLLOWUP_TOLERANCE_DAYS)
        ..=target_days.saturating_add(FOLLOWUP_TOLERANCE_DAYS);
    rows.into_iter()
        .filter(|row| {
            let person = row.contact_person.trim();
            contacts
                .iter()
                .any(|contact| contact.eq_ignore_ascii_case(person))
        })
        .filter(|row| {
            days_since(&row.initial_recording_date, today).is_some_and(|days| window.contains(&days))
        })
        .collect()
}

/// Rows first recorded today, grouped by contact person.
#[must_use]
pub fn today_entries(rows: Vec<Record>, today: NaiveDate) -> TodayEntries {
    let mut entries = TodayEntries::default();
    for row in rows {
        if days_since(&row.initial_recording_date, today) != Some(0) {
            continue;
        }
        let person = row.contact_person.trim();
        if !person.is_empty() {
            entries
                .entries_by_person
                .entry(person.to_string())
                .or_default()
                .push(row.clone());
        }
        entries.data.push(row);
    }
    entries.person_counts = entries
        .entries_by_person
        .iter()
        .map(|(person, records)| (person.clone(), records.len()))
        .collect();
    entries.total_count = entries.data.len();
    entries
}

/// Entries among the newest rows recorded at most `minutes` ago, most recent first.
#[must_use]
pub fn recent_entries(rows: Vec<Record>, minutes: i64, now: NaiveDateTime) -> Vec<RecentEntry> {
    let mut entries: Vec<RecentEntry> = rows
        .into_iter()
        .take(RECENT_SCAN_LIMIT)
        .enumerate()
        .filter_map(|(index, row)| {
            let minutes_ago = minutes_since(&row.initial_recording_date, now)?;
            (minutes_ago <= minutes).then_some(RecentEntry {
                record: row,
                minutes_ago,
                row_index: index + 2,
            })
        })
        .collect();
    entries.sort_by_key(|entry| entry.minutes_ago);
    entries
}

/// Positive integer query value, or `default` for anything else.
#[must_use]
pub fn positive_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|parsed| *parsed > 0)
        .unwrap_or(default)
}
