//! Summary types and the aggregation loop.
//!
//! The aggregator walks every calendar the user owns, pulls the events in
//! the trailing one-month window and flattens them into [`SummaryEvent`]
//! records, calendar-major then event-minor order. Timestamps stay raw
//! strings until this point; a missing or malformed start/end fails the
//! whole summarization, never producing partial results.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;

/// Access role filter for calendar listing.
pub const OWNER_ACCESS_ROLE: &str = "owner";

/// Cap on the number of calendars fetched per summary.
pub const MAX_CALENDARS: u32 = 20;

/// A calendar the authenticated user owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    /// Provider identifier, used for event listing calls.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
}

impl CalendarEntry {
    /// Creates a new calendar entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A raw event as returned by the provider.
///
/// Start and end are kept as the provider's RFC3339 strings so that parse
/// failures surface during summarization rather than being silently
/// skipped at the API boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    /// Event title.
    pub summary: String,
    /// Creation timestamp, passed through verbatim.
    pub created: String,
    /// RFC3339 start timestamp, if the provider supplied one.
    pub start: Option<String>,
    /// RFC3339 end timestamp, if the provider supplied one.
    pub end: Option<String>,
    /// Whether this is an instance of a recurring series.
    pub recurring: bool,
}

/// One line of the flattened summary output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEvent {
    /// Display name of the owning calendar.
    pub calendar: String,
    /// Event title.
    pub summary: String,
    /// Creation timestamp (raw RFC3339 string, not reparsed).
    pub created: String,
    /// Whether the event is an instance of a recurring series.
    pub recurring_event: bool,
    /// Duration in minutes; fractional values are possible.
    pub event_time: f64,
}

/// The time window a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindow {
    /// Lower bound (inclusive) for event start times.
    pub time_min: DateTime<Utc>,
    /// Upper bound for event start times.
    pub time_max: DateTime<Utc>,
}

impl SummaryWindow {
    /// The window from one calendar month ago up to `now`.
    pub fn trailing_month(now: DateTime<Utc>) -> Self {
        let time_min = now
            .checked_sub_months(Months::new(1))
            .unwrap_or(now - chrono::Duration::days(30));
        Self {
            time_min,
            time_max: now,
        }
    }
}

/// Listing operations the aggregator needs from a calendar backend.
///
/// Implemented by the Google API client and by mocks in tests.
pub trait CalendarSource: Send + Sync {
    /// Lists calendars the user has at least `min_access_role` on.
    fn list_calendars<'a>(
        &'a self,
        min_access_role: &'a str,
        max_results: u32,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEntry>>>;

    /// Lists events of one calendar within the window, recurring series
    /// expanded, deleted events excluded, ordered by last-updated time.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a SummaryWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<EventRecord>>>;
}

/// Builds the flattened summary for the given window.
///
/// Zero owned calendars yields an empty list, not an error. Any listing
/// error or unparseable timestamp fails the whole call.
pub async fn summarize(
    source: &dyn CalendarSource,
    window: &SummaryWindow,
) -> ProviderResult<Vec<SummaryEvent>> {
    let calendars = source
        .list_calendars(OWNER_ACCESS_ROLE, MAX_CALENDARS)
        .await?;

    if calendars.is_empty() {
        debug!("no owned calendars found");
        return Ok(Vec::new());
    }

    let mut summary = Vec::new();
    for calendar in &calendars {
        let events = source.list_events(&calendar.id, window).await?;
        debug!(
            calendar = %calendar.name,
            events = events.len(),
            "summarizing calendar"
        );
        for event in events {
            summary.push(summarize_event(&calendar.name, event)?);
        }
    }

    Ok(summary)
}

fn summarize_event(calendar: &str, event: EventRecord) -> ProviderResult<SummaryEvent> {
    let event_time = event_minutes(event.start.as_deref(), event.end.as_deref())?;
    Ok(SummaryEvent {
        calendar: calendar.to_string(),
        summary: event.summary,
        created: event.created,
        recurring_event: event.recurring,
        event_time,
    })
}

/// Computes an event's duration in minutes from its RFC3339 bounds.
pub fn event_minutes(start: Option<&str>, end: Option<&str>) -> ProviderResult<f64> {
    let start = parse_bound("start", start)?;
    let end = parse_bound("end", end)?;
    Ok((end - start).num_milliseconds() as f64 / 60_000.0)
}

fn parse_bound(which: &str, value: Option<&str>) -> ProviderResult<DateTime<Utc>> {
    let raw = value.ok_or_else(|| {
        ProviderError::invalid_response(format!("event has no {} timestamp", which))
    })?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ProviderError::invalid_response(format!("unparseable {} timestamp {:?}", which, raw))
                .with_source(e)
        })
}
