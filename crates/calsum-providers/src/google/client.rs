//! Google Calendar API v3 client.
//!
//! Low-level HTTP client for the two listing endpoints the summary needs,
//! plus conversion from API payloads to the domain records the aggregator
//! consumes.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;
use crate::summary::{CalendarEntry, CalendarSource, EventRecord, SummaryWindow};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client, authenticated with a bearer access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Creates a client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
        })
    }

    /// Replaces the access token after a refresh.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    async fn get_calendars(
        &self,
        min_access_role: &str,
        max_results: u32,
    ) -> ProviderResult<Vec<CalendarEntry>> {
        let url = format!("{}/users/me/calendarList", CALENDAR_API_BASE);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("minAccessRole", min_access_role.to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = check_status(response).await?;
        let list: CalendarListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse calendar list: {}", e))
        })?;

        debug!(calendars = list.items.len(), "listed calendars");
        Ok(list
            .items
            .into_iter()
            .map(|c| CalendarEntry::new(c.id, c.summary.unwrap_or_default()))
            .collect())
    }

    async fn get_events(
        &self,
        calendar_id: &str,
        window: &SummaryWindow,
    ) -> ProviderResult<Vec<EventRecord>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[
                    ("timeMin", window.time_min.to_rfc3339()),
                    ("timeMax", window.time_max.to_rfc3339()),
                    ("singleEvents", "true".to_string()),
                    ("showDeleted", "false".to_string()),
                    ("orderBy", "updated".to_string()),
                ]);

            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(map_transport_error)?;
            let body = check_status(response).await?;

            let page: EventListResponse = serde_json::from_str(&body).map_err(|e| {
                ProviderError::invalid_response(format!("failed to parse event list: {}", e))
            })?;

            events.extend(page.items.into_iter().map(EventRecord::from));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            calendar = calendar_id,
            events = events.len(),
            "listed events"
        );
        Ok(events)
    }
}

impl CalendarSource for GoogleCalendarClient {
    fn list_calendars<'a>(
        &'a self,
        min_access_role: &'a str,
        max_results: u32,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEntry>>> {
        Box::pin(self.get_calendars(min_access_role, max_results))
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a SummaryWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<EventRecord>>> {
        Box::pin(self.get_events(calendar_id, window))
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    }
}

/// Maps an API response status to an error, or returns the body on success.
async fn check_status(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProviderError::authentication(
            "access token expired or invalid",
        ));
    }

    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::authorization("access denied to calendar"));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::rate_limited("rate limit exceeded"));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::server(format!(
            "API error ({}): {}",
            status, body
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<ApiCalendar>,
}

/// A calendar from the calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCalendar {
    id: String,
    summary: Option<String>,
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    summary: Option<String>,
    created: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    recurring_event_id: Option<String>,
}

/// Event time bound from the API.
///
/// Timed events carry `dateTime`; all-day events carry only `date`, which
/// the summary treats as an absent timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<String>,
}

impl From<ApiEvent> for EventRecord {
    fn from(event: ApiEvent) -> Self {
        // Under singleEvents=true, instances of a recurring series carry
        // recurringEventId; that is the recurrence signal.
        let recurring = event.recurring_event_id.is_some();
        EventRecord {
            summary: event.summary.unwrap_or_default(),
            created: event.created.unwrap_or_default(),
            start: event.start.and_then(|t| t.date_time),
            end: event.end.and_then(|t| t.date_time),
            recurring,
        }
    }
}
