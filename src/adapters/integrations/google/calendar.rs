//! Google Calendar adapter. Implements CalendarPort over the Calendar v3 REST API.

use super::credentials::CredentialVault;
use crate::adapters::upstream;
use crate::domain::entities::{CALENDAR_SOURCE, UNTITLED};
use crate::domain::{
    CalendarEvent, CalendarEventCreate, CalendarEventPatch, DomainError, Instant, Metadata,
};
use crate::ports::{CalendarPort, EventQuery, ItemSource, ItemWriter};
use crate::shared::config::GoogleCalendarConfig;
use crate::shared::datetime::{parse_date_or_instant, to_rfc3339, to_utc_z};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

const PROVIDER: &str = "google-calendar";

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
    html_link: Option<String>,
}

/// Either `date` (all-day) or `dateTime` is set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl EventTime {
    fn to_instant(&self) -> Result<Instant, DomainError> {
        let raw = self
            .date_time
            .as_deref()
            .or(self.date.as_deref())
            .ok_or_else(|| DomainError::upstream(PROVIDER, "event time without date or dateTime"))?;
        parse_date_or_instant(raw).map_err(|e| DomainError::upstream(PROVIDER, e))
    }
}

fn event_time(at: &Instant) -> Value {
    json!({ "dateTime": to_rfc3339(at) })
}

/// Overlay the present patch fields onto an upstream event object.
fn apply_patch(patch: &CalendarEventPatch, event: &mut Value) -> Result<(), DomainError> {
    let obj = event
        .as_object_mut()
        .ok_or_else(|| DomainError::upstream(PROVIDER, "event body is not an object"))?;
    if let Some(summary) = &patch.summary {
        obj.insert("summary".into(), json!(summary));
    }
    if let Some(description) = &patch.description {
        obj.insert("description".into(), json!(description));
    }
    if let Some(location) = &patch.location {
        obj.insert("location".into(), json!(location));
    }
    if let Some(start) = &patch.start {
        obj.insert("start".into(), event_time(start));
    }
    if let Some(end) = &patch.end {
        obj.insert("end".into(), event_time(end));
    }
    Ok(())
}

pub struct GoogleCalendarAdapter {
    client: Client,
    config: GoogleCalendarConfig,
    vault: Arc<CredentialVault>,
}

impl GoogleCalendarAdapter {
    pub fn new(
        config: GoogleCalendarConfig,
        vault: Arc<CredentialVault>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            client: upstream::build_client(PROVIDER, config.timeout)?,
            config,
            vault,
        })
    }

    fn events_url(&self) -> Result<Url, DomainError> {
        upstream::endpoint(
            PROVIDER,
            &self.config.api_base,
            &["calendars", &self.config.calendar_id, "events"],
        )
    }

    fn event_url(&self, id: &str) -> Result<Url, DomainError> {
        upstream::endpoint(
            PROVIDER,
            &self.config.api_base,
            &["calendars", &self.config.calendar_id, "events", id],
        )
    }

    async fn request(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder, DomainError> {
        let token = self.vault.access_token().await?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    fn to_domain(event: GoogleEvent) -> Result<CalendarEvent, DomainError> {
        let start = event
            .start
            .as_ref()
            .ok_or_else(|| DomainError::upstream(PROVIDER, "event without start"))?
            .to_instant()?;
        let end = event
            .end
            .as_ref()
            .ok_or_else(|| DomainError::upstream(PROVIDER, "event without end"))?
            .to_instant()?;

        let mut metadata = Metadata::new();
        if let Some(link) = event.html_link {
            metadata.insert("htmlLink".to_string(), Value::String(link));
        }

        Ok(CalendarEvent {
            id: event.id,
            summary: event.summary.unwrap_or_else(|| UNTITLED.to_string()),
            description: event.description,
            start,
            end,
            location: event.location,
            source: CALENDAR_SOURCE.to_string(),
            metadata,
        })
    }

    fn from_value(value: Value) -> Result<CalendarEvent, DomainError> {
        let event: GoogleEvent = serde_json::from_value(value)
            .map_err(|e| DomainError::upstream(PROVIDER, format!("failed to parse event: {e}")))?;
        Self::to_domain(event)
    }
}

#[async_trait::async_trait]
impl ItemSource for GoogleCalendarAdapter {
    type Query = EventQuery;
    type Item = CalendarEvent;

    async fn list_items(&self, query: EventQuery) -> Result<Vec<CalendarEvent>, DomainError> {
        let mut params = vec![
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", query.max_results.to_string()),
        ];
        if let Some(min) = &query.window.after {
            params.push(("timeMin", to_utc_z(min)));
        }
        if let Some(max) = &query.window.before {
            params.push(("timeMax", to_utc_z(max)));
        }
        debug!(?params, "listing calendar events");

        let request = self
            .request(Method::GET, self.events_url()?)
            .await?
            .query(&params);
        let response: EventsResponse = upstream::send_json(PROVIDER, request).await?;

        let events = response
            .items
            .into_iter()
            .map(Self::to_domain)
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = events.len(), "calendar events fetched");
        Ok(events)
    }
}

#[async_trait::async_trait]
impl ItemWriter for GoogleCalendarAdapter {
    type Create = CalendarEventCreate;
    type Patch = CalendarEventPatch;

    async fn create(&self, body: CalendarEventCreate) -> Result<CalendarEvent, DomainError> {
        body.validate()?;

        let mut payload = json!({
            "summary": body.summary,
            "start": event_time(&body.start),
            "end": event_time(&body.end),
        });
        if let Some(description) = &body.description {
            payload["description"] = json!(description);
        }
        if let Some(location) = &body.location {
            payload["location"] = json!(location);
        }

        let request = self
            .request(Method::POST, self.events_url()?)
            .await?
            .json(&payload);
        let created: Value = upstream::send_json(PROVIDER, request).await?;
        let event = Self::from_value(created)?;
        info!(event_id = %event.id, "calendar event created");
        Ok(event)
    }

    async fn patch(&self, id: &str, patch: CalendarEventPatch) -> Result<CalendarEvent, DomainError> {
        patch.validate()?;

        let url = self.event_url(id)?;
        let current: Value =
            upstream::send_json(PROVIDER, self.request(Method::GET, url.clone()).await?).await?;

        // A single bound may still invert the stored range.
        let stored = Self::from_value(current.clone())?;
        patch.validate_over(&stored.start, &stored.end)?;

        let mut merged = current;
        apply_patch(&patch, &mut merged)?;

        let request = self.request(Method::PUT, url).await?.json(&merged);
        let updated: Value = upstream::send_json(PROVIDER, request).await?;
        let event = Self::from_value(updated)?;
        info!(event_id = %event.id, "calendar event updated");
        Ok(event)
    }
}

#[async_trait::async_trait]
impl CalendarPort for GoogleCalendarAdapter {
    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let request = self.request(Method::DELETE, self.event_url(id)?).await?;
        upstream::send(PROVIDER, request).await?;
        info!(event_id = %id, "calendar event deleted");
        Ok(())
    }
}
