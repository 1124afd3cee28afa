// Calendar capability provider
//
// Google Calendar-backed scheduling operations: calendar and event CRUD.
// Event times carry the configured default timezone; the well-known
// "primary" calendar is substituted upstream by argument normalization.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::error::ProviderError;
use crate::providers::session::GoogleSession;
use crate::tools::normalize::{int_arg, opt_str_arg, str_arg, Args};
use crate::tools::registry::{Operation, RegistryBuilder};

const CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<GoogleSession>,
    time_zone: String,
}

impl CalendarClient {
    pub fn new(session: Arc<GoogleSession>, time_zone: String) -> Self {
        Self::with_base_url(session, time_zone, CALENDAR_BASE_URL.to_string())
    }

    pub fn with_base_url(
        session: Arc<GoogleSession>,
        time_zone: String,
        base_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
            time_zone,
        }
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ProviderError> {
        let token = self.session.ensure_ready().await?;
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(|e| {
            ProviderError::Operation(format!("request to calendar backend failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Operation(format!(
                "calendar backend returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(response)
    }

    async fn request_json(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        self.request(method, path, query, body)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Operation(format!("malformed calendar response: {}", e)))
    }

    /// List all calendars accessible to the user
    pub async fn list_calendars(&self) -> Result<String, ProviderError> {
        let listing = self
            .request_json(reqwest::Method::GET, "/users/me/calendarList", &[], None)
            .await?;

        let calendars: Vec<Value> = items(&listing)
            .iter()
            .map(|cal| {
                json!({
                    "id": cal["id"],
                    "summary": cal.get("summary").cloned().unwrap_or(json!("No title")),
                    "description": cal.get("description").cloned().unwrap_or(json!("")),
                    "primary": cal.get("primary").cloned().unwrap_or(json!(false)),
                    "accessRole": cal.get("accessRole").cloned().unwrap_or(json!("")),
                })
            })
            .collect();

        to_pretty(&Value::Array(calendars))
    }

    /// List events within a time window, ordered by start time
    pub async fn list_events(
        &self,
        calendar_id: &str,
        max_results: i64,
        time_min: &str,
        time_max: &str,
        query: Option<&str>,
    ) -> Result<String, ProviderError> {
        let max = max_results.to_string();
        let mut params = vec![
            ("timeMin", time_min),
            ("timeMax", time_max),
            ("maxResults", max.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
        ];
        if let Some(q) = query {
            params.push(("q", q));
        }

        let listing = self
            .request_json(
                reqwest::Method::GET,
                &format!("/calendars/{}/events", calendar_id),
                &params,
                None,
            )
            .await?;

        debug!("Listing events on calendar '{}'", calendar_id);

        let events: Vec<Value> = items(&listing).iter().map(|ev| summarize_event(ev)).collect();
        to_pretty(&Value::Array(events))
    }

    /// Create a new event; attendees is a comma-separated address list
    #[allow(clippy::too_many_arguments)]
    pub async fn create_event(
        &self,
        calendar_id: &str,
        summary: &str,
        start_time: &str,
        end_time: &str,
        description: Option<&str>,
        location: Option<&str>,
        attendees: Option<&str>,
    ) -> Result<String, ProviderError> {
        let mut event = json!({
            "summary": summary,
            "description": description.unwrap_or(""),
            "location": location.unwrap_or(""),
            "start": {"dateTime": start_time, "timeZone": self.time_zone},
            "end": {"dateTime": end_time, "timeZone": self.time_zone},
        });

        if let Some(attendees) = attendees.filter(|a| !a.is_empty()) {
            let list: Vec<Value> = attendees
                .split(',')
                .map(|email| json!({"email": email.trim()}))
                .collect();
            event["attendees"] = Value::Array(list);
        }

        let created = self
            .request_json(
                reqwest::Method::POST,
                &format!("/calendars/{}/events", calendar_id),
                &[],
                Some(&event),
            )
            .await?;

        Ok(format!(
            "Event created successfully! Event ID: {}, Link: {}",
            text(&created, "id"),
            created.get("htmlLink").and_then(Value::as_str).unwrap_or("N/A"),
        ))
    }

    /// Update only the provided fields of an existing event
    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        summary: Option<&str>,
        start_time: Option<&str>,
        end_time: Option<&str>,
        description: Option<&str>,
        location: Option<&str>,
    ) -> Result<String, ProviderError> {
        let path = format!("/calendars/{}/events/{}", calendar_id, event_id);

        // Read-modify-write so untouched fields survive
        let mut event = self
            .request_json(reqwest::Method::GET, &path, &[], None)
            .await?;

        if let Some(summary) = summary {
            event["summary"] = json!(summary);
        }
        if let Some(start_time) = start_time {
            event["start"]["dateTime"] = json!(start_time);
        }
        if let Some(end_time) = end_time {
            event["end"]["dateTime"] = json!(end_time);
        }
        if let Some(description) = description {
            event["description"] = json!(description);
        }
        if let Some(location) = location {
            event["location"] = json!(location);
        }

        let updated = self
            .request_json(reqwest::Method::PUT, &path, &[], Some(&event))
            .await?;

        Ok(format!(
            "Event updated successfully! Event ID: {}",
            text(&updated, "id")
        ))
    }

    pub async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<String, ProviderError> {
        self.request(
            reqwest::Method::DELETE,
            &format!("/calendars/{}/events/{}", calendar_id, event_id),
            &[],
            None,
        )
        .await?;
        Ok(format!("Event {} deleted successfully", event_id))
    }

    pub async fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<String, ProviderError> {
        let event = self
            .request_json(
                reqwest::Method::GET,
                &format!("/calendars/{}/events/{}", calendar_id, event_id),
                &[],
                None,
            )
            .await?;

        let mut details = summarize_event(&event);
        details["created"] = event.get("created").cloned().unwrap_or(json!(""));
        details["updated"] = event.get("updated").cloned().unwrap_or(json!(""));
        to_pretty(&details)
    }

    pub async fn create_calendar(
        &self,
        summary: &str,
        description: Option<&str>,
        time_zone: &str,
    ) -> Result<String, ProviderError> {
        let calendar = json!({
            "summary": summary,
            "description": description.unwrap_or(""),
            "timeZone": time_zone,
        });

        let created = self
            .request_json(reqwest::Method::POST, "/calendars", &[], Some(&calendar))
            .await?;

        Ok(format!(
            "Calendar created successfully! Calendar ID: {}, Summary: {}",
            text(&created, "id"),
            text(&created, "summary"),
        ))
    }

    pub async fn delete_calendar(&self, calendar_id: &str) -> Result<String, ProviderError> {
        self.request(
            reqwest::Method::DELETE,
            &format!("/calendars/{}", calendar_id),
            &[],
            None,
        )
        .await?;
        Ok(format!("Calendar {} deleted successfully", calendar_id))
    }
}

fn items(listing: &Value) -> Vec<Value> {
    listing
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// All-day events carry "date" instead of "dateTime"
fn event_edge(event: &Value, edge: &str) -> Value {
    let edge = &event[edge];
    edge.get("dateTime")
        .or_else(|| edge.get("date"))
        .cloned()
        .unwrap_or(Value::Null)
}

fn summarize_event(event: &Value) -> Value {
    let attendees: Vec<Value> = event
        .get("attendees")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|a| a.get("email").cloned())
                .collect()
        })
        .unwrap_or_default();

    json!({
        "id": event["id"],
        "summary": event.get("summary").cloned().unwrap_or(json!("No title")),
        "description": event.get("description").cloned().unwrap_or(json!("")),
        "start": event_edge(event, "start"),
        "end": event_edge(event, "end"),
        "location": event.get("location").cloned().unwrap_or(json!("")),
        "attendees": attendees,
        "htmlLink": event.get("htmlLink").cloned().unwrap_or(json!("")),
        "status": event.get("status").cloned().unwrap_or(json!("")),
    })
}

fn to_pretty(value: &Value) -> Result<String, ProviderError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ProviderError::Operation(format!("could not serialize result: {}", e)))
}

// Operation bindings

pub struct ListCalendars(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for ListCalendars {
    async fn call(&self, _args: &Args) -> Result<String, ProviderError> {
        self.0.list_calendars().await
    }
}

pub struct ListEvents(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for ListEvents {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .list_events(
                str_arg(args, "calendar_id")?,
                int_arg(args, "max_results")?,
                str_arg(args, "time_min")?,
                str_arg(args, "time_max")?,
                opt_str_arg(args, "query"),
            )
            .await
    }
}

pub struct CreateEvent(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for CreateEvent {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .create_event(
                str_arg(args, "calendar_id")?,
                str_arg(args, "summary")?,
                str_arg(args, "start_time")?,
                str_arg(args, "end_time")?,
                opt_str_arg(args, "description"),
                opt_str_arg(args, "location"),
                opt_str_arg(args, "attendees"),
            )
            .await
    }
}

pub struct UpdateEvent(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for UpdateEvent {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .update_event(
                str_arg(args, "calendar_id")?,
                str_arg(args, "event_id")?,
                opt_str_arg(args, "summary"),
                opt_str_arg(args, "start_time"),
                opt_str_arg(args, "end_time"),
                opt_str_arg(args, "description"),
                opt_str_arg(args, "location"),
            )
            .await
    }
}

pub struct DeleteEvent(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for DeleteEvent {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .delete_event(str_arg(args, "calendar_id")?, str_arg(args, "event_id")?)
            .await
    }
}

pub struct GetEvent(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for GetEvent {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .get_event(str_arg(args, "calendar_id")?, str_arg(args, "event_id")?)
            .await
    }
}

pub struct CreateCalendar(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for CreateCalendar {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .create_calendar(
                str_arg(args, "summary")?,
                opt_str_arg(args, "description"),
                str_arg(args, "time_zone")?,
            )
            .await
    }
}

pub struct DeleteCalendar(pub Arc<CalendarClient>);

#[async_trait]
impl Operation for DeleteCalendar {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0.delete_calendar(str_arg(args, "calendar_id")?).await
    }
}

/// Bind every calendar operation onto the registry builder
pub fn register(builder: RegistryBuilder, client: Arc<CalendarClient>) -> RegistryBuilder {
    builder
        .register("list_calendars", Box::new(ListCalendars(client.clone())))
        .register("list_events", Box::new(ListEvents(client.clone())))
        .register("create_event", Box::new(CreateEvent(client.clone())))
        .register("update_event", Box::new(UpdateEvent(client.clone())))
        .register("delete_event", Box::new(DeleteEvent(client.clone())))
        .register("get_event", Box::new(GetEvent(client.clone())))
        .register("create_calendar", Box::new(CreateCalendar(client.clone())))
        .register("delete_calendar", Box::new(DeleteCalendar(client)))
}
