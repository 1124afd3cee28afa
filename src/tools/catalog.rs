// Static tool catalog
//
// One declarative entry per invocable operation. The same parameter
// descriptors drive both the JSON schema advertised to the upstream engine
// and runtime argument validation, so the two cannot drift.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::tools::types::{ToolDefinition, ToolInputSchema};

/// Well-known calendar identifier used when none is given
pub const PRIMARY_CALENDAR: &str = "primary";

/// Timezone applied to event times and new calendars
pub const DEFAULT_TIME_ZONE: &str = "America/Los_Angeles";

/// Result-count cap used when none is given
pub const DEFAULT_MAX_RESULTS: i64 = 10;

/// Days ahead covered by the default event window
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Primitive kind of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    pub fn json_name(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// Default value substituted when an optional parameter is absent
#[derive(Debug, Clone)]
pub enum ParamDefault {
    Str(&'static str),
    Int(i64),
    /// Current time, RFC 3339 UTC
    NowUtc,
    /// Current time plus N days, RFC 3339 UTC
    NowPlusDays(i64),
}

impl ParamDefault {
    /// Render the default relative to the given clock reading
    pub fn render(&self, now: DateTime<Utc>) -> Value {
        match self {
            ParamDefault::Str(s) => Value::String((*s).to_string()),
            ParamDefault::Int(n) => Value::Number((*n).into()),
            ParamDefault::NowUtc => {
                Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            ParamDefault::NowPlusDays(days) => Value::String(
                (now + Duration::days(*days)).to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        }
    }
}

/// Descriptor for one tool parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<ParamDefault>,
    pub allowed: Option<&'static [&'static str]>,
    pub description: &'static str,
}

fn req(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        default: None,
        allowed: None,
        description,
    }
}

fn opt(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        default: None,
        allowed: None,
        description,
    }
}

fn opt_default(
    name: &'static str,
    kind: ParamKind,
    default: ParamDefault,
    description: &'static str,
) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        default: Some(default),
        allowed: None,
        description,
    }
}

/// Descriptor for one invocable tool
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Look up a parameter descriptor by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render the wire shape the upstream engine consumes
    pub fn definition(&self) -> ToolDefinition {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = serde_json::Map::new();
            prop.insert(
                "type".to_string(),
                Value::String(param.kind.json_name().to_string()),
            );
            prop.insert(
                "description".to_string(),
                Value::String(param.description.to_string()),
            );
            if let Some(allowed) = param.allowed {
                prop.insert(
                    "enum".to_string(),
                    Value::Array(
                        allowed
                            .iter()
                            .map(|v| Value::String((*v).to_string()))
                            .collect(),
                    ),
                );
            }
            properties.insert(param.name.to_string(), Value::Object(prop));
            if param.required {
                required.push(param.name.to_string());
            }
        }

        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties: Value::Object(properties),
                required,
                additional_properties: false,
            },
        }
    }
}

/// The full ordered catalog. Stable across calls within a process.
pub fn catalog() -> &'static [ToolSpec] {
    &CATALOG
}

/// Look up one catalog entry by tool name
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}

/// Wire-shape definitions for every catalog entry, in catalog order
pub fn definitions() -> Vec<ToolDefinition> {
    CATALOG.iter().map(|spec| spec.definition()).collect()
}

static CATALOG: Lazy<Vec<ToolSpec>> = Lazy::new(|| {
    vec![
        ToolSpec {
            name: "read_file",
            description: "Read the contents of a file from the working directory",
            params: vec![req(
                "file_path",
                ParamKind::String,
                "The name of the file to read",
            )],
        },
        ToolSpec {
            name: "write_file",
            description: "Write content to a file in the working directory",
            params: vec![
                req("file_path", ParamKind::String, "The name of the file to write"),
                req("content", ParamKind::String, "The content to write to the file"),
            ],
        },
        ToolSpec {
            name: "list_files",
            description: "List the files in the working directory",
            params: vec![],
        },
        ToolSpec {
            name: "list_emails",
            description: "List emails from the mailbox inbox with optional search query",
            params: vec![
                opt_default(
                    "max_results",
                    ParamKind::Integer,
                    ParamDefault::Int(DEFAULT_MAX_RESULTS),
                    "Maximum number of emails to return (default: 10)",
                ),
                opt_default(
                    "query",
                    ParamKind::String,
                    ParamDefault::Str(""),
                    "Mailbox search query string (optional)",
                ),
            ],
        },
        ToolSpec {
            name: "send_email",
            description: "Send an email message to someone. Use this when the user asks to \
                          send an email. Do NOT use this for calendar events - use \
                          create_event instead.",
            params: vec![
                req("to", ParamKind::String, "Recipient email address"),
                req("subject", ParamKind::String, "Email subject"),
                req("body", ParamKind::String, "Email body content"),
                ParamSpec {
                    name: "content_type",
                    kind: ParamKind::String,
                    required: false,
                    default: Some(ParamDefault::Str("plain")),
                    allowed: Some(&["plain", "html"]),
                    description: "Content type (plain or html)",
                },
            ],
        },
        ToolSpec {
            name: "read_email",
            description: "Read a specific email by its ID, including any attachments. \
                          Returns email content, headers, and attachment details \
                          (filename, size, type, and data).",
            params: vec![req(
                "message_id",
                ParamKind::String,
                "The ID of the email to read",
            )],
        },
        ToolSpec {
            name: "delete_email",
            description: "Delete (move to trash) a specific email by its ID",
            params: vec![req(
                "message_id",
                ParamKind::String,
                "The ID of the email to delete",
            )],
        },
        ToolSpec {
            name: "list_calendars",
            description: "List all calendars accessible to the user",
            params: vec![],
        },
        ToolSpec {
            name: "list_events",
            description: "List events from a calendar with optional time range and search query",
            params: vec![
                opt_default(
                    "calendar_id",
                    ParamKind::String,
                    ParamDefault::Str(PRIMARY_CALENDAR),
                    "Calendar ID (uses 'primary' if not specified)",
                ),
                opt_default(
                    "max_results",
                    ParamKind::Integer,
                    ParamDefault::Int(DEFAULT_MAX_RESULTS),
                    "Maximum number of events to return (uses 10 if not specified)",
                ),
                opt_default(
                    "time_min",
                    ParamKind::String,
                    ParamDefault::NowUtc,
                    "Start time in ISO format (uses current time if not specified)",
                ),
                opt_default(
                    "time_max",
                    ParamKind::String,
                    ParamDefault::NowPlusDays(DEFAULT_WINDOW_DAYS),
                    "End time in ISO format (uses 7 days from now if not specified)",
                ),
                opt("query", ParamKind::String, "Search query for events (optional)"),
            ],
        },
        ToolSpec {
            name: "create_event",
            description: "Create a new calendar event. Use this when the user asks to add, \
                          create, schedule, or book an event or meeting in their calendar.",
            params: vec![
                opt_default(
                    "calendar_id",
                    ParamKind::String,
                    ParamDefault::Str(PRIMARY_CALENDAR),
                    "Calendar ID (uses 'primary' if not specified)",
                ),
                req("summary", ParamKind::String, "Event title/summary"),
                req("start_time", ParamKind::String, "Start time in ISO format"),
                req("end_time", ParamKind::String, "End time in ISO format"),
                opt("description", ParamKind::String, "Event description (optional)"),
                opt("location", ParamKind::String, "Event location (optional)"),
                opt(
                    "attendees",
                    ParamKind::String,
                    "Comma-separated list of attendee emails (optional)",
                ),
            ],
        },
        ToolSpec {
            name: "update_event",
            description: "Update an existing calendar event",
            params: vec![
                req("calendar_id", ParamKind::String, "Calendar ID"),
                req("event_id", ParamKind::String, "Event ID to update"),
                opt("summary", ParamKind::String, "New event title/summary (optional)"),
                opt("start_time", ParamKind::String, "New start time in ISO format (optional)"),
                opt("end_time", ParamKind::String, "New end time in ISO format (optional)"),
                opt("description", ParamKind::String, "New event description (optional)"),
                opt("location", ParamKind::String, "New event location (optional)"),
            ],
        },
        ToolSpec {
            name: "delete_event",
            description: "Delete a calendar event",
            params: vec![
                req("calendar_id", ParamKind::String, "Calendar ID"),
                req("event_id", ParamKind::String, "Event ID to delete"),
            ],
        },
        ToolSpec {
            name: "get_event",
            description: "Get details of a specific calendar event",
            params: vec![
                req("calendar_id", ParamKind::String, "Calendar ID"),
                req("event_id", ParamKind::String, "Event ID to retrieve"),
            ],
        },
        ToolSpec {
            name: "create_calendar",
            description: "Create a new secondary calendar",
            params: vec![
                req("summary", ParamKind::String, "Calendar name/title"),
                opt("description", ParamKind::String, "Calendar description (optional)"),
                opt_default(
                    "time_zone",
                    ParamKind::String,
                    ParamDefault::Str(DEFAULT_TIME_ZONE),
                    "Calendar timezone (uses 'America/Los_Angeles' if not specified)",
                ),
            ],
        },
        ToolSpec {
            name: "delete_calendar",
            description: "Delete a secondary calendar",
            params: vec![req("calendar_id", ParamKind::String, "Calendar ID to delete")],
        },
    ]
});
