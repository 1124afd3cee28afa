// Mail capability provider
//
// Gmail-backed messaging operations: list, send, read (with attachments),
// and trash. Owns all mailbox network I/O; every failure comes back as a
// described ProviderError, never a panic.

use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::error::ProviderError;
use crate::providers::session::GoogleSession;
use crate::tools::normalize::{int_arg, str_arg, Args};
use crate::tools::registry::{Operation, RegistryBuilder};

const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

// Gmail emits urlsafe base64 with and without padding depending on the field
const B64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    id: String,
    #[serde(default)]
    thread_id: String,
    payload: Option<MessagePart>,
}

/// One node of the (possibly nested) MIME part tree
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    filename: String,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartBody {
    #[serde(default)]
    size: i64,
    data: Option<String>,
    attachment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Attachment {
    #[serde(default)]
    size: i64,
    #[serde(default)]
    data: String,
}

pub struct MailClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<GoogleSession>,
}

impl MailClient {
    pub fn new(session: Arc<GoogleSession>) -> Self {
        Self::with_base_url(session, GMAIL_BASE_URL.to_string())
    }

    pub fn with_base_url(session: Arc<GoogleSession>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let token = self.session.ensure_ready().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(request_failed)?;
        parse_json(check(response).await?).await
    }

    /// List inbox messages with From/Subject/Date header summaries
    pub async fn list_emails(&self, max_results: i64, query: &str) -> Result<String, ProviderError> {
        let max = max_results.to_string();
        let listing: MessageList = self
            .get_json("/users/me/messages", &[("maxResults", max.as_str()), ("q", query)])
            .await?;

        debug!("Listing {} message(s)", listing.messages.len());

        let mut emails = Vec::new();
        for entry in &listing.messages {
            let message: Message = self
                .get_json(
                    &format!("/users/me/messages/{}", entry.id),
                    &[
                        ("format", "metadata"),
                        ("metadataHeaders", "From"),
                        ("metadataHeaders", "Subject"),
                        ("metadataHeaders", "Date"),
                    ],
                )
                .await?;

            let mut summary = json!({
                "id": message.id,
                "threadId": message.thread_id,
            });
            if let Some(payload) = &message.payload {
                for header in &payload.headers {
                    let name = header.name.to_lowercase();
                    if matches!(name.as_str(), "from" | "subject" | "date") {
                        summary[name] = Value::String(header.value.clone());
                    }
                }
            }
            emails.push(summary);
        }

        to_pretty(&Value::Array(emails))
    }

    /// Send a plain-text or HTML message
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        content_type: &str,
    ) -> Result<String, ProviderError> {
        let subtype = if content_type == "html" { "html" } else { "plain" };
        let mime = format!(
            "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
             Content-Type: text/{}; charset=\"utf-8\"\r\n\r\n{}",
            to, subject, subtype, body
        );

        let token = self.session.ensure_ready().await?;
        let response = self
            .http
            .post(format!("{}/users/me/messages/send", self.base_url))
            .bearer_auth(token)
            .json(&json!({ "raw": B64_URL.encode(mime) }))
            .send()
            .await
            .map_err(request_failed)?;
        let sent: MessageRef = parse_json(check(response).await?).await?;

        Ok(format!("Email sent successfully. Message Id: {}", sent.id))
    }

    /// Read one message in full: headers, body text, attachments
    pub async fn read_email(&self, message_id: &str) -> Result<String, ProviderError> {
        let message: Message = self
            .get_json(
                &format!("/users/me/messages/{}", message_id),
                &[("format", "full")],
            )
            .await?;

        let mut headers = serde_json::Map::new();
        let mut body_text = String::new();
        let mut attachments = Vec::new();

        if let Some(payload) = &message.payload {
            for header in &payload.headers {
                let name = header.name.to_lowercase();
                if matches!(name.as_str(), "from" | "to" | "subject" | "date") {
                    headers.insert(name, Value::String(header.value.clone()));
                }
            }

            // Explicit worklist over the part tree; nesting depth is
            // attacker-controlled, so no native recursion here.
            let mut stack: Vec<&MessagePart> = vec![payload];
            while let Some(part) = stack.pop() {
                if !part.filename.is_empty() {
                    attachments.push(self.describe_attachment(message_id, part).await?);
                } else if part.mime_type == "text/plain" {
                    if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                        body_text.push_str(&decode_text(data)?);
                    }
                }
                for child in part.parts.iter().rev() {
                    stack.push(child);
                }
            }
        }

        to_pretty(&json!({
            "id": message.id,
            "threadId": message.thread_id,
            "headers": headers,
            "body": body_text,
            "attachments": attachments,
        }))
    }

    /// Move a message to trash
    pub async fn delete_email(&self, message_id: &str) -> Result<String, ProviderError> {
        let token = self.session.ensure_ready().await?;
        let response = self
            .http
            .post(format!(
                "{}/users/me/messages/{}/trash",
                self.base_url, message_id
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(request_failed)?;
        check(response).await?;

        Ok(format!("Email {} moved to trash successfully", message_id))
    }

    async fn describe_attachment(
        &self,
        message_id: &str,
        part: &MessagePart,
    ) -> Result<Value, ProviderError> {
        let mut described = json!({
            "filename": part.filename,
            "mimeType": part.mime_type,
            "size": part.body.as_ref().map(|b| b.size).unwrap_or(0),
        });

        if let Some(attachment_id) = part.body.as_ref().and_then(|b| b.attachment_id.as_deref()) {
            let attachment: Attachment = self
                .get_json(
                    &format!(
                        "/users/me/messages/{}/attachments/{}",
                        message_id, attachment_id
                    ),
                    &[],
                )
                .await?;
            described["size"] = json!(attachment.size);
            described["data"] = Value::String(attachment.data);
        }

        Ok(described)
    }
}

fn decode_text(data: &str) -> Result<String, ProviderError> {
    let bytes = B64_URL
        .decode(data)
        .map_err(|e| ProviderError::Operation(format!("malformed message body encoding: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ProviderError::Operation(format!("message body is not valid UTF-8: {}", e)))
}

fn request_failed(e: reqwest::Error) -> ProviderError {
    ProviderError::Operation(format!("request to mailbox backend failed: {}", e))
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Operation(format!(
            "mailbox backend returned {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )));
    }
    Ok(response)
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    response
        .json()
        .await
        .map_err(|e| ProviderError::Operation(format!("malformed mailbox response: {}", e)))
}

fn to_pretty(value: &Value) -> Result<String, ProviderError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ProviderError::Operation(format!("could not serialize result: {}", e)))
}

// Operation bindings

pub struct ListEmails(pub Arc<MailClient>);

#[async_trait]
impl Operation for ListEmails {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .list_emails(int_arg(args, "max_results")?, str_arg(args, "query")?)
            .await
    }
}

pub struct SendEmail(pub Arc<MailClient>);

#[async_trait]
impl Operation for SendEmail {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .send_email(
                str_arg(args, "to")?,
                str_arg(args, "subject")?,
                str_arg(args, "body")?,
                str_arg(args, "content_type")?,
            )
            .await
    }
}

pub struct ReadEmail(pub Arc<MailClient>);

#[async_trait]
impl Operation for ReadEmail {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0.read_email(str_arg(args, "message_id")?).await
    }
}

pub struct DeleteEmail(pub Arc<MailClient>);

#[async_trait]
impl Operation for DeleteEmail {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0.delete_email(str_arg(args, "message_id")?).await
    }
}

/// Bind every mail operation onto the registry builder
pub fn register(builder: RegistryBuilder, client: Arc<MailClient>) -> RegistryBuilder {
    builder
        .register("list_emails", Box::new(ListEmails(client.clone())))
        .register("send_email", Box::new(SendEmail(client.clone())))
        .register("read_email", Box::new(ReadEmail(client.clone())))
        .register("delete_email", Box::new(DeleteEmail(client)))
}
