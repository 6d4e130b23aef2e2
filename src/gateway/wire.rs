//! Wire shapes for the ticket service.
//!
//! Inbound `Raw*` types accept every variant the server is known to send
//! and are converted into the canonical types in [`crate::model`] before
//! anything else sees them. Outbound `*Payload` types serialize to the
//! exact request bodies the endpoints expect.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::model::{
    Category, ChangeEntry, CurrentUser, EntityRef, PersonRef, Project, Ticket, User, Worknote,
};
use crate::time::parse_server_timestamp;
use crate::types::{Priority, ProjectStatus, Severity, TicketId, TicketStatus};

// ============================================================================
// Envelopes
// ============================================================================

/// A list that may arrive bare or wrapped in `data` / `response`, possibly
/// more than once (`{"data": {"data": [...]}}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data { data: Box<ListEnvelope<T>> },
    Response { response: Box<ListEnvelope<T>> },
}

impl<T> ListEnvelope<T> {
    pub fn into_inner(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Data { data } => data.into_inner(),
            ListEnvelope::Response { response } => response.into_inner(),
        }
    }
}

/// A single entity that may arrive bare or wrapped in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemEnvelope<T> {
    Data { data: T },
    Response { response: T },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            ItemEnvelope::Data { data } => data,
            ItemEnvelope::Response { response } => response,
            ItemEnvelope::Bare(item) => item,
        }
    }
}

/// Error body returned by the API on failure.
#[derive(Debug, Default, Deserialize)]
pub struct RawErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RawErrorBody {
    pub fn message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.is_empty())
    }
}

// ============================================================================
// Scalars and references
// ============================================================================

/// A value the server sends as either a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Str(String),
    Int(i64),
    Float(f64),
}

impl RawScalar {
    pub fn into_string(self) -> String {
        match self {
            RawScalar::Str(s) => s,
            RawScalar::Int(n) => n.to_string(),
            RawScalar::Float(f) => f.to_string(),
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            RawScalar::Str(s) => s.trim().parse().ok(),
            RawScalar::Int(n) => u8::try_from(*n).ok(),
            RawScalar::Float(f) if *f >= 0.0 && *f <= 255.0 => Some(f.round() as u8),
            RawScalar::Float(_) => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RawScalar::Str(s) => s.trim().parse().ok(),
            RawScalar::Int(n) => u32::try_from(*n).ok(),
            RawScalar::Float(f) if *f >= 0.0 => Some(f.round() as u32),
            RawScalar::Float(_) => None,
        }
    }
}

/// Boolean that is sometimes sent as `"true"` / `"false"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBool {
    Bool(bool),
    Str(String),
}

impl RawBool {
    pub fn value(&self) -> bool {
        match self {
            RawBool::Bool(b) => *b,
            RawBool::Str(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRefObject {
    #[serde(default)]
    pub id: Option<RawScalar>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<RawScalar>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "projectName")]
    pub project_name: Option<String>,
}

/// A project/category reference: a bare id or an embedded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRef {
    Id(RawScalar),
    Object(RawRefObject),
}

impl RawRef {
    pub fn into_entity_ref(self) -> Option<EntityRef> {
        match self {
            RawRef::Id(id) => non_empty(id.into_string()).map(EntityRef::new),
            RawRef::Object(obj) => {
                let id = obj
                    .underscore_id
                    .or(obj.id)
                    .map(RawScalar::into_string)
                    .and_then(non_empty)?;
                Some(EntityRef {
                    id,
                    name: obj.name.or(obj.project_name).and_then(non_empty),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthentication {
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPersonObject {
    #[serde(default)]
    pub id: Option<RawScalar>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<RawScalar>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<RawScalar>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub authentication: Option<RawAuthentication>,
}

impl RawPersonObject {
    fn id(&self) -> Option<String> {
        self.underscore_id
            .clone()
            .or_else(|| self.id.clone())
            .map(RawScalar::into_string)
            .and_then(non_empty)
    }

    /// Composite display name: name, then first/last, then username.
    fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.clone().and_then(non_empty) {
            return Some(name);
        }
        let composed = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        if let Some(name) = non_empty(composed.trim().to_string()) {
            return Some(name);
        }
        self.authentication
            .as_ref()
            .and_then(|a| a.user_name.clone())
            .and_then(non_empty)
    }

    fn email(&self) -> Option<String> {
        self.authentication
            .as_ref()
            .and_then(|a| a.email.clone())
            .or_else(|| self.email.clone())
            .and_then(non_empty)
    }

    fn phone(&self) -> Option<String> {
        self.phone
            .clone()
            .or_else(|| self.authentication.as_ref().and_then(|a| a.phone.clone()))
            .map(RawScalar::into_string)
            .and_then(non_empty)
    }
}

/// A person reference: an embedded object or just a name/id string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPerson {
    Object(RawPersonObject),
    Text(String),
}

impl RawPerson {
    pub fn into_person_ref(self) -> Option<PersonRef> {
        match self {
            RawPerson::Text(s) => non_empty(s).map(|name| PersonRef {
                name: Some(name),
                ..Default::default()
            }),
            RawPerson::Object(obj) => {
                let person = PersonRef {
                    id: obj.id(),
                    name: obj.display_name(),
                    email: obj.email(),
                    phone: obj.phone(),
                    user_type: obj.user_type.clone().or(obj.category.clone()),
                };
                if person.id.is_none() && person.name.is_none() && person.email.is_none() {
                    None
                } else {
                    Some(person)
                }
            }
        }
    }
}

/// Attachments arrive as URL strings or `{url}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAttachment {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

impl RawAttachment {
    pub fn into_url(self) -> Option<String> {
        match self {
            RawAttachment::Url(url) => non_empty(url),
            RawAttachment::Object { url } => url.and_then(non_empty),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoryEntry {
    #[serde(default)]
    pub updated_by: Option<RawPerson>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RawHistoryEntry {
    fn text(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.comment.clone())
            .unwrap_or_default()
    }

    fn at(&self) -> Option<Timestamp> {
        self.updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .and_then(parse_server_timestamp)
    }

    pub fn into_worknote(self) -> Worknote {
        let text = self.text();
        let at = self.at();
        Worknote {
            author: self
                .updated_by
                .and_then(RawPerson::into_person_ref)
                .unwrap_or_default(),
            text,
            at,
        }
    }

    pub fn into_change(self) -> ChangeEntry {
        let description = self.text();
        let at = self.at();
        ChangeEntry {
            by: self.updated_by.and_then(RawPerson::into_person_ref),
            description,
            at,
        }
    }
}

// ============================================================================
// Tickets
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicket {
    #[serde(default)]
    pub id: Option<RawScalar>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<RawScalar>,
    #[serde(default)]
    pub ticket_no: Option<RawScalar>,
    #[serde(default)]
    pub order_id: Option<RawScalar>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub priority: Option<RawScalar>,
    #[serde(default)]
    pub category: Option<RawRef>,
    #[serde(default)]
    pub project: Option<RawRef>,
    #[serde(default)]
    pub assign_to: Option<RawPerson>,
    #[serde(default)]
    pub reported_by: Option<RawPerson>,
    #[serde(default)]
    pub reported_to: Option<RawPerson>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<RawAttachment>>,
    #[serde(default)]
    pub change_history: Option<Vec<RawHistoryEntry>>,
    #[serde(default)]
    pub worknote_history: Option<Vec<RawHistoryEntry>>,
    #[serde(default)]
    pub escalated: Option<RawBool>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub tenant: Option<serde_json::Value>,
}

impl RawTicket {
    /// Normalize into a canonical ticket. Returns `None` when the server
    /// object carries no identity at all.
    pub fn into_ticket(self) -> Option<Ticket> {
        let id = self
            .underscore_id
            .or(self.id)
            .map(RawScalar::into_string)
            .and_then(non_empty)?;

        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<TicketStatus>().unwrap_or_else(|_| {
                tracing::warn!("ticket '{id}' has unknown status '{raw}', treating as OPEN");
                TicketStatus::Open
            }),
            None => TicketStatus::Open,
        };

        let severity = self.severity.as_deref().and_then(|raw| {
            raw.parse::<Severity>()
                .map_err(|_| tracing::warn!("ticket '{id}' has unknown severity '{raw}'"))
                .ok()
        });

        let priority = self
            .priority
            .as_ref()
            .and_then(RawScalar::as_u8)
            .and_then(|p| Priority::new(p).ok());

        let tenant = self.tenant.and_then(|value| match value {
            serde_json::Value::String(s) => non_empty(s),
            serde_json::Value::Object(map) => map
                .get("_id")
                .or_else(|| map.get("id"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        });

        Some(Ticket {
            id: TicketId::new(id),
            ticket_no: self
                .ticket_no
                .map(RawScalar::into_string)
                .and_then(non_empty),
            order_id: self
                .order_id
                .map(RawScalar::into_string)
                .and_then(non_empty),
            subject: self.subject.or(self.title).unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            status,
            severity,
            priority,
            category: self.category.and_then(RawRef::into_entity_ref),
            project: self.project.and_then(RawRef::into_entity_ref),
            assignee: self.assign_to.and_then(RawPerson::into_person_ref),
            reporter: self.reported_by.and_then(RawPerson::into_person_ref),
            reported_to: self.reported_to.and_then(RawPerson::into_person_ref),
            start_date: self.start_date.as_deref().and_then(parse_server_timestamp),
            end_date: self.end_date.as_deref().and_then(parse_server_timestamp),
            created_at: self.created_at.as_deref().and_then(parse_server_timestamp),
            updated_at: self.updated_at.as_deref().and_then(parse_server_timestamp),
            attachments: self
                .attachments
                .unwrap_or_default()
                .into_iter()
                .filter_map(RawAttachment::into_url)
                .collect(),
            change_history: self
                .change_history
                .unwrap_or_default()
                .into_iter()
                .map(RawHistoryEntry::into_change)
                .collect(),
            worknotes: self
                .worknote_history
                .unwrap_or_default()
                .into_iter()
                .map(RawHistoryEntry::into_worknote)
                .collect(),
            escalated: self.escalated.map(|e| e.value()).unwrap_or(false),
            scope: self.scope.and_then(non_empty),
            tenant,
        })
    }
}

/// Normalize a list of raw tickets, dropping (and logging) ones without identity.
pub fn normalize_tickets(raw: Vec<RawTicket>) -> Vec<Ticket> {
    let total = raw.len();
    let tickets: Vec<Ticket> = raw.into_iter().filter_map(RawTicket::into_ticket).collect();
    if tickets.len() != total {
        tracing::warn!(
            "dropped {} ticket(s) without an id from server response",
            total - tickets.len()
        );
    }
    tickets
}

// ============================================================================
// Projects, categories, users
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawClient {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProject {
    #[serde(default)]
    pub id: Option<RawScalar>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<RawScalar>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client: Option<RawClient>,
    #[serde(default)]
    pub owner: Option<RawPerson>,
    #[serde(default)]
    pub lead: Option<RawPerson>,
    #[serde(default)]
    pub project_lead: Option<RawPerson>,
    #[serde(default)]
    pub category: Option<RawRef>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub progress: Option<RawScalar>,
    #[serde(default)]
    pub task_count: Option<RawScalar>,
}

impl RawProject {
    pub fn into_project(self) -> Option<Project> {
        let id = self
            .underscore_id
            .or(self.id)
            .map(RawScalar::into_string)
            .and_then(non_empty)?;

        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<ProjectStatus>().unwrap_or_else(|_| {
                tracing::warn!("project '{id}' has unknown status '{raw}', treating as ACTIVE");
                ProjectStatus::Active
            }),
            None => ProjectStatus::Active,
        };

        let client = self.client.and_then(|c| match c {
            RawClient::Name(name) => non_empty(name),
            RawClient::Object { name } => name.and_then(non_empty),
        });

        Some(Project {
            name: self
                .name
                .or(self.project_name)
                .and_then(non_empty)
                .unwrap_or_else(|| "Untitled Project".to_string()),
            id,
            code: self.code.and_then(non_empty),
            description: self.description.and_then(non_empty),
            status,
            client,
            owner: self
                .owner
                .or(self.lead)
                .or(self.project_lead)
                .and_then(RawPerson::into_person_ref),
            category: self
                .category
                .and_then(RawRef::into_entity_ref)
                .map(|c| c.id),
            start_date: self.start_date.as_deref().and_then(parse_server_timestamp),
            end_date: self.end_date.as_deref().and_then(parse_server_timestamp),
            progress: self.progress.as_ref().and_then(RawScalar::as_u8).map(|p| p.min(100)),
            task_count: self.task_count.as_ref().and_then(RawScalar::as_u32),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub id: Option<RawScalar>,
    #[serde(default, rename = "_id")]
    pub underscore_id: Option<RawScalar>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl RawCategory {
    pub fn into_category(self) -> Option<Category> {
        let id = self
            .underscore_id
            .or(self.id)
            .map(RawScalar::into_string)
            .and_then(non_empty)?;
        Some(Category {
            name: self.name.and_then(non_empty).unwrap_or_else(|| id.clone()),
            id,
            severity: self.severity.as_deref().and_then(|s| s.parse().ok()),
            scope: self.scope.and_then(non_empty),
        })
    }
}

impl RawPersonObject {
    pub fn into_user(self) -> Option<User> {
        let id = self.id()?;
        let name = self.display_name().unwrap_or_else(|| id.clone());
        let email = self.email();
        let phone = self.phone();
        Some(User {
            id,
            name,
            username: self.authentication.and_then(|a| a.user_name),
            email,
            phone,
        })
    }

    pub fn into_current_user(self) -> Option<CurrentUser> {
        let id = self.id()?;
        let name = self
            .display_name()
            .or_else(|| self.email())
            .unwrap_or_else(|| id.clone());
        let email = self.email();
        let phone = self.phone();
        Some(CurrentUser {
            id,
            name,
            email,
            phone,
            category: self.category.or(self.user_type),
        })
    }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoginBody {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<RawPersonObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoginResponse {
    #[serde(default)]
    pub response: Option<RawLoginBody>,
    #[serde(default)]
    pub data: Option<RawLoginBody>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RawLoginResponse {
    /// Extract the bearer token and user from wherever the server put them.
    pub fn into_parts(self) -> (Option<String>, Option<CurrentUser>) {
        let mut token = None;
        let mut user = None;
        for body in [self.response, self.data].into_iter().flatten() {
            token = token.or(body.token).or(body.access_token);
            user = user.or_else(|| body.user.and_then(RawPersonObject::into_current_user));
        }
        let token = token
            .or(self.token)
            .or(self.access_token)
            .and_then(non_empty);
        (token, user)
    }
}

// ============================================================================
// Uploads
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUploadData {
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUploadResponse {
    #[serde(default)]
    pub data: Option<RawUploadData>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl RawUploadResponse {
    pub fn file_url(self) -> Option<String> {
        self.data
            .and_then(|d| d.file_url)
            .or(self.file_url)
            .and_then(non_empty)
    }
}

// ============================================================================
// Outbound payloads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangePayload {
    pub current_password: String,
    pub new_password: String,
}

/// A person as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePerson {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

impl From<&PersonRef> for WirePerson {
    fn from(p: &PersonRef) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            user_type: p.user_type.clone(),
        }
    }
}

impl From<&CurrentUser> for WirePerson {
    fn from(u: &CurrentUser) -> Self {
        WirePerson::from(&u.to_person())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHistoryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<WirePerson>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl From<&Worknote> for WireHistoryEntry {
    fn from(w: &Worknote) -> Self {
        Self {
            updated_by: Some(WirePerson::from(&w.author)),
            description: w.text.clone(),
            updated_at: w.at,
        }
    }
}

impl From<&ChangeEntry> for WireHistoryEntry {
    fn from(c: &ChangeEntry) -> Self {
        Self {
            updated_by: c.by.as_ref().map(WirePerson::from),
            description: c.description.clone(),
            updated_at: c.at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketPayload {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub description: String,
    pub subject: String,
    pub reported_by: WirePerson,
    pub attachments: Vec<String>,
    pub priority: Priority,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_to: Option<WirePerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_to: Option<WirePerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketPayload {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub description: String,
    pub subject: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// The endpoint expects the string form.
    pub escalated: String,
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub worknote_history: Vec<WireHistoryEntry>,
    pub change_history: Vec<WireHistoryEntry>,
    pub internal_comments: Vec<WireHistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<WirePerson>,
    pub updated_by: WirePerson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_category: Option<String>,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_to: Option<WirePerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_to: Option<WirePerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
}

impl UpdateTicketPayload {
    /// Full update payload carrying the ticket exactly as it is now.
    pub fn from_ticket(ticket: &Ticket, updater: &CurrentUser) -> Self {
        Self {
            id: ticket.id.to_string(),
            category: ticket.category_id().map(str::to_string),
            project: ticket.project_id().map(str::to_string),
            description: ticket.description.clone(),
            subject: ticket.subject.clone(),
            status: ticket.status,
            priority: ticket.priority,
            severity: ticket.severity,
            escalated: ticket.escalated.to_string(),
            attachments: ticket.attachments.clone(),
            ticket_no: ticket.ticket_no.clone(),
            tenant: ticket.tenant.clone(),
            scope: ticket.scope.clone(),
            worknote_history: ticket.worknotes.iter().map(WireHistoryEntry::from).collect(),
            change_history: ticket
                .change_history
                .iter()
                .map(WireHistoryEntry::from)
                .collect(),
            internal_comments: Vec::new(),
            reported_by: ticket.reporter.as_ref().map(WirePerson::from),
            updated_by: WirePerson {
                user_type: None,
                ..WirePerson::from(updater)
            },
            user_category: updater.category.clone(),
            agent_id: updater.id.clone(),
            assign_to: ticket.assignee.as_ref().map(WirePerson::from),
            reported_to: ticket.reported_to.as_ref().map(WirePerson::from),
            start_date: ticket.start_date,
            end_date: ticket.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorknoteComment {
    pub updated_by: WirePerson,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorknotePayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub comment: WorknoteComment,
}

impl WorknotePayload {
    pub fn new(author: &CurrentUser, text: &str) -> Self {
        Self {
            kind: "WORKNOTE",
            comment: WorknoteComment {
                updated_by: WirePerson::from(author),
                description: text.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireClient {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub client: WireClient,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Server-side ticket filter body. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFilterPayload {
    pub status: String,
    pub priority: Option<Priority>,
    pub category: String,
    pub from_date: String,
    pub to_date: String,
    pub reported_by: String,
    pub assign_to: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadPayload {
    /// Base64 data URL of the file.
    pub image: String,
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_ticket(value: serde_json::Value) -> Option<Ticket> {
        serde_json::from_value::<RawTicket>(value)
            .unwrap()
            .into_ticket()
    }

    #[test]
    fn test_ticket_prefers_underscore_id() {
        let t = parse_ticket(json!({"_id": "abc", "id": "zzz", "subject": "S"})).unwrap();
        assert_eq!(t.id.as_str(), "abc");

        let t = parse_ticket(json!({"id": 42, "subject": "S"})).unwrap();
        assert_eq!(t.id.as_str(), "42");
    }

    #[test]
    fn test_ticket_without_id_is_dropped() {
        assert!(parse_ticket(json!({"subject": "orphan"})).is_none());
        assert!(parse_ticket(json!({"_id": "", "subject": "orphan"})).is_none());
    }

    #[test]
    fn test_ticket_references_normalized() {
        let t = parse_ticket(json!({
            "_id": "t1",
            "category": "cat-1",
            "project": {"id": "p1", "name": "Portal"},
            "assignTo": {"_id": "u1", "name": "Sarah Chen", "email": "sarah@example.com"},
            "reportedBy": {"authentication": {"userName": "ajay", "email": "ajay@example.com"}},
        }))
        .unwrap();

        assert_eq!(t.category, Some(EntityRef::new("cat-1")));
        assert_eq!(t.project, Some(EntityRef::named("p1", "Portal")));
        let assignee = t.assignee.unwrap();
        assert_eq!(assignee.id.as_deref(), Some("u1"));
        assert_eq!(assignee.name.as_deref(), Some("Sarah Chen"));
        let reporter = t.reporter.unwrap();
        assert_eq!(reporter.name.as_deref(), Some("ajay"));
        assert_eq!(reporter.email.as_deref(), Some("ajay@example.com"));
    }

    #[test]
    fn test_ticket_scalars_normalized() {
        let t = parse_ticket(json!({
            "_id": "t1",
            "ticketNo": 20451,
            "priority": "8",
            "severity": "High",
            "status": "IN_PROGRESS",
            "escalated": "true",
            "createdAt": "2026-02-20T00:00:00.000Z",
        }))
        .unwrap();

        assert_eq!(t.ticket_no.as_deref(), Some("20451"));
        assert_eq!(t.priority.map(|p| p.value()), Some(8));
        assert_eq!(t.severity, Some(Severity::High));
        assert_eq!(t.status, TicketStatus::InProgress);
        assert!(t.escalated);
        assert!(t.created_at.is_some());
    }

    #[test]
    fn test_ticket_unknown_status_and_out_of_range_priority() {
        let t = parse_ticket(json!({"_id": "t1", "status": "WEIRD", "priority": 42})).unwrap();
        assert_eq!(t.status, TicketStatus::Open);
        assert!(t.priority.is_none());
    }

    #[test]
    fn test_attachments_strings_and_objects() {
        let t = parse_ticket(json!({
            "_id": "t1",
            "attachments": ["https://a/1.png", {"url": "https://a/2.png"}, {}, ""],
        }))
        .unwrap();
        assert_eq!(t.attachments, vec!["https://a/1.png", "https://a/2.png"]);
    }

    #[test]
    fn test_worknote_history() {
        let t = parse_ticket(json!({
            "_id": "t1",
            "worknoteHistory": [{
                "updatedBy": {"name": "Sam", "email": "sam@example.com"},
                "description": "Looked into it",
                "updatedAt": "2024-01-01T10:00:00Z"
            }],
        }))
        .unwrap();
        assert_eq!(t.worknotes.len(), 1);
        assert_eq!(t.worknotes[0].text, "Looked into it");
        assert_eq!(t.worknotes[0].author.name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_list_envelopes() {
        let bare: ListEnvelope<RawCategory> =
            serde_json::from_value(json!([{"_id": "c1", "name": "Bug"}])).unwrap();
        assert_eq!(bare.into_inner().len(), 1);

        let nested: ListEnvelope<RawCategory> =
            serde_json::from_value(json!({"data": {"data": [{"_id": "c1"}, {"_id": "c2"}]}}))
                .unwrap();
        assert_eq!(nested.into_inner().len(), 2);

        let response: ListEnvelope<RawPersonObject> =
            serde_json::from_value(json!({"response": [{"_id": "u1", "name": "A"}]})).unwrap();
        assert_eq!(response.into_inner().len(), 1);
    }

    #[test]
    fn test_item_envelope() {
        let wrapped: ItemEnvelope<RawTicket> =
            serde_json::from_value(json!({"status": 1, "data": {"_id": "t9"}})).unwrap();
        assert_eq!(
            wrapped.into_inner().into_ticket().unwrap().id.as_str(),
            "t9"
        );

        let bare: ItemEnvelope<RawTicket> =
            serde_json::from_value(json!({"_id": "t8", "subject": "x"})).unwrap();
        assert_eq!(bare.into_inner().into_ticket().unwrap().id.as_str(), "t8");
    }

    #[test]
    fn test_login_token_locations() {
        let raw: RawLoginResponse = serde_json::from_value(json!({
            "response": {
                "token": "tok-1",
                "user": {"_id": "u1", "authentication": {"userName": "sarah", "email": "s@x.io"}, "category": "INSPECTOR"}
            }
        }))
        .unwrap();
        let (token, user) = raw.into_parts();
        assert_eq!(token.as_deref(), Some("tok-1"));
        let user = user.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "sarah");
        assert_eq!(user.category.as_deref(), Some("INSPECTOR"));

        let raw: RawLoginResponse =
            serde_json::from_value(json!({"data": {"accessToken": "tok-2"}})).unwrap();
        assert_eq!(raw.into_parts().0.as_deref(), Some("tok-2"));
    }

    #[test]
    fn test_project_normalization() {
        let raw: RawProject = serde_json::from_value(json!({
            "_id": "p1",
            "projectName": "Portal",
            "status": "on hold",
            "client": {"name": "Acme"},
            "lead": {"name": "Ajay"},
            "progress": 140,
        }))
        .unwrap();
        let p = raw.into_project().unwrap();
        assert_eq!(p.name, "Portal");
        assert_eq!(p.status, ProjectStatus::OnHold);
        assert_eq!(p.client.as_deref(), Some("Acme"));
        assert_eq!(p.owner.unwrap().name.as_deref(), Some("Ajay"));
        assert_eq!(p.progress, Some(100));
    }

    #[test]
    fn test_upload_response_url() {
        let raw: RawUploadResponse =
            serde_json::from_value(json!({"status": 1, "data": {"fileUrl": "https://f/1.png"}}))
                .unwrap();
        assert_eq!(raw.file_url().as_deref(), Some("https://f/1.png"));

        let raw: RawUploadResponse = serde_json::from_value(json!({"fileUrl": ""})).unwrap();
        assert!(raw.file_url().is_none());
    }

    #[test]
    fn test_update_payload_shape() {
        let mut ticket = Ticket::new("t1", "Subject");
        ticket.escalated = true;
        ticket.category = Some(EntityRef::new("c1"));
        let updater = CurrentUser {
            id: "u9".to_string(),
            name: "Agent".to_string(),
            email: None,
            phone: None,
            category: Some("TENANT".to_string()),
        };
        let value = serde_json::to_value(UpdateTicketPayload::from_ticket(&ticket, &updater)).unwrap();
        assert_eq!(value["_id"], "t1");
        assert_eq!(value["escalated"], "true");
        assert_eq!(value["category"], "c1");
        assert_eq!(value["status"], "OPEN");
        assert_eq!(value["agentId"], "u9");
        assert_eq!(value["userCategory"], "TENANT");
        assert_eq!(value["updatedBy"]["name"], "Agent");
    }

    #[test]
    fn test_worknote_payload_shape() {
        let author = CurrentUser {
            id: "u1".to_string(),
            name: "Sam".to_string(),
            email: Some("sam@example.com".to_string()),
            phone: None,
            category: None,
        };
        let value = serde_json::to_value(WorknotePayload::new(&author, "hello")).unwrap();
        assert_eq!(value["type"], "WORKNOTE");
        assert_eq!(value["comment"]["description"], "hello");
        assert_eq!(value["comment"]["updatedBy"]["email"], "sam@example.com");
    }
}
