use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::attachments::AttachmentSet;
use crate::error::{DeskError, Result};
use crate::gateway::wire::{CreateTicketPayload, UpdateTicketPayload, WirePerson};
use crate::model::{Category, CurrentUser, PersonRef, Ticket};
use crate::time::{parse_local_datetime, to_local_input};
use crate::types::{Priority, Severity, TicketStatus};

use super::{Field, FieldErrors, require, require_some};

/// User type sent for a reporter whose profile carries none.
const DEFAULT_REPORTER_TYPE: &str = "INSPECTOR";

/// Which submission a form is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Create/update ticket form.
///
/// Date fields hold local wall-clock input (`YYYY-MM-DDTHH:MM`) in the
/// configured timezone. For updates, `None` keeps the loaded value and an
/// empty string clears it.
#[derive(Debug, Clone, Default)]
pub struct TicketForm {
    pub subject: String,
    pub description: String,
    pub category: Option<String>,
    pub project: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub severity: Option<Severity>,
    pub assignee: Option<PersonRef>,
    pub reported_to: Option<PersonRef>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub scope: Option<String>,
    pub escalated: Option<bool>,
    pub attachments: AttachmentSet,
    errors: FieldErrors,
}

impl TicketForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate from a loaded ticket for editing.
    pub fn from_ticket(ticket: &Ticket, tz: &TimeZone) -> Self {
        Self {
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            category: ticket.category_id().map(str::to_string),
            project: ticket.project_id().map(str::to_string),
            status: Some(ticket.status),
            priority: ticket.priority,
            severity: ticket.severity,
            assignee: ticket.assignee.clone(),
            reported_to: ticket.reported_to.clone(),
            start: ticket.start_date.map(|t| to_local_input(t, tz)),
            end: ticket.end_date.map(|t| to_local_input(t, tz)),
            scope: ticket.scope.clone(),
            escalated: Some(ticket.escalated),
            attachments: AttachmentSet::with_urls(ticket.attachments.iter().cloned()),
            errors: FieldErrors::new(),
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn set_subject(&mut self, value: impl Into<String>) {
        self.subject = value.into();
        self.errors.clear(Field::Subject);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
        self.errors.clear(Field::Description);
    }

    pub fn set_category(&mut self, value: impl Into<String>) {
        self.category = Some(value.into());
        self.errors.clear(Field::Category);
    }

    /// Select a category and take its default severity (Medium when it has
    /// none) and scope.
    pub fn apply_category(&mut self, category: &Category) {
        self.set_category(category.id.clone());
        self.severity = Some(category.severity.unwrap_or_default());
        self.scope = category.scope.clone().filter(|s| !s.trim().is_empty());
    }

    pub fn set_project(&mut self, value: impl Into<String>) {
        self.project = Some(value.into());
        self.errors.clear(Field::Project);
    }

    pub fn set_start(&mut self, value: impl Into<String>) {
        self.start = Some(value.into());
        self.errors.clear(Field::StartDate);
        self.errors.clear(Field::EndDate);
    }

    pub fn set_end(&mut self, value: impl Into<String>) {
        self.end = Some(value.into());
        self.errors.clear(Field::EndDate);
    }

    /// Run validation, store the errors on the form, and report whether it
    /// may be submitted.
    pub fn validate(&mut self, mode: FormMode, tz: &TimeZone) -> bool {
        self.errors = self.check(mode, tz);
        self.errors.is_empty()
    }

    /// Validation without side effects.
    pub fn check(&self, mode: FormMode, tz: &TimeZone) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, Field::Subject, &self.subject, "Subject is required");
        require_some(
            &mut errors,
            Field::Project,
            self.project.as_deref(),
            "Project is required",
        );
        if mode == FormMode::Create {
            require(
                &mut errors,
                Field::Description,
                &self.description,
                "Description is required",
            );
            require_some(
                &mut errors,
                Field::Category,
                self.category.as_deref(),
                "Category is required",
            );
        }

        let start = date_field(&mut errors, Field::StartDate, self.start.as_deref(), tz);
        let end = date_field(&mut errors, Field::EndDate, self.end.as_deref(), tz);
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            errors.insert(Field::EndDate, "End date must be after start date");
        }
        errors
    }

    fn submittable(&mut self, mode: FormMode, tz: &TimeZone) -> Result<()> {
        self.attachments.ensure_idle()?;
        if !self.validate(mode, tz) {
            return Err(DeskError::Validation(self.errors.clone()));
        }
        Ok(())
    }

    /// Validate and shape the create payload.
    pub fn create_payload(
        &mut self,
        reporter: &CurrentUser,
        tz: &TimeZone,
    ) -> Result<CreateTicketPayload> {
        self.submittable(FormMode::Create, tz)?;

        let mut reported_by = WirePerson::from(reporter);
        reported_by.id = None;
        if reported_by.user_type.is_none() {
            reported_by.user_type = Some(DEFAULT_REPORTER_TYPE.to_string());
        }

        Ok(CreateTicketPayload {
            category: self.category.clone().unwrap_or_default(),
            project: self.project.clone(),
            description: self.description.clone(),
            subject: self.subject.trim().to_string(),
            reported_by,
            attachments: self.attachments.urls(),
            priority: self.priority.unwrap_or_default(),
            severity: self.severity.unwrap_or_default(),
            reported_to: self.reported_to.as_ref().map(WirePerson::from),
            assign_to: self.assignee.as_ref().map(WirePerson::from),
            start_date: parse_optional(self.start.as_deref(), tz)?,
            end_date: parse_optional(self.end.as_deref(), tz)?,
            scope: self.scope.clone(),
        })
    }

    /// Validate and merge the form over `base` into a full update payload.
    pub fn update_payload(
        &mut self,
        base: &Ticket,
        updater: &CurrentUser,
        tz: &TimeZone,
    ) -> Result<UpdateTicketPayload> {
        self.submittable(FormMode::Update, tz)?;

        let mut payload = UpdateTicketPayload::from_ticket(base, updater);
        payload.subject = self.subject.trim().to_string();
        payload.description = self.description.clone();
        if let Some(category) = &self.category {
            payload.category = Some(category.clone());
        }
        payload.project = self.project.clone();
        if let Some(status) = self.status {
            payload.status = status;
        }
        if let Some(priority) = self.priority {
            payload.priority = Some(priority);
        }
        if let Some(severity) = self.severity {
            payload.severity = Some(severity);
        }
        if let Some(assignee) = &self.assignee {
            payload.assign_to = Some(WirePerson::from(assignee));
        }
        if let Some(reported_to) = &self.reported_to {
            payload.reported_to = Some(WirePerson::from(reported_to));
        }
        if let Some(start) = &self.start {
            payload.start_date = parse_optional(Some(start), tz)?;
        }
        if let Some(end) = &self.end {
            payload.end_date = parse_optional(Some(end), tz)?;
        }
        if let Some(scope) = &self.scope {
            payload.scope = Some(scope.clone()).filter(|s| !s.is_empty());
        }
        if let Some(escalated) = self.escalated {
            payload.escalated = escalated.to_string();
        }
        payload.attachments = self.attachments.urls();
        Ok(payload)
    }
}

/// Parse a date field for validation, recording a field error on failure.
fn date_field(
    errors: &mut FieldErrors,
    field: Field,
    value: Option<&str>,
    tz: &TimeZone,
) -> Option<Timestamp> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match parse_local_datetime(value, tz) {
        Ok(ts) => Some(ts),
        Err(_) => {
            errors.insert(field, format!("Invalid date '{value}' (expected YYYY-MM-DDTHH:MM)"));
            None
        }
    }
}

fn parse_optional(value: Option<&str>, tz: &TimeZone) -> Result<Option<Timestamp>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(parse_local_datetime(v, tz)?)),
        None => Ok(None),
    }
}
