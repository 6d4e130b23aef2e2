use jiff::tz::TimeZone;

use crate::error::{DeskError, Result};
use crate::gateway::wire::{ProjectPayload, WireClient};
use crate::model::Project;
use crate::time::{parse_local_datetime, to_local_input};
use crate::types::ProjectStatus;

use super::{Field, FieldErrors, require};

/// Create/update project form.
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub name: String,
    pub code: String,
    pub description: String,
    pub status: ProjectStatus,
    pub client: String,
    pub owner: Option<String>,
    pub category: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    errors: FieldErrors,
}

impl ProjectForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_project(project: &Project, tz: &TimeZone) -> Self {
        Self {
            name: project.name.clone(),
            code: project.code.clone().unwrap_or_default(),
            description: project.description.clone().unwrap_or_default(),
            status: project.status,
            client: project.client.clone().unwrap_or_default(),
            owner: project.owner.as_ref().and_then(|o| o.id.clone()),
            category: project.category.clone(),
            start: project.start_date.map(|t| to_local_input(t, tz)),
            end: project.end_date.map(|t| to_local_input(t, tz)),
            errors: FieldErrors::new(),
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
        self.errors.clear(Field::Name);
    }

    pub fn set_code(&mut self, value: impl Into<String>) {
        self.code = value.into();
        self.errors.clear(Field::Code);
    }

    pub fn validate(&mut self, tz: &TimeZone) -> bool {
        let mut errors = FieldErrors::new();
        require(&mut errors, Field::Name, &self.name, "Project name is required");
        require(&mut errors, Field::Code, &self.code, "Project code is required");
        for (field, value) in [(Field::StartDate, &self.start), (Field::EndDate, &self.end)] {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty())
                && parse_local_datetime(v, tz).is_err()
            {
                errors.insert(field, format!("Invalid date '{v}'"));
            }
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validate and shape the request body.
    pub fn payload(&mut self, tz: &TimeZone) -> Result<ProjectPayload> {
        if !self.validate(tz) {
            return Err(DeskError::Validation(self.errors.clone()));
        }
        let date = |value: &Option<String>| -> Result<_> {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => Ok(Some(parse_local_datetime(v, tz)?)),
                None => Ok(None),
            }
        };

        Ok(ProjectPayload {
            name: self.name.trim().to_string(),
            code: self.code.trim().to_string(),
            description: Some(self.description.clone()).filter(|d| !d.trim().is_empty()),
            status: self.status,
            start_date: date(&self.start)?,
            end_date: date(&self.end)?,
            category: self.category.clone(),
            client: WireClient {
                name: self.client.clone(),
            },
            owner: self.owner.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_code_required() {
        let mut form = ProjectForm::new();
        assert!(!form.validate(&TimeZone::UTC));
        assert_eq!(form.errors().get(Field::Name), Some("Project name is required"));
        assert_eq!(form.errors().get(Field::Code), Some("Project code is required"));

        form.set_name("Portal");
        assert!(!form.errors().contains(Field::Name));
        assert!(form.errors().contains(Field::Code));
    }

    #[test]
    fn test_payload_shape() {
        let mut form = ProjectForm::new();
        form.set_name(" Portal ");
        form.set_code("PRT");
        form.client = "Acme".to_string();
        form.status = ProjectStatus::OnHold;
        form.start = Some("2024-05-01T00:00".to_string());

        let value = serde_json::to_value(form.payload(&TimeZone::UTC).unwrap()).unwrap();
        assert_eq!(value["name"], "Portal");
        assert_eq!(value["code"], "PRT");
        assert_eq!(value["status"], "ON HOLD");
        assert_eq!(value["client"]["name"], "Acme");
        assert_eq!(value["startDate"], "2024-05-01T00:00:00Z");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_round_trips_existing_project() {
        let mut project = Project::new("p1", "Portal");
        project.code = Some("PRT".to_string());
        project.client = Some("Acme".to_string());
        let mut form = ProjectForm::from_project(&project, &TimeZone::UTC);
        let payload = form.payload(&TimeZone::UTC).unwrap();
        assert_eq!(payload.code, "PRT");
        assert_eq!(payload.client.name, "Acme");
    }
}
