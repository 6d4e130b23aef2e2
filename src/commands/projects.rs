//! Project commands.

use jiff::Timestamp;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, StdinConfirm};
use crate::desk::Desk;
use crate::display::{render_project_detail, render_projects};
use crate::error::Result;
use crate::forms::ProjectForm;
use crate::store::{AssumeYes, Confirm};
use crate::summary::{summarize_project, summarize_projects};
use crate::types::ProjectStatus;

/// Project fields given on the command line. For updates, `None` keeps the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub client: Option<String>,
    pub owner: Option<String>,
    pub category: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ProjectOptions {
    fn apply(&self, form: &mut ProjectForm) {
        if let Some(name) = &self.name {
            form.set_name(name.clone());
        }
        if let Some(code) = &self.code {
            form.set_code(code.clone());
        }
        if let Some(description) = &self.description {
            form.description = description.clone();
        }
        if let Some(status) = self.status {
            form.status = status;
        }
        if let Some(client) = &self.client {
            form.client = client.clone();
        }
        if self.owner.is_some() {
            form.owner = self.owner.clone();
        }
        if self.category.is_some() {
            form.category = self.category.clone();
        }
        if self.start.is_some() {
            form.start = self.start.clone();
        }
        if self.end.is_some() {
            form.end = self.end.clone();
        }
    }
}

/// List projects with their ticket counts and progress.
pub async fn cmd_project_ls(output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;

    let (projects, tickets) = futures::join!(desk.projects.fetch(), desk.tickets.fetch());
    projects?;
    if let Err(e) = tickets {
        tracing::warn!("could not load tickets for project summaries: {e}");
    }

    let projects = desk.projects.projects();
    let summaries = summarize_projects(&projects, &desk.tickets.tickets(), Timestamp::now());

    let items: Vec<_> = projects
        .iter()
        .zip(&summaries)
        .map(|(project, summary)| json!({ "project": project, "summary": summary }))
        .collect();
    CommandOutput::new(json!({ "projects": items }))
        .with_text(render_projects(&projects, &summaries, &desk.tz))
        .print(output_json)
}

pub async fn cmd_project_show(id: &str, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;

    let (projects, tickets) = futures::join!(desk.projects.fetch(), desk.tickets.fetch());
    projects?;
    tickets?;

    let project = desk.projects.find(id)?;
    let summary = summarize_project(&project, &desk.tickets.tickets(), Timestamp::now());

    CommandOutput::new(json!({ "project": project, "summary": summary }))
        .with_text(render_project_detail(&project, &summary, &desk.tz))
        .print(output_json)
}

pub async fn cmd_project_create(options: ProjectOptions, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;

    let mut form = ProjectForm::new();
    options.apply(&mut form);
    let created = desk.projects.create(&mut form, &desk.tz).await?;

    CommandOutput::new(json!({ "action": "create", "project": created }))
        .with_text(format!("Created project {}", form.name.trim().bold()))
        .print(output_json)
}

pub async fn cmd_project_update(id: &str, options: ProjectOptions, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    desk.projects.fetch().await?;
    let project = desk.projects.find(id)?;

    let mut form = ProjectForm::from_project(&project, &desk.tz);
    options.apply(&mut form);
    let updated = desk.projects.update(&project.id, &mut form, &desk.tz).await?;

    CommandOutput::new(json!({
        "action": "update",
        "id": project.id,
        "project": updated,
    }))
    .with_text(format!("Updated project {}", form.name.trim().bold()))
    .print(output_json)
}

pub async fn cmd_project_delete(id: &str, yes: bool, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    desk.projects.fetch().await?;
    let project = desk.projects.find(id)?;

    let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
    desk.projects.delete(&project.id, confirm).await?;

    CommandOutput::new(json!({ "action": "delete", "id": project.id }))
        .with_text(format!("Deleted project {}", project.name.bold()))
        .print(output_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::Field;
    use jiff::tz::TimeZone;

    #[test]
    fn test_options_only_touch_given_fields() {
        let mut form = ProjectForm::new();
        form.client = "Acme".to_string();
        let options = ProjectOptions {
            name: Some("Portal".to_string()),
            status: Some(ProjectStatus::OnHold),
            ..Default::default()
        };
        options.apply(&mut form);

        assert_eq!(form.name, "Portal");
        assert_eq!(form.client, "Acme");
        assert_eq!(form.status, ProjectStatus::OnHold);
        assert!(!form.validate(&TimeZone::UTC));
        assert!(form.errors().contains(Field::Code));
    }
}
