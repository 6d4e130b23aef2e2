//! Project store.

use std::sync::Arc;

use jiff::tz::TimeZone;
use parking_lot::RwLock;

use crate::error::{DeskError, Result};
use crate::forms::ProjectForm;
use crate::gateway::Gateway;
use crate::model::Project;

use super::{Confirm, Generation, StoreStatus};

#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    pub projects: Vec<Project>,
    pub status: StoreStatus,
    latest_fetch: u64,
}

impl ProjectState {
    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone)]
pub enum ProjectEvent {
    FetchStarted { generation: u64 },
    FetchSucceeded { generation: u64, projects: Vec<Project> },
    FetchFailed { generation: u64, message: String },
    MutationStarted,
    Created(Option<Project>),
    Updated(Option<Project>),
    Deleted(String),
    MutationFailed(String),
}

pub fn reduce_project_state(state: &mut ProjectState, event: ProjectEvent) {
    match event {
        ProjectEvent::FetchStarted { generation } => {
            state.latest_fetch = state.latest_fetch.max(generation);
            state.status.begin_fetch();
        }
        ProjectEvent::FetchSucceeded {
            generation,
            projects,
        } => {
            if generation < state.latest_fetch {
                tracing::debug!("discarding stale project fetch (generation {generation})");
                return;
            }
            state.projects = projects;
            state.status.finish_fetch();
        }
        ProjectEvent::FetchFailed {
            generation,
            message,
        } => {
            if generation >= state.latest_fetch {
                state.status.fail(message);
            }
        }
        ProjectEvent::MutationStarted => state.status.start(),
        ProjectEvent::Created(project) => {
            if let Some(project) = project
                && state.get(&project.id).is_none()
            {
                state.projects.push(project);
            }
            state.status.succeed(Some("Project created successfully"));
        }
        ProjectEvent::Updated(project) => {
            if let Some(project) = project {
                match state.projects.iter_mut().find(|p| p.id == project.id) {
                    Some(existing) => *existing = project,
                    None => state.projects.push(project),
                }
            }
            state.status.succeed(Some("Project updated successfully"));
        }
        ProjectEvent::Deleted(id) => {
            state.projects.retain(|p| p.id != id);
            state.status.succeed(Some("Project deleted successfully"));
        }
        ProjectEvent::MutationFailed(message) => state.status.fail(message),
    }
}

#[derive(Clone)]
pub struct ProjectStore {
    gateway: Arc<dyn Gateway>,
    state: Arc<RwLock<ProjectState>>,
    generation: Arc<Generation>,
}

impl ProjectStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(ProjectState::default())),
            generation: Arc::new(Generation::default()),
        }
    }

    pub fn dispatch(&self, event: ProjectEvent) {
        reduce_project_state(&mut self.state.write(), event);
    }

    pub fn snapshot(&self) -> ProjectState {
        self.state.read().clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.read().projects.clone()
    }

    pub fn status(&self) -> StoreStatus {
        self.state.read().status.clone()
    }

    /// Resolve a project by id, code or name (case-insensitive).
    pub fn find(&self, needle: &str) -> Result<Project> {
        let needle = needle.trim();
        let state = self.state.read();
        state
            .get(needle)
            .or_else(|| {
                state.projects.iter().find(|p| {
                    p.code
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(needle))
                        || p.name.eq_ignore_ascii_case(needle)
                })
            })
            .cloned()
            .ok_or_else(|| DeskError::ProjectNotFound(needle.to_string()))
    }

    pub async fn fetch(&self) -> Result<()> {
        let generation = self.generation.next();
        self.dispatch(ProjectEvent::FetchStarted { generation });
        match self.gateway.list_projects().await {
            Ok(projects) => {
                tracing::debug!("fetched {} projects", projects.len());
                self.dispatch(ProjectEvent::FetchSucceeded {
                    generation,
                    projects,
                });
                Ok(())
            }
            Err(e) => {
                self.dispatch(ProjectEvent::FetchFailed {
                    generation,
                    message: e.store_message(),
                });
                Err(e)
            }
        }
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.fetch().await {
            tracing::warn!("refreshing projects after update failed: {e}");
        }
    }

    pub async fn create(&self, form: &mut ProjectForm, tz: &TimeZone) -> Result<Option<Project>> {
        let payload = form.payload(tz)?;

        self.dispatch(ProjectEvent::MutationStarted);
        match self.gateway.create_project(&payload).await {
            Ok(created) => {
                self.dispatch(ProjectEvent::Created(created.clone()));
                self.refresh_after_mutation().await;
                Ok(created)
            }
            Err(e) => {
                self.dispatch(ProjectEvent::MutationFailed(e.store_message()));
                Err(e)
            }
        }
    }

    pub async fn update(
        &self,
        id: &str,
        form: &mut ProjectForm,
        tz: &TimeZone,
    ) -> Result<Option<Project>> {
        let payload = form.payload(tz)?;

        self.dispatch(ProjectEvent::MutationStarted);
        match self.gateway.update_project(id, &payload).await {
            Ok(updated) => {
                self.dispatch(ProjectEvent::Updated(updated.clone()));
                self.refresh_after_mutation().await;
                Ok(updated)
            }
            Err(e) => {
                self.dispatch(ProjectEvent::MutationFailed(e.store_message()));
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> Result<()> {
        let project = self.find(id)?;
        if !confirm.confirm(&format!("Delete project \"{}\"?", project.name)) {
            return Err(DeskError::Cancelled);
        }

        self.dispatch(ProjectEvent::MutationStarted);
        match self.gateway.delete_project(&project.id).await {
            Ok(()) => {
                self.dispatch(ProjectEvent::Deleted(project.id));
                Ok(())
            }
            Err(e) => {
                self.dispatch(ProjectEvent::MutationFailed(e.store_message()));
                Err(e)
            }
        }
    }
}
