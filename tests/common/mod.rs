#![allow(dead_code)]

pub mod mock_data;

use std::fs;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::Notify;

use ticketdesk::error::{DeskError, Result};
use ticketdesk::gateway::{
    CreateTicketPayload, Credentials, Gateway, LoginOutcome, PasswordChangePayload,
    ProjectPayload, ServerFilterPayload, UpdateTicketPayload, UploadPayload, WorknotePayload,
};
use ticketdesk::gateway::Progress;
use ticketdesk::model::{Category, CurrentUser, Project, Ticket, User};
use ticketdesk::session::SessionStore;
use ticketdesk::types::{TicketId, UserType};

/// Helper struct to run ticketdesk commands with an isolated config directory
pub struct DeskTest {
    pub temp_dir: TempDir,
    binary_path: String,
}

impl DeskTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        DeskTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_ticketdesk").to_string(),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.binary_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("TICKETDESK_CONFIG_DIR", self.temp_dir.path())
            .env_remove("TICKETDESK_API_KEY")
            .env_remove("TICKETDESK_IDENTITY_URL")
            .env_remove("TICKETDESK_SERVICE_URL")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute ticketdesk command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.temp_dir.path().join("config.yaml"))
            .expect("Failed to read config file")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.temp_dir.path().join("config.yaml"), content)
            .expect("Failed to write config file");
    }

    pub fn write_session(&self, content: &str) {
        fs::write(self.temp_dir.path().join("session.json"), content)
            .expect("Failed to write session file");
    }

    pub fn session_exists(&self) -> bool {
        self.temp_dir.path().join("session.json").exists()
    }
}

pub fn test_user() -> CurrentUser {
    CurrentUser {
        id: "u1".to_string(),
        name: "Sarah Chen".to_string(),
        email: Some("sarah@example.com".to_string()),
        phone: None,
        category: Some("employee".to_string()),
    }
}

/// A session store already signed in as [`test_user`].
pub fn signed_in_session() -> Arc<SessionStore> {
    let session = SessionStore::in_memory();
    session.begin_login().expect("begin login");
    session
        .complete_login(test_user(), "token-123".to_string())
        .expect("complete login");
    Arc::new(session)
}

fn server_error() -> DeskError {
    DeskError::Api {
        status: 500,
        message: "Internal server error".to_string(),
    }
}

/// In-memory gateway recording every request it receives.
#[derive(Default)]
pub struct MockGateway {
    pub tickets: Mutex<Vec<Ticket>>,
    pub projects: Mutex<Vec<Project>>,
    pub categories: Mutex<Vec<Category>>,
    pub users: Mutex<Vec<User>>,

    pub created: Mutex<Vec<CreateTicketPayload>>,
    pub updates: Mutex<Vec<UpdateTicketPayload>>,
    pub deleted: Mutex<Vec<TicketId>>,
    pub worknotes: Mutex<Vec<(TicketId, WorknotePayload)>>,
    pub uploads: Mutex<Vec<UploadPayload>>,
    pub filters: Mutex<Vec<ServerFilterPayload>>,

    pub list_calls: AtomicUsize,
    pub category_calls: AtomicUsize,

    /// Every ticket update fails with a 500.
    pub fail_updates: AtomicBool,
    /// Every list call fails with a 500.
    pub fail_lists: AtomicBool,
    /// Every call answers 401.
    pub unauthorized: AtomicBool,
    /// Ticket updates wait for a permit before answering.
    pub update_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let gateway = Self::default();
        *gateway.tickets.lock() = tickets;
        gateway
    }

    /// Hold ticket updates until the returned handle is notified.
    pub fn gate_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.update_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    fn check_auth(&self) -> Result<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(DeskError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn login(&self, credentials: &Credentials, _user_type: UserType) -> Result<LoginOutcome> {
        if credentials.password != "secret" {
            return Err(DeskError::Api {
                status: 400,
                message: "Invalid credentials".to_string(),
            });
        }
        Ok(LoginOutcome {
            token: "token-123".to_string(),
            user: test_user(),
        })
    }

    async fn change_password(&self, _payload: &PasswordChangePayload) -> Result<()> {
        self.check_auth()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.check_auth()?;
        Ok(self.users.lock().clone())
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        self.check_auth()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(self.tickets.lock().clone())
    }

    async fn filter_tickets(&self, filter: &ServerFilterPayload) -> Result<Vec<Ticket>> {
        self.check_auth()?;
        self.filters.lock().push(filter.clone());
        Ok(self.tickets.lock().clone())
    }

    async fn create_ticket(&self, payload: &CreateTicketPayload) -> Result<Option<Ticket>> {
        self.check_auth()?;
        self.created.lock().push(payload.clone());

        let mut tickets = self.tickets.lock();
        let mut ticket = Ticket::new(format!("new-{}", tickets.len() + 1), payload.subject.clone());
        ticket.description = payload.description.clone();
        ticket.priority = Some(payload.priority);
        ticket.severity = Some(payload.severity);
        tickets.push(ticket.clone());
        Ok(Some(ticket))
    }

    async fn update_ticket(
        &self,
        id: &TicketId,
        payload: &UpdateTicketPayload,
    ) -> Result<Option<Ticket>> {
        self.check_auth()?;
        let gate = self.update_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.updates.lock().push(payload.clone());
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(server_error());
        }

        let mut tickets = self.tickets.lock();
        let Some(ticket) = tickets.iter_mut().find(|t| &t.id == id) else {
            return Err(DeskError::Api {
                status: 404,
                message: "Ticket not found".to_string(),
            });
        };
        ticket.subject = payload.subject.clone();
        ticket.status = payload.status;
        ticket.attachments = payload.attachments.clone();
        Ok(Some(ticket.clone()))
    }

    async fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        self.check_auth()?;
        self.deleted.lock().push(id.clone());
        self.tickets.lock().retain(|t| &t.id != id);
        Ok(())
    }

    async fn post_worknote(&self, id: &TicketId, payload: &WorknotePayload) -> Result<()> {
        self.check_auth()?;
        self.worknotes.lock().push((id.clone(), payload.clone()));
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.check_auth()?;
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.categories.lock().clone())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.check_auth()?;
        Ok(self.projects.lock().clone())
    }

    async fn create_project(&self, payload: &ProjectPayload) -> Result<Option<Project>> {
        self.check_auth()?;
        let mut projects = self.projects.lock();
        let mut project = Project::new(format!("p{}", projects.len() + 1), payload.name.clone());
        project.code = Some(payload.code.clone());
        project.status = payload.status;
        projects.push(project.clone());
        Ok(Some(project))
    }

    async fn update_project(&self, id: &str, payload: &ProjectPayload) -> Result<Option<Project>> {
        self.check_auth()?;
        let mut projects = self.projects.lock();
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(server_error)?;
        project.name = payload.name.clone();
        project.status = payload.status;
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.check_auth()?;
        self.projects.lock().retain(|p| p.id != id);
        Ok(())
    }

    async fn upload_image(&self, payload: &UploadPayload, progress: Progress<'_>) -> Result<String> {
        self.check_auth()?;
        progress(50);
        progress(100);
        let mut uploads = self.uploads.lock();
        uploads.push(payload.clone());
        Ok(format!("https://files.example.com/{}.png", uploads.len()))
    }
}
