//! Client for the ticket service REST API.
//!
//! Two hosts are involved: the identity host (login, user directory, ticket
//! deletion) and the service host (tickets, projects, categories, worknotes,
//! uploads, password change). Every request carries the configured
//! API key in `x-encrypted-key` and, once signed in, a bearer token.
//!
//! All responses are normalized into [`crate::model`] types before they
//! leave this module.

pub mod error;
pub mod http;
pub mod wire;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Category, CurrentUser, Project, Ticket, User};
use crate::types::{TicketId, UserType};

pub use error::ApiError;
pub use http::HttpGateway;
pub use wire::{
    CreateTicketPayload, Credentials, PasswordChangePayload, ProjectPayload, ServerFilterPayload,
    UpdateTicketPayload, UploadPayload, WorknotePayload,
};

/// Header carrying the client API key.
pub const API_KEY_HEADER: &str = "x-encrypted-key";

/// Which host serves an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    Identity,
    Service,
}

impl Host {
    pub fn label(&self) -> &'static str {
        match self {
            Host::Identity => "identity",
            Host::Service => "service",
        }
    }
}

/// Endpoint paths, relative to their host.
pub mod endpoints {
    pub const ADMIN_LOGIN: &str = "/cap/users/admin/login";
    pub const TENANT_LOGIN: &str = "/cap/users/tenant/login";
    pub const UPDATE_PASSWORD: &str = "/cap/users/admin/update-password";
    pub const USER_LIST: &str = "/cap/users/admin/list";
    pub const TICKET_DELETE: &str = "/tickets";

    pub const TICKET_LIST: &str = "/servicerequest/ticket/list";
    pub const TICKET_CREATE: &str = "/servicerequest/ticket/create";
    pub const TICKET_UPDATE: &str = "/servicerequest/ticket/update";
    pub const TICKET_FILTER: &str = "/servicerequest/ticket/filter";
    pub const TICKET_COMMENT: &str = "/servicerequest/ticket/postcomment";
    pub const CATEGORY_LIST: &str = "/servicerequest/category/list";
    pub const PROJECT_LIST: &str = "/servicerequest/project/list";
    pub const PROJECT_CREATE: &str = "/servicerequest/project/create";
    pub const PROJECT_UPDATE: &str = "/servicerequest/project/update";
    pub const PROJECT_DELETE: &str = "/servicerequest/project/delete";
    pub const IMAGE_UPLOAD: &str = "/servicerequest/storage/upload/image";
}

/// Result of a successful login call.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: CurrentUser,
}

/// Upload progress callback, called with a percentage in `0..=100`.
pub type Progress<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Operations offered by the ticket service.
///
/// A 401 from any call other than `login` and `change_password` signs the
/// current session out before the error is returned.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn login(&self, credentials: &Credentials, user_type: UserType) -> Result<LoginOutcome>;

    async fn change_password(&self, payload: &PasswordChangePayload) -> Result<()>;

    async fn list_users(&self) -> Result<Vec<User>>;

    async fn list_tickets(&self) -> Result<Vec<Ticket>>;

    async fn filter_tickets(&self, filter: &ServerFilterPayload) -> Result<Vec<Ticket>>;

    /// Returns the created ticket if the server echoed it back.
    async fn create_ticket(&self, payload: &CreateTicketPayload) -> Result<Option<Ticket>>;

    /// Returns the updated ticket if the server echoed it back.
    async fn update_ticket(
        &self,
        id: &TicketId,
        payload: &UpdateTicketPayload,
    ) -> Result<Option<Ticket>>;

    async fn delete_ticket(&self, id: &TicketId) -> Result<()>;

    async fn post_worknote(&self, id: &TicketId, payload: &WorknotePayload) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn create_project(&self, payload: &ProjectPayload) -> Result<Option<Project>>;

    async fn update_project(&self, id: &str, payload: &ProjectPayload) -> Result<Option<Project>>;

    async fn delete_project(&self, id: &str) -> Result<()>;

    /// Upload one file and return its hosted URL.
    async fn upload_image(&self, payload: &UploadPayload, progress: Progress<'_>) -> Result<String>;
}
