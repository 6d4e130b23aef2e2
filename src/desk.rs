//! Application context shared by the commands.

use std::sync::Arc;

use jiff::tz::TimeZone;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::{Gateway, HttpGateway};
use crate::model::{Category, CurrentUser, Project};
use crate::query::FilterContext;
use crate::session::SessionStore;
use crate::store::{CategoryStore, ProjectStore, TicketStore, UserStore};

/// Configuration, session, gateway and stores for one run.
pub struct Desk {
    pub config: Config,
    pub tz: TimeZone,
    pub session: Arc<SessionStore>,
    pub gateway: Arc<dyn Gateway>,
    pub tickets: TicketStore,
    pub projects: ProjectStore,
    pub categories: CategoryStore,
    pub users: UserStore,
}

impl Desk {
    /// Load configuration, restore the persisted session and connect.
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let session = Arc::new(SessionStore::restore(Config::session_path()?));
        let gateway = Arc::new(HttpGateway::from_config(&config, Arc::clone(&session))?);
        Self::with_gateway(config, session, gateway)
    }

    /// Assemble a desk around an existing gateway.
    pub fn with_gateway(
        config: Config,
        session: Arc<SessionStore>,
        gateway: Arc<dyn Gateway>,
    ) -> Result<Self> {
        let tz = config.time_zone()?;
        Ok(Self {
            tickets: TicketStore::new(Arc::clone(&gateway)),
            projects: ProjectStore::new(Arc::clone(&gateway)),
            categories: CategoryStore::new(Arc::clone(&gateway)),
            users: UserStore::new(Arc::clone(&gateway)),
            config,
            tz,
            session,
            gateway,
        })
    }

    pub fn require_user(&self) -> Result<CurrentUser> {
        self.session.require_user()
    }

    pub fn filter_context(&self) -> FilterContext {
        FilterContext::new(
            self.session.current_user().map(|u| u.id),
            self.tz.clone(),
        )
    }

    /// Projects and categories for grouping. Failures are logged and
    /// leave the list empty, so views still render from ticket data.
    pub async fn load_references(&self) -> (Vec<Project>, Vec<Category>) {
        let (projects, categories) =
            futures::join!(self.projects.fetch(), self.categories.ensure_loaded());
        if let Err(e) = projects {
            tracing::warn!("could not load projects: {e}");
        }
        let categories = categories.unwrap_or_else(|e| {
            tracing::warn!("could not load categories: {e}");
            Vec::new()
        });
        (self.projects.projects(), categories)
    }
}
