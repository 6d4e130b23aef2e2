//! Authentication session lifecycle.
//!
//! The session moves between three phases:
//!
//! ```text
//! Anonymous --login--> Authenticating --ok--> Authenticated
//!     ^                      |                     |
//!     +------- failure ------+                     |
//!     +------------- logout / 401 teardown --------+
//! ```
//!
//! The authenticated session is persisted to `session.json` so it survives
//! restarts. The file and the in-memory state are updated under the same
//! write lock, so nothing observes one without the other.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::gateway::{Credentials, Gateway, PasswordChangePayload};
use crate::model::CurrentUser;
use crate::types::UserType;

/// Observable session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// An established session.
pub struct Session {
    pub user: CurrentUser,
    token: SecretBox<String>,
}

impl Session {
    pub fn new(user: CurrentUser, token: String) -> Self {
        Self {
            user,
            token: SecretBox::new(Box::new(token)),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    user: CurrentUser,
    token: String,
}

/// Holds the session and keeps it in sync with its persisted copy.
#[derive(Debug)]
pub struct SessionStore {
    state: RwLock<SessionState>,
    last_error: RwLock<Option<String>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(SessionState::Anonymous),
            last_error: RwLock::new(None),
            path: None,
        }
    }

    /// Restore from `path`, starting anonymous when the file is absent.
    ///
    /// An unreadable or corrupt session file is discarded with a warning.
    pub fn restore(path: PathBuf) -> Self {
        let state = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<PersistedSession>(&content) {
                Ok(saved) if !saved.token.is_empty() => {
                    tracing::debug!("restored session for {}", saved.user.name);
                    SessionState::Authenticated(Session::new(saved.user, saved.token))
                }
                Ok(_) | Err(_) => {
                    tracing::warn!("discarding invalid session file {}", path.display());
                    if let Err(e) = remove_file(&path) {
                        tracing::warn!("failed to remove session file: {e}");
                    }
                    SessionState::Anonymous
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => SessionState::Anonymous,
            Err(e) => {
                tracing::warn!("failed to read session file {}: {e}", path.display());
                SessionState::Anonymous
            }
        };

        Self {
            state: RwLock::new(state),
            last_error: RwLock::new(None),
            path: Some(path),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match &*self.state.read() {
            SessionState::Anonymous => SessionPhase::Anonymous,
            SessionState::Authenticating => SessionPhase::Authenticating,
            SessionState::Authenticated(_) => SessionPhase::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        match &*self.state.read() {
            SessionState::Authenticated(session) => Some(session.user.clone()),
            _ => None,
        }
    }

    /// The signed-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<CurrentUser> {
        self.current_user().ok_or(DeskError::NotAuthenticated)
    }

    pub fn bearer_token(&self) -> Option<String> {
        match &*self.state.read() {
            SessionState::Authenticated(session) => Some(session.token.expose_secret().clone()),
            _ => None,
        }
    }

    /// Message from the most recent failed login, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Anonymous -> Authenticating.
    pub fn begin_login(&self) -> Result<()> {
        let mut state = self.state.write();
        match &*state {
            SessionState::Anonymous => {
                *state = SessionState::Authenticating;
                *self.last_error.write() = None;
                Ok(())
            }
            SessionState::Authenticating => {
                Err(DeskError::Auth("a login is already in progress".to_string()))
            }
            SessionState::Authenticated(session) => Err(DeskError::Auth(format!(
                "already signed in as {}; log out first",
                session.user.name
            ))),
        }
    }

    /// Authenticating -> Authenticated. Persists the session first; if that
    /// fails the store returns to Anonymous.
    pub fn complete_login(&self, user: CurrentUser, token: String) -> Result<()> {
        let mut state = self.state.write();
        if !matches!(*state, SessionState::Authenticating) {
            return Err(DeskError::Auth("no login in progress".to_string()));
        }

        if let Some(path) = &self.path
            && let Err(e) = write_session(path, &user, &token)
        {
            // An older session file must not outlive the failed login.
            if let Err(remove) = remove_file(path) {
                tracing::warn!("failed to remove session file: {remove}");
            }
            *state = SessionState::Anonymous;
            *self.last_error.write() = Some(e.to_string());
            return Err(e);
        }

        tracing::info!("signed in as {}", user.name);
        *state = SessionState::Authenticated(Session::new(user, token));
        Ok(())
    }

    /// Authenticating -> Anonymous, recording the failure message.
    pub fn fail_login(&self, message: impl Into<String>) {
        let mut state = self.state.write();
        if matches!(*state, SessionState::Authenticating) {
            *state = SessionState::Anonymous;
        }
        *self.last_error.write() = Some(message.into());
    }

    /// Explicit sign-out. The in-memory session is cleared regardless; if
    /// removing the session file fails, the error is returned and the file
    /// may survive, so the next start restores it.
    pub fn logout(&self) -> Result<()> {
        let mut state = self.state.write();
        *state = SessionState::Anonymous;
        match &self.path {
            Some(path) => remove_file(path).map_err(DeskError::from),
            None => Ok(()),
        }
    }

    /// Sign-out triggered by a 401. Never fails.
    pub fn force_sign_out(&self) {
        let mut state = self.state.write();
        if matches!(*state, SessionState::Anonymous) {
            return;
        }
        tracing::warn!("server rejected the session token; signing out");
        *state = SessionState::Anonymous;
        if let Some(path) = &self.path
            && let Err(e) = remove_file(path)
        {
            tracing::warn!("failed to remove session file: {e}");
        }
    }
}

fn remove_file(path: &PathBuf) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Write the session to a private temp file, then rename it into place.
fn write_session(path: &PathBuf, user: &CurrentUser, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&PersistedSession {
        user: user.clone(),
        token: token.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    if let Err(e) = write_private(&tmp, &content).and_then(|()| fs::rename(&tmp, path)) {
        if let Err(remove) = remove_file(&tmp) {
            tracing::debug!("failed to remove {}: {remove}", tmp.display());
        }
        return Err(e.into());
    }
    Ok(())
}

fn write_private(path: &PathBuf, content: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;

    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Run the full login flow against the gateway.
///
/// A failed attempt leaves the store anonymous with the failure recorded in
/// [`SessionStore::last_error`].
pub async fn login(
    gateway: &dyn Gateway,
    session: &SessionStore,
    credentials: &Credentials,
    user_type: UserType,
) -> Result<CurrentUser> {
    session.begin_login()?;
    match gateway.login(credentials, user_type).await {
        Ok(outcome) => {
            session.complete_login(outcome.user.clone(), outcome.token)?;
            Ok(outcome.user)
        }
        Err(e) => {
            session.fail_login(e.store_message());
            Err(e)
        }
    }
}

/// Change the signed-in user's password.
pub async fn change_password(
    gateway: &dyn Gateway,
    session: &SessionStore,
    current: &str,
    new: &str,
) -> Result<()> {
    session.require_user()?;
    if new.trim().is_empty() {
        return Err(DeskError::Auth("new password cannot be empty".to_string()));
    }
    if current == new {
        return Err(DeskError::Auth(
            "new password must differ from the current one".to_string(),
        ));
    }
    gateway
        .change_password(&PasswordChangePayload {
            current_password: current.to_string(),
            new_password: new.to_string(),
        })
        .await
}
