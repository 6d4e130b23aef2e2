//! reqwest-backed [`Gateway`] implementation.
//!
//! # Security Note - Logging
//!
//! The API key and bearer token are attached as sensitive header values,
//! which reqwest redacts from its `Debug` output. Request logging here only
//! records method, host and path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use reqwest::{Body, Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretBox};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use url::Url;

use crate::config::Config;
use crate::error::{DeskError, Result};
use crate::model::{Category, Project, Ticket, User};
use crate::session::SessionStore;
use crate::types::{TicketId, UserType};

use super::error::ApiError;
use super::wire::{
    ItemEnvelope, ListEnvelope, RawCategory, RawLoginResponse, RawPersonObject, RawProject,
    RawTicket, RawUploadResponse, normalize_tickets,
};
use super::{
    API_KEY_HEADER, CreateTicketPayload, Credentials, Gateway, Host, LoginOutcome,
    PasswordChangePayload, Progress, ProjectPayload, ServerFilterPayload, UpdateTicketPayload,
    UploadPayload, WorknotePayload, endpoints,
};

/// Size of each streamed chunk when uploading.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a 401 means for a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnauthorized {
    /// Tear down the session.
    SignOut,
    /// Credentials were rejected; report as an auth error.
    Login,
    /// Report as a plain API error (password change).
    Report,
}

pub struct HttpGateway {
    client: Client,
    identity_url: Url,
    service_url: Url,
    api_key: Option<SecretBox<String>>,
    session: Arc<SessionStore>,
}

impl HttpGateway {
    /// Create a gateway from configuration.
    ///
    /// Configures the HTTP client with a 10s connect timeout and the
    /// configured total timeout.
    pub fn from_config(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        let identity_url = config.identity_url()?;
        let service_url = config.service_url()?;
        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!("no api_key configured; requests will be sent without x-encrypted-key");
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            identity_url,
            service_url,
            api_key: api_key.map(|k| SecretBox::new(Box::new(k))),
            session,
        })
    }

    fn url(&self, host: Host, path: &str) -> Result<Url> {
        let base = match host {
            Host::Identity => &self.identity_url,
            Host::Service => &self.service_url,
        };
        // Joining by string keeps any path prefix on the configured base.
        let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&joined)?)
    }

    fn request(&self, method: Method, host: Host, path: &str) -> Result<RequestBuilder> {
        let url = self.url(host, path)?;
        tracing::debug!(%method, host = host.label(), path, "sending request");

        let mut builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, sensitive(key.expose_secret())?);
        }
        if let Some(token) = self.session.bearer_token() {
            builder = builder.header(header::AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);
        }
        Ok(builder)
    }

    async fn check(&self, host: Host, response: Response, policy: OnUnauthorized) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_body(status, &body, host.label());
        tracing::debug!("{error}");

        match policy {
            OnUnauthorized::SignOut => {
                if error.is_unauthorized() {
                    self.session.force_sign_out();
                }
                Err(error.into_desk_error())
            }
            OnUnauthorized::Login => Err(error.into_login_error()),
            OnUnauthorized::Report => Err(DeskError::Api {
                status: error.status.as_u16(),
                message: error.message,
            }),
        }
    }

    async fn send(&self, host: Host, builder: RequestBuilder, policy: OnUnauthorized) -> Result<Response> {
        let response = builder.send().await?;
        self.check(host, response, policy).await
    }

    async fn fetch_list<T: DeserializeOwned>(&self, host: Host, path: &str) -> Result<Vec<T>> {
        let builder = self.request(Method::GET, host, path)?;
        let response = self.send(host, builder, OnUnauthorized::SignOut).await?;
        let text = response.text().await?;
        let envelope: ListEnvelope<T> = serde_json::from_str(&text)?;
        Ok(envelope.into_inner())
    }

    /// Parse an optional echoed entity. Empty or unrecognized bodies are `None`.
    async fn echoed<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str::<ItemEnvelope<T>>(&text)
            .ok()
            .map(ItemEnvelope::into_inner))
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| DeskError::Config("credential contains invalid header characters".to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

fn percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn login(&self, credentials: &Credentials, user_type: UserType) -> Result<LoginOutcome> {
        let path = match user_type {
            UserType::Employee => endpoints::ADMIN_LOGIN,
            UserType::Tenant => endpoints::TENANT_LOGIN,
        };
        let builder = self
            .request(Method::POST, Host::Identity, path)?
            .json(credentials);
        let response = self.send(Host::Identity, builder, OnUnauthorized::Login).await?;
        let raw: RawLoginResponse = response.json().await?;
        let message = raw.message.clone();

        match raw.into_parts() {
            (Some(token), Some(user)) => Ok(LoginOutcome { token, user }),
            (Some(_), None) => Err(DeskError::Auth(
                "login response did not include the user profile".to_string(),
            )),
            (None, _) => Err(DeskError::Auth(
                message.unwrap_or_else(|| "login response did not include a token".to_string()),
            )),
        }
    }

    async fn change_password(&self, payload: &PasswordChangePayload) -> Result<()> {
        let builder = self
            .request(Method::POST, Host::Service, endpoints::UPDATE_PASSWORD)?
            .json(payload);
        self.send(Host::Service, builder, OnUnauthorized::Report).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let raw: Vec<RawPersonObject> = self.fetch_list(Host::Identity, endpoints::USER_LIST).await?;
        Ok(raw.into_iter().filter_map(RawPersonObject::into_user).collect())
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let raw: Vec<RawTicket> = self.fetch_list(Host::Service, endpoints::TICKET_LIST).await?;
        Ok(normalize_tickets(raw))
    }

    async fn filter_tickets(&self, filter: &ServerFilterPayload) -> Result<Vec<Ticket>> {
        let builder = self
            .request(Method::POST, Host::Service, endpoints::TICKET_FILTER)?
            .json(filter);
        let response = self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        let text = response.text().await?;
        let envelope: ListEnvelope<RawTicket> = serde_json::from_str(&text)?;
        Ok(normalize_tickets(envelope.into_inner()))
    }

    async fn create_ticket(&self, payload: &CreateTicketPayload) -> Result<Option<Ticket>> {
        let builder = self
            .request(Method::POST, Host::Service, endpoints::TICKET_CREATE)?
            .json(payload);
        let response = self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        let raw: Option<RawTicket> = Self::echoed(response).await?;
        Ok(raw.and_then(RawTicket::into_ticket))
    }

    async fn update_ticket(
        &self,
        id: &TicketId,
        payload: &UpdateTicketPayload,
    ) -> Result<Option<Ticket>> {
        let path = format!("{}/{}", endpoints::TICKET_UPDATE, id);
        let builder = self.request(Method::PUT, Host::Service, &path)?.json(payload);
        let response = self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        let raw: Option<RawTicket> = Self::echoed(response).await?;
        Ok(raw.and_then(RawTicket::into_ticket))
    }

    async fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let path = format!("{}/{}", endpoints::TICKET_DELETE, id);
        let builder = self.request(Method::DELETE, Host::Identity, &path)?;
        self.send(Host::Identity, builder, OnUnauthorized::SignOut).await?;
        Ok(())
    }

    async fn post_worknote(&self, id: &TicketId, payload: &WorknotePayload) -> Result<()> {
        let path = format!("{}/{}", endpoints::TICKET_COMMENT, id);
        let builder = self.request(Method::POST, Host::Service, &path)?.json(payload);
        self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let raw: Vec<RawCategory> = self.fetch_list(Host::Service, endpoints::CATEGORY_LIST).await?;
        Ok(raw.into_iter().filter_map(RawCategory::into_category).collect())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let raw: Vec<RawProject> = self.fetch_list(Host::Service, endpoints::PROJECT_LIST).await?;
        Ok(raw.into_iter().filter_map(RawProject::into_project).collect())
    }

    async fn create_project(&self, payload: &ProjectPayload) -> Result<Option<Project>> {
        let builder = self
            .request(Method::POST, Host::Service, endpoints::PROJECT_CREATE)?
            .json(payload);
        let response = self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        let raw: Option<RawProject> = Self::echoed(response).await?;
        Ok(raw.and_then(RawProject::into_project))
    }

    async fn update_project(&self, id: &str, payload: &ProjectPayload) -> Result<Option<Project>> {
        let path = format!("{}/{}", endpoints::PROJECT_UPDATE, id);
        let builder = self.request(Method::PUT, Host::Service, &path)?.json(payload);
        let response = self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        let raw: Option<RawProject> = Self::echoed(response).await?;
        Ok(raw.and_then(RawProject::into_project))
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", endpoints::PROJECT_DELETE, id);
        let builder = self.request(Method::DELETE, Host::Service, &path)?;
        self.send(Host::Service, builder, OnUnauthorized::SignOut).await?;
        Ok(())
    }

    async fn upload_image(&self, payload: &UploadPayload, progress: Progress<'_>) -> Result<String> {
        let body = serde_json::to_vec(payload)?;
        let total = body.len();
        let chunks: Vec<Vec<u8>> = body.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

        // The body stream reports bytes handed to the connection; the loop
        // below forwards those reports while the request is in flight.
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let stream = futures::stream::iter(chunks.into_iter().scan(0usize, move |sent, chunk| {
            *sent += chunk.len();
            let _ = tx.send(percent(*sent, total));
            Some(Ok::<Vec<u8>, std::io::Error>(chunk))
        }));

        let builder = self
            .request(Method::POST, Host::Service, endpoints::IMAGE_UPLOAD)?
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(header::CONTENT_LENGTH, total)
            .body(Body::wrap_stream(stream));

        progress(0);
        let send = builder.send();
        tokio::pin!(send);
        let response = loop {
            tokio::select! {
                Some(pct) = rx.recv() => progress(pct),
                result = &mut send => break result?,
            }
        };
        while let Ok(pct) = rx.try_recv() {
            progress(pct);
        }

        let response = self.check(Host::Service, response, OnUnauthorized::SignOut).await?;
        let raw: RawUploadResponse = response.json().await?;
        let url = raw.file_url().ok_or_else(|| DeskError::Api {
            status: 200,
            message: "upload response did not include a file URL".to_string(),
        })?;
        progress(100);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CurrentUser;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn gateway(identity: &str, service: &str) -> HttpGateway {
        let config = Config {
            identity_url: Some(identity.to_string()),
            service_url: Some(service.to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        HttpGateway::from_config(&config, Arc::new(SessionStore::in_memory())).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let gw = gateway("https://api.example.com/", "https://svc.example.com/v2");
        assert_eq!(
            gw.url(Host::Service, endpoints::TICKET_LIST).unwrap().as_str(),
            "https://svc.example.com/v2/servicerequest/ticket/list"
        );
        assert_eq!(
            gw.url(Host::Identity, endpoints::ADMIN_LOGIN).unwrap().as_str(),
            "https://api.example.com/cap/users/admin/login"
        );
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 100), 0);
        assert_eq!(percent(50, 200), 25);
        assert_eq!(percent(300, 200), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_sensitive_header_value() {
        let value = sensitive("Bearer token123").unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer token123");
        assert!(sensitive("bad\nvalue").is_err());
    }

    fn signed_in() -> Arc<SessionStore> {
        let session = SessionStore::in_memory();
        session.begin_login().unwrap();
        session
            .complete_login(
                CurrentUser {
                    id: "u1".to_string(),
                    name: "Sarah Chen".to_string(),
                    email: None,
                    phone: None,
                    category: None,
                },
                "expired-token".to_string(),
            )
            .unwrap();
        Arc::new(session)
    }

    /// Gateway whose hosts both point at `base`, bypassing any proxy.
    fn local_gateway(base: &str, session: Arc<SessionStore>) -> HttpGateway {
        HttpGateway {
            client: Client::builder().no_proxy().build().unwrap(),
            identity_url: Url::parse(base).unwrap(),
            service_url: Url::parse(base).unwrap(),
            api_key: None,
            session,
        }
    }

    /// Read one request, headers and body, so closing the socket does not
    /// reset the connection before the client sees the response.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let mut expected = None;
        loop {
            if let Some(total) = expected
                && buf.len() >= total
            {
                return;
            }
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if expected.is_none()
                && let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n")
            {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                expected = Some(end + 4 + length);
            }
        }
    }

    /// Serve `401 {"message":"jwt expired"}` to every request.
    async fn serve_unauthorized() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let body = r#"{"message":"jwt expired"}"#;
                    let response = format!(
                        "HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_unauthorized_list_signs_out() {
        let base = serve_unauthorized().await;
        let session = signed_in();
        let gw = local_gateway(&base, Arc::clone(&session));

        let err = gw.list_tickets().await.unwrap_err();
        assert!(matches!(err, DeskError::Unauthorized));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_password_change_keeps_session() {
        let base = serve_unauthorized().await;
        let session = signed_in();
        let gw = local_gateway(&base, Arc::clone(&session));

        let payload = PasswordChangePayload {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
        };
        match gw.change_password(&payload).await.unwrap_err() {
            DeskError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "jwt expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_session() {
        let base = serve_unauthorized().await;
        let session = signed_in();
        let gw = local_gateway(&base, Arc::clone(&session));

        let credentials = Credentials {
            email: "sarah@example.com".to_string(),
            password: "wrong".to_string(),
        };
        let err = gw
            .login(&credentials, UserType::Employee)
            .await
            .err()
            .expect("login should be rejected");
        assert!(matches!(err, DeskError::Auth(ref m) if m == "jwt expired"));
        assert!(session.is_authenticated());
    }
}
