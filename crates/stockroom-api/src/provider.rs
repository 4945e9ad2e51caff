//! [`HttpIdentityProvider`]: a REST client for a GoTrue-style identity
//! service.
//!
//! Only the current access token is kept, and only in memory. Every call that
//! changes who is signed in is followed by an [`AuthEvent`] on the broadcast
//! channel handed out by [`IdentityProvider::subscribe`].

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use stockroom_core::{
  provider::{Credential, IdentityProvider, ProviderError},
  session::AuthEvent,
  subject::SubjectId,
};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct ProviderSession {
  access_token: String,
  subject_id:   SubjectId,
}

#[derive(Debug, Deserialize)]
struct UserBody {
  id: String,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
  access_token: String,
  user:         UserBody,
}

/// `/signup` answers with a full session when no confirmation step is
/// configured, or with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
  Session(TokenBody),
  PendingConfirmation(UserBody),
}

pub struct HttpIdentityProvider {
  client:   Client,
  base_url: String,
  api_key:  String,
  session:  Mutex<Option<ProviderSession>>,
  events:   broadcast::Sender<AuthEvent>,
}

impl HttpIdentityProvider {
  pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| ProviderError::new(format!("failed to build HTTP client: {e}")))?;
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      api_key: api_key.into(),
      session: Mutex::new(None),
      events,
    })
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, format!("{}{path}", self.base_url))
      .header("apikey", &self.api_key)
  }

  fn access_token(&self) -> Option<String> {
    self.session.lock().as_ref().map(|s| s.access_token.clone())
  }

  fn emit(&self, event: AuthEvent) {
    if self.events.send(event).is_err() {
      debug!("no session listeners for auth event");
    }
  }

  fn establish(&self, token: TokenBody) {
    let subject_id = SubjectId::new(token.user.id);
    *self.session.lock() =
      Some(ProviderSession { access_token: token.access_token, subject_id: subject_id.clone() });
    self.emit(AuthEvent::signed_in(subject_id));
  }

  fn clear(&self) -> bool { self.session.lock().take().is_some() }
}

/// Send `request` and reject non-success statuses.
async fn send(request: RequestBuilder) -> Result<Response, ProviderError> {
  ensure_success(dispatch(request).await?).await
}

async fn dispatch(request: RequestBuilder) -> Result<Response, ProviderError> {
  request
    .send()
    .await
    .map_err(|e| ProviderError::new(format!("identity provider unreachable: {e}")))
}

/// Turn a non-success status into a [`ProviderError`] carrying a readable
/// message.
async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  Err(ProviderError::new(error_message(status, &body)))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
  response
    .json()
    .await
    .map_err(|e| ProviderError::new(format!("unexpected identity provider response: {e}")))
}

/// Pick the human-readable part of a provider error body.
pub fn error_message(status: StatusCode, body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| {
      ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_owned))
    })
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| status.to_string())
}

impl IdentityProvider for HttpIdentityProvider {
  async fn current_session(&self) -> Result<Option<SubjectId>, ProviderError> {
    let Some(token) = self.access_token() else { return Ok(None) };

    let response = dispatch(self.request(Method::GET, "/user").bearer_auth(token)).await?;
    if response.status() == StatusCode::UNAUTHORIZED {
      debug!("access token rejected; dropping it");
      self.clear();
      return Ok(None);
    }

    let user: UserBody = decode(ensure_success(response).await?).await?;
    Ok(Some(SubjectId::new(user.id)))
  }

  fn subscribe(&self) -> broadcast::Receiver<AuthEvent> { self.events.subscribe() }

  async fn sign_in(&self, credential: &Credential) -> Result<(), ProviderError> {
    let response = send(
      self
        .request(Method::POST, "/token")
        .query(&[("grant_type", "password")])
        .json(credential),
    )
    .await?;
    let token: TokenBody = decode(response).await?;
    self.establish(token);
    Ok(())
  }

  async fn sign_up(&self, credential: &Credential) -> Result<(), ProviderError> {
    let response = send(self.request(Method::POST, "/signup").json(credential)).await?;
    match decode::<SignUpBody>(response).await? {
      SignUpBody::Session(token) => self.establish(token),
      SignUpBody::PendingConfirmation(user) => {
        debug!(user = %user.id, "sign-up awaiting confirmation");
      }
    }
    Ok(())
  }

  async fn sign_out(&self) -> Result<(), ProviderError> {
    let result = match self.access_token() {
      Some(token) => send(self.request(Method::POST, "/logout").bearer_auth(token)).await.map(drop),
      None => Ok(()),
    };
    if self.clear() {
      self.emit(AuthEvent::signed_out());
    }
    result
  }

  async fn reset_password(&self, identifier: &str) -> Result<(), ProviderError> {
    send(self.request(Method::POST, "/recover").json(&json!({ "email": identifier }))).await?;
    Ok(())
  }
}
