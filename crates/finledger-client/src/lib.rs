//! HTTP access to the remote transaction store
//!
//! Endpoints:
//! - GET    {base}/transactions?month=M&year=Y
//! - POST   {base}/transactions
//! - PUT    {base}/transactions/{id}
//! - DELETE {base}/transactions/{id}
//! - GET    {base}/salaries/{year}/{month}
//! - POST   {base}/salaries
//! - POST   {base}/auth/token (form login, returns a bearer token)
//! - POST   {base}/auth/register

pub mod error;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use finledger_config::RemoteConfig;
use finledger_core::{
    Period, RemoteError, Salary, SalaryDraft, Transaction, TransactionDraft, TransactionRemote,
};

pub use error::ClientError;

const TRANSACTIONS: &str = "transactions";
const SALARIES: &str = "salaries";

/// Longest server message carried into an error
const MAX_MESSAGE_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Account created by [`HttpRemote::register`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub is_active: bool,
}

/// [`TransactionRemote`] over HTTP with an optional bearer token
#[derive(Debug)]
pub struct HttpRemote {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: config.base_url.clone(),
                message: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: RwLock::new(config.token.clone()),
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn logout(&self) {
        self.set_token(None);
    }

    /// Exchange credentials for a bearer token and keep it for later calls
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let url = self.endpoint(&["auth", "token"]).map_err(ClientError::Login)?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| ClientError::Login(transport(e)))?;
        let response = check(response).await.map_err(ClientError::Login)?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Login(decode(e)))?;

        self.set_token(Some(body.access_token.clone()));
        log::info!("logged in as {}", username);
        Ok(body.access_token)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, ClientError> {
        let url = self.endpoint(&["auth", "register"]).map_err(ClientError::Register)?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| ClientError::Register(transport(e)))?;
        let response = check(response).await.map_err(ClientError::Register)?;
        let account: Account = response
            .json()
            .await
            .map_err(|e| ClientError::Register(decode(e)))?;

        log::info!("registered account {}", account.email);
        Ok(account)
    }

    /// Base URL with `segments` appended to its path
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport {
                message: format!("{} cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn list_url(&self, period: Period) -> Result<Url, RemoteError> {
        let mut url = self.endpoint(&[TRANSACTIONS])?;
        url.query_pairs_mut()
            .append_pair("month", &period.month.to_string())
            .append_pair("year", &period.year.to_string());
        Ok(url)
    }

    fn record_url(&self, id: i64) -> Result<Url, RemoteError> {
        self.endpoint(&[TRANSACTIONS, &id.to_string()])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.authorize(request).send().await.map_err(transport)?;
        let result = check(response).await;
        if matches!(result, Err(RemoteError::Unauthorized)) && self.token().is_some() {
            log::warn!("token rejected by the remote store, logging out");
            self.logout();
        }
        result
    }
}

#[async_trait]
impl TransactionRemote for HttpRemote {
    async fn list(&self, period: Period) -> Result<Vec<Transaction>, RemoteError> {
        let url = self.list_url(period)?;
        log::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        response.json().await.map_err(decode)
    }

    async fn create(&self, draft: &TransactionDraft) -> Result<Transaction, RemoteError> {
        let url = self.endpoint(&[TRANSACTIONS])?;
        log::debug!("POST {}", url);
        let response = self.send(self.client.post(url).json(draft)).await?;
        response.json().await.map_err(decode)
    }

    async fn update(&self, id: i64, draft: &TransactionDraft) -> Result<Transaction, RemoteError> {
        let url = self.record_url(id)?;
        log::debug!("PUT {}", url);
        let response = self.send(self.client.put(url).json(draft)).await?;
        response.json().await.map_err(decode)
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let url = self.record_url(id)?;
        log::debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn salary(&self, period: Period) -> Result<Option<Salary>, RemoteError> {
        let url = self.endpoint(&[SALARIES, &period.year.to_string(), &period.month.to_string()])?;
        log::debug!("GET {}", url);
        match self.send(self.client.get(url)).await {
            Ok(response) => response.json().await.map(Some).map_err(decode),
            Err(RemoteError::Status { status: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn set_salary(&self, draft: &SalaryDraft) -> Result<Salary, RemoteError> {
        let url = self.endpoint(&[SALARIES])?;
        log::debug!("POST {}", url);
        let response = self.send(self.client.post(url).json(draft)).await?;
        response.json().await.map_err(decode)
    }
}

fn transport(error: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        message: error.to_string(),
    }
}

fn decode(error: reqwest::Error) -> RemoteError {
    RemoteError::Decode {
        message: error.to_string(),
    }
}

/// Pass successful responses through, turn the rest into errors
async fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> RemoteError {
    if status == StatusCode::UNAUTHORIZED {
        return RemoteError::Unauthorized;
    }

    let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|value| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
    });

    let message = match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().chars().take(MAX_MESSAGE_LEN).collect(),
        None => status.canonical_reason().unwrap_or("request failed").to_string(),
    };

    RemoteError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_lowercase()
    }

    /// Answer a single request; the handle yields the request as received, lowercased
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (base_url, handle)
    }

    fn with_token(base_url: &str, token: &str) -> HttpRemote {
        let config = RemoteConfig {
            base_url: base_url.to_string(),
            token: Some(token.to_string()),
            ..RemoteConfig::default()
        };
        HttpRemote::new(&config).unwrap()
    }

    fn october() -> Period {
        Period::new(10, 2025).unwrap()
    }

    fn remote(base_url: &str) -> HttpRemote {
        let config = RemoteConfig {
            base_url: base_url.to_string(),
            ..RemoteConfig::default()
        };
        HttpRemote::new(&config).unwrap()
    }

    #[test]
    fn test_list_url() {
        let remote = remote("http://localhost:8001");
        let url = remote.list_url(Period::new(3, 2025).unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/transactions?month=3&year=2025");
    }

    #[test]
    fn test_urls_keep_base_path() {
        let remote = remote("https://example.com/api/");
        assert_eq!(
            remote.record_url(42).unwrap().as_str(),
            "https://example.com/api/transactions/42"
        );
        assert_eq!(
            remote.endpoint(&["auth", "token"]).unwrap().as_str(),
            "https://example.com/api/auth/token"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = RemoteConfig {
            base_url: "not a url".to_string(),
            ..RemoteConfig::default()
        };
        assert!(matches!(HttpRemote::new(&config), Err(ClientError::InvalidUrl { .. })));

        let config = RemoteConfig {
            base_url: "mailto:me@example.com".to_string(),
            ..RemoteConfig::default()
        };
        assert!(matches!(HttpRemote::new(&config), Err(ClientError::InvalidUrl { .. })));
    }

    #[test]
    fn test_token_handling() {
        let config = RemoteConfig {
            token: Some("abc".to_string()),
            ..RemoteConfig::default()
        };
        let remote = HttpRemote::new(&config).unwrap();
        assert_eq!(remote.token().as_deref(), Some("abc"));
        remote.set_token(Some("def".to_string()));
        assert_eq!(remote.token().as_deref(), Some("def"));
        remote.logout();
        assert_eq!(remote.token(), None);
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(status_error(StatusCode::UNAUTHORIZED, ""), RemoteError::Unauthorized);
    }

    #[test]
    fn test_status_message_from_json_detail() {
        let error = status_error(StatusCode::BAD_REQUEST, r#"{"detail": "Amount must be positive"}"#);
        assert_eq!(
            error,
            RemoteError::Status { status: 400, message: "Amount must be positive".to_string() }
        );
    }

    #[test]
    fn test_status_message_fallbacks() {
        let error = status_error(StatusCode::BAD_GATEWAY, "upstream gone\n");
        assert_eq!(error, RemoteError::Status { status: 502, message: "upstream gone".to_string() });

        let error = status_error(StatusCode::NOT_FOUND, "");
        assert_eq!(error, RemoteError::Status { status: 404, message: "Not Found".to_string() });

        let long = "x".repeat(500);
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, &long) {
            RemoteError::Status { message, .. } => assert_eq!(message.len(), MAX_MESSAGE_LEN),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_sends_period_and_token() {
        let body = r#"[{"id": 1, "kind": "expense", "amount": 12.5, "description": "Lunch", "date": "2025-10-03T12:00:00"}]"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let remote = with_token(&base_url, "abc");

        let rows = remote.list(october()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Lunch");

        let request = server.await.unwrap();
        assert!(request.starts_with("get /transactions?month=10&year=2025 http/1.1"));
        assert!(request.contains("authorization: bearer abc"));
    }

    #[tokio::test]
    async fn test_rejected_token_is_dropped() {
        let (base_url, server) = serve_once("401 Unauthorized", r#"{"detail": "Could not validate credentials"}"#).await;
        let remote = with_token(&base_url, "expired");

        assert_eq!(remote.delete(3).await, Err(RemoteError::Unauthorized));
        assert_eq!(remote.token(), None);
        assert!(server.await.unwrap().starts_with("delete /transactions/3 "));
    }

    #[tokio::test]
    async fn test_missing_salary_is_none() {
        let (base_url, server) = serve_once("404 Not Found", r#"{"detail": "no salary"}"#).await;
        let remote = with_token(&base_url, "abc");

        assert_eq!(remote.salary(october()).await, Ok(None));
        assert_eq!(remote.token().as_deref(), Some("abc"));
        assert!(server.await.unwrap().starts_with("get /salaries/2025/10 "));
    }

    #[tokio::test]
    async fn test_set_salary_posts_draft() {
        let (base_url, server) = serve_once("200 OK", r#"{"id": 9, "amount": 1500.0, "month": 10, "year": 2025}"#).await;
        let remote = with_token(&base_url, "abc");

        let draft = SalaryDraft::new(october(), finledger_core::Decimal::new(1500, 0));
        let salary = remote.set_salary(&draft).await.unwrap();
        assert_eq!(salary.id, 9);
        assert!(salary.is_for(october()));

        let request = server.await.unwrap();
        assert!(request.starts_with("post /salaries "));
        assert!(request.contains(r#""month":10"#));
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let (base_url, server) = serve_once("200 OK", r#"{"access_token": "fresh", "token_type": "bearer"}"#).await;
        let remote = remote(&base_url);

        assert_eq!(remote.login("ana", "secret").await.unwrap(), "fresh");
        assert_eq!(remote.token().as_deref(), Some("fresh"));

        let request = server.await.unwrap();
        assert!(request.starts_with("post /auth/token "));
        assert!(request.contains("username=ana&password=secret"));
    }

    #[tokio::test]
    async fn test_register() {
        let (base_url, server) = serve_once("200 OK", r#"{"id": 4, "email": "ana@example.com", "is_active": true}"#).await;
        let remote = remote(&base_url);

        let account = remote.register("ana@example.com", "secret").await.unwrap();
        assert_eq!(account, Account { id: 4, email: "ana@example.com".to_string(), is_active: true });
        assert_eq!(remote.token(), None);

        let request = server.await.unwrap();
        assert!(request.starts_with("post /auth/register "));
        assert!(request.contains(r#""email":"ana@example.com""#));
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let (base_url, server) = serve_once("400 Bad Request", r#"{"detail": "Email already registered"}"#).await;
        let remote = remote(&base_url);

        match remote.register("ana@example.com", "secret").await {
            Err(ClientError::Register(RemoteError::Status { status, message })) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let remote = with_token(&base_url, "abc");
        assert!(matches!(remote.list(october()).await, Err(RemoteError::Transport { .. })));
        assert_eq!(remote.token().as_deref(), Some("abc"));
    }
}
