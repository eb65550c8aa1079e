//! The HTTP client every request goes through.

use crate::{Config, InvalidEndpoint, SessionContext, StorageError};
use reqwest::{
    header::AUTHORIZATION, Client, Method, Request, RequestBuilder, Response,
    StatusCode,
};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use std::sync::Arc;

/// A configured request sender which takes care of authentication.
///
/// Every request picks up the bearer token from the session's credential
/// store, and a `401 Unauthorized` reply evicts the session the rejected
/// token belonged to.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    config: Config,
    session: Arc<SessionContext>,
}

impl ApiClient {
    pub fn new(
        config: Config,
        session: Arc<SessionContext>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ApiClient {
            http: builder.build()?,
            config,
            session,
        })
    }

    pub fn config(&self) -> &Config { &self.config }

    /// The session this client authenticates with.
    pub fn session(&self) -> &Arc<SessionContext> { &self.session }

    /// Start building a request to the endpoint made up of `segments`, with
    /// the current token attached.
    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.config.endpoint(segments)?;
        log::debug!("Sending a {} request to {}", method, url);

        Ok(self.authorize(self.http.request(method, url)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.stored_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and parse the JSON response, evicting the session if
    /// the server no longer accepts our token.
    pub(crate) async fn send<T>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let (http, request) = request.build_split();
        let request = request?;
        let token = bearer_token(&request);
        let response = http.execute(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            log::info!(
                "The server rejected our credentials for {}",
                response.url()
            );
            self.session.evict(token.as_deref());
            return Err(ApiError::Unauthorized);
        }

        parse(response).await
    }

    /// Send a request which trades credentials for a token.
    ///
    /// A `401` here means the credentials were wrong, so it is reported as a
    /// normal rejection and the current session is left alone.
    pub(crate) async fn exchange_credentials<T>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        parse(request.send().await?).await
    }
}

/// The bearer token a request was authorized with, if any.
fn bearer_token(request: &Request) -> Option<String> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(String::from)
}

async fn parse<T>(response: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    log::trace!("Headers: {:#?}", response.headers());

    let body = response.text().await?;
    log::trace!("Response ({}): {}", status, body);

    if status.is_client_error() || status.is_server_error() {
        return Err(ApiError::rejected(status, &body));
    }

    serde_json::from_str(&body).map_err(ApiError::from)
}

/// Errors which may be returned when talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server no longer accepts our token. The session has already been
    /// cleared by the time you see this.
    #[error("The session has expired")]
    Unauthorized,
    /// The server understood the request but refused it, `detail` is its
    /// explanation.
    #[error("The server rejected the request ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    HttpClient(#[from] reqwest::Error),
    #[error("Unable to parse the response")]
    Decode(#[from] serde_json::Error),
    #[error("Unable to build the endpoint URL")]
    BadUrl(#[from] InvalidEndpoint),
    #[error("Unable to update the stored credentials")]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn rejected(status: StatusCode, body: &str) -> ApiError {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.detail)
            .map(Detail::into_message)
            .unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            });

        ApiError::Rejected { status, detail }
    }

    /// The HTTP status behind this error, if the server replied at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::HttpClient(e) => e.status(),
            _ => None,
        }
    }

    /// A short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => {
                String::from("Your session has expired, please log in again.")
            },
            ApiError::Rejected { detail, .. } => detail.clone(),
            ApiError::HttpClient(_) | ApiError::Decode(_) => {
                String::from("Something went wrong, please try again later.")
            },
            ApiError::BadUrl(_) | ApiError::Storage(_) => self.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Detail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    /// Request validation failures come back as a list of issues.
    Issues(Vec<Issue>),
}

impl Detail {
    fn into_message(self) -> String {
        match self {
            Detail::Message(message) => message,
            Detail::Issues(issues) => issues
                .into_iter()
                .map(|issue| issue.msg)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Issue {
    msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Id, MemoryStore, Session, User};

    fn user() -> User {
        User {
            id: "9".into(),
            email: String::from("ravi@pes.edu"),
            name: String::from("Ravi"),
            phone: String::from("1234567890"),
            is_driver: false,
            is_admin: false,
            created_at: None,
        }
    }

    fn client(store: MemoryStore) -> ApiClient {
        ApiClient::new(Config::default(), SessionContext::new(store)).unwrap()
    }

    #[test]
    fn requests_carry_the_stored_token() {
        let store =
            MemoryStore::with_session(&Session::new(user(), "T3")).unwrap();
        let client = client(store);

        let request = client
            .request(Method::GET, &["rides"])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(bearer_token(&request).as_deref(), Some("T3"));
        assert_eq!(request.url().as_str(), "http://127.0.0.1:8000/api/rides");
    }

    #[test]
    fn anonymous_requests_have_no_authorization_header() {
        let client = client(MemoryStore::new());

        let request = client
            .request(Method::POST, &["auth", "login"])
            .unwrap()
            .build()
            .unwrap();

        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(bearer_token(&request), None);
    }

    #[test]
    fn ids_are_escaped_in_request_urls() {
        let client = client(MemoryStore::new());
        let ride = Id::from("../admin/metrics");

        let request = client
            .request(Method::GET, &["rides", ride.as_str()])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/api/rides/..%2Fadmin%2Fmetrics");
    }

    #[test]
    fn dot_dot_ids_are_refused() {
        let client = client(MemoryStore::new());

        let got = client.request(Method::POST, &["rides", "..", "book"]);

        assert!(matches!(got, Err(ApiError::BadUrl(_))));
    }

    #[test]
    fn server_detail_is_surfaced_verbatim() {
        let err = ApiError::rejected(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Not enough seats available"}"#,
        );

        assert_eq!(err.user_message(), "Not enough seats available");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn validation_issues_are_joined() {
        let body = r#"{"detail": [
            {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"},
            {"loc": ["body", "phone"], "msg": "field required", "type": "missing"}
        ]}"#;

        let err = ApiError::rejected(StatusCode::UNPROCESSABLE_ENTITY, body);

        assert_eq!(
            err.user_message(),
            "value is not a valid email address; field required"
        );
    }

    #[test]
    fn fall_back_to_the_status_text() {
        let err = ApiError::rejected(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>",
        );

        assert_eq!(err.user_message(), "Internal Server Error");
    }
}
