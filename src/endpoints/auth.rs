use crate::{ApiClient, ApiError, Registration, Session, User};
use reqwest::Method;
use serde_derive::{Deserialize, Serialize};

/// Exchange an email address and password for a new [`Session`].
pub async fn login(
    client: &ApiClient,
    email: &str,
    password: &str,
) -> Result<Session, ApiError> {
    let data = Credentials { email, password };
    log::debug!("Logging in as {}", email);

    let request = client
        .request(Method::POST, &["auth", "login"])?
        .json(&data);
    let response: TokenResponse = client.exchange_credentials(request).await?;

    Ok(response.into_session())
}

/// Create a new account, getting a [`Session`] for it in return.
pub async fn register(
    client: &ApiClient,
    registration: &Registration,
) -> Result<Session, ApiError> {
    log::debug!("Registering {:?}", registration);

    let request = client
        .request(Method::POST, &["auth", "register"])?
        .json(registration);
    let response: TokenResponse = client.exchange_credentials(request).await?;

    Ok(response.into_session())
}

/// Ask the server who the current token belongs to.
pub async fn me(client: &ApiClient) -> Result<User, ApiError> {
    let request = client.request(Method::GET, &["auth", "me"])?;
    client.send(request).await
}

#[derive(Copy, Clone, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        if let Some(kind) = &self.token_type {
            if !kind.eq_ignore_ascii_case("bearer") {
                log::warn!("Expected a bearer token but got \"{}\"", kind);
            }
        }

        Session::new(self.user, self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_happy_login_response() {
        let src = r#"{
            "access_token": "T3",
            "token_type": "bearer",
            "user": {
                "id": "9",
                "email": "ravi@pes.edu",
                "name": "Ravi Kumar",
                "phone": "1234567890",
                "is_driver": false,
                "is_admin": false,
                "created_at": "2024-10-01T09:00:00Z"
            }
        }"#;

        let got: TokenResponse = serde_json::from_str(src).unwrap();
        let session = got.into_session();

        assert_eq!(session.token, "T3");
        assert_eq!(&*session.user.id, "9");
        assert!(!session.user.is_driver);
    }
}
