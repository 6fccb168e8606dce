//! Login, signup, token verification and logout

use crate::error::{ClientError, ClientResult};
use crate::http::{AuthScope, HttpClient};
use atrium_core::Profile;
use atrium_core::types::{AuthResponse, LoginRequest, SignupRequest};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// `/auth/verify` answers either `{ "user": ... }` or the bare profile
#[derive(Deserialize)]
#[serde(untagged)]
enum VerifyResponse {
    Wrapped { user: Profile },
    Bare(Profile),
}

impl From<VerifyResponse> for Profile {
    fn from(response: VerifyResponse) -> Self {
        match response {
            VerifyResponse::Wrapped { user } | VerifyResponse::Bare(user) => user,
        }
    }
}

/// Authentication endpoints
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: HttpClient,
}

impl AuthClient {
    /// Client sharing `http`'s session store
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Log in and store the resulting session
    ///
    /// A 401 here means bad credentials; an existing session is left alone.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed credentials, the classified
    /// HTTP failure, or a storage error if the session cannot be persisted.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<Profile> {
        request.validate()?;
        let response: AuthResponse = self
            .http
            .send_json(Method::POST, "auth/login", request, AuthScope::LoginFlow)
            .await?;
        self.store(response)
    }

    /// Create an account and store the resulting session
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<Profile> {
        request.validate()?;
        let response: AuthResponse = self
            .http
            .send_json(Method::POST, "auth/signup", request, AuthScope::LoginFlow)
            .await?;
        self.store(response)
    }

    /// Check the stored token with the backend and refresh the cached profile
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthenticated`] without a request when no
    /// session is held, or the classified HTTP failure.
    pub async fn verify(&self) -> ClientResult<Profile> {
        if !self.http.session().is_authenticated() {
            return Err(ClientError::Unauthenticated {
                message: "You are not logged in.".to_string(),
            });
        }
        let response: VerifyResponse = self.http.get("auth/verify", &[]).await?;
        let profile = Profile::from(response);
        self.http.session().update_profile(profile.clone())?;
        Ok(profile)
    }

    /// Forget the session locally
    ///
    /// # Errors
    ///
    /// Returns an error if persisted session data cannot be removed.
    pub fn logout(&self) -> ClientResult<()> {
        self.http.session().logout()
    }

    fn store(&self, response: AuthResponse) -> ClientResult<Profile> {
        if response.token.trim().is_empty() {
            return Err(ClientError::Api {
                status: 200,
                message: "The server did not issue a token.".to_string(),
            });
        }
        let profile = response.user.clone();
        self.http.session().set_session(response.into())?;
        info!(user = %profile.email, "Authenticated");
        Ok(profile)
    }
}
