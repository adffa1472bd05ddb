use academy_core::envelope;
use academy_core::types::{AuthSession, LoginRequest, RegisterRequest, User};
use academy_core::StorageKey;
use reqwest::Method;
use serde_json::json;

use crate::client::RequestOptions;
use crate::{ApiClient, ApiError, Result};

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const REGISTER_ENDPOINT: &str = "/auth/register";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";
pub const REFRESH_ENDPOINT: &str = "/auth/refresh";
pub const PASSWORD_RESET_ENDPOINT: &str = "/auth/password-reset";
pub const PASSWORD_RESET_CONFIRM_ENDPOINT: &str = "/auth/password-reset/confirm";

impl ApiClient {
    /// Exchange credentials for a session and persist it.
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthSession> {
        let session = self
            .unauthenticated_post(LOGIN_ENDPOINT, serde_json::to_value(req)?)
            .await?;
        self.store_session(&session)?;
        tracing::info!(email = %req.email, "signed in");
        Ok(session)
    }

    /// Create an account; the backend signs the new user in immediately.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthSession> {
        let session = self
            .unauthenticated_post(REGISTER_ENDPOINT, serde_json::to_value(req)?)
            .await?;
        self.store_session(&session)?;
        tracing::info!(email = %req.email, "registered");
        Ok(session)
    }

    /// End the session.
    ///
    /// The server is told about the refresh credential when one is held, but
    /// local state is cleared regardless of whether that call succeeds.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh) = self.inner.storage.refresh_token() {
            if let Err(e) = self
                .post(LOGOUT_ENDPOINT, &json!({ "refresh_token": refresh }))
                .await
            {
                tracing::warn!(error = %e, "server logout failed; clearing local session anyway");
            }
        }
        self.clear_session()?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Trade the stored refresh credential for a new access credential.
    pub async fn refresh_session(&self) -> Result<String> {
        let refresh = self
            .inner
            .storage
            .refresh_token()
            .ok_or(ApiError::NotSignedIn)?;
        let session = self
            .unauthenticated_post(REFRESH_ENDPOINT, json!({ "refresh_token": refresh }))
            .await?;
        self.inner.storage.set_token(&session.access_token)?;
        if let Some(rotated) = &session.refresh_token {
            self.inner.storage.set_refresh_token(rotated)?;
        }
        tracing::debug!("access credential refreshed");
        Ok(session.access_token)
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.request(
            PASSWORD_RESET_ENDPOINT,
            RequestOptions::with_method(Method::POST, Some(json!({ "email": email }))).skip_auth(),
        )
        .await?;
        Ok(())
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        let body = json!({ "token": token, "new_password": new_password });
        self.request(
            PASSWORD_RESET_CONFIRM_ENDPOINT,
            RequestOptions::with_method(Method::POST, Some(body)).skip_auth(),
        )
        .await?;
        Ok(())
    }

    /// The user stored by the last login or profile read, if any.
    pub fn current_user(&self) -> Result<Option<User>> {
        Ok(self.inner.storage.load_json(StorageKey::User)?)
    }

    async fn unauthenticated_post(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession> {
        let value = self
            .request(
                endpoint,
                RequestOptions::with_method(Method::POST, Some(body)).skip_auth(),
            )
            .await?;
        Ok(envelope::entity(value, "session")?)
    }

    fn store_session(&self, session: &AuthSession) -> Result<()> {
        let storage = &self.inner.storage;
        self.invalidate_profile()?;
        storage.set_token(&session.access_token)?;
        match &session.refresh_token {
            Some(refresh) => storage.set_refresh_token(refresh)?,
            None => storage.remove(StorageKey::RefreshToken)?,
        }
        match &session.user {
            Some(user) => storage.save_json(StorageKey::User, user)?,
            None => storage.remove(StorageKey::User)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, FakeTransport, Reply};
    use serde_json::json;

    fn login_req() -> LoginRequest {
        LoginRequest {
            email: "sam@academy.test".into(),
            password: "pw".into(),
        }
    }

    #[tokio::test]
    async fn login_persists_session() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/auth/login",
            vec![Reply::ok(json!({
                "access_token": "acc-1",
                "refresh_token": "ref-1",
                "user": {"id": 7, "email": "sam@academy.test"}
            }))],
        );
        let (client, _dir) = client(&fake);

        let session = client.login(&login_req()).await.unwrap();
        assert_eq!(session.access_token, "acc-1");
        assert_eq!(client.storage().token(), Some("acc-1".into()));
        assert_eq!(client.storage().refresh_token(), Some("ref-1".into()));
        assert_eq!(client.current_user().unwrap().unwrap().id, 7);
    }

    #[tokio::test]
    async fn login_never_sends_stale_credential() {
        let fake = FakeTransport::new();
        fake.script("/api/auth/login", vec![Reply::ok(json!({"token": "acc-2"}))]);
        let (client, _dir) = client(&fake);
        client.storage().set_token("old").unwrap();
        client.storage().set_refresh_token("old-refresh").unwrap();

        client.login(&login_req()).await.unwrap();
        let req = fake.last_request().unwrap();
        assert_eq!(req.header("authorization"), None);
        assert_eq!(client.storage().token(), Some("acc-2".into()));
        assert_eq!(client.storage().refresh_token(), None);
    }

    #[tokio::test]
    async fn failed_login_keeps_previous_state() {
        let fake = FakeTransport::new();
        fake.script("/api/auth/login", vec![Reply::status(400, "bad credentials")]);
        let (client, _dir) = client(&fake);
        client.storage().set_token("keep").unwrap();

        let err = client.login(&login_req()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
        assert_eq!(client.storage().token(), Some("keep".into()));
    }

    #[tokio::test]
    async fn register_wraps_data_envelope() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/auth/register",
            vec![Reply::ok(json!({"data": {"access_token": "new-acc"}}))],
        );
        let (client, _dir) = client(&fake);
        let req = RegisterRequest {
            full_name: "Sam".into(),
            email: "sam@academy.test".into(),
            password: "pw".into(),
            cohort_id: Some(2),
        };

        client.register(&req).await.unwrap();
        assert_eq!(client.storage().token(), Some("new-acc".into()));
    }

    #[tokio::test]
    async fn logout_sends_refresh_credential_and_clears() {
        let fake = FakeTransport::new();
        fake.script("/api/auth/logout", vec![Reply::status(204, "")]);
        let (client, _dir) = client(&fake);
        client.storage().set_token("acc").unwrap();
        client.storage().set_refresh_token("ref").unwrap();

        client.logout().await.unwrap();
        let req = fake.last_request().unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"refresh_token":"ref"}"#));
        assert!(!client.is_signed_in());
        assert_eq!(client.storage().refresh_token(), None);
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let fake = FakeTransport::new();
        fake.script("/api/auth/logout", vec![Reply::status(500, "down")]);
        let (client, _dir) = client(&fake);
        client.storage().set_token("acc").unwrap();
        client.storage().set_refresh_token("ref").unwrap();

        client.logout().await.unwrap();
        assert!(!client.is_signed_in());
    }

    #[tokio::test]
    async fn logout_without_refresh_credential_skips_network() {
        let fake = FakeTransport::new();
        let (client, _dir) = client(&fake);
        client.storage().set_token("acc").unwrap();

        client.logout().await.unwrap();
        assert_eq!(fake.total_calls(), 0);
        assert!(!client.is_signed_in());
    }

    #[tokio::test]
    async fn refresh_rotates_credentials() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/auth/refresh",
            vec![Reply::ok(json!({"access": "acc-3", "refresh": "ref-3"}))],
        );
        let (client, _dir) = client(&fake);
        client.storage().set_refresh_token("ref-2").unwrap();

        assert_eq!(client.refresh_session().await.unwrap(), "acc-3");
        assert_eq!(client.storage().token(), Some("acc-3".into()));
        assert_eq!(client.storage().refresh_token(), Some("ref-3".into()));
    }

    #[tokio::test]
    async fn refresh_without_credential_is_not_signed_in() {
        let fake = FakeTransport::new();
        let (client, _dir) = client(&fake);
        let err = client.refresh_session().await.unwrap_err();
        assert!(matches!(err, ApiError::NotSignedIn));
    }

    #[tokio::test]
    async fn password_reset_flows_are_unauthenticated() {
        let fake = FakeTransport::new();
        fake.script("/api/auth/password-reset", vec![Reply::ok(json!({}))]);
        fake.script("/api/auth/password-reset/confirm", vec![Reply::ok(json!({}))]);
        let (client, _dir) = client(&fake);
        client.storage().set_token("acc").unwrap();

        client.request_password_reset("sam@academy.test").await.unwrap();
        assert_eq!(fake.last_request().unwrap().header("authorization"), None);
        client.confirm_password_reset("t0k", "new-pw").await.unwrap();
        assert_eq!(fake.calls("/api/auth/password-reset/confirm"), 1);
    }
}
