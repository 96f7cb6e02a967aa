use crate::error::CinkbertError;
use crate::providers::policy::{read_json, upstream_error};
use cinkbert_schema::{PasswordGrantRequest, SupabaseErrorBody, SupabaseSession, SupabaseUser};
use reqwest::StatusCode;
use tracing::{debug, info};

use super::{SUPABASE_PROVIDER, SupabaseClient};

impl SupabaseClient {
    /// Resolves an access token to its user. Rejected tokens yield `Ok(None)`.
    pub async fn get_user(&self, access_token: &str) -> Result<Option<SupabaseUser>, CinkbertError> {
        let resp = self
            .client
            .get(self.api_url("auth/v1/user")?)
            .header("apikey", &self.cfg.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if matches!(
            resp.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!(status = %resp.status(), "[Supabase] access token rejected");
            return Ok(None);
        }
        read_json(SUPABASE_PROVIDER, resp).await.map(Some)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SupabaseSession, CinkbertError> {
        let mut url = self.api_url("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let resp = self
            .client
            .post(url)
            .header("apikey", &self.cfg.anon_key)
            .json(&PasswordGrantRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if matches!(
            resp.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            let status = resp.status();
            let reason = resp
                .json::<SupabaseErrorBody>()
                .await
                .ok()
                .and_then(|body| body.best_message().map(str::to_string));
            info!(%status, reason = ?reason, "[Supabase] password sign-in refused");
            return Err(CinkbertError::InvalidCredentials);
        }

        let session: SupabaseSession = read_json(SUPABASE_PROVIDER, resp).await?;
        info!(user_id = %session.user.id, "[Supabase] password sign-in succeeded");
        Ok(session)
    }

    /// Revokes the session behind `access_token`. Already-invalid tokens are not an error.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), CinkbertError> {
        let resp = self
            .client
            .post(self.api_url("auth/v1/logout")?)
            .header("apikey", &self.cfg.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => {
                debug!("[Supabase] session revoked");
                Ok(())
            }
            _ => Err(upstream_error(SUPABASE_PROVIDER, resp).await),
        }
    }
}
