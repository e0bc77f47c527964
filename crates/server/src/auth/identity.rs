//! Identity provider over the `accounts` table.

use async_trait::async_trait;
use recorder::{GatewayError, Identity, IdentityGateway, IdentitySubscription};
use regex::Regex;
use sqlx::PgPool;
use tokio::sync::watch;

use crate::auth::password;
use crate::db::accounts;
use crate::error::AppError;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const MIN_PASSWORD_LEN: usize = 8;

/// One client session with the provider. Accounts are shared through the
/// pool; the signed-in identity is per instance.
pub struct PgIdentity {
    pool: PgPool,
    session: watch::Sender<Option<Identity>>,
}

impl PgIdentity {
    /// A signed-out session.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            session: watch::Sender::new(None),
        }
    }

    /// A session already signed in, e.g. from a verified bearer token.
    pub fn signed_in(pool: PgPool, identity: Identity) -> Self {
        Self {
            pool,
            session: watch::Sender::new(Some(identity)),
        }
    }
}

fn unavailable(e: AppError) -> GatewayError {
    tracing::error!("Identity store error: {e}");
    GatewayError::Unavailable(e.to_string())
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), GatewayError> {
    let email_re = Regex::new(EMAIL_PATTERN)
        .map_err(|e| GatewayError::Unavailable(format!("email pattern: {e}")))?;
    if !email_re.is_match(email) {
        return Err(GatewayError::Rejected("Invalid email address".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(GatewayError::Rejected(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl IdentityGateway for PgIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, GatewayError> {
        let email = email.trim();
        validate_credentials(email, password)?;

        if accounts::email_exists(&self.pool, email)
            .await
            .map_err(unavailable)?
        {
            return Err(GatewayError::AccountExists);
        }

        let hash = password::hash_password(password)
            .map_err(|e| GatewayError::Unavailable(format!("Password hash error: {e}")))?;
        let account_id = accounts::create_account(&self.pool, email, &hash)
            .await
            .map_err(unavailable)?;

        let identity = Identity {
            account_id,
            email: email.to_string(),
        };
        tracing::info!(account_id, "Account created");
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, GatewayError> {
        let account = accounts::get_account_by_email(&self.pool, email.trim())
            .await
            .map_err(unavailable)?
            .ok_or(GatewayError::InvalidCredentials)?;

        let valid = password::verify_password(password, &account.password_hash)
            .map_err(|e| GatewayError::Unavailable(format!("Password verify error: {e}")))?;
        if !valid {
            return Err(GatewayError::InvalidCredentials);
        }

        let identity = Identity {
            account_id: account.id,
            email: account.email,
        };
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        self.session.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> IdentitySubscription {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("player@example.com", "longenough").is_ok());
        assert_eq!(
            validate_credentials("not-an-email", "longenough"),
            Err(GatewayError::Rejected("Invalid email address".into()))
        );
        assert!(matches!(
            validate_credentials("player@example.com", "short"),
            Err(GatewayError::Rejected(_))
        ));
    }
}
