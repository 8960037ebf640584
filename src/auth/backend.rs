use crate::{
    data::user::User,
    error::{BcryptSnafu, JoinTaskSnafu, RosterError},
    state::RosterState,
};
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;

#[derive(Clone, Debug)]
pub struct RosterAuthBackend {
    state: RosterState,
}

impl RosterAuthBackend {
    pub const fn new(state: RosterState) -> Self {
        Self { state }
    }
}

pub enum RosterAuthCredentials {
    EmailPassword {
        email: String,
        password: SecretString,
    },
}

#[async_trait]
impl AuthnBackend for RosterAuthBackend {
    type User = User;
    type Credentials = RosterAuthCredentials;
    type Error = RosterError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match creds {
            RosterAuthCredentials::EmailPassword { email, password } => {
                let Some(user) = self.state.users().get_by_email(email.trim()).await? else {
                    return Ok(None);
                };

                let hash = user.bcrypt_hashed_password.clone();
                let password_verification_result = tokio::task::spawn_blocking(move || {
                    bcrypt::verify(password.expose_secret(), hash.expose_secret())
                })
                .await
                .context(JoinTaskSnafu)?
                .context(BcryptSnafu)?;

                Ok(if password_verification_result {
                    Some(user)
                } else {
                    None
                })
            }
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        self.state.users().get_by_id(*user_id).await
    }
}
