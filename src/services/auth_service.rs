//! Authentication service - password login, social sign-in, logout.
//!
//! Password checks always run, against a dummy hash when the email is
//! unknown, so response timing does not reveal which accounts exist.

use async_trait::async_trait;
use std::sync::Arc;

use super::credentials::{AuthenticatedUser, Claims, CredentialIssuer};
use crate::domain::{normalize_email, Password};
use crate::errors::{AppError, AppResult};
use crate::infra::{IdentityProvider, SocialProvider, UnitOfWork};
use crate::with_transaction;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Email and password login. Only verified accounts may sign in.
    async fn login(&self, email: String, password: String) -> AppResult<AuthenticatedUser>;

    /// Exchange a provider access token for a local account and credential.
    async fn social_login(
        &self,
        provider: SocialProvider,
        access_token: String,
    ) -> AppResult<AuthenticatedUser>;

    /// Revoke the caller's credential.
    async fn logout(&self, caller: &Claims) -> AppResult<()>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    credentials: Arc<dyn CredentialIssuer>,
    google: Arc<dyn IdentityProvider>,
    facebook: Arc<dyn IdentityProvider>,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(
        uow: Arc<U>,
        credentials: Arc<dyn CredentialIssuer>,
        google: Arc<dyn IdentityProvider>,
        facebook: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            uow,
            credentials,
            google,
            facebook,
        }
    }

    fn provider(&self, provider: SocialProvider) -> &Arc<dyn IdentityProvider> {
        match provider {
            SocialProvider::Google => &self.google,
            SocialProvider::Facebook => &self.facebook,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn login(&self, email: String, password: String) -> AppResult<AuthenticatedUser> {
        let email = normalize_email(&email);
        let user = self.uow.users().find_by_email(&email).await?;

        let stored = match &user {
            Some(user) => user.password(),
            None => Password::dummy(),
        };
        let password_valid = stored.verify(&password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        if !user.is_active {
            return Err(AppError::AccountNotVerified);
        }

        let credential = self.credentials.issue(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthenticatedUser { user, credential })
    }

    async fn social_login(
        &self,
        provider: SocialProvider,
        access_token: String,
    ) -> AppResult<AuthenticatedUser> {
        let profile = self.provider(provider).fetch_profile(&access_token).await?;
        let email = normalize_email(&profile.email);

        let user = with_transaction!(self.uow, |ctx| {
            let users = ctx.users();
            let mut user = match users.find_by_email_for_update(&email).await? {
                Some(user) => user,
                None => {
                    users
                        .create_if_absent(email, Password::unusable().into_string(), true)
                        .await?
                }
            };

            if !user.is_active {
                // The provider vouches for the address, not for the password
                // whoever registered it chose
                let unusable = Password::unusable().into_string();
                users.update_password(user.id, unusable.clone()).await?;
                users.activate(user.id).await?;
                ctx.verification_codes().delete_by_user(user.id).await?;
                user.password_hash = unusable;
                user.activate();
            }

            Ok(user)
        })?;

        let credential = self.credentials.issue(&user)?;
        tracing::info!(user_id = %user.id, provider = %provider, "Social login");

        Ok(AuthenticatedUser { user, credential })
    }

    async fn logout(&self, caller: &Claims) -> AppResult<()> {
        self.credentials.revoke(caller).await?;
        tracing::info!(user_id = %caller.sub, "User logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::infra::{
        ContactRepository, MockContactRepository, MockIdentityProvider, MockUserRepository,
        MockVerificationCodeRepository, TransactionContext, UserRepository,
        VerificationCodeRepository,
    };
    use crate::services::credentials::{MockCredentialIssuer, TokenResponse};
    use uuid::Uuid;

    /// Read-only unit of work around a mocked user repository.
    struct ReadOnlyUow {
        users: Arc<MockUserRepository>,
    }

    #[async_trait]
    impl UnitOfWork for ReadOnlyUow {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn verification_codes(&self) -> Arc<dyn VerificationCodeRepository> {
            Arc::new(MockVerificationCodeRepository::new())
        }

        fn contacts(&self) -> Arc<dyn ContactRepository> {
            Arc::new(MockContactRepository::new())
        }

        async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                    Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
                > + Send,
            T: Send,
        {
            Err(AppError::internal("no transactions in unit tests"))
        }
    }

    fn stored_user(password: &str, is_active: bool) -> User {
        let mut user = User::new(
            Uuid::new_v4(),
            "ada@example.com".to_string(),
            Password::new(password).unwrap().into_string(),
        );
        user.is_active = is_active;
        user
    }

    fn token() -> TokenResponse {
        TokenResponse {
            access_token: "token".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        }
    }

    fn authenticator(
        users: MockUserRepository,
        credentials: MockCredentialIssuer,
    ) -> Authenticator<ReadOnlyUow> {
        Authenticator::new(
            Arc::new(ReadOnlyUow {
                users: Arc::new(users),
            }),
            Arc::new(credentials),
            Arc::new(MockIdentityProvider::new()),
            Arc::new(MockIdentityProvider::new()),
        )
    }

    #[tokio::test]
    async fn test_login_success_normalizes_email() {
        let user = stored_user("correct-horse", true);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "ada@example.com")
            .returning(move |_| Ok(Some(user.clone())));

        let mut credentials = MockCredentialIssuer::new();
        credentials.expect_issue().times(1).returning(|_| Ok(token()));

        let result = authenticator(users, credentials)
            .login(" Ada@Example.com ".to_string(), "correct-horse".to_string())
            .await
            .unwrap();

        assert_eq!(result.user.email, "ada@example.com");
        assert_eq!(result.credential.access_token, "token");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = stored_user("correct-horse", true);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let mut credentials = MockCredentialIssuer::new();
        credentials.expect_issue().never();

        let result = authenticator(users, credentials)
            .login("ada@example.com".to_string(), "battery-staple".to_string())
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let result = authenticator(users, MockCredentialIssuer::new())
            .login("nobody@example.com".to_string(), "whatever123".to_string())
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_pending_account() {
        let user = stored_user("correct-horse", false);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let result = authenticator(users, MockCredentialIssuer::new())
            .login("ada@example.com".to_string(), "correct-horse".to_string())
            .await;

        assert!(matches!(result, Err(AppError::AccountNotVerified)));
    }

    #[tokio::test]
    async fn test_login_social_only_account() {
        let mut user = stored_user("unused-password", true);
        user.password_hash = Password::unusable().into_string();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let result = authenticator(users, MockCredentialIssuer::new())
            .login("ada@example.com".to_string(), "!".to_string())
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_social_login_rejected_token_touches_nothing() {
        let mut google = MockIdentityProvider::new();
        google
            .expect_fetch_profile()
            .returning(|_| Err(AppError::ProviderRejected));

        let service = Authenticator::new(
            Arc::new(ReadOnlyUow {
                users: Arc::new(MockUserRepository::new()),
            }),
            Arc::new(MockCredentialIssuer::new()),
            Arc::new(google),
            Arc::new(MockIdentityProvider::new()),
        );

        let result = service
            .social_login(SocialProvider::Google, "bad-token".to_string())
            .await;

        assert!(matches!(result, Err(AppError::ProviderRejected)));
    }

    #[tokio::test]
    async fn test_logout_revokes_caller() {
        let caller = Claims {
            sub: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            jti: Uuid::new_v4(),
            exp: 0,
            iat: 0,
        };
        let expected = caller.jti;

        let mut credentials = MockCredentialIssuer::new();
        credentials
            .expect_revoke()
            .withf(move |claims| claims.jti == expected)
            .times(1)
            .returning(|_| Ok(()));

        authenticator(MockUserRepository::new(), credentials)
            .logout(&caller)
            .await
            .unwrap();
    }
}
