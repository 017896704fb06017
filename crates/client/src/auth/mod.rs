//! Authentication service.
//!
//! Validates login and signup forms locally, asks an [`Authenticator`] for a
//! credential, and installs the result in the [`SessionStore`]. A failed
//! attempt leaves the current session untouched.
//!
//! Two authenticators are provided: [`RemoteAuthenticator`] talks to the auth
//! endpoints, [`DemoAuthenticator`] knows the two built-in demo accounts.
//! [`Fallback`] chains them so the demo accounts work while the auth service
//! is down, without ever overriding a rejection from a live service.

mod error;

pub use error::AuthError;

use std::future::Future;

use secrecy::SecretString;
use tracing::{info, warn};
use uuid::Uuid;

use phoneplace_core::{Identity, Role, UserId};

use crate::api::{ApiClient, ApiError, AuthGrant, LoginRequest, SignupRequest};
use crate::session::SessionStore;
use crate::validation::{self, ValidationError};

/// Something that can exchange credentials for a bearer token.
pub trait Authenticator: Send + Sync {
    /// Exchange an email and password for a credential.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthGrant, AuthError>> + Send;

    /// Create an account and sign it in.
    fn signup(
        &self,
        request: &SignupRequest,
    ) -> impl Future<Output = Result<AuthGrant, AuthError>> + Send;
}

// =============================================================================
// Remote
// =============================================================================

/// Authenticates against `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    api: ApiClient,
}

impl RemoteAuthenticator {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl Authenticator for RemoteAuthenticator {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, AuthError> {
        self.api.login(request).await.map_err(|e| match e {
            ApiError::Unauthorized(_) => AuthError::InvalidCredentials,
            other => AuthError::Api(other),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, AuthError> {
        self.api.signup(request).await.map_err(|e| match e {
            ApiError::Client { status: 409, .. } => AuthError::AccountExists,
            other => AuthError::Api(other),
        })
    }
}

// =============================================================================
// Demo
// =============================================================================

struct DemoAccount {
    email: &'static str,
    password: &'static str,
    id: &'static str,
    first_name: &'static str,
    phone: &'static str,
    role: Role,
    token_prefix: &'static str,
}

const DEMO_ACCOUNTS: [DemoAccount; 2] = [
    DemoAccount {
        email: "demo@example.com",
        password: "password123",
        id: "demo-user-1",
        first_name: "Demo",
        phone: "+254 700 000 000",
        role: Role::User,
        token_prefix: "demo-token",
    },
    DemoAccount {
        email: "admin@phoneplace.com",
        password: "admin123",
        id: "admin-user-1",
        first_name: "Admin",
        phone: "+254 700 000 001",
        role: Role::Admin,
        token_prefix: "admin-token",
    },
];

/// Offline authenticator with two fixed accounts:
/// `demo@example.com` / `password123` (user) and
/// `admin@phoneplace.com` / `admin123` (admin).
///
/// Signup creates a fresh user identity for any email that is not one of the
/// demo accounts. Credentials it issues are only meaningful to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoAuthenticator;

impl DemoAuthenticator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn issue(prefix: &str, identity: Identity) -> AuthGrant {
        AuthGrant {
            credential: SecretString::from(format!("{prefix}-{}", Uuid::new_v4())),
            identity,
        }
    }
}

impl Authenticator for DemoAuthenticator {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, AuthError> {
        let account = DEMO_ACCOUNTS
            .iter()
            .find(|a| a.email == request.email.as_str() && a.password == request.password)
            .ok_or(AuthError::InvalidCredentials)?;

        let identity = Identity {
            id: UserId::new(account.id),
            email: request.email.clone(),
            first_name: account.first_name.to_string(),
            last_name: "User".to_string(),
            phone: Some(account.phone.to_string()),
            role: account.role,
        };
        Ok(Self::issue(account.token_prefix, identity))
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, AuthError> {
        if DEMO_ACCOUNTS
            .iter()
            .any(|a| a.email == request.email.as_str())
        {
            return Err(AuthError::AccountExists);
        }

        let identity = Identity {
            id: UserId::new(format!("user-{}", Uuid::new_v4())),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            phone: request.phone.clone(),
            role: Role::User,
        };
        Ok(Self::issue("token", identity))
    }
}

// =============================================================================
// Fallback
// =============================================================================

/// Tries `primary`; consults `fallback` only when `primary` is unavailable
/// (transport failure, 5xx, or no auth routes at all). Rejections from
/// `primary` are final.
#[derive(Debug, Clone)]
pub struct Fallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> Fallback<P, F> {
    pub const fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: Authenticator, F: Authenticator> Authenticator for Fallback<P, F> {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, AuthError> {
        match self.primary.login(request).await {
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "Auth service unavailable, trying fallback");
                self.fallback.login(request).await
            }
            other => other,
        }
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, AuthError> {
        match self.primary.signup(request).await {
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "Auth service unavailable, trying fallback");
                self.fallback.signup(request).await
            }
            other => other,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Raw login form input.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
        let email = validation::email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        Ok(LoginRequest {
            email,
            password: self.password.clone(),
        })
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Raw signup form input.
#[derive(Clone, Default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

impl SignupForm {
    /// # Errors
    ///
    /// Returns the first invalid field, in form order.
    pub fn validate(&self) -> Result<SignupRequest, ValidationError> {
        let first_name = validation::required("First name", &self.first_name)?;
        let last_name = validation::required("Last name", &self.last_name)?;
        let email = validation::email(&self.email)?;
        validation::password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !self.accept_terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(SignupRequest {
            first_name,
            last_name,
            email,
            phone,
            password: self.password.clone(),
        })
    }
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("accept_terms", &self.accept_terms)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Service
// =============================================================================

/// Form validation plus session installation around an [`Authenticator`].
#[derive(Debug, Clone)]
pub struct AuthService<A> {
    authenticator: A,
}

impl<A: Authenticator> AuthService<A> {
    #[must_use]
    pub const fn new(authenticator: A) -> Self {
        Self { authenticator }
    }

    /// Log in and replace the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any request if the form is
    /// invalid, `AuthError::InvalidCredentials` if the pair is rejected, or
    /// the service/storage failure. The session is unchanged on error.
    pub async fn login(
        &self,
        session: &mut SessionStore,
        form: &LoginForm,
    ) -> Result<Identity, AuthError> {
        let request = form.validate()?;
        let grant = self.authenticator.login(&request).await?;
        Self::install(session, grant)
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any request if the form is
    /// invalid, `AuthError::AccountExists` for a taken email, or the
    /// service/storage failure. The session is unchanged on error.
    pub async fn signup(
        &self,
        session: &mut SessionStore,
        form: &SignupForm,
    ) -> Result<Identity, AuthError> {
        let request = form.validate()?;
        let grant = self.authenticator.signup(&request).await?;
        info!(email = %request.email, "Account created");
        Self::install(session, grant)
    }

    fn install(session: &mut SessionStore, grant: AuthGrant) -> Result<Identity, AuthError> {
        let identity = grant.identity.clone();
        session.login(grant.credential, grant.identity)?;
        Ok(identity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::storage::MemoryStore;

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn signup_form() -> SignupForm {
        SignupForm {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: Some("  ".to_string()),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            accept_terms: true,
        }
    }

    fn session() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStore::new()))
    }

    /// Always unavailable, like an unreachable auth service.
    struct Down;

    impl Authenticator for Down {
        async fn login(&self, _: &LoginRequest) -> Result<AuthGrant, AuthError> {
            Err(AuthError::Api(ApiError::Server {
                status: 503,
                message: "down".to_string(),
            }))
        }

        async fn signup(&self, _: &SignupRequest) -> Result<AuthGrant, AuthError> {
            Err(AuthError::Api(ApiError::Server {
                status: 503,
                message: "down".to_string(),
            }))
        }
    }

    /// A live service that rejects every credential.
    struct Rejecting;

    impl Authenticator for Rejecting {
        async fn login(&self, _: &LoginRequest) -> Result<AuthGrant, AuthError> {
            Err(AuthError::InvalidCredentials)
        }

        async fn signup(&self, _: &SignupRequest) -> Result<AuthGrant, AuthError> {
            Err(AuthError::AccountExists)
        }
    }

    #[tokio::test]
    async fn test_demo_accounts() {
        let service = AuthService::new(DemoAuthenticator::new());
        let mut session = session();

        service
            .login(&mut session, &login_form("demo@example.com", "password123"))
            .await
            .unwrap();
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
        assert!(
            session
                .session()
                .unwrap()
                .credential()
                .expose_secret()
                .starts_with("demo-token-")
        );

        service
            .login(&mut session, &login_form("admin@phoneplace.com", "admin123"))
            .await
            .unwrap();
        assert!(session.is_admin());
        assert_eq!(session.identity().unwrap().display_name(), "Admin User");
    }

    #[tokio::test]
    async fn test_wrong_pair_leaves_session_unchanged() {
        let service = AuthService::new(DemoAuthenticator::new());
        let mut session = session();
        service
            .login(&mut session, &login_form("demo@example.com", "password123"))
            .await
            .unwrap();

        for (email, password) in [
            ("demo@example.com", "admin123"),
            ("admin@phoneplace.com", "password123"),
            ("someone@example.com", "password123"),
        ] {
            let err = service
                .login(&mut session, &login_form(email, password))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(session.identity().unwrap().email.as_str(), "demo@example.com");
    }

    #[tokio::test]
    async fn test_fallback_only_when_unavailable() {
        let mut session = session();

        let down = AuthService::new(Fallback::new(Down, DemoAuthenticator::new()));
        down.login(&mut session, &login_form("demo@example.com", "password123"))
            .await
            .unwrap();
        assert!(session.is_authenticated());

        session.logout().unwrap();
        let rejecting = AuthService::new(Fallback::new(Rejecting, DemoAuthenticator::new()));
        let err = rejecting
            .login(&mut session, &login_form("demo@example.com", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_validation_runs_before_authenticator() {
        let service = AuthService::new(Down);
        let mut session = session();
        let err = service
            .login(&mut session, &login_form("not-an-email", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_demo_signup() {
        let service = AuthService::new(DemoAuthenticator::new());
        let mut session = session();

        let identity = service.signup(&mut session, &signup_form()).await.unwrap();
        assert_eq!(identity.role, Role::User);
        assert!(identity.phone.is_none());
        assert!(identity.id.as_str().starts_with("user-"));
        assert!(session.is_authenticated());

        let mut taken = signup_form();
        taken.email = "admin@phoneplace.com".to_string();
        assert!(matches!(
            service.signup(&mut session, &taken).await,
            Err(AuthError::AccountExists)
        ));
    }

    #[test]
    fn test_signup_form_validation_order() {
        let mut form = signup_form();
        form.first_name = " ".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::Required("First name")
        );

        let mut form = signup_form();
        form.password = "12345".to_string();
        form.confirm_password = "12345".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::PasswordTooShort { min: 6 }
        );

        let mut form = signup_form();
        form.confirm_password = "secret2".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordMismatch);

        let mut form = signup_form();
        form.accept_terms = false;
        assert_eq!(form.validate().unwrap_err(), ValidationError::TermsNotAccepted);
    }

    #[test]
    fn test_form_debug_redacts_password() {
        let debug = format!("{:?}", login_form("demo@example.com", "password123"));
        assert!(!debug.contains("password123"));
        let debug = format!("{:?}", signup_form());
        assert!(!debug.contains("secret1"));
    }

    #[test]
    fn test_missing_auth_routes_count_as_unavailable() {
        let not_found = AuthError::Api(ApiError::NotFound("no route".to_string()));
        assert!(not_found.is_unavailable());
        let not_allowed = AuthError::Api(ApiError::Client {
            status: 405,
            message: "method not allowed".to_string(),
        });
        assert!(not_allowed.is_unavailable());

        let bad_request = AuthError::Api(ApiError::Client {
            status: 400,
            message: "bad".to_string(),
        });
        assert!(!bad_request.is_unavailable());
        assert!(!AuthError::Api(ApiError::Unauthorized("nope".to_string())).is_unavailable());
        assert!(!AuthError::InvalidCredentials.is_unavailable());
    }
}
