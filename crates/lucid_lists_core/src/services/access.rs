//! crates/lucid_lists_core/src/services/access.rs
//!
//! Authentication (credential check, token issue and verification) and
//! project-membership authorization.
//!
//! A request moves `Unauthenticated -> Authenticated -> Authorized | Forbidden`.
//! [`AccessControl::authenticate`] performs the first step and
//! [`AccessControl::authorize`] the second. Every nested resource is first resolved to
//! its root project, so membership is checked the same way for a list, a task, a note,
//! a folder or a conversation as for the project itself.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{InternalId, NewUser, ResourceRef, Session};
use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, UserView};
use crate::ports::{DatabaseService, PasswordService, PortError, PortResult, TokenService};
use crate::validation::{require_length, validate_email};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AccessControl {
    db: Arc<dyn DatabaseService>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AccessControl {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self { db, passwords, tokens }
    }

    /// Creates an account and signs the caller in. Duplicate emails are `Conflict`.
    pub async fn register(&self, req: RegisterRequest) -> PortResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();
        require_length("name", &req.name, 2, 100)?;
        validate_email(&email)?;
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = self.passwords.hash_password(&req.password)?;
        let user = self
            .db
            .create_user(NewUser {
                email,
                password_hash,
                name: req.name,
            })
            .await?;
        info!(user_uid = %user.user_uid, "registered new user");

        let token = self.tokens.issue_token(&Session::from(&user))?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> PortResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();
        let user = match self.db.get_user_by_email(&email).await {
            Ok(user) => user,
            Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized),
            Err(e) => return Err(e),
        };
        if !self.passwords.verify_password(&req.password, &user.password_hash)? {
            warn!(user_uid = %user.user_uid, "login rejected: wrong password");
            return Err(PortError::Unauthorized);
        }

        let token = self.tokens.issue_token(&Session::from(&user))?;
        info!(user_uid = %user.user_uid, "user logged in");
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Verifies a bearer token's signature and expiry.
    pub fn authenticate(&self, token: &str) -> PortResult<Session> {
        self.tokens
            .verify_token(token)
            .map_err(|_| PortError::Unauthorized)
    }

    pub async fn current_user(&self, session: &Session) -> PortResult<UserView> {
        match self.db.get_user_by_id(session.user_id).await {
            Ok(user) => Ok(user.into()),
            Err(PortError::NotFound(_)) => Err(PortError::Unauthorized),
            Err(e) => Err(e),
        }
    }

    /// Resolves `resource` to its root project and requires the session's user to be a
    /// member of it. Returns the project's internal id.
    ///
    /// A resource that does not exist is `NotFound`; one that exists in a project the
    /// user is not a member of is `Forbidden`. Roles are not differentiated.
    pub async fn authorize(
        &self,
        session: &Session,
        resource: ResourceRef,
    ) -> PortResult<InternalId> {
        let project_id = self.db.resolve_project_id(resource).await?;
        if !self.db.is_member(project_id, session.user_id).await? {
            warn!(
                user_uid = %session.user_uid,
                resource = resource.kind(),
                uid = %resource.uid(),
                "access denied: not a project member"
            );
            return Err(PortError::Forbidden);
        }
        Ok(project_id)
    }
}
