//! Account, session and profile use-cases.
//!
//! Passwords are stored and compared in plaintext. This mirrors the demo
//! scope and must be replaced by real hashing before any real use.
//!
//! # Invariants
//! - Emails are unique across accounts (case-insensitive).
//! - The first registered account is an admin; later ones are members.
//! - Public reads never expose passwords.
//! - The session pointer is refreshed when its account changes.

use crate::model::user::{AuthUser, User, UserProfile, UserRole, MIN_PASSWORD_LEN};
use crate::model::{new_record_id, now_epoch_ms, require_text, ModelValidationError};
use crate::repo::keys::{profile_key, CURRENT_USER};
use crate::repo::{load_value, remove_value, save_value, RepoError, SeedMode, USERS};
use crate::store::{KvAccess, KvStore, StoreError};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Errors from account use-cases.
#[derive(Debug)]
pub enum AuthError {
    Validation(ModelValidationError),
    InvalidEmail(String),
    PasswordTooShort,
    EmailTaken,
    InvalidCredentials,
    UserNotFound(String),
    IncorrectPassword,
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidEmail(email) => write!(f, "invalid email address: `{email}`"),
            Self::PasswordTooShort => write!(
                f,
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ),
            Self::EmailTaken => write!(f, "Email already registered"),
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::IncorrectPassword => write!(f, "Current password is incorrect"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        Self::Repo(RepoError::Store(value))
    }
}

impl From<ModelValidationError> for AuthError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Partial update of account fields.
///
/// Blank names are rejected; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Account/session service facade.
pub struct AuthService<S: KvStore> {
    store: S,
}

impl<S: KvStore> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new account and starts a session for it.
    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let user = self.store.transaction(|access| {
            let user = register_in(access, email, password, name, now_epoch_ms())?;
            save_value(access, CURRENT_USER, &user)?;
            Ok::<_, AuthError>(user)
        })?;
        info!("event=auth_register module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Starts a session when email and password match an account.
    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.store.transaction(|access| {
            let users = USERS.load(access, SeedMode::Empty, now_epoch_ms())?;
            let account = users
                .iter()
                .find(|account| account.email_matches(email) && account.password_matches(password))
                .ok_or(AuthError::InvalidCredentials)?;
            save_value(access, CURRENT_USER, &account.user)?;
            Ok::<_, AuthError>(account.user.clone())
        });

        match user {
            Ok(user) => {
                info!("event=auth_login module=service status=ok user_id={}", user.id);
                Ok(user)
            }
            Err(err) => {
                warn!("event=auth_login module=service status=rejected error={err}");
                Err(err)
            }
        }
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        remove_value(&self.store, CURRENT_USER)?;
        info!("event=auth_logout module=service status=ok");
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(load_value(&self.store, CURRENT_USER)?)
    }

    pub fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.current_user()?.is_some())
    }

    /// Lists all accounts without credentials.
    pub fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let users = USERS.load(&self.store, SeedMode::Empty, now_epoch_ms())?;
        Ok(users.into_iter().map(|account| account.user).collect())
    }

    /// Updates name and/or email of one account.
    pub fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<User, AuthError> {
        self.mutate_account(user_id, |users, index| {
            if let Some(name) = update.name.as_deref() {
                users[index].user.name = require_text("name", name)?;
            }
            if let Some(email) = update.email.as_deref() {
                let email = normalize_email(email)?;
                let taken = users
                    .iter()
                    .enumerate()
                    .any(|(other, account)| other != index && account.email_matches(&email));
                if taken {
                    return Err(AuthError::EmailTaken);
                }
                users[index].user.email = email;
            }
            Ok(())
        })
    }

    /// Replaces the password after checking the current one.
    pub fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.mutate_account(user_id, |users, index| {
            if !users[index].password_matches(current_password) {
                return Err(AuthError::IncorrectPassword);
            }
            users[index].password = validate_password(new_password)?;
            Ok(())
        })?;
        info!("event=auth_change_password module=service status=ok user_id={user_id}");
        Ok(())
    }

    /// Sets the role of one account.
    pub fn update_user_role(&self, user_id: &str, role: UserRole) -> Result<User, AuthError> {
        let user = self.mutate_account(user_id, |users, index| {
            users[index].user.role = Some(role);
            Ok(())
        })?;
        info!(
            "event=auth_update_role module=service status=ok user_id={user_id} role={role:?}"
        );
        Ok(user)
    }

    /// Returns the profile extension, empty when none was saved.
    pub fn get_profile(&self, user_id: &str) -> Result<UserProfile, AuthError> {
        Ok(load_value(&self.store, &profile_key(user_id))?.unwrap_or_default())
    }

    pub fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), AuthError> {
        save_value(&self.store, &profile_key(user_id), profile)?;
        Ok(())
    }

    fn mutate_account(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut Vec<AuthUser>, usize) -> Result<(), AuthError>,
    ) -> Result<User, AuthError> {
        self.store.transaction(|access: &dyn KvAccess| {
            let mut users = USERS.load(access, SeedMode::Empty, now_epoch_ms())?;
            let index = users
                .iter()
                .position(|account| account.user.id == user_id)
                .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
            apply(&mut users, index)?;
            USERS.save(access, &users)?;

            let updated = users[index].user.clone();
            let session: Option<User> = load_value(access, CURRENT_USER)?;
            if session.is_some_and(|session| session.id == updated.id) {
                save_value(access, CURRENT_USER, &updated)?;
            }
            Ok(updated)
        })
    }
}

/// Creates an account inside an open store scope. Does not touch the session.
pub(crate) fn register_in(
    access: &dyn KvAccess,
    email: &str,
    password: &str,
    name: &str,
    now_ms: i64,
) -> Result<User, AuthError> {
    let email = normalize_email(email)?;
    let password = validate_password(password)?;
    let name = require_text("name", name)?;

    let mut users = USERS.load(access, SeedMode::Empty, now_ms)?;
    if users.iter().any(|account| account.email_matches(&email)) {
        warn!("event=auth_register module=service status=rejected error_code=email_taken");
        return Err(AuthError::EmailTaken);
    }

    let role = if users.is_empty() {
        UserRole::Admin
    } else {
        UserRole::Member
    };
    let user = User {
        id: new_record_id(),
        email,
        name,
        created_at: now_ms,
        role: Some(role),
    };
    users.push(AuthUser {
        user: user.clone(),
        password,
    });
    USERS.save(access, &users)?;
    Ok(user)
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let trimmed = email.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(AuthError::InvalidEmail(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_password(password: &str) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(password.to_string())
}
