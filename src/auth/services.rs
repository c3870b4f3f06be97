use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tokio::task;
use tracing::{debug, warn};

use crate::auth::{
    dto::{SigninRequest, SignupRequest},
    password::{hash_password, verify_or_dummy},
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    MissingFields(&'static str),
    #[error("invalid email")]
    InvalidEmail,
    #[error("password too short")]
    WeakPassword,
    #[error("username or email already exists")]
    Duplicate,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("store error: {0}")]
    Store(sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AuthError::Duplicate,
            StoreError::Database(e) => AuthError::Store(e),
        }
    }
}

/// Validated signup input.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validated signin input.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `None`, `null`, and blank strings all count as missing.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

pub fn validate_signup(req: SignupRequest) -> Result<Registration, AuthError> {
    const MISSING: &str = "All fields are required";
    let name = present(req.name).or_else(|| present(req.username));
    let (Some(name), Some(email), Some(password)) =
        (name, present(req.email), present(req.password))
    else {
        return Err(AuthError::MissingFields(MISSING));
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }

    Ok(Registration {
        username: name.trim().to_owned(),
        email,
        password,
    })
}

pub fn validate_signin(req: SigninRequest) -> Result<Credentials, AuthError> {
    const MISSING: &str = "Email and password are required";
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AuthError::MissingFields(MISSING));
    };
    Ok(Credentials {
        email: normalize_email(&email),
        password,
    })
}

/// Hash the password and insert the user in one statement.
pub async fn register(store: &dyn UserStore, reg: Registration) -> Result<User, AuthError> {
    let Registration {
        username,
        email,
        password,
    } = reg;
    let hash = task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hash(e.into()))?
        .map_err(AuthError::Hash)?;
    let user = store
        .insert(NewUser {
            username: &username,
            email: &email,
            password_hash: &hash,
        })
        .await?;
    debug!(user_id = %user.id, "registration stored");
    Ok(user)
}

/// Look the user up by email and check the password. Unknown email and wrong
/// password produce the same error and the same Argon2 work.
pub async fn authenticate(store: &dyn UserStore, creds: Credentials) -> Result<User, AuthError> {
    let user = store.find_by_email(&creds.email).await?;

    let password = creds.password;
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let ok = task::spawn_blocking(move || verify_or_dummy(&password, stored.as_deref()))
        .await
        .map_err(|e| AuthError::Hash(e.into()))?;

    match user {
        Some(user) if ok => Ok(user),
        Some(user) => {
            warn!(user_id = %user.id, "login invalid password");
            Err(AuthError::InvalidCredentials)
        }
        None => {
            warn!("login unknown email");
            Err(AuthError::InvalidCredentials)
        }
    }
}
