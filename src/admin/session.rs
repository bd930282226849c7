//! Admin access control: basic-auth checks and the session cookie.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Realm announced in basic-auth challenges.
pub const ADMIN_AUTH_REALM: &str = "SVB Admin";

/// Name of the admin session cookie.
pub const SESSION_COOKIE_NAME: &str = "admin_session";

/// Lifetime of the admin session cookie.
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Environment variable holding the admin user name.
pub const ADMIN_USERNAME_ENV: &str = "ADMIN_USERNAME";

/// Environment variable holding the admin password.
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

const TOKEN_BYTES: usize = 32;

/// Errors raised while authenticating admin requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials are not configured.
    #[error("Admin credentials are missing. Set ADMIN_USERNAME and ADMIN_PASSWORD.")]
    MissingCredentials,
    /// Login form values did not match.
    #[error("Invalid username or password")]
    InvalidLogin,
    /// A request carried no valid basic-auth header.
    #[error("Unauthorized admin request")]
    Unauthorized,
}

/// Configured admin user name and password.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// Builds credentials from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when either value is empty.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let credentials = Self {
            username: username.into(),
            password: password.into(),
        };
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(credentials)
    }

    /// Reads `ADMIN_USERNAME` and `ADMIN_PASSWORD` from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when either is unset or
    /// empty.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when either is unset or
    /// empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(ADMIN_USERNAME_ENV).ok_or(AuthError::MissingCredentials)?;
        let password = lookup(ADMIN_PASSWORD_ENV).ok_or(AuthError::MissingCredentials)?;
        Self::new(username, password)
    }

    /// Configured user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns `true` when `header` is a `Basic` authorization header
    /// carrying these credentials.
    #[must_use]
    pub fn verify_basic_auth(&self, header: Option<&str>) -> bool {
        let Some((username, password)) = header.and_then(decode_basic_auth) else {
            return false;
        };
        self.matches(&username, &password)
    }

    /// Guards an admin request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] unless `header` carries these
    /// credentials.
    pub fn authorize(&self, header: Option<&str>) -> Result<(), AuthError> {
        if self.verify_basic_auth(header) {
            return Ok(());
        }
        debug!("admin request rejected");
        Err(AuthError::Unauthorized)
    }

    /// Checks login form values and issues a fresh session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidLogin`] when the values do not match.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        if !self.matches(username, password) {
            warn!(username, "admin login rejected");
            return Err(AuthError::InvalidLogin);
        }
        info!(username, "admin logged in");
        Ok(SessionToken::generate())
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = same_digest(&self.username, username);
        let pass_ok = same_digest(&self.password, password);
        user_ok && pass_ok
    }
}

/// Value of the `WWW-Authenticate` header sent with a 401.
#[must_use]
pub fn basic_auth_challenge() -> String {
    format!("Basic realm=\"{ADMIN_AUTH_REALM}\"")
}

fn decode_basic_auth(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if scheme != "Basic" || encoded.is_empty() {
        return None;
    }
    let decoded = match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, "malformed basic auth header");
            return None;
        }
    };
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_owned(), password.to_owned()))
}

fn same_digest(expected: &str, provided: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(provided.as_bytes())
}

/// Opaque admin session identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl SessionToken {
    /// Creates a token from 32 random bytes, hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let hex = bytes
            .iter()
            .flat_map(|byte| [byte >> 4, byte & 0x0f])
            .filter_map(|nibble| char::from_digit(u32::from(nibble), 16))
            .collect();
        Self(hex)
    }

    /// Token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Set-Cookie` value that stores this token.
    ///
    /// `secure` adds the `Secure` attribute, as production deployments do.
    #[must_use]
    pub fn set_cookie(&self, secure: bool) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            self.0,
            SESSION_MAX_AGE.as_secs()
        );
        if secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// `Set-Cookie` value that ends the admin session.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; Max-Age=0; Path=/")
}

/// Outcome of a session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// A session cookie is present.
    Authenticated,
    /// The visitor has to log in first.
    RedirectToLogin,
}

/// Session check applied before admin pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionGate;

impl SessionGate {
    /// Path visitors without a session are sent to.
    pub const LOGIN_PATH: &'static str = "/login";

    /// Inspects a `Cookie` request header. Any non-empty `admin_session`
    /// value counts as a session.
    #[must_use]
    pub fn check(cookie_header: Option<&str>) -> Access {
        let has_session = cookie_header.is_some_and(|header| {
            header
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .any(|(name, value)| name == SESSION_COOKIE_NAME && !value.is_empty())
        });
        if has_session {
            Access::Authenticated
        } else {
            Access::RedirectToLogin
        }
    }
}
