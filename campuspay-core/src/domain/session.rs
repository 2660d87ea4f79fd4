//! Session domain model
//!
//! The session is the client's authorization state: an access token plus a
//! coarse classification of the user. It is persisted as two secure-storage
//! keys, `access_token` and `user_type`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Classification of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// A registered student holding an access token
    Normal,
    /// Degraded, unauthenticated usage
    Guest,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Normal => "normal",
            UserType::Guest => "guest",
        }
    }
}

impl FromStr for UserType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(UserType::Normal),
            "guest" => Ok(UserType::Guest),
            other => Err(Error::validation(format!("Unknown user type '{}'", other))),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the two secrets held by a session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    UserType,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AccessToken => "access_token",
            SessionKey::UserType => "user_type",
        }
    }
}

/// Current authorization state
///
/// A `normal` user without a token cannot be expressed.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// Nothing stored yet
    #[default]
    Unauthenticated,
    Registered {
        access_token: String,
    },
    Guest,
}

impl Session {
    pub fn registered(access_token: impl Into<String>) -> Self {
        Session::Registered {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            Session::Registered { access_token } => Some(access_token),
            _ => None,
        }
    }

    pub fn user_type(&self) -> Option<UserType> {
        match self {
            Session::Unauthenticated => None,
            Session::Registered { .. } => Some(UserType::Normal),
            Session::Guest => Some(UserType::Guest),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Session::Guest)
    }

    /// Rebuild a session from the two stored keys.
    ///
    /// A `normal` classification without a token is treated as no session at
    /// all. A token without a classification comes from an interrupted write
    /// of the token-then-classification pair and is kept as registered.
    pub fn from_parts(access_token: Option<String>, user_type: Option<UserType>) -> Self {
        match (access_token, user_type) {
            (_, Some(UserType::Guest)) => Session::Guest,
            (Some(token), Some(UserType::Normal) | None) if !token.is_empty() => {
                Session::Registered { access_token: token }
            }
            _ => Session::Unauthenticated,
        }
    }

    /// The two stored keys for this session
    pub fn to_parts(&self) -> (Option<&str>, Option<UserType>) {
        (self.access_token(), self.user_type())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Unauthenticated => f.write_str("Unauthenticated"),
            Session::Registered { .. } => f
                .debug_struct("Registered")
                .field("access_token", &"<redacted>")
                .finish(),
            Session::Guest => f.write_str("Guest"),
        }
    }
}

/// Result of an authentication attempt
#[derive(Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The service issued an access token
    Registered(String),
    /// The service accepted the identity but granted only guest access
    Guest,
}

impl AuthOutcome {
    /// The issued token, or the literal `"guest"`
    pub fn as_str(&self) -> &str {
        match self {
            AuthOutcome::Registered(token) => token,
            AuthOutcome::Guest => "guest",
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, AuthOutcome::Guest)
    }
}

impl fmt::Debug for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Registered(_) => f.write_str("Registered(<redacted>)"),
            AuthOutcome::Guest => f.write_str("Guest"),
        }
    }
}
