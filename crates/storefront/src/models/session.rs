//! Session-related types.
//!
//! The storefront keeps no database: the logged-in user, including the
//! backend bearer token, the assistant conversation and one-shot flash
//! messages all live in the session.

use serde::{Deserialize, Serialize};

use mobistore_core::{UserId, UserRole};

use crate::backend::User;

/// Session-stored user identity.
///
/// Implements `Debug` manually to redact the backend token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Bearer token issued by the backend at login.
    pub token: String,
}

impl CurrentUser {
    /// Build from a login/register response.
    #[must_use]
    pub fn from_login(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }

    /// Name shown in the header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS class suffix for the alert box.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// The logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Assistant widget conversation (`Vec<ChatTurn>`).
    pub const CHAT_HISTORY: &str = "chat_history";

    /// One-shot flash message.
    pub const FLASH: &str = "flash";

    /// Path to return to after login.
    pub const RETURN_TO: &str = "return_to";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: String::new(),
            email: "an@example.vn".to_string(),
            role: UserRole::User,
            token: "eyJhbGciOi.secret".to_string(),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", user());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user().display_name(), "an@example.vn");
    }
}
