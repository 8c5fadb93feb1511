//! Session-related types for admin authentication.
//!
//! The signed-in admin, including the backend bearer token, lives in the
//! session; there is no local user table.

use serde::{Deserialize, Serialize};

use mobistore_core::{UserId, UserRole};

use crate::backend::User;

/// Session-stored admin identity.
///
/// Only accounts whose backend role is `admin` are ever stored. `Debug` is
/// implemented manually to redact the token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Bearer token issued by the backend at login.
    pub token: String,
}

impl CurrentAdmin {
    /// Build from a login response; `None` unless the account is an admin.
    #[must_use]
    pub fn from_login(user: User, token: String) -> Option<Self> {
        (user.role == UserRole::Admin).then(|| Self {
            id: user.id,
            name: user.name,
            email: user.email,
            token,
        })
    }

    /// Name shown in the sidebar.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl std::fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
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
}

/// Session keys for admin data.
pub mod keys {
    /// The signed-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// One-shot flash message.
    pub const FLASH: &str = "flash";
}
