//! The identity a menu is rendered for.
//!
//! Menus never own users. They only need a role list and a superuser flag
//! from whatever identity system the host application uses.

use serde::{Deserialize, Serialize};

/// Anything that can be checked against a menu item's role restriction.
pub trait Principal: Send + Sync {
    /// Role names held by this principal.
    fn roles(&self) -> &[String];

    /// Superusers see every item.
    fn is_superuser(&self) -> bool;
}

/// Plain principal built from request data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub roles: Vec<String>,
    pub is_superuser: bool,
}

impl Viewer {
    /// A viewer with no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A regular viewer holding the given roles.
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            is_superuser: false,
        }
    }

    pub fn superuser() -> Self {
        Self {
            roles: Vec::new(),
            is_superuser: true,
        }
    }
}

impl Principal for Viewer {
    fn roles(&self) -> &[String] {
        &self.roles
    }

    fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}
