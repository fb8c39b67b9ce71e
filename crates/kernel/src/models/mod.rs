//! Data models.

pub mod menu;
pub mod viewer;

pub use menu::{
    AllowedRoles, CreateMenuItem, MenuItem, MenuTarget, MenuType, RequiredPermissions,
    UpdateMenuItem,
};
pub use viewer::{Principal, Viewer};
