//! Menu store: persistence, validation and read queries for the navigation tree.
//!
//! All reads and writes go through the [`MenuStore`] trait. Two backends exist:
//!
//! - [`PgMenuStore`] - PostgreSQL, with row locks around validation and a
//!   foreign-key cascade for subtree deletion.
//! - [`MemoryMenuStore`] - process-local map behind a single lock, used when
//!   no database is configured and in tests.
//!
//! A store is built once at startup and handed to callers through
//! [`AppState`](crate::state::AppState).
//!
//! # Usage
//!
//! ```ignore
//! let products = store.create(CreateMenuItem::new("Products", MenuType::Dropdown)).await?;
//! let nav = store.menus_for_user(&viewer).await?;
//! ```

mod error;
mod filter;
mod memory;
mod postgres;
pub mod query;
mod tree;
pub mod validate;

use async_trait::async_trait;
use uuid::Uuid;

pub use error::{MenuError, MenuResult};
pub use filter::{MenuFilter, ParentFilter};
pub use memory::MemoryMenuStore;
pub use postgres::PgMenuStore;
pub use tree::{MenuNode, build_tree};

use crate::models::{CreateMenuItem, MenuItem, Principal, UpdateMenuItem};

/// Storage and query interface for menu items.
///
/// Implementations must validate the complete proposed state (see
/// [`validate::validate`]) before every write, inside the same lock or
/// transaction as the write itself.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Validate and persist a new item.
    async fn create(&self, input: CreateMenuItem) -> MenuResult<MenuItem>;

    /// Load one item by id.
    async fn get(&self, id: Uuid) -> MenuResult<MenuItem>;

    /// Apply a patch, re-validate the whole item, persist and refresh `updated_at`.
    async fn update(&self, id: Uuid, patch: UpdateMenuItem) -> MenuResult<MenuItem>;

    /// Delete an item and all of its descendants atomically.
    ///
    /// Returns the number of items removed.
    async fn delete(&self, id: Uuid) -> MenuResult<u64>;

    /// List items matching a filter in display order.
    async fn list(&self, filter: &MenuFilter) -> MenuResult<Vec<MenuItem>>;

    /// Count items matching a filter, ignoring pagination.
    async fn count(&self, filter: &MenuFilter) -> MenuResult<u64>;

    /// Case-insensitive exact title match among active items.
    ///
    /// When several match, the first in `(order, title, id)` order wins.
    async fn find_by_title(&self, title: &str) -> MenuResult<Option<MenuItem>>;

    /// Whether the backing storage is reachable.
    async fn healthy(&self) -> bool;

    /// Active top-level items.
    async fn list_main_menus(&self) -> MenuResult<Vec<MenuItem>> {
        self.list(&MenuFilter::main_menus()).await
    }

    /// Active direct children of an item.
    async fn list_active_submenus(&self, parent_id: Uuid) -> MenuResult<Vec<MenuItem>> {
        self.list(&MenuFilter::active_children(parent_id)).await
    }

    async fn has_active_submenus(&self, id: Uuid) -> MenuResult<bool> {
        let filter = MenuFilter {
            limit: Some(1),
            ..MenuFilter::active_children(id)
        };
        Ok(!self.list(&filter).await?.is_empty())
    }

    /// First active title match the viewer is allowed to see.
    ///
    /// Same matching and ordering as [`MenuStore::find_by_title`], but
    /// restricted items are skipped instead of hiding later matches.
    async fn find_visible_by_title(
        &self,
        title: &str,
        viewer: &dyn Principal,
    ) -> MenuResult<Option<MenuItem>> {
        let matches = self.list(&MenuFilter::active_titled(title)).await?;
        Ok(matches.into_iter().find(|menu| menu.visible_to(viewer)))
    }

    /// Main menus the viewer is allowed to see.
    async fn menus_for_user(&self, viewer: &dyn Principal) -> MenuResult<Vec<MenuItem>> {
        let menus = self.list_main_menus().await?;
        Ok(menus
            .into_iter()
            .filter(|menu| menu.visible_to(viewer))
            .collect())
    }

    /// The full navigation tree the viewer is allowed to see.
    async fn menu_tree(&self, viewer: &dyn Principal) -> MenuResult<Vec<MenuNode>> {
        let items = self.list(&MenuFilter::active()).await?;
        Ok(build_tree(items, viewer))
    }
}
