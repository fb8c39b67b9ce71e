//! In-process implementation of MenuStore.
//!
//! One `RwLock` guards the whole map. Writers hold it across validation and
//! commit, so the parent check and the write can never interleave with
//! another writer.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use super::error::{MenuError, MenuResult};
use super::filter::MenuFilter;
use super::validate::{TreeContext, ancestor_chain, validate};
use super::MenuStore;
use crate::models::{CreateMenuItem, MenuItem, UpdateMenuItem};

/// Menu store backed by a process-local map.
#[derive(Default)]
pub struct MemoryMenuStore {
    items: RwLock<HashMap<Uuid, MenuItem>>,
}

impl MemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items, active or not.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

fn tree_context(items: &HashMap<Uuid, MenuItem>, item: &MenuItem) -> TreeContext {
    let parent = item
        .parent_id
        .filter(|id| *id != item.id)
        .and_then(|id| items.get(&id).cloned());

    let ancestors = ancestor_chain(parent.as_ref().and_then(|p| p.parent_id), |id| {
        items.get(&id).and_then(|i| i.parent_id)
    });

    let has_children = items.values().any(|i| i.parent_id == Some(item.id));

    TreeContext {
        parent,
        ancestors,
        has_children,
    }
}

/// Ids of `root` and everything below it.
fn subtree(items: &HashMap<Uuid, MenuItem>, root: Uuid) -> Vec<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for item in items.values() {
        if let Some(parent) = item.parent_id {
            children.entry(parent).or_default().push(item.id);
        }
    }

    let mut found = vec![root];
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        for child in children.remove(&id).unwrap_or_default() {
            found.push(child);
            queue.push_back(child);
        }
    }
    found
}

#[async_trait]
impl MenuStore for MemoryMenuStore {
    async fn create(&self, input: CreateMenuItem) -> MenuResult<MenuItem> {
        let item = MenuItem::from_input(Uuid::now_v7(), input, Utc::now());

        let mut items = self.items.write();
        validate(&item, &tree_context(&items, &item))?;
        items.insert(item.id, item.clone());
        drop(items);

        info!(id = %item.id, title = %item.title, menu_type = item.menu_type.as_str(), "menu item created");
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> MenuResult<MenuItem> {
        self.items
            .read()
            .get(&id)
            .cloned()
            .ok_or(MenuError::NotFound(id))
    }

    async fn update(&self, id: Uuid, patch: UpdateMenuItem) -> MenuResult<MenuItem> {
        let mut items = self.items.write();
        let mut item = items.get(&id).cloned().ok_or(MenuError::NotFound(id))?;

        item.apply(patch);
        item.updated_at = Utc::now();

        validate(&item, &tree_context(&items, &item))?;
        items.insert(id, item.clone());
        drop(items);

        info!(id = %id, title = %item.title, "menu item updated");
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> MenuResult<u64> {
        let mut items = self.items.write();
        if !items.contains_key(&id) {
            return Err(MenuError::NotFound(id));
        }

        let doomed = subtree(&items, id);
        for doomed_id in &doomed {
            items.remove(doomed_id);
        }
        drop(items);

        let removed = doomed.len() as u64;
        info!(id = %id, removed, "menu item deleted");
        Ok(removed)
    }

    async fn list(&self, filter: &MenuFilter) -> MenuResult<Vec<MenuItem>> {
        let mut matched: Vec<MenuItem> = self
            .items
            .read()
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        matched.sort_by(MenuItem::display_cmp);

        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &MenuFilter) -> MenuResult<u64> {
        let count = self
            .items
            .read()
            .values()
            .filter(|item| filter.matches(item))
            .count();
        Ok(count as u64)
    }

    async fn find_by_title(&self, title: &str) -> MenuResult<Option<MenuItem>> {
        let needle = title.to_lowercase();
        Ok(self
            .items
            .read()
            .values()
            .filter(|item| item.is_active && item.title.to_lowercase() == needle)
            .min_by(|a, b| a.display_cmp(b))
            .cloned())
    }

    async fn healthy(&self) -> bool {
        true
    }
}
