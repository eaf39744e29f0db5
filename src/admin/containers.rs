//! Container hierarchy queries used by the container list.

use crate::domain::model::{Record, RecordType};
use crate::domain::ports::RecordStore;
use crate::utils::error::Result;
use std::collections::{HashMap, HashSet};

/// Snapshot of every container plus who points at it.
#[derive(Debug, Clone, Default)]
pub struct ContainerIndex {
    containers: HashMap<u64, Record>,
    children: HashMap<u64, usize>,
    objects: HashMap<u64, usize>,
}

impl ContainerIndex {
    pub async fn load(store: &dyn RecordStore) -> Result<Self> {
        let mut index = ContainerIndex::default();

        for container in store.all(RecordType::Container).await? {
            if let Some(parent) = container.ref_id("parent") {
                *index.children.entry(parent).or_default() += 1;
            }
            index.containers.insert(container.id, container);
        }

        for record_type in RecordType::ALL {
            if record_type == RecordType::Container {
                continue;
            }
            for record in store.all(record_type).await? {
                if let Some(container) = record.ref_id("container") {
                    *index.objects.entry(container).or_default() += 1;
                }
            }
        }

        Ok(index)
    }

    /// Topmost ancestor of `id`, following `parent`. `None` on a cycle or a
    /// dangling reference.
    pub fn root(&self, id: u64) -> Option<&Record> {
        let mut seen = HashSet::new();
        let mut current = self.containers.get(&id)?;
        while let Some(parent) = current.ref_id("parent") {
            if !seen.insert(current.id) {
                return None;
            }
            current = self.containers.get(&parent)?;
        }
        Some(current)
    }

    pub fn root_apparatus(&self, id: u64) -> Option<u64> {
        self.root(id)?.ref_id("apparatus")
    }

    pub fn root_apparatus_subdivision(&self, id: u64) -> Option<u64> {
        self.root(id)?.ref_id("apparatus_subdivision")
    }

    pub fn nr_children(&self, id: u64) -> usize {
        self.children.get(&id).copied().unwrap_or(0)
    }

    pub fn nr_objects_in_container(&self, id: u64) -> usize {
        self.objects.get(&id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self, id: u64) -> bool {
        self.nr_children(id) == 0 && self.nr_objects_in_container(id) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::fixtures::freezer_store;

    #[tokio::test]
    async fn test_root_apparatus_walks_parents() {
        let index = ContainerIndex::load(&freezer_store()).await.unwrap();
        assert_eq!(index.root_apparatus(3), Some(7));
        assert_eq!(index.root_apparatus_subdivision(3), Some(70));
        assert_eq!(index.root_apparatus(4), Some(8));
        assert_eq!(index.root_apparatus(5), None);
        assert_eq!(index.root_apparatus(99), None);
    }

    #[tokio::test]
    async fn test_emptiness_counts_children_and_objects() {
        let index = ContainerIndex::load(&freezer_store()).await.unwrap();
        assert_eq!(index.nr_children(1), 1);
        assert_eq!(index.nr_objects_in_container(3), 2);
        assert!(!index.is_empty(1));
        assert!(!index.is_empty(3));
        assert!(index.is_empty(4));
    }
}
