//! Sidebar filters of the change list.

use crate::admin::containers::ContainerIndex;
use crate::domain::model::{Record, RecordType};
use crate::domain::ports::RecordStore;
use crate::utils::error::{LimsError, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait ListFilter: Send + Sync {
    fn title(&self) -> &str;

    /// Query parameter that carries the selected value.
    fn parameter_name(&self) -> &str;

    /// `(value, label)` choices.
    async fn lookups(&self, store: &dyn RecordStore) -> Result<Vec<(String, String)>>;

    async fn apply(
        &self,
        value: &str,
        records: Vec<Record>,
        store: &dyn RecordStore,
    ) -> Result<Vec<Record>>;
}

/// What a `ModelAdmin` lists in `list_filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSpec {
    Field(&'static str),
    ContainerApparatus,
    ContainerIsEmpty,
}

impl FilterSpec {
    pub fn build(self, record_type: RecordType) -> Box<dyn ListFilter> {
        match self {
            FilterSpec::Field(field) => Box::new(FieldFilter { record_type, field }),
            FilterSpec::ContainerApparatus => Box::new(ContainerApparatusFilter),
            FilterSpec::ContainerIsEmpty => Box::new(ContainerIsEmptyFilter),
        }
    }
}

fn cell(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Equality on a plain field.
pub struct FieldFilter {
    record_type: RecordType,
    field: &'static str,
}

#[async_trait]
impl ListFilter for FieldFilter {
    fn title(&self) -> &str {
        self.field
    }

    fn parameter_name(&self) -> &str {
        self.field
    }

    async fn lookups(&self, store: &dyn RecordStore) -> Result<Vec<(String, String)>> {
        let values: BTreeSet<String> = store
            .all(self.record_type)
            .await?
            .iter()
            .filter_map(|r| cell(r, self.field))
            .collect();
        Ok(values.into_iter().map(|v| (v.clone(), v)).collect())
    }

    async fn apply(
        &self,
        value: &str,
        records: Vec<Record>,
        _store: &dyn RecordStore,
    ) -> Result<Vec<Record>> {
        Ok(records
            .into_iter()
            .filter(|r| cell(r, self.field).as_deref() == Some(value))
            .collect())
    }
}

/// Containers whose root apparatus is the selected apparatus.
pub struct ContainerApparatusFilter;

#[async_trait]
impl ListFilter for ContainerApparatusFilter {
    fn title(&self) -> &str {
        "Apparatus"
    }

    fn parameter_name(&self) -> &str {
        "apparatus"
    }

    async fn lookups(&self, store: &dyn RecordStore) -> Result<Vec<(String, String)>> {
        Ok(store
            .all(RecordType::Apparatus)
            .await?
            .iter()
            .map(|a| (a.id.to_string(), a.display_name()))
            .collect())
    }

    async fn apply(
        &self,
        value: &str,
        records: Vec<Record>,
        store: &dyn RecordStore,
    ) -> Result<Vec<Record>> {
        let apparatus: u64 = value.trim().parse().map_err(|_| {
            LimsError::InvalidConfigValueError {
                field: "apparatus".to_string(),
                value: value.to_string(),
                reason: "Apparatus filter takes an apparatus id".to_string(),
            }
        })?;
        let index = ContainerIndex::load(store).await?;
        Ok(records
            .into_iter()
            .filter(|c| index.root_apparatus(c.id) == Some(apparatus))
            .collect())
    }
}

pub struct ContainerIsEmptyFilter;

#[async_trait]
impl ListFilter for ContainerIsEmptyFilter {
    fn title(&self) -> &str {
        "Is Empty"
    }

    fn parameter_name(&self) -> &str {
        "is_empty"
    }

    async fn lookups(&self, _store: &dyn RecordStore) -> Result<Vec<(String, String)>> {
        Ok(vec![
            ("True".to_string(), "True".to_string()),
            ("False".to_string(), "False".to_string()),
        ])
    }

    async fn apply(
        &self,
        value: &str,
        records: Vec<Record>,
        store: &dyn RecordStore,
    ) -> Result<Vec<Record>> {
        let wanted = value == "True";
        let index = ContainerIndex::load(store).await?;
        Ok(records
            .into_iter()
            .filter(|c| index.is_empty(c.id) == wanted)
            .collect())
    }
}
