use crate::domain::model::{Record, RecordType};
use crate::domain::ports::{RecordStore, Storage};
use crate::utils::error::{LimsError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// Records read from `<record_type>.csv` or `<record_type>.json` under a
/// storage root. A type with neither file has no records. Files are read
/// once per store.
pub struct FileRecordStore<S: Storage> {
    storage: S,
    cache: Mutex<HashMap<RecordType, Vec<Record>>>,
}

impl<S: Storage> FileRecordStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn load(&self, record_type: RecordType) -> Result<Vec<Record>> {
        let csv_name = format!("{}.csv", record_type.key());
        if self.storage.exists(&csv_name).await {
            let data = self.storage.read_file(&csv_name).await?;
            return parse_csv(record_type, &csv_name, &data);
        }

        let json_name = format!("{}.json", record_type.key());
        if self.storage.exists(&json_name).await {
            let data = self.storage.read_file(&json_name).await?;
            return parse_json(record_type, &json_name, &data);
        }

        tracing::debug!("No record file for {}", record_type);
        Ok(Vec::new())
    }
}

#[async_trait]
impl<S: Storage> RecordStore for FileRecordStore<S> {
    async fn all(&self, record_type: RecordType) -> Result<Vec<Record>> {
        let mut cache = self.cache.lock().await;
        if let Some(records) = cache.get(&record_type) {
            return Ok(records.clone());
        }
        let records = self.load(record_type).await?;
        tracing::debug!("Loaded {} {} records", records.len(), record_type);
        cache.insert(record_type, records.clone());
        Ok(records)
    }
}

fn invalid_id(file: &str, row: usize, value: &str) -> LimsError {
    LimsError::InvalidConfigValueError {
        field: format!("{} row {}", file, row),
        value: value.to_string(),
        reason: "id must be a non-negative integer".to_string(),
    }
}

fn parse_csv(record_type: RecordType, file: &str, data: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_reader(data);
    let headers = reader.headers()?.clone();
    let id_column = headers
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| LimsError::MissingConfigError {
            field: format!("{}: id column", file),
        })?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let row_data = result?;
        let raw_id = row_data.get(id_column).unwrap_or("").trim();
        let id = raw_id
            .parse::<u64>()
            .map_err(|_| invalid_id(file, row + 1, raw_id))?;

        let mut fields = BTreeMap::new();
        for (header, cell) in headers.iter().zip(row_data.iter()) {
            if header == "id" {
                continue;
            }
            let value = if cell.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::String(cell.to_string())
            };
            fields.insert(header.to_string(), value);
        }
        records.push(Record {
            id,
            record_type,
            fields,
        });
    }
    Ok(records)
}

fn parse_json(record_type: RecordType, file: &str, data: &[u8]) -> Result<Vec<Record>> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(data)?;

    rows.into_iter()
        .enumerate()
        .map(|(row, mut object)| {
            let id = match object.remove("id") {
                Some(serde_json::Value::Number(n)) => n.as_u64(),
                Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            }
            .ok_or_else(|| invalid_id(file, row + 1, "<missing>"))?;

            Ok(Record {
                id,
                record_type,
                fields: object.into_iter().collect(),
            })
        })
        .collect()
}

/// Fixed record set, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: HashMap<RecordType, Vec<Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: Record) {
        self.records
            .entry(record.record_type)
            .or_default()
            .push(record);
    }

    pub fn with(mut self, record: Record) -> Self {
        self.insert(record);
        self
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn all(&self, record_type: RecordType) -> Result<Vec<Record>> {
        Ok(self.records.get(&record_type).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_csv_records() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("sample.csv"),
            "id,barcode,date,depth\n1,S001,2020-01-01,\n2,S002,2020-01-02,12.5\n",
        )
        .unwrap();

        let store = FileRecordStore::new(LocalStorage::new(
            dir.path().to_str().unwrap().to_string(),
        ));
        let samples = store.all(RecordType::Sample).await.unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, 1);
        assert_eq!(samples[0].get_str("barcode"), Some("S001"));
        assert_eq!(samples[0].get("depth"), Some(serde_json::Value::Null));
        assert_eq!(samples[1].get_str("depth"), Some("12.5"));
        assert!(!samples[0].fields.contains_key("id"));
    }

    #[tokio::test]
    async fn test_json_records_and_missing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("container.json"),
            r#"[{"id": 3, "barcode": "BOX-3", "parent": null}, {"id": "4", "parent": 3}]"#,
        )
        .unwrap();

        let store = FileRecordStore::new(LocalStorage::new(
            dir.path().to_str().unwrap().to_string(),
        ));
        let containers = store.all(RecordType::Container).await.unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[1].id, 4);
        assert_eq!(containers[1].ref_id("parent"), Some(3));

        assert!(store.all(RecordType::Primer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_csv_without_id_column() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("primer.csv"), "tmelt,stock\n60,yes\n").unwrap();

        let store = FileRecordStore::new(LocalStorage::new(
            dir.path().to_str().unwrap().to_string(),
        ));
        assert!(matches!(
            store.all(RecordType::Primer).await,
            Err(LimsError::MissingConfigError { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_keeps_request_order() {
        let store = MemoryRecordStore::new()
            .with(Record::new(RecordType::Sample, 1))
            .with(Record::new(RecordType::Sample, 2))
            .with(Record::new(RecordType::Sample, 3));

        let ids: Vec<u64> = store
            .select(RecordType::Sample, &[3, 1])
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);

        assert!(matches!(
            store.select(RecordType::Sample, &[4]).await,
            Err(LimsError::RecordNotFoundError { id: 4, .. })
        ));
    }
}
