use crate::domain::model::{Printer, Record, RecordType};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Read access to persisted records. Persistence itself lives elsewhere.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn all(&self, record_type: RecordType) -> Result<Vec<Record>>;

    async fn get(&self, record_type: RecordType, id: u64) -> Result<Option<Record>> {
        Ok(self
            .all(record_type)
            .await?
            .into_iter()
            .find(|r| r.id == id))
    }

    /// Records in the order of `ids`. Unknown ids are an error.
    async fn select(&self, record_type: RecordType, ids: &[u64]) -> Result<Vec<Record>> {
        let all = self.all(record_type).await?;
        ids.iter()
            .map(|id| {
                all.iter().find(|r| r.id == *id).cloned().ok_or_else(|| {
                    crate::utils::error::LimsError::RecordNotFoundError {
                        record_type: record_type.key().to_string(),
                        id: *id,
                    }
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Spooler,
    Diagnostic,
}

#[async_trait]
pub trait PrintDispatcher: Send + Sync {
    async fn dispatch(&self, printer: &Printer, label: &str) -> Result<()>;

    fn mode(&self) -> DispatchMode;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

/// User-facing notifications, one per executed action.
pub trait MessageSink: Send + Sync {
    fn message_user(&self, level: MessageLevel, message: &str);
}
