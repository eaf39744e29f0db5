use crate::admin::{AdminSite, ChangeList, ChangeListRequest};
use crate::core::actions::{BarcodeAction, BarcodeActionGenerator, BatchReport};
use crate::core::{MessageSink, PrintDispatcher, RecordStore};
use crate::domain::model::{Catalog, RecordType};
use crate::utils::error::{LimsError, Result};
use std::sync::Arc;

/// Request-scoped entry point: one call handles one admin request.
pub struct LimsEngine<R: RecordStore> {
    store: R,
    catalog: Catalog,
    dispatcher: Arc<dyn PrintDispatcher>,
    site: AdminSite,
}

impl<R: RecordStore> LimsEngine<R> {
    pub fn new(store: R, catalog: Catalog, dispatcher: Arc<dyn PrintDispatcher>) -> Self {
        Self {
            store,
            catalog,
            dispatcher,
            site: AdminSite::lims(),
        }
    }

    pub fn site(&self) -> &AdminSite {
        &self.site
    }

    pub fn dispatcher(&self) -> &dyn PrintDispatcher {
        self.dispatcher.as_ref()
    }

    pub fn actions(&self, record_type: RecordType) -> Result<Vec<BarcodeAction>> {
        BarcodeActionGenerator::new(&self.catalog).actions_for(record_type)
    }

    pub async fn run_action(
        &self,
        record_type: RecordType,
        action_name: &str,
        ids: &[u64],
        messages: &dyn MessageSink,
    ) -> Result<BatchReport> {
        let action = BarcodeActionGenerator::new(&self.catalog).find(record_type, action_name)?;
        tracing::info!(
            "Running {} on {} {} record(s)",
            action_name,
            ids.len(),
            record_type
        );

        let records = self.store.select(record_type, ids).await?;
        Ok(action
            .execute(&records, self.dispatcher.as_ref(), messages)
            .await)
    }

    pub async fn changelist(
        &self,
        record_type: RecordType,
        request: &ChangeListRequest,
    ) -> Result<ChangeList> {
        let admin = self
            .site
            .get(record_type)
            .ok_or_else(|| LimsError::UnknownRecordTypeError {
                name: record_type.key().to_string(),
            })?;
        let actions = self.actions(record_type)?;
        ChangeList::build(admin, request, &self.store, &actions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::records::MemoryRecordStore;
    use crate::core::dispatch::DiagnosticDispatcher;
    use crate::core::{MessageLevel, Record};
    use crate::domain::model::{LabelTemplate, Printer, PrinterBinding};

    struct Silent;

    impl MessageSink for Silent {
        fn message_user(&self, _level: MessageLevel, _message: &str) {}
    }

    fn engine() -> LimsEngine<MemoryRecordStore> {
        let store = MemoryRecordStore::new()
            .with(Record::new(RecordType::Sample, 1).with_field("barcode", "S001"))
            .with(Record::new(RecordType::Sample, 2).with_field("barcode", "S002"));
        let catalog = Catalog {
            templates: vec![LabelTemplate {
                id: 1,
                name: "plain".to_string(),
                template: "{}".to_string(),
                nr_fields: 1,
            }],
            printers: vec![Printer {
                id: 1,
                name: "zebra_lab1".to_string(),
            }],
            bindings: vec![PrinterBinding {
                id: 1,
                record_type: RecordType::Sample,
                template: 1,
                printer: 1,
                fields: "barcode".to_string(),
            }],
        };
        LimsEngine::new(
            store,
            catalog,
            Arc::new(DiagnosticDispatcher::with_writer(std::io::sink())),
        )
    }

    #[tokio::test]
    async fn test_run_action_selects_records() {
        let report = engine()
            .run_action(RecordType::Sample, "print_barcode_1", &[2, 1], &Silent)
            .await
            .unwrap();
        assert_eq!(report.printed, 2);
    }

    #[tokio::test]
    async fn test_run_action_with_unknown_id() {
        let result = engine()
            .run_action(RecordType::Sample, "print_barcode_1", &[3], &Silent)
            .await;
        assert!(matches!(result, Err(LimsError::RecordNotFoundError { id: 3, .. })));
    }

    #[tokio::test]
    async fn test_changelist_lists_actions() {
        let list = engine()
            .changelist(RecordType::Sample, &ChangeListRequest::new())
            .await
            .unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.actions[0].0, "print_barcode_1");
    }
}
