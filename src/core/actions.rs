use crate::core::template::render_label;
use crate::core::{MessageLevel, MessageSink, PrintDispatcher, Record};
use crate::domain::model::{Catalog, LabelTemplate, Printer, PrinterBinding, RecordType};
use crate::utils::error::{LimsError, Result};
use tracing::{info, instrument, warn};

/// One "print barcode" bulk action, built from a single binding.
#[derive(Debug, Clone)]
pub struct BarcodeAction {
    binding: PrinterBinding,
    template: LabelTemplate,
    printer: Printer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: u64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub action: String,
    pub printed: usize,
    pub skipped: Vec<SkippedRecord>,
    pub message: String,
}

impl BarcodeAction {
    pub fn name(&self) -> String {
        format!("print_barcode_{}", self.binding.id)
    }

    pub fn description(&self) -> String {
        format!(
            "Print barcode with template \"{}\" on printer \"{}\"",
            self.template.name, self.printer.name
        )
    }

    /// Best effort over the selection: a record that cannot be rendered or
    /// sent is logged and skipped. One message is sent for the whole batch.
    #[instrument(skip_all, fields(action = %self.name(), selected = records.len()))]
    pub async fn execute(
        &self,
        records: &[Record],
        dispatcher: &dyn PrintDispatcher,
        messages: &dyn MessageSink,
    ) -> BatchReport {
        let mut printed = 0;
        let mut skipped = Vec::new();

        for record in records {
            if record.record_type != self.binding.record_type {
                warn!(
                    id = record.id,
                    record_type = %record.record_type,
                    "Record type does not match binding"
                );
                skipped.push(SkippedRecord {
                    id: record.id,
                    reason: format!("expected a {} record", self.binding.record_type),
                });
                continue;
            }

            let label = match render_label(&self.template, &self.binding.fields, record) {
                Ok(label) => label,
                Err(e) => {
                    warn!(id = record.id, binding = self.binding.id, error = %e, "Skipping label");
                    skipped.push(SkippedRecord {
                        id: record.id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match dispatcher.dispatch(&self.printer, &label).await {
                Ok(()) => printed += 1,
                Err(e) => {
                    warn!(id = record.id, error = %e, "Label dispatch failed");
                    skipped.push(SkippedRecord {
                        id: record.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let message = format!(
            "Printed {} barcode label(s) with template \"{}\" on printer \"{}\"",
            printed, self.template.name, self.printer.name
        );
        messages.message_user(MessageLevel::Success, &message);
        info!(printed, skipped = skipped.len(), "Barcode batch finished");

        BatchReport {
            action: self.name(),
            printed,
            skipped,
            message,
        }
    }
}

pub struct BarcodeActionGenerator<'a> {
    catalog: &'a Catalog,
}

impl<'a> BarcodeActionGenerator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    fn build(&self, binding: &PrinterBinding) -> Result<BarcodeAction> {
        let template = self.catalog.template(binding.template).ok_or_else(|| {
            LimsError::config(format!(
                "binding {} references unknown template {}",
                binding.id, binding.template
            ))
        })?;
        let printer = self.catalog.printer(binding.printer).ok_or_else(|| {
            LimsError::config(format!(
                "binding {} references unknown printer {}",
                binding.id, binding.printer
            ))
        })?;

        Ok(BarcodeAction {
            binding: binding.clone(),
            template: template.clone(),
            printer: printer.clone(),
        })
    }

    /// One action per binding of `record_type`, ordered by binding id.
    pub fn actions_for(&self, record_type: RecordType) -> Result<Vec<BarcodeAction>> {
        self.catalog
            .bindings_for(record_type)
            .into_iter()
            .map(|b| self.build(b))
            .collect()
    }

    pub fn find(&self, record_type: RecordType, name: &str) -> Result<BarcodeAction> {
        self.actions_for(record_type)?
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| LimsError::UnknownActionError {
                record_type: record_type.key().to_string(),
                action: name.to_string(),
            })
    }
}
