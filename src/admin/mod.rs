//! Admin list configuration: what each record type's change list shows,
//! which filters it offers, and how a request is evaluated against records.

pub mod changelist;
pub mod containers;
pub mod filters;
pub mod site;

pub use changelist::{ChangeList, ChangeListRequest};
pub use site::{AdminSite, ModelAdmin};

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::adapters::records::MemoryRecordStore;
    use crate::domain::model::{Record, RecordType};

    /// rack 1 (apparatus 7) > box 2 > box 3 holding two records;
    /// loose box 4 (apparatus 8); boxes 5 and 6 parent each other.
    pub fn freezer_store() -> MemoryRecordStore {
        MemoryRecordStore::new()
            .with(
                Record::new(RecordType::Container, 1)
                    .with_field("apparatus", 7)
                    .with_field("apparatus_subdivision", 70),
            )
            .with(Record::new(RecordType::Container, 2).with_field("parent", 1))
            .with(Record::new(RecordType::Container, 3).with_field("parent", "2"))
            .with(Record::new(RecordType::Container, 4).with_field("apparatus", 8))
            .with(Record::new(RecordType::Container, 5).with_field("parent", 6))
            .with(Record::new(RecordType::Container, 6).with_field("parent", 5))
            .with(Record::new(RecordType::Sample, 10).with_field("container", 3))
            .with(Record::new(RecordType::ExtractedDna, 11).with_field("container", 3))
    }
}
