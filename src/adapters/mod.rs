// Adapters layer: concrete implementations of the domain ports (files, records, console).

pub mod messages;
pub mod records;
pub mod storage;
