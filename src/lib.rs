pub mod adapters;
pub mod admin;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    messages::ConsoleMessages,
    records::{FileRecordStore, MemoryRecordStore},
    storage::LocalStorage,
};
pub use config::LimsConfig;
pub use core::{
    actions::{BarcodeAction, BarcodeActionGenerator, BatchReport},
    dispatch::{
        select_dispatcher, select_dispatcher_with, DiagnosticDispatcher, SpoolerDispatcher,
    },
    engine::LimsEngine,
};
pub use utils::error::{LimsError, Result};
