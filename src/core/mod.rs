pub mod actions;
pub mod dispatch;
pub mod engine;
pub mod template;

pub use crate::domain::model::Record;
pub use crate::domain::ports::{
    DispatchMode, MessageLevel, MessageSink, PrintDispatcher, RecordStore, Storage,
};
pub use crate::utils::error::Result;
