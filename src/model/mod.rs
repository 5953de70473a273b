pub mod config;
pub mod document;
pub mod task;
pub mod task_item;

pub use config::*;
pub use document::*;
pub use task::*;
pub use task_item::*;
