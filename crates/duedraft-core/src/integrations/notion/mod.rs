//! Notion workspace integration.

pub mod client;
pub mod properties;

pub use client::{task_page_properties, NotionClient};
pub use properties::PropertyValue;
