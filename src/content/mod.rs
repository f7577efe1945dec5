//! HTML content processing: sanitization and article extraction.

pub mod extract;
pub mod sanitize;
