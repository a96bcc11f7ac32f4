//! Tiny alias so the I/O edge can return `Result<T>` everywhere.
//!
//! The calculation core never fails; only file and stream handling does.

pub type Result<T> = std::result::Result<T, anyhow::Error>;
