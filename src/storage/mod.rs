//! Storage helpers
//!
//! Owner-only file creation, atomic JSON writes and the write-then-rename
//! replacement used when restoring the database.

pub mod file_io;
