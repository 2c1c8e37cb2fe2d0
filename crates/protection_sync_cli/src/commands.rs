//! Command modules for the protection sync CLI.
//!
//! - `sync_cmd`: runs a sync from resolved options and reports the result

pub mod sync_cmd;
