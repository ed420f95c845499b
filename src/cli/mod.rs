//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Workspace setup | `init` |
//! | Inventory | Schemas, ID formats, sharing | `inventory create`, `inventory id-format`, `inventory share` |
//! | Item | Records | `item add`, `item update`, `item delete` |
//! | Search | Text search over titles and custom IDs | `search hammer`, `search T-00 --inventory inv-...` |
//! | Stats | Field statistics | `stats <inventory>`, `stats` |
//!
//! Every mutating command takes `--version`, the version the caller last
//! saw. A stale version fails with a version conflict and changes nothing.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Logs go to stderr through `tracing`. Use `--verbose` (or `-v`) for debug
//! output, or set `RUST_LOG`:
//! ```bash
//! RUST_LOG=stockroom=debug stockroom item add inv-... "Hammer"
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod inventory;
mod item;
mod output;
mod search;
mod session;
mod stats;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
