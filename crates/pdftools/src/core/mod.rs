//! Shared plumbing for both services.
//!
//! - **Configuration** (`config`): service settings and config file discovery
//! - **Filenames** (`filename`): upload name sanitizing and size formatting
//! - **I/O** (`io`): per-request temporary workspaces
//! - **MIME** (`mime`): file kind detection and upload validation

pub mod config;
pub mod filename;
pub mod io;
pub mod mime;

pub use config::{CompressionConfig, GhostscriptConfig, MergeConfig, ServiceConfig};
pub use io::RequestWorkspace;
pub use mime::FileKind;
