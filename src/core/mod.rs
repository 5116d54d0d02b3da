// Public modules
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod notify;
pub mod paths;
pub mod prompt;
pub mod select;
pub mod server;

// Public modules for CLI access
pub mod defaults;

// Re-export common types for convenience
pub use context::{DeployContext, DeployOptions};
pub use error::{Error, ErrorCode, Result};
pub use git::{RefCandidate, RefKind};
