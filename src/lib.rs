pub mod cache;
pub mod catalog;
pub mod clienv;
pub mod completions;
pub mod debug;
pub mod download;
pub mod error;
pub mod locale;
pub mod mo;
pub mod pipeline;
pub mod project;
pub mod settings;

pub use error::{Result, StoreError, UpdateError};
pub use locale::Locale;
pub use pipeline::{Pipeline, RunContext, UpdateLog, UpdateReport, UpdateRequest, UpdateSummary};
pub use project::{Project, ProjectKind};
