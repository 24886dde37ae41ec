//! Waymark Workflow Service
//!
//! Persistence and the save pipeline around the `workflow-graph` model:
//!
//! - [`GraphStore`]: the storage gateway, with in-memory and directory adapters
//! - [`WorkflowService`]: validation-gated saves with optimistic concurrency
//! - [`EditSession`]: a working copy with undo/redo and conflict recovery
//! - [`ServiceConfig`]: store selection and tuning, file plus env overrides

pub mod config;
pub mod constants;
pub mod error;
pub mod file_store;
pub mod service;
pub mod session;
pub mod store;

pub use config::{ServiceConfig, StoreConfig};
pub use error::{Result, WorkflowServiceError};
pub use file_store::FileGraphStore;
pub use service::{build_store, SaveOutcome, WorkflowService};
pub use session::EditSession;
pub use store::{GraphStore, InMemoryGraphStore, StoredWorkflow, WorkflowId, WorkflowSummary};
