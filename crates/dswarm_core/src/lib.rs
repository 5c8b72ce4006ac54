//! dswarm-core - backup and restore for d:swarm
//!
//! This crate copies projects, data models and data model content out of a
//! running d:swarm installation into plain JSON files, and replays those
//! files back into an installation later on.

pub mod backend;
pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod pools;
pub mod store;
pub mod transport;
pub mod types;

pub use backend::BackendClient;
pub use config::{BackupConfig, HttpConfig, PoolConfig};
pub use content::{GraphExtensionClient, WriteRequestEnvelope};
pub use error::{CoreError, Result, Stage};
pub use pipeline::{
    ExportSummary, FailedObject, ImportSummary, export_content, export_objects, import_content,
    import_objects,
};
pub use pools::{PoolKey, PoolRegistry, WorkerKind, WorkerPool};
pub use transport::{ApiClient, ApiResponse};
pub use types::{
    CollectionDescriptor, ContentRecord, DATA_MODEL, ObjectIdentifier, ObjectRecord, PROJECT,
    PipelineOutcome,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        ApiClient, BackendClient, BackupConfig, CollectionDescriptor, CoreError, ExportSummary,
        GraphExtensionClient, ImportSummary, ObjectIdentifier, ObjectRecord, PoolRegistry,
        Result,
    };
}
