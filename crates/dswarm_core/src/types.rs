//! Values that flow through the backup and restore pipelines

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Collection name of d:swarm projects
pub const PROJECT: &str = "project";

/// Collection name of d:swarm data models
pub const DATA_MODEL: &str = "datamodel";

/// Identifier of a remote object, unique within its collection.
///
/// Usually a UUID handed out by the backend, or the middle segment of an
/// exported file name (`datamodel.{id}.json`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectIdentifier(String);

impl ObjectIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ObjectIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unit of work: an identifier paired with the JSON text of its object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: ObjectIdentifier,
    pub payload: String,
}

impl ObjectRecord {
    pub fn new(id: impl Into<ObjectIdentifier>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }
}

/// A content file waiting to be written back into the graph extension.
///
/// The payload stays on disk and is streamed when the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: ObjectIdentifier,
    pub path: PathBuf,
}

/// Endpoints of one remote collection, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescriptor {
    /// Collection name, e.g. "project"
    pub name: String,
    /// Listing endpoint, queried with `format=short`
    pub list_endpoint: String,
    /// Item endpoint; the identifier is appended as a path segment
    pub item_endpoint: String,
    /// Endpoint imports are posted to
    pub import_endpoint: String,
}

impl CollectionDescriptor {
    /// Descriptor with the plain `/{name}s` endpoints for listing, fetching and importing.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let objects = format!("{name}s");
        Self {
            list_endpoint: objects.clone(),
            item_endpoint: objects.clone(),
            import_endpoint: objects,
            name,
        }
    }

    /// Replace the import endpoint.
    pub fn with_import_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.import_endpoint = endpoint.into();
        self
    }

    /// Projects are imported through the robust import endpoint.
    pub fn projects() -> Self {
        Self::new(PROJECT).with_import_endpoint(format!("{PROJECT}s/robust"))
    }

    pub fn data_models() -> Self {
        Self::new(DATA_MODEL)
    }

    /// Path of a single object below the item endpoint.
    pub fn item_path(&self, id: &ObjectIdentifier) -> String {
        format!("{}/{}", self.item_endpoint, id)
    }
}

/// Result of pushing one object through a pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    Success(ObjectRecord),
    Failure {
        /// Object identifier, or the file name when the identifier was never known
        label: String,
        error: CoreError,
    },
}

impl PipelineOutcome {
    pub fn failure(label: impl Into<String>, error: CoreError) -> Self {
        Self::Failure {
            label: label.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_descriptor_uses_robust_import() {
        let projects = CollectionDescriptor::projects();
        assert_eq!(projects.name, "project");
        assert_eq!(projects.list_endpoint, "projects");
        assert_eq!(projects.import_endpoint, "projects/robust");
        assert_eq!(
            projects.item_path(&ObjectIdentifier::from("A")),
            "projects/A"
        );
    }

    #[test]
    fn test_data_model_descriptor_imports_to_item_endpoint() {
        let data_models = CollectionDescriptor::data_models();
        assert_eq!(data_models.import_endpoint, data_models.item_endpoint);
        assert_eq!(data_models.list_endpoint, "datamodels");
    }
}
