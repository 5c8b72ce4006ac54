use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Pipeline stage an object was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Enumerate,
    Fetch,
    Read,
    Deserialize,
    ExtractIdentifier,
    Write,
    Import,
    FetchMetadata,
    FetchContent,
    WriteContent,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Enumerate => "enumerate",
            Stage::Fetch => "fetch",
            Stage::Read => "read",
            Stage::Deserialize => "deserialize",
            Stage::ExtractIdentifier => "extract identifier",
            Stage::Write => "write",
            Stage::Import => "import",
            Stage::FetchMetadata => "fetch metadata",
            Stage::FetchContent => "fetch content",
            Stage::WriteContent => "write content",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("'{path}' is no directory")]
    #[diagnostic(
        code(dswarm_core::not_a_directory),
        help("Please specify a folder as import directory")
    )]
    NotADirectory { path: String },

    #[error("I/O failure while trying to {operation} '{path}'")]
    #[diagnostic(
        code(dswarm_core::io_error),
        help("Check that the path exists and is readable/writable")
    )]
    Io {
        operation: String,
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("could not deserialize {label}")]
    #[diagnostic(
        code(dswarm_core::deserialization_error),
        help("The payload is not well-formed JSON of the expected shape")
    )]
    Deserialization {
        label: String,
        #[source]
        cause: serde_json::Error,
    },

    #[error("could not serialize {label}")]
    #[diagnostic(code(dswarm_core::serialization_error))]
    Serialization {
        label: String,
        #[source]
        cause: serde_json::Error,
    },

    #[error("field '{field}' is missing in {context}")]
    #[diagnostic(
        code(dswarm_core::missing_field),
        help("The document does not carry the expected '{field}' field")
    )]
    MissingField { field: String, context: String },

    #[error("{method} {url} answered with status {status}")]
    #[diagnostic(code(dswarm_core::remote_call_failed), help("Response body: {body}"))]
    RemoteCall {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{method} {url} could not be sent")]
    #[diagnostic(
        code(dswarm_core::transport_failed),
        help("Check that the API base URI is correct and the service is running")
    )]
    Transport {
        method: String,
        url: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("file name '{file_name}' does not follow the naming convention")]
    #[diagnostic(
        code(dswarm_core::naming_convention),
        help("Expected a file name shaped like '{expected}'")
    )]
    NamingConvention { file_name: String, expected: String },

    #[error("{stage} failed for {collection} '{object}'")]
    #[diagnostic(code(dswarm_core::operation_failed))]
    OperationFailed {
        stage: Stage,
        collection: String,
        object: String,
        #[source]
        cause: Box<CoreError>,
    },

    #[error("export of {collection}s aborted after {written} written file(s)")]
    #[diagnostic(
        code(dswarm_core::export_aborted),
        help("Files written before the failure are kept; re-run the export once the cause is fixed")
    )]
    ExportAborted {
        collection: String,
        written: usize,
        #[source]
        cause: Box<CoreError>,
    },

    #[error("worker pool '{pool}' failed to run a task")]
    #[diagnostic(code(dswarm_core::worker_failed))]
    WorkerFailed {
        pool: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Configuration error")]
    #[diagnostic(
        code(dswarm_core::configuration_error),
        help("Check '{field}' in {config_path}: expected {expected}")
    )]
    Configuration {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

// Helper functions for creating common errors with context
impl CoreError {
    pub fn io(
        operation: impl Into<String>,
        path: impl AsRef<std::path::Path>,
        cause: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.as_ref().display().to_string(),
            cause,
        }
    }

    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn naming_convention(file_name: impl Into<String>) -> Self {
        Self::NamingConvention {
            file_name: file_name.into(),
            expected: "{name}.{identifier}.{extension}".to_string(),
        }
    }

    pub fn configuration(
        config_path: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Configuration {
            config_path: config_path.into(),
            field: field.into(),
            expected: expected.into(),
            cause: cause.into(),
        }
    }

    /// Wrap this error with the stage and object it happened for.
    pub fn in_stage(
        self,
        stage: Stage,
        collection: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self::OperationFailed {
            stage,
            collection: collection.into(),
            object: object.into(),
            cause: Box::new(self),
        }
    }

    /// Drop the outermost stage wrapper, so the error can be put into another stage.
    pub fn without_stage(self) -> Self {
        match self {
            Self::OperationFailed { cause, .. } => *cause,
            other => other,
        }
    }

    /// HTTP status behind this error, looking through stage wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteCall { status, .. } => Some(*status),
            Self::OperationFailed { cause, .. } | Self::ExportAborted { cause, .. } => {
                cause.status()
            }
            _ => None,
        }
    }

    /// The innermost error, i.e. the one that was wrapped by stage context.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::OperationFailed { cause, .. } | Self::ExportAborted { cause, .. } => {
                cause.root_cause()
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn test_stage_wrapper_keeps_cause() {
        let error = CoreError::missing_field("uuid", "file '/tmp/project.json'")
            .in_stage(Stage::ExtractIdentifier, "project", "project.json");

        assert_eq!(
            error.to_string(),
            "extract identifier failed for project 'project.json'"
        );
        let source = std::error::Error::source(&error).expect("wrapped cause");
        assert!(source.to_string().contains("uuid"));
        assert!(matches!(error.root_cause(), CoreError::MissingField { .. }));
    }

    #[test]
    fn test_status_looks_through_wrappers() {
        let error = CoreError::RemoteCall {
            method: "GET".to_string(),
            url: "http://localhost/projects/B".to_string(),
            status: 500,
            body: "boom".to_string(),
        }
        .in_stage(Stage::Fetch, "project", "B");

        assert_eq!(error.status(), Some(500));
        assert_eq!(CoreError::naming_convention("x.json").status(), None);
    }

    #[test]
    fn test_restaging_replaces_the_wrapper() {
        let error = CoreError::naming_convention("x.json")
            .in_stage(Stage::Fetch, "datamodel", "D")
            .without_stage()
            .in_stage(Stage::FetchMetadata, "datamodel", "D");

        assert_eq!(error.to_string(), "fetch metadata failed for datamodel 'D'");
        assert!(matches!(
            std::error::Error::source(&error)
                .and_then(|source| source.downcast_ref::<CoreError>()),
            Some(CoreError::NamingConvention { .. })
        ));
    }

    #[test]
    fn test_report_contains_code_and_help() {
        let error = CoreError::naming_convention("datamodel.json");
        let output = format!("{:?}", Report::new(error));
        assert!(output.contains("naming_convention"));
        assert!(output.contains("{name}.{identifier}.{extension}"));
    }
}
