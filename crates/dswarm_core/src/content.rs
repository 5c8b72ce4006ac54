//! Data model content, read from and written to the d:swarm graph extension
//!
//! Content is large, so writes are multipart requests whose second part is
//! streamed from disk. Every write needs an envelope derived from the data
//! model's metadata, which lives in the backend API.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::backend::BackendClient;
use crate::document::{self, INPUT_DATA_MODEL_FIELD, UUID_FIELD};
use crate::pools::{PoolRegistry, WorkerKind};
use crate::transport::ApiClient;
use crate::types::{ContentRecord, DATA_MODEL, ObjectIdentifier, ObjectRecord, PipelineOutcome};
use crate::{CoreError, Result, Stage};

pub const READ_CONTENT_ENDPOINT: &str = "gdm/get";
pub const WRITE_CONTENT_ENDPOINT: &str = "gdm/put";

/// Body of a content read request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadRequest {
    pub data_model_uri: String,
    pub record_class_uri: String,
}

/// Envelope sent as the metadata part of a content write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRequestEnvelope {
    pub data_model_uri: String,
    pub record_class_uri: String,
    pub deprecate_missing_records: &'static str,
    pub enable_versioning: &'static str,
}

impl WriteRequestEnvelope {
    /// Envelope for rewriting the content of a data model, with record
    /// deprecation and versioning switched off.
    pub fn from_metadata(data_model_uri: String, metadata: &Value) -> Result<Self> {
        Ok(Self {
            data_model_uri,
            record_class_uri: document::record_class_uri(metadata)?,
            deprecate_missing_records: "false",
            enable_versioning: "false",
        })
    }
}

/// Input data model of a project: its identifier and record class URI.
///
/// `None` when the project has no input data model.
pub fn input_data_model_of(project: &Value) -> Result<Option<(ObjectIdentifier, String)>> {
    match project.get(INPUT_DATA_MODEL_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(data_model) => {
            let id = document::extract_identifier(data_model, UUID_FIELD)?;
            let record_class_uri = document::record_class_uri(data_model)?;
            Ok(Some((id, record_class_uri)))
        }
    }
}

fn to_request_text(request: &impl Serialize, label: &str) -> Result<String> {
    serde_json::to_string(request).map_err(|cause| CoreError::Serialization {
        label: label.to_string(),
        cause,
    })
}

#[derive(Debug, Clone)]
pub struct GraphExtensionClient {
    api: ApiClient,
    data_models: BackendClient,
    pools: Arc<PoolRegistry>,
    data_model_uri_template: Arc<str>,
}

impl GraphExtensionClient {
    /// `data_models` is the backend client the write envelopes' metadata is fetched with.
    pub fn new(
        api: ApiClient,
        data_models: BackendClient,
        pools: Arc<PoolRegistry>,
        data_model_uri_template: &str,
    ) -> Self {
        Self {
            api,
            data_models,
            pools,
            data_model_uri_template: Arc::from(data_model_uri_template),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn pools(&self) -> &Arc<PoolRegistry> {
        &self.pools
    }

    pub fn data_model_uri(&self, id: &ObjectIdentifier) -> String {
        self.data_model_uri_template.replace("{id}", id.as_str())
    }

    /// Content of one data model as a canonicalized JSON array.
    pub async fn fetch_content(
        &self,
        id: ObjectIdentifier,
        record_class_uri: String,
    ) -> Result<ObjectRecord> {
        let api = self.api.clone();
        let pool = self.pools.pool_for(WorkerKind::Exporter, DATA_MODEL);
        let request = ReadRequest {
            data_model_uri: self.data_model_uri(&id),
            record_class_uri,
        };

        let task_id = id.clone();
        pool.run(async move {
            let id = task_id;
            let body = to_request_text(
                &request,
                &format!("read-data-model-content request for '{id}'"),
            )?;
            let response = api.post_json(READ_CONTENT_ENDPOINT, body).await?;
            tracing::debug!("exported content of data model '{}'", id);
            document::canonicalize_array(DATA_MODEL, &id, &response.body)
        })
        .await
        .map_err(|e| e.in_stage(Stage::FetchContent, DATA_MODEL, id.as_str()))
    }

    /// Fetch the data model's metadata and derive the write envelope from it.
    pub async fn write_envelope(&self, id: &ObjectIdentifier) -> Result<WriteRequestEnvelope> {
        let label = format!("{DATA_MODEL} {id}");
        self.data_models
            .fetch_one(id.clone())
            .await
            .map_err(CoreError::without_stage)
            .and_then(|metadata| document::to_object(&metadata.payload, &label))
            .and_then(|metadata| WriteRequestEnvelope::from_metadata(self.data_model_uri(id), &metadata))
            .map_err(|e| e.in_stage(Stage::FetchMetadata, DATA_MODEL, id.as_str()))
    }

    /// Send `content` with its envelope. Only HTTP 200 counts as success.
    pub async fn write_content(
        &self,
        id: &ObjectIdentifier,
        envelope: &WriteRequestEnvelope,
        content: &Path,
    ) -> Result<ObjectRecord> {
        let api = self.api.clone();
        let pool = self.pools.pool_for(WorkerKind::Importer, DATA_MODEL);
        let envelope = to_request_text(
            envelope,
            &format!("request metadata for data model '{id}'"),
        )
        .map_err(|e| e.in_stage(Stage::WriteContent, DATA_MODEL, id.as_str()))?;

        let task_id = id.clone();
        let path = content.to_path_buf();
        pool.run(async move {
            let response = api
                .post_multipart(WRITE_CONTENT_ENDPOINT, envelope, &path)
                .await?;
            if !response.is_ok() {
                return Err(CoreError::RemoteCall {
                    method: "POST".to_string(),
                    url: api.url(WRITE_CONTENT_ENDPOINT),
                    status: response.status,
                    body: response.body,
                });
            }
            Ok(ObjectRecord::new(task_id, response.body))
        })
        .await
        .map_err(|e| e.in_stage(Stage::WriteContent, DATA_MODEL, id.as_str()))
    }

    /// Metadata lookup, envelope and write for one content file.
    pub async fn import_one(&self, record: &ContentRecord) -> Result<ObjectRecord> {
        let envelope = self.write_envelope(&record.id).await?;
        self.write_content(&record.id, &envelope, &record.path).await
    }

    /// Write content files strictly one after another; the whole
    /// metadata-envelope-write sequence of one file finishes before the next starts.
    pub fn import_all<'a, S>(&'a self, records: S) -> impl Stream<Item = PipelineOutcome> + 'a
    where
        S: Stream<Item = std::result::Result<ContentRecord, PipelineOutcome>> + 'a,
    {
        records.then(move |record| async move {
            match record {
                Ok(record) => match self.import_one(&record).await {
                    Ok(written) => PipelineOutcome::Success(written),
                    Err(error) => PipelineOutcome::failure(record.id.as_str(), error),
                },
                Err(failed) => failed,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackupConfig, HttpConfig};
    use crate::types::CollectionDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_write_envelope_from_metadata() {
        let metadata = json!({ "schema": { "record_class": { "uri": "urn:x" } } });
        let envelope = WriteRequestEnvelope::from_metadata(
            "http://data.slub-dresden.de/datamodel/C/data".to_string(),
            &metadata,
        )
        .unwrap();

        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"data_model_uri":"http://data.slub-dresden.de/datamodel/C/data","record_class_uri":"urn:x","deprecate_missing_records":"false","enable_versioning":"false"}"#
        );
    }

    #[test]
    fn test_write_envelope_needs_record_class() {
        let err = WriteRequestEnvelope::from_metadata("uri".to_string(), &json!({}))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingField { .. }));
    }

    #[test]
    fn test_data_model_uri_follows_template() {
        let pools = Arc::new(PoolRegistry::default());
        let api = ApiClient::new("http://localhost:8087/dmp", &HttpConfig::default()).unwrap();
        let data_models =
            BackendClient::new(api.clone(), CollectionDescriptor::data_models(), pools.clone());
        let client = GraphExtensionClient::new(
            api,
            data_models,
            pools,
            &BackupConfig::default().data_model_uri_template,
        );

        assert_eq!(
            client.data_model_uri(&ObjectIdentifier::from("C")),
            "http://data.slub-dresden.de/datamodel/C/data"
        );
    }

    #[test]
    fn test_input_data_model_of_project() {
        let project = json!({
            "uuid": "P1",
            "input_data_model": {
                "uuid": "DM1",
                "schema": { "record_class": { "uri": "urn:record" } }
            }
        });
        assert_eq!(
            input_data_model_of(&project).unwrap(),
            Some((ObjectIdentifier::from("DM1"), "urn:record".to_string()))
        );

        assert_eq!(input_data_model_of(&json!({ "uuid": "P2" })).unwrap(), None);
        assert!(input_data_model_of(&json!({ "input_data_model": { "uuid": "DM" } })).is_err());
    }
}
