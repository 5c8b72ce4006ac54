use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::ImportSummary;
use crate::backend::BackendClient;
use crate::content::GraphExtensionClient;
use crate::document::{self, UUID_FIELD};
use crate::pools::{WorkerKind, WorkerPool};
use crate::store;
use crate::types::{ContentRecord, DATA_MODEL, ObjectRecord, PipelineOutcome};
use crate::{Result, Stage};

/// Replay every file in `directory` into `client`'s collection.
///
/// Files are read ahead on the reader pool but imported one at a time. Only an
/// unusable `directory` fails the run; any other failure is recorded in the
/// summary against the file or object it happened for.
pub async fn import_objects(client: &BackendClient, directory: &Path) -> Result<ImportSummary> {
    let collection = client.collection().name.clone();
    let files = store::list_files(directory).await?;
    tracing::info!(
        "importing {} {} file(s) from '{}' to '{}'",
        files.len(),
        collection,
        directory.display(),
        client.api().base_uri()
    );

    let reader = client.pools().pool_for(WorkerKind::Reader, &collection);
    let read_ahead = reader.capacity();
    let records = stream::iter(files)
        .map(|file_name| {
            read_record(
                reader.clone(),
                collection.clone(),
                directory.to_path_buf(),
                file_name,
            )
        })
        .buffered(read_ahead);

    let summary = ImportSummary::collect(collection.as_str(), client.import_all(records)).await;

    tracing::info!(
        "imported '{}' {}s from '{}' to '{}' ('{}' failed)",
        summary.succeeded_count(),
        collection,
        directory.display(),
        client.api().base_uri(),
        summary.failed_count()
    );
    Ok(summary)
}

/// Write every content file in `directory` back into the graph extension.
///
/// The data model a file belongs to is taken from its name
/// (`datamodel.{id}.json`). Files are checked to hold a JSON array on the
/// reader pool, then streamed from disk one at a time.
pub async fn import_content(
    content: &GraphExtensionClient,
    directory: &Path,
) -> Result<ImportSummary> {
    let files = store::list_files(directory).await?;
    tracing::info!(
        "importing content of {} {} file(s) from '{}' to '{}'",
        files.len(),
        DATA_MODEL,
        directory.display(),
        content.api().base_uri()
    );

    let reader = content.pools().pool_for(WorkerKind::Reader, DATA_MODEL);
    let read_ahead = reader.capacity();
    let records = stream::iter(files)
        .map(|file_name| read_content_record(reader.clone(), directory.to_path_buf(), file_name))
        .buffered(read_ahead);

    let summary = ImportSummary::collect(DATA_MODEL, content.import_all(records)).await;

    tracing::info!(
        "imported content of '{}' {}s from '{}' to '{}' ('{}' failed)",
        summary.succeeded_count(),
        DATA_MODEL,
        directory.display(),
        content.api().base_uri(),
        summary.failed_count()
    );
    Ok(summary)
}

/// Read, parse and identify one file on the reader pool.
///
/// A failure is returned as the outcome for that file.
async fn read_record(
    reader: Arc<WorkerPool>,
    collection: String,
    directory: PathBuf,
    file_name: String,
) -> std::result::Result<ObjectRecord, PipelineOutcome> {
    let label = file_name.clone();

    reader
        .run(async move {
            let text = store::read_file(&directory, &file_name)
                .await
                .map_err(|e| e.in_stage(Stage::Read, &collection, file_name.as_str()))?;

            let object = document::to_object(&text, &format!("file '{file_name}'"))
                .map_err(|e| e.in_stage(Stage::Deserialize, &collection, file_name.as_str()))?;
            let id = document::extract_identifier(&object, UUID_FIELD)
                .map_err(|e| e.in_stage(Stage::ExtractIdentifier, &collection, file_name.as_str()))?;

            tracing::debug!("read {} '{}' from '{}'", collection, id, file_name);
            Ok(ObjectRecord::new(id, text))
        })
        .await
        .map_err(|error| PipelineOutcome::failure(label, error))
}

/// Identify a content file by its name and make sure it parses as a JSON
/// array. The content itself stays on disk for the upload.
async fn read_content_record(
    reader: Arc<WorkerPool>,
    directory: PathBuf,
    file_name: String,
) -> std::result::Result<ContentRecord, PipelineOutcome> {
    let label = file_name.clone();

    reader
        .run(async move {
            let id = store::identifier_from_file_name(&file_name)
                .map_err(|e| e.in_stage(Stage::ExtractIdentifier, DATA_MODEL, file_name.as_str()))?;

            let text = store::read_file(&directory, &file_name)
                .await
                .map_err(|e| e.in_stage(Stage::Read, DATA_MODEL, file_name.as_str()))?;
            document::to_array(&text, &format!("file '{file_name}'"))
                .map_err(|e| e.in_stage(Stage::Deserialize, DATA_MODEL, file_name.as_str()))?;

            tracing::debug!("read content of {} '{}' from '{}'", DATA_MODEL, id, file_name);
            Ok(ContentRecord {
                id,
                path: directory.join(&file_name),
            })
        })
        .await
        .map_err(|error| PipelineOutcome::failure(label, error))
}
