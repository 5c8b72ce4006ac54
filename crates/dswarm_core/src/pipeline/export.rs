use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, Stream, StreamExt};

use super::ExportSummary;
use crate::backend::BackendClient;
use crate::content::{GraphExtensionClient, input_data_model_of};
use crate::document;
use crate::pools::{WorkerKind, WorkerPool};
use crate::store;
use crate::types::{DATA_MODEL, ObjectIdentifier, ObjectRecord};
use crate::{CoreError, Result, Stage};

/// Enumerate, fetch and write every object of `client`'s collection.
///
/// Files are written on the collection's writer pool as fetches complete. The
/// first failed fetch or write ends the run with [`CoreError::ExportAborted`];
/// files written up to then are left in place.
pub async fn export_objects(client: &BackendClient, directory: &Path) -> Result<ExportSummary> {
    let collection = client.collection().name.clone();
    tracing::info!(
        "exporting {}s from '{}' to '{}'",
        collection,
        client.api().base_uri(),
        directory.display()
    );

    let records = client
        .fetch_all()
        .await
        .map_err(|cause| aborted(&collection, 0, cause))?;
    let writer = client.pools().pool_for(WorkerKind::Writer, &collection);
    let summary = write_all(&collection, records, &writer, directory).await?;

    tracing::info!(
        "exported '{}' {}s from '{}' to '{}'",
        summary.exported,
        collection,
        client.api().base_uri(),
        directory.display()
    );
    Ok(summary)
}

/// Write the content of every project's input data model to `directory`.
///
/// The data models are found through the projects of `projects`; each one is
/// exported once even if several projects share it. Projects without an
/// input data model are skipped.
pub async fn export_content(
    projects: &BackendClient,
    content: &GraphExtensionClient,
    directory: &Path,
) -> Result<ExportSummary> {
    tracing::info!(
        "exporting data model content from '{}' to '{}'",
        content.api().base_uri(),
        directory.display()
    );

    let data_models = input_data_models(projects)
        .await
        .map_err(|cause| aborted(DATA_MODEL, 0, cause))?;
    tracing::debug!("found {} distinct input data models", data_models.len());

    let contents = data_models
        .into_iter()
        .map(|(id, record_class_uri)| content.fetch_content(id, record_class_uri))
        .collect::<FuturesUnordered<_>>();
    let writer = content.pools().pool_for(WorkerKind::Writer, DATA_MODEL);
    let summary = write_all(DATA_MODEL, contents, &writer, directory).await?;

    tracing::info!(
        "exported content of '{}' {}s from '{}' to '{}'",
        summary.exported,
        DATA_MODEL,
        content.api().base_uri(),
        directory.display()
    );
    Ok(summary)
}

/// Distinct (data model, record class URI) pairs referenced by all projects,
/// in the order they were first seen.
async fn input_data_models(
    projects: &BackendClient,
) -> Result<Vec<(ObjectIdentifier, String)>> {
    let collection = projects.collection().name.clone();
    let mut records = std::pin::pin!(projects.fetch_all().await?);

    let mut data_models: Vec<(ObjectIdentifier, String)> = Vec::new();
    while let Some(record) = records.next().await {
        let record = record?;
        let label = format!("{collection} {}", record.id);
        let project = document::to_object(&record.payload, &label)
            .map_err(|e| e.in_stage(Stage::Deserialize, &collection, record.id.as_str()))?;

        match input_data_model_of(&project)
            .map_err(|e| e.in_stage(Stage::ExtractIdentifier, &collection, record.id.as_str()))?
        {
            Some(data_model) => {
                if !data_models.contains(&data_model) {
                    data_models.push(data_model);
                }
            }
            None => tracing::warn!(
                "{} '{}' has no input data model, skipping it",
                collection,
                record.id
            ),
        }
    }
    Ok(data_models)
}

/// Drain `records` and write each one to its own file, stopping at the first error.
async fn write_all<S>(
    collection: &str,
    records: S,
    writer: &Arc<WorkerPool>,
    directory: &Path,
) -> Result<ExportSummary>
where
    S: Stream<Item = Result<ObjectRecord>>,
{
    let mut records = std::pin::pin!(records);
    let mut files = Vec::new();

    while let Some(record) = records.next().await {
        let written = match record {
            Ok(record) => write_record(collection, record, writer, directory).await,
            Err(cause) => Err(cause),
        };
        match written {
            Ok(file_name) => files.push(file_name),
            Err(cause) => {
                tracing::error!(
                    "aborting export of {}s after {} file(s): {}",
                    collection,
                    files.len(),
                    cause
                );
                return Err(aborted(collection, files.len(), cause));
            }
        }
    }

    Ok(ExportSummary {
        collection: collection.to_string(),
        directory: directory.to_path_buf(),
        exported: files.len(),
        files,
    })
}

async fn write_record(
    collection: &str,
    record: ObjectRecord,
    writer: &Arc<WorkerPool>,
    directory: &Path,
) -> Result<String> {
    let file_name = store::export_file_name(collection, &record.id);
    let task_directory: PathBuf = directory.to_path_buf();
    let task_file_name = file_name.clone();

    writer
        .run(async move {
            store::write_file(&record.payload, &task_directory, &task_file_name).await?;
            tracing::debug!("wrote '{}'", task_directory.join(&task_file_name).display());
            Ok(())
        })
        .await
        .map_err(|e| e.in_stage(Stage::Write, collection, file_name.as_str()))?;

    Ok(file_name)
}

fn aborted(collection: &str, written: usize, cause: CoreError) -> CoreError {
    CoreError::ExportAborted {
        collection: collection.to_string(),
        written,
        cause: Box::new(cause),
    }
}
