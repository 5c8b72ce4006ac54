//! Listing, fetching and importing objects of one backend collection

use std::sync::Arc;

use futures::stream::{FuturesUnordered, Stream, StreamExt};

use crate::document::{self, UUID_FIELD};
use crate::pools::{PoolRegistry, WorkerKind};
use crate::transport::ApiClient;
use crate::types::{CollectionDescriptor, ObjectIdentifier, ObjectRecord, PipelineOutcome};
use crate::{Result, Stage};

const FORMAT_PARAMETER: &str = "format";
const SHORT_FORMAT: &str = "short";

/// Client for one collection of the d:swarm backend API.
///
/// Remote reads run on the collection's exporter pool, imports on its
/// importer pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    api: ApiClient,
    collection: Arc<CollectionDescriptor>,
    pools: Arc<PoolRegistry>,
}

impl BackendClient {
    pub fn new(api: ApiClient, collection: CollectionDescriptor, pools: Arc<PoolRegistry>) -> Self {
        Self {
            api,
            collection: Arc::new(collection),
            pools,
        }
    }

    pub fn collection(&self) -> &CollectionDescriptor {
        &self.collection
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn pools(&self) -> &Arc<PoolRegistry> {
        &self.pools
    }

    /// Identifiers of all objects in the collection, in the order the backend lists them.
    ///
    /// Any failure aborts the whole listing.
    pub async fn list_identifiers(&self) -> Result<Vec<ObjectIdentifier>> {
        let api = self.api.clone();
        let collection = self.collection.clone();
        let pool = self.pools.pool_for(WorkerKind::Exporter, &collection.name);

        let task_collection = collection.clone();
        pool.run(async move {
            let collection = task_collection;
            let query = [(FORMAT_PARAMETER, SHORT_FORMAT)];
            let response = api.get(&collection.list_endpoint, &query).await?;
            tracing::info!("got a 200 for '{}s' retrieval", collection.name);

            let label = format!("short descriptions of all {}s", collection.name);
            let descriptions = document::to_array(&response.body, &label)?;

            let ids = descriptions
                .as_array()
                .map(|descriptions| {
                    descriptions
                        .iter()
                        .map(|description| document::extract_identifier(description, UUID_FIELD))
                        .collect::<Result<Vec<_>>>()
                })
                .unwrap_or_else(|| Ok(Vec::new()))?;
            Ok(ids)
        })
        .await
        .map_err(|e| e.in_stage(Stage::Enumerate, &collection.name, "*"))
    }

    /// Full representation of one object, canonicalized.
    pub async fn fetch_one(&self, id: ObjectIdentifier) -> Result<ObjectRecord> {
        let api = self.api.clone();
        let collection = self.collection.clone();
        let pool = self.pools.pool_for(WorkerKind::Exporter, &collection.name);

        let task_collection = collection.clone();
        let task_id = id.clone();
        pool.run(async move {
            let (collection, id) = (task_collection, task_id);
            tracing::debug!(
                "trying to retrieve full {} description for {} '{}'",
                collection.name,
                collection.name,
                id
            );
            let response = api.get(&collection.item_path(&id), &[]).await?;
            tracing::debug!(
                "retrieved full {} description for {} '{}'",
                collection.name,
                collection.name,
                id
            );
            document::canonicalize(&collection.name, &id, &response.body)
        })
        .await
        .map_err(|e| e.in_stage(Stage::Fetch, &collection.name, id.as_str()))
    }

    /// Every object of the collection.
    ///
    /// Fetches for all identifiers are issued at once, bounded only by the
    /// exporter pool; results arrive in completion order. A failed fetch shows
    /// up as an `Err` item and does not stop the others.
    pub async fn fetch_all(&self) -> Result<impl Stream<Item = Result<ObjectRecord>> + '_> {
        let ids = self.list_identifiers().await?;
        tracing::debug!("fetching {} {}s", ids.len(), self.collection.name);

        Ok(ids
            .into_iter()
            .map(|id| self.fetch_one(id))
            .collect::<FuturesUnordered<_>>())
    }

    /// Post one object to the import endpoint; the response is canonicalized
    /// into the returned record.
    pub async fn import_one(&self, record: ObjectRecord) -> Result<ObjectRecord> {
        let api = self.api.clone();
        let collection = self.collection.clone();
        let pool = self.pools.pool_for(WorkerKind::Importer, &collection.name);
        let id = record.id.clone();

        let task_collection = collection.clone();
        pool.run(async move {
            let collection = task_collection;
            tracing::debug!(
                "trying to import full {} description of {} '{}'",
                collection.name,
                collection.name,
                record.id
            );
            let response = api
                .post_json(&collection.import_endpoint, record.payload)
                .await?;
            tracing::info!("imported '{}' '{}'", collection.name, record.id);
            document::canonicalize(&collection.name, &record.id, &response.body)
        })
        .await
        .map_err(|e| e.in_stage(Stage::Import, &collection.name, id.as_str()))
    }

    /// Import records strictly one after another.
    ///
    /// The import endpoints are not safe under concurrent writes, so the next
    /// request is only sent once the previous one completed. Records that
    /// already failed upstream are passed through as failures.
    pub fn import_all<'a, S>(&'a self, records: S) -> impl Stream<Item = PipelineOutcome> + 'a
    where
        S: Stream<Item = std::result::Result<ObjectRecord, PipelineOutcome>> + 'a,
    {
        records.then(move |record| async move {
            match record {
                Ok(record) => {
                    let id = record.id.clone();
                    match self.import_one(record).await {
                        Ok(imported) => PipelineOutcome::Success(imported),
                        Err(error) => PipelineOutcome::failure(id.as_str(), error),
                    }
                }
                Err(failed) => failed,
            }
        })
    }
}
