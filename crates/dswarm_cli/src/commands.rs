//! Backup, restore and config commands

pub mod config;
pub mod content;
pub mod projects;

use std::sync::Arc;

use dswarm_core::{
    ApiClient, BackendClient, BackupConfig, CollectionDescriptor, GraphExtensionClient,
    ImportSummary, PoolRegistry,
};
use miette::Result;

use crate::params::{self, ArgsError, CommandKind, GRAPH_EXTENSION_API, Invocation};

/// Run a backup or restore command with its raw `-key=value` arguments.
///
/// Bad parameters and aborted runs print the command's usage. An import that
/// finished with failed objects fails too, but without the usage text.
pub async fn run(command: CommandKind, args: &[String], config: &BackupConfig) -> Result<()> {
    let clean = match try_run(command, args, config).await {
        Ok(clean) => clean,
        Err(e) => {
            eprintln!("\n{}", command.usage());
            return Err(e);
        }
    };

    if !clean {
        return Err(miette::miette!(
            "'{}' finished, but some objects could not be imported",
            command.name()
        ));
    }
    Ok(())
}

async fn try_run(command: CommandKind, args: &[String], config: &BackupConfig) -> Result<bool> {
    let params = params::parse_params(command, args)?;
    if params.wants_help() {
        println!("{}", command.usage());
        return Ok(true);
    }

    let invocation = params.resolve(command, config)?;
    tracing::debug!("running '{}' with {:?}", command.name(), invocation);

    match command {
        CommandKind::ExportProjects => projects::export(&invocation, config).await,
        CommandKind::ImportProjects => projects::import(&invocation, config).await,
        CommandKind::ExportDataModelsContent => content::export(&invocation, config).await,
        CommandKind::ImportDataModelsContent => content::import(&invocation, config).await,
    }
}

/// One registry per run, shared by every client of that run.
fn pool_registry(config: &BackupConfig) -> Arc<PoolRegistry> {
    Arc::new(PoolRegistry::new(config.pools.clone()))
}

fn backend_client(
    invocation: &Invocation,
    collection: CollectionDescriptor,
    config: &BackupConfig,
    pools: &Arc<PoolRegistry>,
) -> Result<BackendClient> {
    let api = ApiClient::new(invocation.backend_api.as_str(), &config.http)?;
    Ok(BackendClient::new(api, collection, pools.clone()))
}

fn graph_extension_client(
    invocation: &Invocation,
    config: &BackupConfig,
    pools: &Arc<PoolRegistry>,
) -> Result<GraphExtensionClient> {
    let uri = invocation
        .graph_extension_api
        .as_deref()
        .ok_or(ArgsError::Missing(GRAPH_EXTENSION_API))?;
    let api = ApiClient::new(uri, &config.http)?;
    let data_models = backend_client(
        invocation,
        CollectionDescriptor::data_models(),
        config,
        pools,
    )?;

    Ok(GraphExtensionClient::new(
        api,
        data_models,
        pools.clone(),
        &config.data_model_uri_template,
    ))
}

fn is_clean(summary: &ImportSummary) -> bool {
    if !summary.is_clean() {
        tracing::warn!(
            "{} {}(s) failed to import",
            summary.failed_count(),
            summary.collection
        );
    }
    summary.is_clean()
}
