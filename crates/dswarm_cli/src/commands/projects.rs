use dswarm_core::{BackupConfig, CollectionDescriptor, export_objects, import_objects};
use miette::Result;

use crate::output::Output;
use crate::params::Invocation;

/// Export every project to `{directory}/project.{uuid}.json`.
pub async fn export(invocation: &Invocation, config: &BackupConfig) -> Result<bool> {
    let output = Output::new();
    output.run_header(
        "Exporting projects",
        &invocation.backend_api,
        &invocation.directory.display().to_string(),
    );

    let pools = super::pool_registry(config);
    let client = super::backend_client(invocation, CollectionDescriptor::projects(), config, &pools)?;

    let summary = export_objects(&client, &invocation.directory).await?;
    output.export_summary(&summary);
    Ok(true)
}

/// Import every project file of the directory through the robust import endpoint.
pub async fn import(invocation: &Invocation, config: &BackupConfig) -> Result<bool> {
    let output = Output::new();
    output.run_header(
        "Importing projects",
        &invocation.directory.display().to_string(),
        &invocation.backend_api,
    );

    let pools = super::pool_registry(config);
    let client = super::backend_client(invocation, CollectionDescriptor::projects(), config, &pools)?;

    let summary = import_objects(&client, &invocation.directory).await?;
    output.import_summary(&summary);
    Ok(super::is_clean(&summary))
}
