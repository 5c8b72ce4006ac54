use dswarm_core::{BackupConfig, CollectionDescriptor, export_content, import_content};
use miette::Result;

use crate::output::Output;
use crate::params::Invocation;

fn graph_extension_uri(invocation: &Invocation) -> String {
    invocation.graph_extension_api.clone().unwrap_or_default()
}

/// Export the content of all input data models of all projects.
pub async fn export(invocation: &Invocation, config: &BackupConfig) -> Result<bool> {
    let output = Output::new();
    output.run_header(
        "Exporting data model content",
        &graph_extension_uri(invocation),
        &invocation.directory.display().to_string(),
    );

    let pools = super::pool_registry(config);
    let projects =
        super::backend_client(invocation, CollectionDescriptor::projects(), config, &pools)?;
    let graph_extension = super::graph_extension_client(invocation, config, &pools)?;

    let summary = export_content(&projects, &graph_extension, &invocation.directory).await?;
    output.export_summary(&summary);
    Ok(true)
}

/// Write every `datamodel.{id}.json` file back into the graph extension.
pub async fn import(invocation: &Invocation, config: &BackupConfig) -> Result<bool> {
    let output = Output::new();
    output.run_header(
        "Importing data model content",
        &invocation.directory.display().to_string(),
        &graph_extension_uri(invocation),
    );

    let graph_extension =
        super::graph_extension_client(invocation, config, &super::pool_registry(config))?;

    let summary = import_content(&graph_extension, &invocation.directory).await?;
    output.import_summary(&summary);
    Ok(super::is_clean(&summary))
}
