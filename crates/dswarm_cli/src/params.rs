//! `-key=value` parameters of the backup and restore commands

use std::collections::HashMap;
use std::path::PathBuf;

use dswarm_core::BackupConfig;
use miette::Diagnostic;
use thiserror::Error;

pub const BACKEND_API: &str = "dswarm-backend-api";
pub const GRAPH_EXTENSION_API: &str = "dswarm-graph-extension-api";
pub const EXPORT_DIRECTORY: &str = "export-directory-name";
pub const IMPORT_DIRECTORY: &str = "import-directory-name";

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("'{0}' is not a parameter of the form '-key=value'")]
    #[diagnostic(code(dswarm_cli::malformed_parameter))]
    Malformed(String),

    #[error("unknown parameter '-{key}' for command '{command}'")]
    #[diagnostic(code(dswarm_cli::unknown_parameter))]
    Unknown { command: &'static str, key: String },

    #[error("missing required parameter '-{0}'")]
    #[diagnostic(
        code(dswarm_cli::missing_parameter),
        help("API URIs may also come from the config file or the DSWARM_* environment variables")
    )]
    Missing(&'static str),
}

/// The backup and restore commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ExportProjects,
    ImportProjects,
    ExportDataModelsContent,
    ImportDataModelsContent,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::ExportProjects => "export-projects",
            CommandKind::ImportProjects => "import-projects",
            CommandKind::ExportDataModelsContent => "export-datamodels-content",
            CommandKind::ImportDataModelsContent => "import-datamodels-content",
        }
    }

    fn needs_graph_extension(&self) -> bool {
        matches!(
            self,
            CommandKind::ExportDataModelsContent | CommandKind::ImportDataModelsContent
        )
    }

    fn directory_key(&self) -> &'static str {
        match self {
            CommandKind::ExportProjects | CommandKind::ExportDataModelsContent => EXPORT_DIRECTORY,
            CommandKind::ImportProjects | CommandKind::ImportDataModelsContent => IMPORT_DIRECTORY,
        }
    }

    /// Keys this command accepts.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec![BACKEND_API];
        if self.needs_graph_extension() {
            keys.push(GRAPH_EXTENSION_API);
        }
        keys.push(self.directory_key());
        keys
    }

    pub fn usage(&self) -> String {
        let description = match self {
            CommandKind::ExportProjects => {
                "Exports all projects of a d:swarm backend, one JSON file per project."
            }
            CommandKind::ImportProjects => {
                "Imports all project files of a directory into a d:swarm backend, one at a time."
            }
            CommandKind::ExportDataModelsContent => {
                "Exports the content of every input data model referenced by a project."
            }
            CommandKind::ImportDataModelsContent => {
                "Writes data model content files back into the d:swarm graph extension, one at a time."
            }
        };

        let mut usage = format!(
            "{description}\n\nUSAGE:\n    dswarm-tools {} {}\n\nPARAMETERS:\n",
            self.name(),
            self.keys()
                .iter()
                .map(|key| format!("-{key}=VALUE"))
                .collect::<Vec<_>>()
                .join(" ")
        );
        for key in self.keys() {
            let explanation = match key {
                BACKEND_API => "base URI of the d:swarm backend API",
                GRAPH_EXTENSION_API => "base URI of the d:swarm graph extension API",
                EXPORT_DIRECTORY => "directory the files are written to",
                _ => "directory the files are read from",
            };
            usage.push_str(&format!("    -{key:<30}{explanation}\n"));
        }
        usage.push_str(&format!("    --{:<29}print this help\n", "help"));
        usage
    }
}

/// Parameters given on the command line, checked against the command's keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
    help: bool,
}

impl Params {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn wants_help(&self) -> bool {
        self.help
    }

    /// Merge with the configuration; parameters win over config values.
    pub fn resolve(&self, command: CommandKind, config: &BackupConfig) -> Result<Invocation, ArgsError> {
        let backend_api = self
            .get(BACKEND_API)
            .or(config.backend_api.as_deref())
            .ok_or(ArgsError::Missing(BACKEND_API))?
            .to_string();

        let graph_extension_api = if command.needs_graph_extension() {
            let uri = self
                .get(GRAPH_EXTENSION_API)
                .or(config.graph_extension_api.as_deref())
                .ok_or(ArgsError::Missing(GRAPH_EXTENSION_API))?;
            Some(uri.to_string())
        } else {
            None
        };

        let directory_key = command.directory_key();
        let directory = self
            .get(directory_key)
            .map(PathBuf::from)
            .ok_or(ArgsError::Missing(directory_key))?;

        Ok(Invocation {
            backend_api,
            graph_extension_api,
            directory,
        })
    }
}

/// Everything a command needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub backend_api: String,
    pub graph_extension_api: Option<String>,
    pub directory: PathBuf,
}

/// Parse `-key=value` arguments. `--help` (or `-help`) anywhere asks for usage.
pub fn parse_params(command: CommandKind, args: &[String]) -> Result<Params, ArgsError> {
    let keys = command.keys();
    let mut params = Params::default();

    for arg in args {
        let stripped = arg.trim_start_matches('-');
        if stripped == "help" && arg.starts_with('-') {
            params.help = true;
            continue;
        }
        if !arg.starts_with('-') {
            return Err(ArgsError::Malformed(arg.clone()));
        }

        let (key, value) = stripped
            .split_once('=')
            .ok_or_else(|| ArgsError::Malformed(arg.clone()))?;
        if key.is_empty() || value.is_empty() {
            return Err(ArgsError::Malformed(arg.clone()));
        }
        if !keys.contains(&key) {
            return Err(ArgsError::Unknown {
                command: command.name(),
                key: key.to_string(),
            });
        }
        params.values.insert(key.to_string(), value.to_string());
    }

    Ok(params)
}
