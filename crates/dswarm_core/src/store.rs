//! Object payloads on disk, one file per object

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use crate::{CoreError, ObjectIdentifier, Result};

/// File name an exported object is written to: `{collection}.{id}.json`.
pub fn export_file_name(collection: &str, id: &ObjectIdentifier) -> String {
    format!("{collection}.{id}.json")
}

/// Recover the identifier from a file named `{name}.{id}.{extension}`.
///
/// Exactly one `.` has to sit before and after the identifier.
pub fn identifier_from_file_name(file_name: &str) -> Result<ObjectIdentifier> {
    let segments: Vec<&str> = file_name.split('.').collect();
    match segments.as_slice() {
        [name, id, extension] if !name.is_empty() && !id.is_empty() && !extension.is_empty() => {
            Ok(ObjectIdentifier::new(*id))
        }
        _ => Err(CoreError::naming_convention(file_name)),
    }
}

/// Names of the regular files in `directory`, sorted.
pub async fn list_files(directory: &Path) -> Result<Vec<String>> {
    let is_dir = match fs::metadata(directory).await {
        Ok(metadata) => metadata.is_dir(),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => false,
        Err(e) => return Err(CoreError::io("inspect", directory, e)),
    };
    if !is_dir {
        tracing::error!(
            "'{}' is no directory - please specify a folder as import directory",
            directory.display()
        );
        return Err(CoreError::NotADirectory {
            path: directory.display().to_string(),
        });
    }

    let mut entries = fs::read_dir(directory)
        .await
        .map_err(|e| CoreError::io("list", directory, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CoreError::io("list", directory, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| CoreError::io("inspect", entry.path(), e))?;
        if !file_type.is_file() {
            tracing::debug!("skipping '{}', not a regular file", entry.path().display());
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    names.sort();
    Ok(names)
}

/// Read a UTF-8 file from `directory`.
pub async fn read_file(directory: &Path, name: &str) -> Result<String> {
    let path = directory.join(name);
    fs::read_to_string(&path)
        .await
        .map_err(|e| CoreError::io("read", path, e))
}

/// Write `content` to `directory/name`, creating missing directories and
/// replacing any existing file.
pub async fn write_file(content: &str, directory: &Path, name: &str) -> Result<()> {
    fs::create_dir_all(directory)
        .await
        .map_err(|e| CoreError::io("create directory", directory, e))?;

    let path = directory.join(name);
    fs::write(&path, content)
        .await
        .map_err(|e| CoreError::io("write", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier_from_file_name() {
        let id =
            identifier_from_file_name("datamodel.550e8400-e29b-41d4-a716-446655440000.json")
                .unwrap();
        assert_eq!(id.as_str(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_identifier_from_malformed_file_names() {
        for name in [
            "datamodel.json",
            "datamodel.a.b.json",
            ".abc.json",
            "datamodel..json",
            "no-dots",
        ] {
            let err = identifier_from_file_name(name).unwrap_err();
            assert!(
                matches!(err, CoreError::NamingConvention { .. }),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("project", &ObjectIdentifier::from("A")),
            "project.A.json"
        );
    }

    #[tokio::test]
    async fn test_write_creates_directories_and_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let directory = temp.path().join("nested").join("export");

        write_file("first", &directory, "project.A.json").await.unwrap();
        write_file("second", &directory, "project.A.json").await.unwrap();

        assert_eq!(
            read_file(&directory, "project.A.json").await.unwrap(),
            "second"
        );
    }

    #[tokio::test]
    async fn test_list_files_sorted_and_skips_directories() {
        let temp = tempfile::tempdir().unwrap();
        write_file("{}", temp.path(), "project.B.json").await.unwrap();
        write_file("{}", temp.path(), "project.A.json").await.unwrap();
        std::fs::create_dir(temp.path().join("subdir")).unwrap();

        assert_eq!(
            list_files(temp.path()).await.unwrap(),
            vec!["project.A.json".to_string(), "project.B.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_files_rejects_non_directory() {
        let temp = tempfile::tempdir().unwrap();
        write_file("{}", temp.path(), "file.json").await.unwrap();

        let err = list_files(&temp.path().join("file.json")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory { .. }));

        let err = list_files(&temp.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory { .. }));

        let err = list_files(&temp.path().join("file.json").join("below"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn test_list_files_unusable_path_is_io_error() {
        // the path cannot even be inspected
        let err = list_files(Path::new("import\0directory")).await.unwrap_err();
        assert!(matches!(err, CoreError::Io { ref operation, .. } if operation == "inspect"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = read_file(temp.path(), "missing.json").await.unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
