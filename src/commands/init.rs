use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where `init` put things.
#[derive(Debug, Clone, Serialize)]
pub struct InitOutput {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub identities_path: PathBuf,
    pub sqlite_path: PathBuf,
}

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file with default settings
/// - Moves `identities_file` into its default location in the data dir
/// - Creates the SQLite database
///
/// # Arguments
/// - `billing_home` - The directory that will be the root of data directory, e.g. `$HOME/billing`
/// - `identities_file` - The JSON file listing the bearer tokens that may call the server.
///
/// # Errors
/// - Returns an error if the identities file is invalid or if any file operations fail.
pub async fn init(billing_home: &Path, identities_file: &Path) -> Result<Out<InitOutput>> {
    let config = Config::create(billing_home, identities_file)
        .await
        .context("Unable to create the data directory and configs")?;
    let output = InitOutput {
        root: config.root().to_path_buf(),
        config_path: config.config_path().to_path_buf(),
        identities_path: config.identities_path(),
        sqlite_path: config.sqlite_path().to_path_buf(),
    };
    Ok(Out::new(
        format!(
            "Successfully created the billing directory at {}",
            output.root.display()
        ),
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let identities = dir.path().join("ids.json");
        std::fs::write(&identities, r#"{"identities": []}"#).unwrap();

        let out = init(&dir.path().join("home"), &identities).await.unwrap();
        let output = out.structure().unwrap();
        assert!(output.config_path.is_file());
        assert!(output.identities_path.is_file());
        assert!(output.sqlite_path.is_file());
        assert!(out.message().contains("Successfully created"));

        // A second init over the same home refuses to clobber the database
        std::fs::write(&identities, r#"{"identities": []}"#).unwrap();
        assert!(init(&dir.path().join("home"), &identities).await.is_err());
    }
}
