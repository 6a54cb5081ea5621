//! Configuration file handling for billing.
//!
//! The configuration file is stored at `$BILLING_HOME/config.json` and contains the listen address
//! of the server and the location of the identity file.

use crate::auth::TokenAuthenticator;
use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "billing";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const IDENTITIES_JSON: &str = "identities.json";
const CONFIG_JSON: &str = "config.json";
const BILLING_SQLITE: &str = "billing.sqlite";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BILLING_HOME` and from there it loads `$BILLING_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the billing home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file with default settings
    /// - Moves `identities_file` into its default location in the data dir
    /// - Initializes the SQLite database
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/billing`
    /// - `identities_file` - The JSON file listing the tokens that may call the server. This will
    ///   be moved to `.secrets/identities.json` in the data directory.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, identities_file: &Path) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the billing home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        // Read it before moving it so that a malformed file never lands in the data dir
        let _ = TokenAuthenticator::load(identities_file)
            .await
            .context("The identities file is not valid")?;
        utils::rename(identities_file, secrets_dir.join(IDENTITIES_JSON)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let db_path = root.join(BILLING_SQLITE);
        let db = Db::init(&db_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            db,
            sqlite_path: db_path,
        })
    }

    /// This will
    /// - validate that the `billing_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - load and migrate the SQLite database
    /// - return the loaded configuration object
    pub async fn load(billing_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = billing_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Billing Home is missing")?;
        let _ = utils::read_dir(&root)
            .await
            .context("Billing Home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display())
        }

        let db_path = root.join(BILLING_SQLITE);
        let db = Db::load(&db_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            db,
            sqlite_path: db_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// The address the server binds to unless overridden on the command line.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let raw = self.config_file.listen_addr();
        raw.parse()
            .with_context(|| format!("Invalid listen_addr '{raw}' in config file"))
    }

    /// Returns the stored `identities_path` if it is absolute, otherwise resolves it against the
    /// billing home.
    pub fn identities_path(&self) -> PathBuf {
        let p = self.config_file.identities_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "billing",
///   "config_version": 1,
///   "listen_addr": "0.0.0.0:8080",
///   "identities_path": ".secrets/identities.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "billing"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Socket address for the HTTP server. Defaults to 127.0.0.1:3000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    listen_addr: Option<String>,

    /// Path to the identity file (optional, relative to the billing home or absolute)
    /// Defaults to $BILLING_HOME/.secrets/identities.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identities_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            listen_addr: None,
            identities_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {} in config file, the newest known version is {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    pub fn listen_addr(&self) -> &str {
        self.listen_addr.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR)
    }

    pub fn identities_path(&self) -> PathBuf {
        self.identities_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(IDENTITIES_JSON))
    }
}
