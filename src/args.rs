//! These structs provide the CLI interface for the billing server.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// billing: A REST backend for tracking personal income and expenses.
///
/// Bills and categories are kept in a local SQLite database and served as JSON over HTTP. Every
/// request needs a bearer token listed in the identities file; only admin identities may create,
/// update or delete records.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files and database.
    ///
    /// This is the first command you should run. Prepare an identities file beforehand, it looks
    /// like this:
    ///
    /// {"identities": [{"token": "s3cret", "name": "alice", "is_admin": true}]}
    ///
    /// It will be moved into the secrets directory of --billing-home.
    Init(InitArgs),
    /// Run the HTTP server until interrupted with Ctrl-C.
    Serve(ServeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where billing data and configuration is held. Defaults to ~/billing
    #[arg(long, env = "BILLING_HOME", default_value_t = default_billing_home())]
    billing_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, billing_home: PathBuf) -> Self {
        Self {
            log_level,
            billing_home: billing_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn billing_home(&self) -> &DisplayPath {
        &self.billing_home
    }
}

/// (Not shown): Args for the `billing init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to the identities JSON file. This file will be moved to the default secrets
    /// location in the main data directory.
    #[arg(long)]
    identities: PathBuf,
}

impl InitArgs {
    pub fn new(identities: impl Into<PathBuf>) -> Self {
        Self {
            identities: identities.into(),
        }
    }

    pub fn identities(&self) -> &Path {
        &self.identities
    }
}

/// (Not shown): Args for the `billing serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// The address to listen on, e.g. 0.0.0.0:8080. Overrides listen_addr in config.json.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

impl ServeArgs {
    pub fn new(listen: Option<SocketAddr>) -> Self {
        Self { listen }
    }

    pub fn listen(&self) -> Option<SocketAddr> {
        self.listen
    }
}

fn default_billing_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("billing"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --billing-home or BILLING_HOME instead of relying on the \
                default billing home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("billing")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let args = Args::try_parse_from([
            "billing",
            "--log-level",
            "debug",
            "--billing-home",
            "/tmp/b",
            "serve",
            "--listen",
            "0.0.0.0:8080",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        assert_eq!(args.common().billing_home().path(), Path::new("/tmp/b"));
        match args.command() {
            Command::Serve(serve) => {
                assert_eq!(serve.listen(), Some("0.0.0.0:8080".parse().unwrap()))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_init() {
        let args = Args::try_parse_from([
            "billing",
            "--billing-home",
            "/tmp/b",
            "init",
            "--identities",
            "ids.json",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        match args.command() {
            Command::Init(init) => assert_eq!(init.identities(), Path::new("ids.json")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_bad_listen_addr() {
        let result = Args::try_parse_from(["billing", "serve", "--listen", "localhost"]);
        assert!(result.is_err());
    }
}
