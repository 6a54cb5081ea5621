use crate::commands::Out;
use crate::{http, Config, Result};
use std::net::SocketAddr;
use tracing::debug;

/// Runs the HTTP server until Ctrl-C is received.
///
/// # Arguments
/// - `config` - The loaded configuration, which also holds the open database
/// - `listen` - Overrides the `listen_addr` of `config.json` when given
pub async fn serve(config: Config, listen: Option<SocketAddr>) -> Result<Out<()>> {
    let addr = match listen {
        Some(addr) => addr,
        None => config.listen_addr()?,
    };
    debug!(
        "Serving from {} with database schema version {}",
        config.root().display(),
        config.db().schema_version().await?
    );
    http::serve(&config, addr).await?;
    Ok("The server has stopped".into())
}
