//! Identity lookup for incoming requests.
//!
//! Identities are not managed here. They are read from an externally maintained JSON file:
//!
//! ```json
//! { "identities": [ { "token": "s3cret", "name": "alice", "is_admin": true } ] }
//! ```

use crate::{utils, Result};
use anyhow::ensure;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The caller behind a request.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Resolves a bearer token into an `Identity`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns `Ok(None)` when the token does not belong to anyone.
    async fn authenticate(&self, token: &str) -> Result<Option<Identity>>;
}

#[derive(Debug, Clone, Deserialize)]
struct IdentityEntry {
    token: String,
    #[serde(flatten)]
    identity: Identity,
}

#[derive(Debug, Clone, Deserialize)]
struct IdentityFile {
    identities: Vec<IdentityEntry>,
}

/// An `Authenticator` backed by a fixed table of tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    identities: HashMap<String, Identity>,
}

impl TokenAuthenticator {
    /// Reads the identity file at `path`. Tokens must be non-empty and unique.
    pub async fn load(path: &Path) -> Result<Self> {
        let file: IdentityFile = utils::deserialize(path).await?;
        let mut identities = HashMap::with_capacity(file.identities.len());
        for entry in file.identities {
            ensure!(
                !entry.token.trim().is_empty(),
                "Identity '{}' in {} has an empty token",
                entry.identity.name,
                path.display()
            );
            ensure!(
                !identities.contains_key(&entry.token),
                "Identity '{}' in {} reuses a token",
                entry.identity.name,
                path.display()
            );
            identities.insert(entry.token, entry.identity);
        }
        Ok(Self { identities })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Identity>> {
        Ok(self.identities.get(token).cloned())
    }
}
