use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Client, Realm, User};

/// Errors raised while loading realm fixtures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read realm fixture '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse realm fixture '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("realm catalog is empty (realm_count = 0)")]
    Empty,
    #[error("realm '{realm}' is unusable: {reason}")]
    InvalidRealm { realm: String, reason: String },
}

/// Read-only collection of realms loaded before the run starts.
#[derive(Debug, Clone)]
pub struct RealmCatalog {
    realms: Vec<Realm>,
}

/// File name of the fixture for realm number `index`, e.g. `realm-007.json`.
pub fn fixture_file_name(index: usize) -> String {
    format!("realm-{:03}.json", index)
}

impl RealmCatalog {
    /// Builds a catalog from already-parsed realms, validating each one.
    pub fn new(realms: Vec<Realm>) -> Result<Self, CatalogError> {
        if realms.is_empty() {
            return Err(CatalogError::Empty);
        }
        for realm in &realms {
            validate(realm)?;
        }
        Ok(Self { realms })
    }

    /// Loads `realm-000.json` .. `realm-{count-1}.json` from `data_dir`.
    pub fn load(data_dir: &Path, realm_count: usize) -> Result<Self, CatalogError> {
        info!(
            "Loading {} realm fixtures from '{}'",
            realm_count,
            data_dir.display()
        );

        let realms = (0..realm_count)
            .map(|index| {
                let path = data_dir.join(fixture_file_name(index));
                let raw = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })?;
                let realm: Realm = serde_json::from_str(&raw)
                    .map_err(|source| CatalogError::Parse { path, source })?;
                debug!(
                    realm = realm.id.as_str(),
                    clients = realm.clients.len(),
                    users = realm.users.len(),
                    "Loaded realm fixture"
                );
                Ok(realm)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Self::new(realms)
    }

    pub fn len(&self) -> usize {
        self.realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }

    pub fn realms(&self) -> &[Realm] {
        &self.realms
    }

    /// Deterministic worker -> realm assignment (`worker_id mod realm_count`).
    /// Several workers share a realm when there are more workers than realms.
    pub fn realm_for_worker(&self, worker_id: usize) -> &Realm {
        &self.realms[worker_id % self.realms.len()]
    }
}

/// Picks a random client of the realm.
pub fn pick_client<'a, R: Rng + ?Sized>(realm: &'a Realm, rng: &mut R) -> Option<&'a Client> {
    realm.clients.choose(rng)
}

/// Picks a random user of the realm.
pub fn pick_user<'a, R: Rng + ?Sized>(realm: &'a Realm, rng: &mut R) -> Option<&'a User> {
    realm.users.choose(rng)
}

fn validate(realm: &Realm) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidRealm {
        realm: realm.id.clone(),
        reason,
    };

    if realm.clients.is_empty() {
        return Err(invalid("no clients".into()));
    }
    if realm.users.is_empty() {
        return Err(invalid("no users".into()));
    }
    if let Some(client) = realm.clients.iter().find(|c| c.redirect_uri().is_none()) {
        return Err(invalid(format!(
            "client '{}' has no redirect URI",
            client.client_id
        )));
    }
    if let Some(user) = realm.users.iter().find(|u| u.password().is_none()) {
        return Err(invalid(format!("user '{}' has no credentials", user.username)));
    }
    Ok(())
}
