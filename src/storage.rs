//! Durable storage for the logged-in user's credentials.
//!
//! A persisted record holds two string entries, the bearer token and a
//! serialized snapshot of the user it belongs to. Stores always write or
//! remove both entries together.

use crate::Session;
use parking_lot::Mutex;
use serde_derive::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Somewhere a [`Session`] can survive between runs.
pub trait CredentialStore: Send + Sync {
    /// Read the persisted session, if there is one.
    fn load(&self) -> Result<Option<Session>, StorageError>;

    /// Persist a session, replacing whatever was there before.
    fn save(&self, session: &Session) -> Result<(), StorageError>;

    /// Remove the persisted session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StorageError>;

    /// Just the bearer token.
    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.map(|session| session.token))
    }
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn load(&self) -> Result<Option<Session>, StorageError> { (**self).load() }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), StorageError> { (**self).clear() }

    fn token(&self) -> Result<Option<String>, StorageError> {
        (**self).token()
    }
}

/// Errors that may occur while reading or writing persisted credentials.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unable to access the credential store")]
    Io(#[from] io::Error),
    #[error("Unable to encode or decode the stored credentials")]
    Encoding(#[from] serde_json::Error),
    /// Only one of the two entries was found.
    #[error("The stored credentials are incomplete")]
    Incomplete,
}

/// The on-disk layout, two string entries which are both present or both
/// absent.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

impl Record {
    fn encode(session: &Session) -> Result<Record, StorageError> {
        Ok(Record {
            token: Some(session.token.clone()),
            user: Some(serde_json::to_string(&session.user)?),
        })
    }

    fn decode(self) -> Result<Option<Session>, StorageError> {
        match (self.token, self.user) {
            (Some(token), Some(user)) => {
                let user = serde_json::from_str(&user)?;
                Ok(Some(Session::new(user, token)))
            },
            (None, None) => Ok(None),
            _ => Err(StorageError::Incomplete),
        }
    }
}

/// A [`CredentialStore`] which only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Record>,
}

impl MemoryStore {
    pub fn new() -> Self { MemoryStore::default() }

    /// Create a store which already holds a session, as if it was saved by a
    /// previous run.
    pub fn with_session(session: &Session) -> Result<Self, StorageError> {
        Ok(MemoryStore {
            record: Mutex::new(Record::encode(session)?),
        })
    }

    /// Does the store hold neither entry?
    pub fn is_empty(&self) -> bool {
        let record = self.record.lock();
        record.token.is_none() && record.user.is_none()
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        self.record.lock().clone().decode()
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        let record = Record::encode(session)?;
        *self.record.lock() = record;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.record.lock() = Record::default();
        Ok(())
    }

    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.record.lock().token.clone())
    }
}

/// A [`CredentialStore`] backed by a JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// original, so readers see either the old record or the new one.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<Record, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Record::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        log::trace!("Loading credentials from {}", self.path.display());
        self.read()?.decode()
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        let record = Record::encode(session)?;
        let temporary = self.temporary_path();

        log::debug!("Saving credentials to {}", self.path.display());
        fs::write(&temporary, serde_json::to_vec_pretty(&record)?)?;
        fs::rename(&temporary, &self.path)?;

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("Removed {}", self.path.display());
                Ok(())
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.token)
    }
}
