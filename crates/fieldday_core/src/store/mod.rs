//! Versioned, write-behind persistence for the four storage units.
//!
//! # Responsibility
//! - Wrap each persisted collection as `{schemaVersion, data}`.
//! - Load with graceful fallback: current payload, drifted payload, legacy
//!   unwrapped payload, then the type default.
//! - Hand writes to a background writer thread so callers never block on I/O.
//!
//! # Invariants
//! - A unit whose version differs from `SCHEMA_VERSION` (or fails to decode)
//!   is copied to `<key>.backup` before any compatibility attempt.
//! - Writes are applied in submission order, each as one atomic replace.
//! - Read and write failures are logged and absorbed; loads never fail.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::medal::{merge_with_catalog, FieldMedal};
use crate::repo::unit_repo::{RepoError, SqliteUnitRepository, UnitRepository};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Payload schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const WRITER_THREAD_NAME: &str = "fieldday-store-writer";

/// One independently persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageUnit {
    Zones,
    FieldDays,
    Config,
    Medals,
}

impl StorageUnit {
    pub const ALL: [StorageUnit; 4] = [
        StorageUnit::Zones,
        StorageUnit::FieldDays,
        StorageUnit::Config,
        StorageUnit::Medals,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Zones => "zones",
            Self::FieldDays => "field_days",
            Self::Config => "config",
            Self::Medals => "medals",
        }
    }

    pub fn backup_key(self) -> String {
        format!("{}.backup", self.key())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while opening a store.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    /// Writer thread could not be spawned.
    Spawn(std::io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start store writer: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    data: serde_json::Value,
}

/// Outcome of decoding one raw unit.
#[derive(Debug)]
enum Decoded<T> {
    /// Envelope at `SCHEMA_VERSION` with a decodable payload.
    Current(T),
    /// Anything else; `value` is the best-effort decode, if any.
    Drifted {
        found_version: Option<u32>,
        value: Option<T>,
    },
}

fn decode_unit<T: DeserializeOwned>(raw: &str) -> Decoded<T> {
    match serde_json::from_str::<EnvelopeIn>(raw) {
        Ok(envelope) => {
            let found_version = Some(envelope.schema_version);
            match serde_json::from_value::<T>(envelope.data) {
                Ok(value) if envelope.schema_version == SCHEMA_VERSION => Decoded::Current(value),
                Ok(value) => Decoded::Drifted {
                    found_version,
                    value: Some(value),
                },
                Err(_) => Decoded::Drifted {
                    found_version,
                    value: serde_json::from_str::<T>(raw).ok(),
                },
            }
        }
        Err(_) => Decoded::Drifted {
            found_version: None,
            value: serde_json::from_str::<T>(raw).ok(),
        },
    }
}

enum WriteCommand {
    Write { unit_key: String, payload: String },
    Delete { unit_key: String },
    Flush(Sender<()>),
}

type SharedRepo = Arc<Mutex<Box<dyn UnitRepository>>>;

/// Versioned persistence store with a background writer.
pub struct PersistenceStore {
    repo: SharedRepo,
    sender: Option<Sender<WriteCommand>>,
    writer: Option<JoinHandle<()>>,
}

impl PersistenceStore {
    /// Creates a store over any unit repository and starts its writer.
    pub fn new(repo: Box<dyn UnitRepository>) -> StoreResult<Self> {
        let repo: SharedRepo = Arc::new(Mutex::new(repo));
        let (sender, receiver) = mpsc::channel();
        let writer_repo = Arc::clone(&repo);
        let writer = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(writer_repo, receiver))
            .map_err(StoreError::Spawn)?;

        Ok(Self {
            repo,
            sender: Some(sender),
            writer: Some(writer),
        })
    }

    /// Opens (or creates) a SQLite-backed store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_db(path)?;
        Self::new(Box::new(SqliteUnitRepository::try_new(conn)?))
    }

    /// Opens a store over a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Self::new(Box::new(SqliteUnitRepository::try_new(conn)?))
    }

    /// Loads one unit, falling back to `T::default()` on any failure.
    ///
    /// # Side effects
    /// - Writes `<key>.backup` synchronously when the stored unit drifted.
    pub fn load<T: DeserializeOwned + Default>(&self, unit: StorageUnit) -> T {
        let raw = match self.with_repo(|repo| repo.read_unit(unit.key())) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(
                    "event=store_load module=store status=absent unit={}",
                    unit.key()
                );
                return T::default();
            }
            Err(err) => {
                warn!(
                    "event=store_load module=store status=error unit={} error={}",
                    unit.key(),
                    err
                );
                return T::default();
            }
        };

        match decode_unit::<T>(&raw) {
            Decoded::Current(value) => {
                debug!("event=store_load module=store status=ok unit={}", unit.key());
                value
            }
            Decoded::Drifted {
                found_version,
                value,
            } => {
                self.backup_raw(unit, &raw);
                let found = found_version.map_or_else(|| "none".to_string(), |v| v.to_string());
                match value {
                    Some(value) => {
                        info!(
                            "event=store_load module=store status=drift unit={} found_version={} current_version={}",
                            unit.key(),
                            found,
                            SCHEMA_VERSION
                        );
                        value
                    }
                    None => {
                        warn!(
                            "event=store_load module=store status=fallback unit={} found_version={} current_version={}",
                            unit.key(),
                            found,
                            SCHEMA_VERSION
                        );
                        T::default()
                    }
                }
            }
        }
    }

    /// Loads medals merged against the static catalog.
    pub fn load_medals(&self) -> Vec<FieldMedal> {
        merge_with_catalog(self.load::<Vec<FieldMedal>>(StorageUnit::Medals))
    }

    /// Queues a versioned write of `value`; never blocks on I/O.
    pub fn save<T: Serialize>(&self, unit: StorageUnit, value: &T) {
        let envelope = EnvelopeOut {
            schema_version: SCHEMA_VERSION,
            data: value,
        };
        match serde_json::to_string(&envelope) {
            Ok(payload) => self.submit(WriteCommand::Write {
                unit_key: unit.key().to_string(),
                payload,
            }),
            Err(err) => error!(
                "event=store_save module=store status=error unit={} error_code=encode_failed error={}",
                unit.key(),
                err
            ),
        }
    }

    /// Queues removal of every `.backup` unit.
    pub fn discard_backups(&self) {
        for unit in StorageUnit::ALL {
            self.submit(WriteCommand::Delete {
                unit_key: unit.backup_key(),
            });
        }
    }

    /// Reads the preserved backup of a unit, if any.
    pub fn read_backup(&self, unit: StorageUnit) -> Option<String> {
        self.with_repo(|repo| repo.read_unit(&unit.backup_key()))
            .ok()
            .flatten()
    }

    /// Blocks until every queued write has been applied.
    ///
    /// Returns `false` when the writer is no longer running.
    pub fn flush(&self) -> bool {
        let (ack_sender, ack_receiver) = mpsc::channel();
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        if sender.send(WriteCommand::Flush(ack_sender)).is_err() {
            return false;
        }
        ack_receiver.recv().is_ok()
    }

    fn submit(&self, command: WriteCommand) {
        let delivered = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(command).is_ok());
        if !delivered {
            error!("event=store_save module=store status=error error_code=writer_stopped");
        }
    }

    fn backup_raw(&self, unit: StorageUnit, raw: &str) {
        match self.with_repo(|repo| repo.write_unit(&unit.backup_key(), raw)) {
            Ok(()) => info!(
                "event=store_backup module=store status=ok unit={}",
                unit.key()
            ),
            Err(err) => warn!(
                "event=store_backup module=store status=error unit={} error={}",
                unit.key(),
                err
            ),
        }
    }

    fn with_repo<R>(
        &self,
        f: impl FnOnce(&dyn UnitRepository) -> Result<R, RepoError>,
    ) -> Result<R, RepoError> {
        let guard = self.repo.lock().map_err(|_| RepoError::Poisoned)?;
        f(&**guard)
    }
}

impl Drop for PersistenceStore {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain the queue and exit.
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                error!("event=store_close module=store status=error error_code=writer_panicked");
            }
        }
    }
}

fn run_writer(repo: SharedRepo, receiver: Receiver<WriteCommand>) {
    for command in receiver {
        match command {
            WriteCommand::Write { unit_key, payload } => {
                let result = repo
                    .lock()
                    .map_err(|_| RepoError::Poisoned)
                    .and_then(|guard| guard.write_unit(&unit_key, &payload));
                match result {
                    Ok(()) => debug!(
                        "event=store_save module=store status=ok unit={} bytes={}",
                        unit_key,
                        payload.len()
                    ),
                    Err(err) => error!(
                        "event=store_save module=store status=error unit={} error={}",
                        unit_key, err
                    ),
                }
            }
            WriteCommand::Delete { unit_key } => {
                let result = repo
                    .lock()
                    .map_err(|_| RepoError::Poisoned)
                    .and_then(|guard| guard.delete_unit(&unit_key));
                if let Err(err) = result {
                    error!(
                        "event=store_delete module=store status=error unit={} error={}",
                        unit_key, err
                    );
                }
            }
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
