// src/utils/store.rs
use crate::models::ServiceError;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Teams,
    TeamMembers,
    TeamInvitations,
    Events,
    EventRegistrations,
    Threads,
    ThreadParticipants,
    ThreadMessages,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Users,
        Table::Teams,
        Table::TeamMembers,
        Table::TeamInvitations,
        Table::Events,
        Table::EventRegistrations,
        Table::Threads,
        Table::ThreadParticipants,
        Table::ThreadMessages,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Teams => "teams",
            Table::TeamMembers => "team_members",
            Table::TeamInvitations => "team_invitations",
            Table::Events => "events",
            Table::EventRegistrations => "event_registrations",
            Table::Threads => "threads",
            Table::ThreadParticipants => "thread_participants",
            Table::ThreadMessages => "thread_messages",
        }
    }
}

/// JSON document store: one directory per table, one file per record.
///
/// Every mutating service call holds a [`Transaction`] for its whole
/// read-check-write sequence, so mutations are serialized against each other.
/// Writes made while a transaction is open are journaled and undone unless the
/// transaction is committed.
pub struct Store {
    root: PathBuf,
    write_lock: Mutex<()>,
    journal: Mutex<Option<Vec<Undo>>>,
}

// Prior content of a record touched inside a transaction; `None` if it did not exist
struct Undo {
    path: PathBuf,
    previous: Option<String>,
}

/// Exclusive write access to the store. Dropping it without calling
/// [`Transaction::commit`] restores every record written through the store
/// since it was opened.
pub struct Transaction<'a> {
    store: &'a Store,
    committed: bool,
    _guard: MutexGuard<'a, ()>,
}

impl Transaction<'_> {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        let entries = self.store.close_journal();
        if !self.committed && !entries.is_empty() {
            self.store.roll_back(entries);
        }
    }
}

impl Store {
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();

        for table in Table::ALL {
            let dir = root.join(table.dir_name());
            if !dir.exists() {
                info!("Creating {} directory", table.dir_name());
                fs::create_dir_all(&dir)?;
            }
        }

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            journal: Mutex::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn transaction(&self) -> Result<Transaction<'_>, ServiceError> {
        let guard = self.write_lock.lock().map_err(|e| {
            error!("Store lock poisoned: {:?}", e);
            ServiceError::InternalServerError
        })?;
        *self.journal_slot() = Some(Vec::new());

        Ok(Transaction {
            store: self,
            committed: false,
            _guard: guard,
        })
    }

    fn journal_slot(&self) -> MutexGuard<'_, Option<Vec<Undo>>> {
        // The journal holds plain data, a poisoned lock leaves it usable
        self.journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn close_journal(&self) -> Vec<Undo> {
        self.journal_slot().take().unwrap_or_default()
    }

    // Record the current content of `path` the first time a transaction touches it
    fn remember(&self, path: &Path) -> Result<(), ServiceError> {
        let mut slot = self.journal_slot();
        let entries = match slot.as_mut() {
            Some(entries) => entries,
            None => return Ok(()),
        };
        if entries.iter().any(|undo| undo.path == path) {
            return Ok(());
        }

        let previous = if path.exists() {
            Some(fs::read_to_string(path).map_err(|e| {
                error!("Failed to snapshot {}: {:?}", path.display(), e);
                ServiceError::InternalServerError
            })?)
        } else {
            None
        };
        entries.push(Undo {
            path: path.to_path_buf(),
            previous,
        });
        Ok(())
    }

    fn roll_back(&self, entries: Vec<Undo>) {
        warn!("Rolling back {} record(s)", entries.len());
        for undo in entries.into_iter().rev() {
            let restored = match &undo.previous {
                Some(content) => write_atomically(&undo.path, content),
                None if undo.path.exists() => fs::remove_file(&undo.path),
                None => Ok(()),
            };
            if let Err(e) = restored {
                error!("Failed to restore {}: {:?}", undo.path.display(), e);
            }
        }
    }

    // Ids are UUIDs; anything else never maps to a file
    fn record_path(&self, table: Table, id: &str) -> Option<PathBuf> {
        Uuid::parse_str(id).ok()?;
        Some(self.root.join(table.dir_name()).join(format!("{}.json", id)))
    }

    pub fn put<T: Serialize>(&self, table: Table, id: &str, record: &T) -> Result<(), ServiceError> {
        let path = self.record_path(table, id).ok_or_else(|| {
            error!("Refusing to store {} record with invalid id: {}", table.dir_name(), id);
            ServiceError::InternalServerError
        })?;

        let json = serde_json::to_string_pretty(record).map_err(|e| {
            error!("Failed to serialize {} record: {:?}", table.dir_name(), e);
            ServiceError::InternalServerError
        })?;

        self.remember(&path)?;
        write_atomically(&path, &json).map_err(|e| {
            error!("Failed to write {} record: {:?}", table.dir_name(), e);
            ServiceError::InternalServerError
        })?;

        debug!("Saved {} record: {}", table.dir_name(), id);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, table: Table, id: &str) -> Result<Option<T>, ServiceError> {
        let path = match self.record_path(table, id) {
            Some(path) => path,
            None => return Ok(None),
        };

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {} record: {:?}", table.dir_name(), e);
            ServiceError::InternalServerError
        })?;

        let record = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse {} record {}: {:?}", table.dir_name(), id, e);
            ServiceError::InternalServerError
        })?;

        Ok(Some(record))
    }

    pub fn delete(&self, table: Table, id: &str) -> Result<bool, ServiceError> {
        let path = match self.record_path(table, id) {
            Some(path) => path,
            None => return Ok(false),
        };

        if !path.exists() {
            return Ok(false);
        }

        self.remember(&path)?;
        fs::remove_file(&path).map_err(|e| {
            error!("Failed to delete {} record: {:?}", table.dir_name(), e);
            ServiceError::InternalServerError
        })?;

        debug!("Deleted {} record: {}", table.dir_name(), id);
        Ok(true)
    }

    // Full scan of a table, keeping the records the predicate accepts
    pub fn find_all<T, F>(&self, table: Table, mut predicate: F) -> Result<Vec<T>, ServiceError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let dir = self.root.join(table.dir_name());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            error!("Failed to read {} directory: {:?}", table.dir_name(), e);
            ServiceError::InternalServerError
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Failed to read directory entry: {:?}", e);
                ServiceError::InternalServerError
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            // A record may be deleted between listing and reading
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    error!("Failed to read {} record: {:?}", table.dir_name(), e);
                    return Err(ServiceError::InternalServerError);
                }
            };

            let record: T = match serde_json::from_str(&content) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable {} record {:?}: {:?}", table.dir_name(), path, e);
                    continue;
                }
            };

            if predicate(&record) {
                records.push(record);
            }
        }

        Ok(records)
    }

    pub fn find_one<T, F>(&self, table: Table, predicate: F) -> Result<Option<T>, ServiceError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        Ok(self.find_all(table, predicate)?.into_iter().next())
    }
}

// Write then rename so readers never see a half-written document
fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)
}
