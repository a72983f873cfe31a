//! Saving and restoring users and tables.
//!
//! The state file holds two JSON lines: the array of users, then the
//! array of tables. Tables are saved unfiltered, so the file contains
//! every card face and must not be served to clients.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::fs;
use vpoker::{TableManager, TableState, User};

/// State file errors
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state file is missing the {0} line")]
    MissingLine(&'static str),
}

/// Everything the state file holds.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub tables: Vec<TableState>,
}

/// The on-disk copy of the server's state.
#[derive(Clone, Debug)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot`, replacing the previous file only once the new
    /// one is complete.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let mut contents = serde_json::to_vec(&snapshot.users)?;
        contents.push(b'\n');
        serde_json::to_writer(&mut contents, &snapshot.tables)?;
        contents.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &contents).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the file back. A missing file is `Ok(None)`.
    pub async fn load(&self) -> Result<Option<Snapshot>, StateError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut lines = text.lines();
        let users = lines.next().ok_or(StateError::MissingLine("users"))?;
        let tables = lines.next().ok_or(StateError::MissingLine("tables"))?;

        Ok(Some(Snapshot {
            users: serde_json::from_str(users)?,
            tables: serde_json::from_str(tables)?,
        }))
    }

    /// Save everything `manager` knows.
    pub async fn save_from(&self, manager: &TableManager) -> Result<(), StateError> {
        let (users, tables) = manager.snapshot().await;
        let result = self.save(&Snapshot { users, tables }).await;
        crate::metrics::state_saves_total(result.is_ok());
        result
    }

    /// Load the file into `manager`. Returns whether a file was found.
    pub async fn restore_into(&self, manager: &TableManager) -> Result<bool, StateError> {
        match self.load().await? {
            Some(snapshot) => {
                manager.restore(snapshot.users, snapshot.tables).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Save `manager` to `file` every `interval` until the task is dropped.
pub async fn save_loop(file: StateFile, manager: Arc<TableManager>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; nothing has changed yet.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match file.save_from(&manager).await {
            Ok(()) => tracing::debug!(path = %file.path().display(), "State saved"),
            Err(e) => tracing::error!(path = %file.path().display(), error = %e, "State save failed"),
        }
    }
}
