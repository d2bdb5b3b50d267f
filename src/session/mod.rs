//! Locally persisted authentication state.
//!
//! The token and the user profile are one serialized document: they are
//! written and cleared together, never one without the other. Components
//! that care about auth changes subscribe to the watch channel instead of
//! polling the file.

use anyhow::{Context, Result};
use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

pub struct SessionStore {
    path: PathBuf,
    current: ArcSwapOption<Session>,
    tx: watch::Sender<Option<Arc<Session>>>,
}

impl SessionStore {
    /// Open the store, reading any previously persisted session.
    ///
    /// A missing file means signed out. An unreadable or corrupt file is
    /// cleared and the store starts signed out.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir: {}", data_dir.display()))?;
        let path = data_dir.join(SESSION_FILE);

        let initial = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => Some(Arc::new(session)),
                Err(e) => {
                    warn!("Discarding corrupt session file: {}", e);
                    let _ = std::fs::remove_file(&path);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Discarding unreadable session file: {}", e);
                let _ = std::fs::remove_file(&path);
                None
            }
        };

        let (tx, _) = watch::channel(initial.clone());
        Ok(Self {
            path,
            current: ArcSwapOption::new(initial),
            tx,
        })
    }

    /// Current session, if signed in. Cheap enough to call on every request.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    /// Persist and publish a new session.
    pub fn store(&self, session: Session) -> Result<()> {
        let json = serde_json::to_vec_pretty(&session).context("Failed to serialize session")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;

        // The file holds a bearer token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600));
        }

        let session = Arc::new(session);
        self.current.store(Some(session.clone()));
        let _ = self.tx.send(Some(session));
        Ok(())
    }

    /// Delete the persisted session and publish the signed-out state.
    /// Idempotent.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove session file: {}", e);
            }
        }
        self.current.store(None);
        let _ = self.tx.send(None);
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Session>>> {
        self.tx.subscribe()
    }
}
