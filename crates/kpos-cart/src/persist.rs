//! Cart persistence keyed by session id.
//!
//! The engine itself only mutates a `&mut Cart`; where carts live between
//! requests is the store's concern. Two stores ship here: an in-process map
//! and a directory of JSON files (one file per session, written via a temp
//! file + rename so a crash never leaves a half-written cart).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::types::Cart;

#[derive(Debug)]
pub enum PersistError {
    /// Session ids are used as file names; only `[A-Za-z0-9_-]` is allowed.
    InvalidSessionId(String),
    Io { path: PathBuf, detail: String },
    Corrupt { path: PathBuf, detail: String },
    /// A previous holder of the store lock panicked.
    Poisoned,
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::InvalidSessionId(id) => write!(f, "invalid session id '{id}'"),
            PersistError::Io { path, detail } => {
                write!(f, "cart store io error at {}: {detail}", path.display())
            }
            PersistError::Corrupt { path, detail } => {
                write!(f, "corrupt cart file {}: {detail}", path.display())
            }
            PersistError::Poisoned => write!(f, "cart store lock poisoned"),
        }
    }
}

impl std::error::Error for PersistError {}

/// Where carts live between requests.
pub trait CartStore {
    fn save(&self, session_id: &str, cart: &Cart) -> Result<(), PersistError>;
    /// `Ok(None)` when the session has no stored cart.
    fn load(&self, session_id: &str) -> Result<Option<Cart>, PersistError>;
    /// Removing an unknown session is not an error.
    fn remove(&self, session_id: &str) -> Result<(), PersistError>;
}

pub fn validate_session_id(session_id: &str) -> Result<(), PersistError> {
    let ok = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(PersistError::InvalidSessionId(session_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MemoryCartStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: Mutex<HashMap<String, Cart>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for MemoryCartStore {
    fn save(&self, session_id: &str, cart: &Cart) -> Result<(), PersistError> {
        validate_session_id(session_id)?;
        let mut g = self.carts.lock().map_err(|_| PersistError::Poisoned)?;
        g.insert(session_id.to_string(), cart.clone());
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<Cart>, PersistError> {
        validate_session_id(session_id)?;
        let g = self.carts.lock().map_err(|_| PersistError::Poisoned)?;
        Ok(g.get(session_id).cloned())
    }

    fn remove(&self, session_id: &str) -> Result<(), PersistError> {
        validate_session_id(session_id)?;
        let mut g = self.carts.lock().map_err(|_| PersistError::Poisoned)?;
        g.remove(session_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileCartStore
// ---------------------------------------------------------------------------

/// One `<session_id>.json` per cart under `dir`.
#[derive(Clone, Debug)]
pub struct JsonFileCartStore {
    dir: PathBuf,
}

impl JsonFileCartStore {
    /// Creates `dir` if it does not exist.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| PersistError::Io {
            path: dir.clone(),
            detail: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, PersistError> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{session_id}.json")))
    }
}

fn io_err(path: &Path, e: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

impl CartStore for JsonFileCartStore {
    fn save(&self, session_id: &str, cart: &Cart) -> Result<(), PersistError> {
        let path = self.path_for(session_id)?;
        let tmp = self.dir.join(format!(".{session_id}.json.tmp"));
        let body = serde_json::to_vec_pretty(cart).map_err(|e| PersistError::Corrupt {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        fs::write(&tmp, body).map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        debug!(session_id, path = %path.display(), "cart saved");
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<Cart>, PersistError> {
        let path = self.path_for(session_id)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path, e)),
        };
        let cart = serde_json::from_slice(&raw).map_err(|e| PersistError::Corrupt {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        Ok(Some(cart))
    }

    fn remove(&self, session_id: &str) -> Result<(), PersistError> {
        let path = self.path_for(session_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }
}
