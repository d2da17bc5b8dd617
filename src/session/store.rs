//! Durable key-value store for the session record and auth token
//!
//! Two entries live in one directory: `session.json` and `auth_token`. They
//! are written together on login and removed together on logout.

use super::Session;
use crate::{DisolError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SESSION_FILE: &str = "session.json";
const TOKEN_FILE: &str = "auth_token";

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Read the persisted session, if any
    ///
    /// A corrupt record is treated as absent so a bad file never locks the
    /// user out; it is left on disk until the next login overwrites it.
    pub fn load(&self) -> Result<Option<Session>> {
        let path = self.session_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(DisolError::Storage(format!(
                    "failed to read {}: {err}",
                    path.display()
                )))
            }
        };

        match serde_json::from_slice::<Session>(&data) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!("ignoring unreadable session record {}: {err}", path.display());
                Ok(None)
            }
        }
    }

    pub fn token(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.token_path()) {
            Ok(token) => Ok(Some(token.trim().to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist both entries
    pub fn save(&self, session: &Session, token: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|err| DisolError::Storage(err.to_string()))?;
        write_atomic(&self.session_path(), &bytes)?;
        write_atomic(&self.token_path(), token.as_bytes())?;
        debug!(user_id = session.id, "session persisted");
        Ok(())
    }

    /// Remove both entries; missing files are not an error
    pub fn clear(&self) -> Result<()> {
        for path in [self.session_path(), self.token_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        debug!("session cleared");
        Ok(())
    }
}

fn write_atomic(final_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = final_path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, bytes)?;
    match fs::rename(&tmp_path, final_path) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if final_path.exists() {
                fs::remove_file(final_path)?;
                fs::rename(&tmp_path, final_path)
            } else {
                Err(rename_err)
            }
        }
    }
}
