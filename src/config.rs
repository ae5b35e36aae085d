//! Default endpoint/database configuration.
//!
//! Two sources, checked by `BwQuery` when neither value is passed
//! explicitly:
//!
//! - a process-wide stack of [`Defaults`] frames for library users.
//!   [`install`] pushes a frame and returns a guard; the frame pops when
//!   the guard drops, so resolution after a scope exits is exactly what it
//!   was before the scope was entered. Frames must be dropped in LIFO
//!   order, which scoped guards give for free.
//! - a `.bookworm.json` file in the current directory for the CLI.
//!
//! Resolution scans from the innermost frame outward; the first frame
//! carrying a value wins, so nested scopes may shadow a single key while
//! inheriting the rest.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// One frame of default settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    pub endpoint: Option<String>,
    pub database: Option<String>,
}

static STACK: Mutex<Vec<Defaults>> = Mutex::new(Vec::new());

fn stack() -> MutexGuard<'static, Vec<Defaults>> {
    // A panic while holding the lock cannot corrupt a Vec of frames.
    STACK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Install a defaults frame for the lifetime of the returned guard.
#[must_use = "the defaults frame pops as soon as the guard is dropped"]
pub fn install(defaults: Defaults) -> DefaultsGuard {
    stack().push(defaults);
    DefaultsGuard { _priv: () }
}

/// Pops its frame on drop.
pub struct DefaultsGuard {
    _priv: (),
}

impl Drop for DefaultsGuard {
    fn drop(&mut self) {
        stack().pop();
    }
}

/// Innermost installed endpoint, if any.
pub fn default_endpoint() -> Option<String> {
    stack().iter().rev().find_map(|d| d.endpoint.clone())
}

/// Innermost installed database, if any.
pub fn default_database() -> Option<String> {
    stack().iter().rev().find_map(|d| d.database.clone())
}

/// `.bookworm.json` contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    pub database: Option<String>,
}

impl ConfigFile {
    /// Load `.bookworm.json` from the current directory.
    ///
    /// A missing file is not an error (`Ok(None)`): the CLI may be fully
    /// configured through flags or installed defaults. Unreadable or
    /// invalid JSON is an error.
    pub fn load() -> Result<Option<Self>, Box<dyn Error>> {
        let config_path = PathBuf::from(".bookworm.json");

        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read .bookworm.json: {}", e))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in .bookworm.json: {}", e))?;

        Ok(Some(config))
    }
}
