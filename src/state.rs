use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// Maximum allowed size for the ledger file to prevent DoS attacks (10MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const MAX_ENTRIES: usize = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Failed to read ledger {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Ledger {0} is corrupt: {1}")]
    Corrupt(PathBuf, String),
    #[error("Failed to write ledger {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("Ledger {0} is full: {1}")]
    Full(PathBuf, String),
    #[error("Ledger {0} is locked by another run (remove {1} if no run is active)")]
    Locked(PathBuf, PathBuf),
}

/// Identifies one occurrence of an event: recurring or rescheduled
/// instances get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub uid: String,
    pub occurrence: NaiveDateTime,
}

impl LedgerKey {
    pub fn new(uid: Option<&str>, occurrence: NaiveDateTime) -> Self {
        Self { uid: uid.unwrap_or_default().to_string(), occurrence }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.uid, self.occurrence.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// At-most-once record of surfaced occurrences. A key moves from unseen to
/// notified and never back.
pub trait NotificationLedger {
    fn has_notified(&self, key: &LedgerKey) -> bool;
    fn mark_notified(&mut self, key: &LedgerKey) -> Result<(), LedgerError>;
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
struct LedgerState {
    #[serde(default)]
    briefed: Vec<String>,
}

impl LedgerState {
    fn contains(&self, key: &str) -> bool {
        self.briefed.iter().any(|k| k == key)
    }
}

/// Ledger that lives only for the current process.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: LedgerState,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.state.briefed
    }
}

impl NotificationLedger for MemoryLedger {
    fn has_notified(&self, key: &LedgerKey) -> bool {
        self.state.contains(&key.to_string())
    }

    fn mark_notified(&mut self, key: &LedgerKey) -> Result<(), LedgerError> {
        let key = key.to_string();
        if !self.state.contains(&key) {
            self.state.briefed.push(key);
        }
        Ok(())
    }
}

/// JSON-file ledger, `{"briefed": [...]}`. Loaded in full on open and
/// rewritten on every new mark.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    state: LedgerState,
}

impl FileLedger {
    /// Open the ledger, starting empty if the file does not exist yet. Any
    /// other problem with the file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let state = if path.exists() { Self::load(&path)? } else { LedgerState::default() };
        log::debug!("Opened ledger {} with {} entries", path.display(), state.briefed.len());
        Ok(Self { path, state })
    }

    fn load(path: &Path) -> Result<LedgerState, LedgerError> {
        // Check file size before loading to prevent DoS attacks
        let metadata = fs::metadata(path).map_err(|e| LedgerError::Read(path.to_path_buf(), e))?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(LedgerError::Corrupt(path.to_path_buf(), "file size exceeds security limits".to_string()));
        }

        let file = File::open(path).map_err(|e| LedgerError::Read(path.to_path_buf(), e))?;
        let state: LedgerState = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LedgerError::Corrupt(path.to_path_buf(), e.to_string()))?;

        if state.briefed.len() > MAX_ENTRIES {
            return Err(LedgerError::Corrupt(path.to_path_buf(), format!("too many entries (maximum {})", MAX_ENTRIES)));
        }
        Ok(state)
    }

    fn save(&self) -> Result<(), LedgerError> {
        let write_err = |e: std::io::Error| LedgerError::Write(self.path.clone(), e);

        let content = serde_json::to_vec_pretty(&self.state).map_err(|e| write_err(std::io::Error::other(e)))?;
        // Never write a file that load would refuse
        if content.len() as u64 > MAX_FILE_SIZE {
            return Err(LedgerError::Full(self.path.clone(), format!("file would exceed {} bytes", MAX_FILE_SIZE)));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Write next to the ledger and rename, so readers never see a partial file
        let tmp_path = sibling(&self.path, "tmp");
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(&tmp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&content).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(write_err)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.state.briefed
    }
}

impl NotificationLedger for FileLedger {
    fn has_notified(&self, key: &LedgerKey) -> bool {
        self.state.contains(&key.to_string())
    }

    fn mark_notified(&mut self, key: &LedgerKey) -> Result<(), LedgerError> {
        let key = key.to_string();
        if self.state.contains(&key) {
            return Ok(());
        }
        if self.state.briefed.len() >= MAX_ENTRIES {
            return Err(LedgerError::Full(self.path.clone(), format!("{} entries recorded", MAX_ENTRIES)));
        }
        self.state.briefed.push(key);
        if let Err(e) = self.save() {
            self.state.briefed.pop();
            return Err(e);
        }
        Ok(())
    }
}

/// Exclusive `<ledger>.lock` file held across a check-and-mark cycle.
/// Released when dropped. The file holds the owner's PID, and a lock whose
/// owner is no longer running is taken over.
#[derive(Debug)]
pub struct LedgerLock {
    path: PathBuf,
}

impl LedgerLock {
    pub fn acquire(ledger_path: &Path) -> Result<Self, LedgerError> {
        let path = sibling(ledger_path, "lock");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Write(path.clone(), e))?;
        }

        match Self::create(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            result => return result.map_err(|e| LedgerError::Write(path.clone(), e)),
        }

        if !is_stale(&path) {
            return Err(LedgerError::Locked(ledger_path.to_path_buf(), path));
        }
        log::warn!("Removing stale ledger lock {}", path.display());
        match fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(LedgerError::Write(path, e)),
            _ => {}
        }

        match Self::create(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(LedgerError::Locked(ledger_path.to_path_buf(), path))
            }
            result => result.map_err(|e| LedgerError::Write(path.clone(), e)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let lock = Self { path: path.to_path_buf() };
        writeln!(file, "{}", std::process::id())?;
        Ok(lock)
    }
}

/// A lock is stale when it names a process that is no longer running. An
/// unreadable or empty lock file is treated as held.
fn is_stale(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    match content.trim().parse::<u32>() {
        Ok(pid) => !process_alive(pid),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // Signal 0 only checks that the process exists
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove ledger lock {}: {}", self.path.display(), e);
        }
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}
