use crate::errors::SchedlogError;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, SchedlogError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), SchedlogError>;
    fn append_line(&self, path: &Path, line: &str) -> Result<(), SchedlogError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), SchedlogError>;
    fn exists(&self, path: &Path) -> bool;
}

pub trait Terminal: Send + Sync {
    fn write_line(&self, line: &str) -> Result<(), SchedlogError>;
    /// Writes every line or none of them.
    fn write_lines(&self, lines: &[String]) -> Result<(), SchedlogError>;
}

pub struct ProductionClock;

impl Clock for ProductionClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, SchedlogError> {
        std::fs::read_to_string(path)
            .map_err(|e| SchedlogError::Io(format!("{}: {e}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), SchedlogError> {
        std::fs::write(path, contents)
            .map_err(|e| SchedlogError::Io(format!("{}: {e}", path.display())))
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<(), SchedlogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SchedlogError::Io(format!("{}: {e}", path.display())))?;
        writeln!(file, "{line}").map_err(|e| SchedlogError::Io(e.to_string()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), SchedlogError> {
        std::fs::create_dir_all(path).map_err(|e| SchedlogError::Io(e.to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn write_line(&self, line: &str) -> Result<(), SchedlogError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|e| SchedlogError::Io(e.to_string()))
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), SchedlogError> {
        let mut text = lines.join("\n");
        if !lines.is_empty() {
            text.push('\n');
        }
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| SchedlogError::Io(e.to_string()))
    }
}

/// Collaborators handed to the logger and the CLI instead of process globals.
#[derive(Clone)]
pub struct ProductionRuntime {
    pub clock: Arc<dyn Clock>,
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(ProductionClock),
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

// Test doubles recover from poisoning so one failed assertion does not cascade.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clock under test control. With a tick, every reading advances time by it.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<SystemTime>>,
    tick: Duration,
}

impl FakeClock {
    pub fn new(now: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            tick: Duration::ZERO,
        }
    }

    pub fn ticking(tick: Duration) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        let mut now = lock(&self.now);
        let reading = *now;
        *now += self.tick;
        reading
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<SchedlogError>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        lock(&fs.files).insert(path.into(), contents.into());
        fs
    }

    pub fn set_fail_next(&self, error: SchedlogError) {
        *lock(&self.fail_next) = Some(error);
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        lock(&self.files).get(path).cloned()
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        lock(&self.dirs).clone()
    }

    fn maybe_fail(&self) -> Result<(), SchedlogError> {
        match lock(&self.fail_next).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, SchedlogError> {
        self.maybe_fail()?;
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| SchedlogError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), SchedlogError> {
        self.maybe_fail()?;
        lock(&self.files).insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<(), SchedlogError> {
        self.maybe_fail()?;
        let mut files = lock(&self.files);
        let entry = files.entry(path.to_path_buf()).or_default();
        entry.push_str(line);
        entry.push('\n');
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), SchedlogError> {
        self.maybe_fail()?;
        lock(&self.dirs).push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        lock(&self.files).contains_key(path)
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    writes: Arc<Mutex<Vec<String>>>,
    fail_next: Arc<Mutex<Option<SchedlogError>>>,
}

impl FakeTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_next(&self, error: SchedlogError) {
        *lock(&self.fail_next) = Some(error);
    }

    pub fn written_lines(&self) -> Vec<String> {
        lock(&self.writes).clone()
    }
}

impl Terminal for FakeTerminal {
    fn write_line(&self, line: &str) -> Result<(), SchedlogError> {
        self.write_lines(&[line.to_string()])
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), SchedlogError> {
        if let Some(err) = lock(&self.fail_next).take() {
            return Err(err);
        }
        lock(&self.writes).extend_from_slice(lines);
        Ok(())
    }
}
