use crate::config::LoggerConfig;
use crate::errors::SchedlogError;
use crate::labels::{format_elapsed_seconds, LabelSet, LogRecord, NO_EVENT_LOOP_TASK};
use crate::log_sorter::ScheduleBasedLogSorter;
use crate::logging::JsonlLogger;
use crate::runtime::{Clock, ProductionRuntime, Terminal};
use crate::scheduling::current_unit;
use crate::types::LogLevel;
use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

pub struct Logger {
    config: LoggerConfig,
    started_at: SystemTime,
    clock: Arc<dyn Clock>,
    terminal: Arc<dyn Terminal>,
    sink: Option<JsonlLogger>,
    buffer: Mutex<Vec<LogRecord>>,
}

impl Logger {
    pub fn new(config: LoggerConfig, runtime: &ProductionRuntime) -> Self {
        let sink = config
            .log_file
            .as_ref()
            .map(|path| JsonlLogger::new(path, Arc::clone(&runtime.file_system)));
        Self {
            started_at: runtime.clock.now(),
            clock: Arc::clone(&runtime.clock),
            terminal: Arc::clone(&runtime.terminal),
            sink,
            buffer: Mutex::new(Vec::new()),
            config,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock
            .now()
            .duration_since(self.started_at)
            .unwrap_or_default()
    }

    pub fn snapshot_runtime_context(&self, caller: &Location<'_>) -> LabelSet {
        let unit = current_unit();
        let thread = std::thread::current();
        let thread_name = thread
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", thread.id()));

        LabelSet {
            scheduling_context: unit.as_ref().and_then(|u| u.scheduling_context.clone()),
            timestamp: format_elapsed_seconds(self.elapsed()),
            thread: thread_name,
            task: unit.map_or_else(|| NO_EVENT_LOOP_TASK.to_string(), |u| u.name),
            source: source_location(caller),
        }
    }

    #[track_caller]
    pub fn log(&self, message: &str, level: LogLevel) -> Result<(), SchedlogError> {
        if !level.is_active(self.config.activation_level) {
            return Ok(());
        }
        let labels = self.snapshot_runtime_context(Location::caller());
        self.tee(LogRecord::new(self.unclutter(message), labels))
    }

    #[track_caller]
    pub fn info(&self, message: &str) -> Result<(), SchedlogError> {
        self.log(message, LogLevel::Info)
    }

    #[track_caller]
    pub fn detailed(&self, message: &str) -> Result<(), SchedlogError> {
        self.log(message, LogLevel::Detailed)
    }

    #[track_caller]
    pub fn debug(&self, message: &str) -> Result<(), SchedlogError> {
        self.log(message, LogLevel::Debug)
    }

    pub fn unclutter(&self, message: &str) -> String {
        self.config
            .unclutter
            .iter()
            .fold(message.to_string(), |text, (needle, replacement)| {
                text.replace(needle.as_str(), replacement)
            })
    }

    fn tee(&self, record: LogRecord) -> Result<(), SchedlogError> {
        if let Some(sink) = &self.sink {
            sink.append(&record)?;
        }
        if self.config.schedule_based_logging {
            self.lock_buffer()?.push(record);
            Ok(())
        } else {
            self.terminal.write_line(&format_immediate_line(&record))
        }
    }

    /// Prints the buffered batch in scheduling order and starts a new batch.
    /// A batch that fails to sort or print stays buffered, and nothing of it
    /// reaches the terminal.
    pub fn flush(&self) -> Result<(), SchedlogError> {
        if !self.config.schedule_based_logging {
            return Err(SchedlogError::Logger(
                "flush requires schedule_based_logging = true".to_string(),
            ));
        }
        let mut buffer = self.lock_buffer()?;
        let lines = ScheduleBasedLogSorter::new(&buffer)?.sort()?;

        let mut output = Vec::with_capacity(lines.len() + 1);
        output.push(String::new());
        output.extend(lines);
        self.terminal.write_lines(&output)?;
        buffer.clear();
        Ok(())
    }

    pub fn buffered_len(&self) -> Result<usize, SchedlogError> {
        Ok(self.lock_buffer()?.len())
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.sink.as_ref().map(|sink| sink.path.as_path())
    }

    fn lock_buffer(&self) -> Result<MutexGuard<'_, Vec<LogRecord>>, SchedlogError> {
        self.buffer
            .lock()
            .map_err(|_| SchedlogError::Logger("log buffer lock poisoned".to_string()))
    }
}

pub fn source_location(caller: &Location<'_>) -> String {
    let file = Path::new(caller.file())
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("<source location undetermined>");
    format!("{file}:{}", caller.line())
}

/// Execution-order rendering used when schedule-based logging is off.
pub fn format_immediate_line(record: &LogRecord) -> String {
    let labels = &record.labels;
    let mut prefix = format!(
        "\n[{} - {} - {} - {}]",
        labels.timestamp, labels.thread, labels.task, labels.source
    );
    if let Some(ctx) = labels.parent() {
        prefix.push_str(&format!(
            "<<[{} - {} - {} - {}]",
            ctx.timestamp, ctx.thread, ctx.task, ctx.source
        ));
    }
    format!("{prefix}\t{}", record.message)
}
