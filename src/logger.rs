//! Structured logging system with visual formatting.
//!
//! Log lines use Unicode box drawing characters to group related output into
//! blocks. Output can be routed to stdout (the default), stderr, or a file that
//! is written by a dedicated thread. File lines are stamped with the wall
//! clock time in UTC.
//!
//! The clock owns the terminal while it runs, so stdout logging is muted while
//! the alternate screen is active. To watch logs live, point the destination at
//! stderr and redirect it to another terminal:
//!
//! ```text
//! LINEAR_CLOCK_LOG=stderr linear-terminal-clock 2>/dev/pts/18
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::sync::{Mutex, OnceLock};

// Set while the clock face owns the screen
static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

static DESTINATION: Mutex<Destination> = Mutex::new(Destination::Stdout);

// Zone used for simulated timestamps
static DISPLAY_TIMEZONE: OnceLock<chrono_tz::Tz> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Where formatted log lines are written.
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Parse a destination: `stdout`, `stderr`, or anything else as a file path.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            v if v.eq_ignore_ascii_case("stdout") => LogTarget::Stdout,
            v if v.eq_ignore_ascii_case("stderr") => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }

    /// Destination requested through the environment, if any.
    pub fn from_env() -> Option<Self> {
        std::env::var(crate::constants::LOG_DESTINATION_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Self::parse(&v))
    }
}

enum Destination {
    Stdout,
    Stderr,
    File(Sender<LogMessage>),
}

/// Main logging interface providing structured output formatting.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`**: begins a new conceptual block. Prints an empty pipe
///   `┃` for spacing, then `┣ message`.
/// - **`log_decorated!`**: a line inside the current block, `┣ message`.
/// - **`log_indented!`**: nested detail, `┃   message`.
/// - **`log_pipe!`**: a lone `┃` for vertical spacing before a semantic message.
/// - **`log_version!`**: the startup header, `┏ linear-terminal-clock vX.Y.Z ━━╸`.
/// - **`log_end!`**: the final `╹` marker.
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`**:
///   semantic messages with a colored `[LEVEL]` prefix.
/// - **`log_error_exit!`**: an error that ends the flow, `┗[ERROR] message`.
pub struct Log;

impl Log {
    /// Mark whether the alternate screen is showing the clock face.
    pub fn set_screen_active(active: bool) {
        SCREEN_ACTIVE.store(active, Ordering::SeqCst);
    }

    /// Set the zone used to print simulated timestamps. Only the first call wins.
    pub fn set_display_timezone(tz: chrono_tz::Tz) {
        let _ = DISPLAY_TIMEZONE.set(tz);
    }

    /// Route output to the given target.
    ///
    /// File targets spawn a writer thread; keep the returned guard alive until
    /// shutdown so buffered lines are flushed.
    pub fn set_target(target: LogTarget) -> anyhow::Result<Option<LoggerGuard>> {
        let (destination, guard) = match target {
            LogTarget::Stdout => (Destination::Stdout, None),
            LogTarget::Stderr => (Destination::Stderr, None),
            LogTarget::File(path) => {
                let guard = Self::start_file_logging(path)?;
                (Destination::File(guard.tx.clone()), Some(guard))
            }
        };

        let mut current = DESTINATION
            .lock()
            .map_err(|_| anyhow::anyhow!("Log destination lock poisoned"))?;
        *current = destination;
        Ok(guard)
    }

    fn start_file_logging(path: PathBuf) -> anyhow::Result<LoggerGuard> {
        use anyhow::Context;

        // Open up front so a bad path fails before the clock takes the screen
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        let (tx, rx) = channel();
        let handle = std::thread::spawn(move || {
            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for simulation mode, empty otherwise.
    ///
    /// Shows the simulated instant so logs line up with the frames on screen.
    pub fn get_timestamp_prefix() -> String {
        if !(crate::time_source::is_initialized() && crate::time_source::is_simulated()) {
            return String::new();
        }

        let now = crate::time_source::now();
        match DISPLAY_TIMEZONE.get() {
            Some(tz) => format!("[{}] ", now.with_timezone(tz).format("%Y-%m-%d %H:%M:%S")),
            None => format!(
                "[{}] ",
                now.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        if let Ok(mut current) = DESTINATION.lock() {
            *current = Destination::Stdout;
        }
    }
}

// Strips ANSI color sequences (ESC [ ... m) for file output
pub(crate) fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

// One line for the log file: UTC timestamp, then the uncolored text
fn file_line(stamp: chrono::DateTime<chrono::Utc>, text: &str) -> String {
    format!(
        "{} {}",
        stamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        strip_ansi_codes(text)
    )
}

// Public function that routes output (needed by macros)
pub fn write_output(text: &str) {
    let Ok(destination) = DESTINATION.lock() else {
        return;
    };

    match &*destination {
        Destination::File(tx) => {
            let _ = tx.send(LogMessage::Formatted(file_line(chrono::Utc::now(), text)));
        }
        Destination::Stderr => {
            eprint!("{text}");
        }
        Destination::Stdout => {
            if SCREEN_ACTIVE.load(Ordering::SeqCst) {
                return;
            }
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    }
}

/// Format one line with the simulation prefix and route it.
pub fn emit(lead: &str, message: &str) {
    let prefix = Log::get_timestamp_prefix();
    write_output(&format!("{prefix}{lead}{message}\n"));
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┣ ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┣ ", &format!("{}", $expr));
    }};
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┃   ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┃   ", &format!("{}", $expr));
    }};
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        $crate::logger::emit("┃", "");
    }};
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┃", "");
        $crate::logger::emit("┣ ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┃", "");
        $crate::logger::emit("┣ ", &format!("{}", $expr));
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        $crate::logger::emit(
            "┏ ",
            &format!("{} v{} ━━╸", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        );
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        $crate::logger::emit("╹", "");
    }};
}

/// Log a warning message with pipe prefix and yellow-colored text.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┣[\x1b[33mWARNING\x1b[0m] ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┣[\x1b[33mWARNING\x1b[0m] ", &format!("{}", $expr));
    }};
}

/// Log an error message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┣[\x1b[31mERROR\x1b[0m] ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┣[\x1b[31mERROR\x1b[0m] ", &format!("{}", $expr));
    }};
}

/// Log an error that terminates the flow, closing the block with a corner.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┃", "");
        $crate::logger::emit("┗[\x1b[31mERROR\x1b[0m] ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┃", "");
        $crate::logger::emit("┗[\x1b[31mERROR\x1b[0m] ", &format!("{}", $expr));
    }};
}

/// Log an informational message with pipe prefix and green-colored text.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┣[\x1b[32mINFO\x1b[0m] ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┣[\x1b[32mINFO\x1b[0m] ", &format!("{}", $expr));
    }};
}

/// Log a debug/operational message with pipe prefix and green-colored text.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┣[\x1b[32mDEBUG\x1b[0m] ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┣[\x1b[32mDEBUG\x1b[0m] ", &format!("{}", $expr));
    }};
}

/// Log a critical message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_critical {
    ($fmt:literal $($arg:tt)*) => {{
        $crate::logger::emit("┣[\x1b[31mCRITICAL\x1b[0m] ", &format!($fmt $($arg)*));
    }};
    ($expr:expr) => {{
        $crate::logger::emit("┣[\x1b[31mCRITICAL\x1b[0m] ", &format!("{}", $expr));
    }};
}
