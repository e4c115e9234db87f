use directories::ProjectDirs;
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::{ConfigError, Result};

const LOG_FILE_NAME: &str = "ri-recommender.log";

/// Initialize the logger with file and console output
///
/// # Arguments
///
/// * `verbose` - Enable debug level logging
/// * `quiet` - Suppress console output (logs still written to file)
///
/// Console output goes to stderr so that the report on stdout stays clean.
///
/// # Platform-specific log locations
///
/// * **macOS**: `~/Library/Application Support/com.frost8ytes.ri-recommender/ri-recommender.log`
/// * **Linux**: `~/.local/share/ri-recommender/ri-recommender.log`
/// * **Windows**: `C:\Users\<User>\AppData\Local\frost8ytes\ri-recommender\data\ri-recommender.log`
///
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_path = log_file_path()?;

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| ConfigError::FileError(format!("Failed to open log file: {}", e)))?;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level).format_timestamp_secs();

    if quiet {
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter {
            console: std::io::stderr(),
            file: log_file,
        })));
    }

    builder
        .try_init()
        .map_err(|e| ConfigError::InvalidValue(format!("Logger already initialized: {}", e)))?;

    log::debug!("Logging to: {}", log_path.display());

    Ok(())
}

/// Platform log file location, falling back to the current directory
fn log_file_path() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "frost8ytes", "ri-recommender") {
        let log_dir = proj_dirs.data_local_dir();
        fs::create_dir_all(log_dir).map_err(|e| {
            ConfigError::FileError(format!("Failed to create log directory: {}", e))
        })?;
        Ok(log_dir.join(LOG_FILE_NAME))
    } else {
        Ok(std::env::current_dir()
            .map_err(|e| {
                ConfigError::FileError(format!("Failed to get current directory: {}", e))
            })?
            .join(LOG_FILE_NAME))
    }
}

/// Writes every log line to both stderr and the log file
struct TeeWriter {
    console: std::io::Stderr,
    file: fs::File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.console.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.console.flush()?;
        self.file.flush()?;
        Ok(())
    }
}
