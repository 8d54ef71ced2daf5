use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{Config, Handle};

use crate::{LoggingError, Result};

const LOG_FORMAT_CONSOLE: &str = "\x1B[37m{d(%Y-%m-%d %H:%M:%S%.3f)}\x1B[0m {h({l:>5.5})} \x1B[37m[{T:>15.15}]\x1B[0m \x1B[36m{t:<40.40}\x1B[0m \x1B[37m:\x1B[0m {m}{n}";
const LOG_FORMAT_FILE: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:>5.5} [{T:>15.15}] {t:<40.40} : {m}{n}";
const CONSOLE_APPENDER: &str = "console";
const FILE_APPENDER: &str = "file";
const LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;
const LOG_FILE_WINDOW: u32 = 5;
const DEFAULT_LOG_FILENAME: &str = "insights";

/// The http stack packages which are capped at [LevelFilter::Info] unless configured otherwise.
pub const DEFAULT_LOGGERS: [&str; 5] = ["h2", "hyper", "hyper_util", "reqwest", "rustls"];

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// The process-wide logger of an application which collects insights.
/// Only one instance can be created per process.
#[derive(Debug)]
pub struct InsightsLogger {
    handle: Handle,
}

impl InsightsLogger {
    pub fn builder() -> InsightsLoggerBuilder {
        InsightsLoggerBuilder::default()
    }

    /// Returns the root logging level of the logger.
    pub fn root_log_level(&self) -> LevelFilter {
        self.handle.max_log_level()
    }

    fn new(
        root_level: LevelFilter,
        config_path: Option<PathBuf>,
        log_path: Option<PathBuf>,
        loggers: HashMap<String, LevelFilter>,
    ) -> Result<Self> {
        // the config file is checked before claiming the global logger
        if let Some(path) = config_path.as_ref().filter(|e| !e.exists()) {
            return Err(LoggingError::NotFound(path.clone()));
        }
        if INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LoggingError::AlreadyInitialized);
        }

        let handle = match config_path {
            Some(path) => Self::load_from_config(path.as_path()),
            None => Self::create_config(root_level, log_path.as_deref(), loggers),
        }
        .and_then(|config| {
            log4rs::init_config(config).map_err(|e| LoggingError::InvalidConfig(e.to_string()))
        })
        .map_err(|e| {
            INITIALIZED.store(false, Ordering::Release);
            e
        })?;

        info!("Insights logger has been initialized");
        Ok(Self { handle })
    }

    fn load_from_config(path: &Path) -> Result<Config> {
        log4rs::config::load_config_file(path, Default::default())
            .map_err(|e| LoggingError::InvalidConfig(e.to_string()))
    }

    fn create_config(
        root_level: LevelFilter,
        log_path: Option<&Path>,
        loggers: HashMap<String, LevelFilter>,
    ) -> Result<Config> {
        let mut root = Root::builder().appender(CONSOLE_APPENDER);
        let mut config_builder = Config::builder().appender(Appender::builder().build(
            CONSOLE_APPENDER,
            Box::new(
                ConsoleAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_CONSOLE)))
                    .build(),
            ),
        ));

        if let Some(path) = log_path {
            config_builder = config_builder.appender(Self::create_file_appender(path)?);
            root = root.appender(FILE_APPENDER);
        }

        let mut levels: HashMap<String, LevelFilter> = DEFAULT_LOGGERS
            .iter()
            .map(|e| (e.to_string(), LevelFilter::Info))
            .collect();
        levels.extend(loggers);
        let mut levels: Vec<(String, LevelFilter)> = levels.into_iter().collect();
        levels.sort_by(|a, b| a.0.cmp(&b.0));
        for (package, level) in levels {
            config_builder = config_builder.logger(Logger::builder().build(package, level));
        }

        config_builder
            .build(root.build(root_level))
            .map_err(|e| LoggingError::InvalidConfig(e.to_string()))
    }

    fn create_file_appender(path: &Path) -> Result<Appender> {
        if let Some(parent) = path.parent().filter(|e| !e.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let pattern = Self::roll_pattern(path);
        debug!("Rolling insights log files as {}", pattern);
        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(pattern.as_str(), LOG_FILE_WINDOW)
            .map_err(|e| LoggingError::InvalidConfig(e.to_string()))?;
        let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_SIZE)), Box::new(roller));

        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_FILE)))
            .append(true)
            .build(path, Box::new(policy))?;

        Ok(Appender::builder().build(FILE_APPENDER, Box::new(appender)))
    }

    /// Get the pattern of the rolled log files, placed next to the active log file.
    fn roll_pattern(path: &Path) -> String {
        let stem = path
            .file_stem()
            .and_then(|e| e.to_str())
            .unwrap_or(DEFAULT_LOG_FILENAME);
        let rolled = format!("{}.{{}}.log", stem);

        match path.parent() {
            Some(parent) => parent.join(rolled).to_string_lossy().to_string(),
            None => rolled,
        }
    }
}

#[derive(Debug, Default)]
pub struct InsightsLoggerBuilder {
    root_level: Option<LevelFilter>,
    config_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    loggers: HashMap<String, LevelFilter>,
}

impl InsightsLoggerBuilder {
    /// Set the root level of the logger, defaults to [LevelFilter::Info].
    pub fn root_level(&mut self, level: LevelFilter) -> &mut Self {
        self.root_level = Some(level);
        self
    }

    /// Load the log4rs yaml config at the given path instead of the builder settings.
    pub fn config_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Write the logs also to the given file, which is rolled once it grows too large.
    pub fn log_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the log level of the given package.
    pub fn logger<S: AsRef<str>>(&mut self, package: S, level: LevelFilter) -> &mut Self {
        self.loggers.insert(package.as_ref().to_string(), level);
        self
    }

    /// Initialize the process-wide logger.
    ///
    /// It returns [LoggingError::AlreadyInitialized] when a logger has already been created.
    pub fn build(&mut self) -> Result<InsightsLogger> {
        InsightsLogger::new(
            self.root_level.take().unwrap_or(LevelFilter::Info),
            self.config_path.take(),
            self.log_path.take(),
            self.loggers.drain().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_new() {
        let temp_dir = tempdir().unwrap();
        let log_path = temp_dir.path().join("logs").join("insights.log");
        let logger = InsightsLogger::builder()
            .root_level(LevelFilter::Trace)
            .log_path(&log_path)
            .logger("insights_graph::graph", LevelFilter::Debug)
            .build()
            .expect("expected a logger");

        assert_eq!(LevelFilter::Trace, logger.root_log_level());
        assert!(log_path.exists(), "expected the log file to have been created");

        let result = InsightsLogger::builder()
            .build()
            .err()
            .expect("expected an error to have been returned");
        assert_eq!(LoggingError::AlreadyInitialized, result);
    }

    #[test]
    fn test_new_config_not_found() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("log4.yml");

        let result = InsightsLogger::builder()
            .config_path(&config_path)
            .build()
            .err()
            .expect("expected an error to have been returned");

        assert_eq!(LoggingError::NotFound(config_path), result);
    }

    #[test]
    fn test_create_config() {
        let loggers = vec![
            ("insights_core".to_string(), LevelFilter::Trace),
            ("reqwest".to_string(), LevelFilter::Warn),
        ]
        .into_iter()
        .collect();

        let config = InsightsLogger::create_config(LevelFilter::Debug, None, loggers).unwrap();

        assert_eq!(LevelFilter::Debug, config.root().level());
        assert_eq!(1, config.appenders().len());
        let reqwest = config.loggers().iter().find(|e| e.name() == "reqwest").unwrap();
        assert_eq!(LevelFilter::Warn, reqwest.level());
        let hyper = config.loggers().iter().find(|e| e.name() == "hyper").unwrap();
        assert_eq!(LevelFilter::Info, hyper.level());
        let core = config.loggers().iter().find(|e| e.name() == "insights_core").unwrap();
        assert_eq!(LevelFilter::Trace, core.level());
    }

    #[test]
    fn test_create_config_with_file() {
        let temp_dir = tempdir().unwrap();
        let log_path = temp_dir.path().join("collector.log");

        let config =
            InsightsLogger::create_config(LevelFilter::Info, Some(log_path.as_path()), HashMap::new()).unwrap();

        assert_eq!(2, config.appenders().len());
        assert_eq!(2, config.root().appenders().len());
    }

    #[test]
    fn test_roll_pattern() {
        let result = InsightsLogger::roll_pattern(Path::new("collector.log"));
        assert_eq!("collector.{}.log", result);

        let result = InsightsLogger::roll_pattern(Path::new("logs").join("collector.log").as_path());
        assert_eq!(
            Path::new("logs").join("collector.{}.log").to_string_lossy().to_string(),
            result
        );
    }
}
