//! Config record and the resolution pipeline.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Config file (`cmsload.toml` in the data directory)
//! 3. Built-in defaults
//!
//! Resolution runs once per process, synchronously:
//! 1. Start from the built-in defaults.
//! 2. Pre-parse the command line for `--data-dir` / `--config-file` so
//!    the config file can be located; only an explicit help or version
//!    request stops resolution here.
//! 3. Overlay the config file, field by field. A missing file is a
//!    deferred warning, anything else is fatal.
//! 4. Parse the command line in full so flags win over file values.
//! 5. Provision the data directory and derive the server log paths.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::args::{Args, PreArgs};
use crate::config::paths::{self, Paths};
use crate::constants;
use crate::env::Env;

/// Errors during config resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed command line. The rendered message includes the usage hint.
    #[error(transparent)]
    Usage(Box<clap::Error>),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to resolve path {path}: {source}")]
    ResolvePath {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to create data directory {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to create data directory: is symlink {path} -> {target} mounted?")]
    DanglingSymlink { path: PathBuf, target: PathBuf },
}

/// Logging level passed through to the target servers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(format!(
                "unknown log level: {s}. Supported: trace, debug, info, warn, error, critical"
            )),
        }
    }
}

/// Fully resolved configuration.
///
/// Immutable once resolution completes; callers must not merge further
/// sources in. `data_dir` and `config_file` are absolute, cleaned paths
/// and the two log paths are children of `data_dir`.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub admin_email: String,
    pub admin_user: String,
    pub admin_pass: String,
    pub contractor_email: String,
    pub contractor_user: String,
    pub contractor_pass: String,
    pub contractor_name: String,
    pub contractor_location: String,
    pub contractor_extended_public_key: String,
    pub verbose: bool,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_level: LogLevel,
    pub delete_data: bool,
    pub include_tests: bool,

    /// Derived: records daemon log path under `data_dir`.
    pub recordsd_log_file: PathBuf,
    /// Derived: web service log path under `data_dir`.
    pub cmsweb_log_file: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("admin_email", &self.admin_email)
            .field("admin_user", &self.admin_user)
            .field("admin_pass", &"[REDACTED]")
            .field("contractor_email", &self.contractor_email)
            .field("contractor_user", &self.contractor_user)
            .field("contractor_pass", &"[REDACTED]")
            .field("contractor_name", &self.contractor_name)
            .field("contractor_location", &self.contractor_location)
            .field(
                "contractor_extended_public_key",
                &self.contractor_extended_public_key,
            )
            .field("verbose", &self.verbose)
            .field("data_dir", &self.data_dir)
            .field("config_file", &self.config_file)
            .field("log_level", &self.log_level)
            .field("delete_data", &self.delete_data)
            .field("include_tests", &self.include_tests)
            .field("recordsd_log_file", &self.recordsd_log_file)
            .field("cmsweb_log_file", &self.cmsweb_log_file)
            .finish()
    }
}

impl Config {
    /// Built-in defaults, anchored at the given well-known paths.
    ///
    /// The derived log paths stay empty until resolution completes.
    pub fn defaults(paths: &Paths) -> Self {
        Self {
            admin_email: "admin@example.com".into(),
            admin_user: "admin".into(),
            admin_pass: "password".into(),
            contractor_email: "contractor@example.com".into(),
            contractor_user: "contractor".into(),
            contractor_pass: "password".into(),
            contractor_name: "John Smith".into(),
            contractor_location: "Dallas, TX, USA".into(),
            contractor_extended_public_key: "faketpub".into(),
            verbose: false,
            data_dir: paths.default_data_dir(),
            config_file: paths.default_config_file(),
            log_level: LogLevel::default(),
            delete_data: false,
            include_tests: false,
            recordsd_log_file: PathBuf::new(),
            cmsweb_log_file: PathBuf::new(),
        }
    }
}

/// Outcome of a resolution run.
#[derive(Debug)]
pub enum Resolution {
    /// Fully resolved configuration plus any deferred warnings.
    Ready {
        config: Box<Config>,
        warnings: Vec<String>,
    },
    /// Help or version text was requested; print it and exit zero.
    Exit { output: String },
}

/// Options as they appear in the config file. Only supplied keys
/// overwrite the running config; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct FileConfig {
    admin_email: Option<String>,
    admin_user: Option<String>,
    admin_pass: Option<String>,
    contractor_email: Option<String>,
    contractor_user: Option<String>,
    contractor_pass: Option<String>,
    contractor_name: Option<String>,
    contractor_location: Option<String>,
    contractor_extended_public_key: Option<String>,
    verbose: Option<bool>,
    data_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    log_level: Option<LogLevel>,
    delete_data: Option<bool>,
    include_tests: Option<bool>,
}

impl FileConfig {
    fn apply(self, cfg: &mut Config, paths: &Paths, env: &Env) -> Result<(), ConfigError> {
        if let Some(v) = self.admin_email {
            cfg.admin_email = v;
        }
        if let Some(v) = self.admin_user {
            cfg.admin_user = v;
        }
        if let Some(v) = self.admin_pass {
            cfg.admin_pass = v;
        }
        if let Some(v) = self.contractor_email {
            cfg.contractor_email = v;
        }
        if let Some(v) = self.contractor_user {
            cfg.contractor_user = v;
        }
        if let Some(v) = self.contractor_pass {
            cfg.contractor_pass = v;
        }
        if let Some(v) = self.contractor_name {
            cfg.contractor_name = v;
        }
        if let Some(v) = self.contractor_location {
            cfg.contractor_location = v;
        }
        if let Some(v) = self.contractor_extended_public_key {
            cfg.contractor_extended_public_key = v;
        }
        if let Some(v) = self.verbose {
            cfg.verbose = v;
        }
        if let Some(dir) = self.data_dir {
            cfg.data_dir = absolutize(&paths.clean_and_expand(env, &dir))?;
        }
        if let Some(file) = self.config_file {
            cfg.config_file = absolutize(&paths.clean_and_expand(env, &file))?;
        }
        if let Some(v) = self.log_level {
            cfg.log_level = v;
        }
        if let Some(v) = self.delete_data {
            cfg.delete_data = v;
        }
        if let Some(v) = self.include_tests {
            cfg.include_tests = v;
        }
        Ok(())
    }
}

/// Resolve the effective configuration from defaults, the config file,
/// and `argv`, then provision the data directory.
///
/// `argv` must include the program name in position zero. Warnings are
/// returned rather than printed so the caller decides where they go.
pub fn load(paths: &Paths, env: &Env, argv: &[OsString]) -> Result<Resolution, ConfigError> {
    let mut cfg = Config::defaults(paths);
    let mut warnings = Vec::new();

    // Stage one: only the path overrides and an explicit help or
    // version request matter here. Everything else is validated by the
    // full parse below.
    let pre = PreArgs::parse_lenient(argv);
    if pre.help {
        return Ok(Resolution::Exit {
            output: Args::command().render_long_help().to_string(),
        });
    }
    if pre.version {
        return Ok(Resolution::Exit {
            output: format!("{} {}", constants::APP_NAME, env!("CARGO_PKG_VERSION")),
        });
    }

    if let Some(dir) = &pre.data_dir {
        cfg.data_dir = absolutize(&paths.clean_and_expand(env, dir))?;
        // Relocate the config file under the new data directory unless
        // the caller pointed at one explicitly.
        if pre.config_file.is_none() {
            cfg.config_file = cfg.data_dir.join(constants::CONFIG_FILENAME);
        }
    }
    if let Some(file) = &pre.config_file {
        cfg.config_file = absolutize(&paths.clean_and_expand(env, file))?;
    }

    match fs::read_to_string(&cfg.config_file) {
        Ok(content) => {
            let file_cfg: FileConfig =
                toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
                    path: cfg.config_file.clone(),
                    source,
                })?;
            file_cfg.apply(&mut cfg, paths, env)?;
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            warnings.push(format!(
                "config file {} not found",
                cfg.config_file.display()
            ));
        }
        Err(source) => {
            return Err(ConfigError::ReadFile {
                path: cfg.config_file.clone(),
                source,
            });
        }
    }

    // Stage two: the full parse. Flags always win over file values.
    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(Resolution::Exit {
                output: err.to_string(),
            });
        }
        Err(err) => return Err(ConfigError::Usage(Box::new(err))),
    };
    args.apply(&mut cfg);
    if let Some(dir) = &args.data_dir {
        cfg.data_dir = absolutize(&paths.clean_and_expand(env, dir))?;
    }
    if let Some(file) = &args.config_file {
        cfg.config_file = absolutize(&paths.clean_and_expand(env, file))?;
    }

    create_data_dir(&cfg.data_dir)?;

    cfg.recordsd_log_file = cfg.data_dir.join(constants::RECORDSD_LOG_FILENAME);
    cfg.cmsweb_log_file = cfg.data_dir.join(constants::CMSWEB_LOG_FILENAME);

    Ok(Resolution::Ready {
        config: Box::new(cfg),
        warnings,
    })
}

/// Make `path` absolute against the current directory and clean it.
fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path)
        .map(|p| paths::clean_path(&p))
        .map_err(|source| ConfigError::ResolvePath {
            path: path.to_path_buf(),
            source,
        })
}

/// Create the data directory tree with owner-only permissions.
fn create_data_dir(dir: &Path) -> Result<(), ConfigError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    if let Err(source) = builder.create(dir) {
        // A dangling symlink at the target surfaces as a create failure;
        // name the link target so the operator can tell an unmounted
        // volume from a permission problem.
        if let Ok(target) = fs::read_link(dir) {
            return Err(ConfigError::DanglingSymlink {
                path: dir.to_path_buf(),
                target,
            });
        }
        return Err(ConfigError::CreateDataDir {
            path: dir.to_path_buf(),
            source,
        });
    }
    Ok(())
}
