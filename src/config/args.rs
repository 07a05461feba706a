//! Clap argument types for the two resolution stages.
//!
//! Stage one ([`PreArgs`]) runs leniently and only extracts the path
//! overrides, so the config file can be located before anything else is
//! validated. Stage two ([`Args`]) is the full parse and always wins
//! over file-supplied values.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::loader::{Config, LogLevel};
use crate::constants;

/// First-stage parser: path overrides and explicit help/version requests
/// only. Unknown flags and malformed values are left for the full parse.
#[derive(Parser, Debug, Default)]
#[command(
    name = constants::APP_NAME,
    ignore_errors = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct PreArgs {
    /// Path to the config/data directory.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the configuration file.
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(short, long)]
    pub help: bool,

    #[arg(short = 'V', long)]
    pub version: bool,
}

impl PreArgs {
    /// Parse `argv`, falling back to defaults on any error.
    pub fn parse_lenient(argv: &[OsString]) -> Self {
        Self::try_parse_from(argv).unwrap_or_default()
    }
}

/// Test data loader for the CMS contractor-management stack.
///
/// Seeds recordsd and cmsweb with a default admin and contractor
/// account. Every option may also be set in the config file using the
/// same name.
#[derive(Parser, Debug)]
#[command(name = constants::APP_NAME, version)]
pub struct Args {
    /// Admin user email address.
    #[arg(long, value_name = "EMAIL")]
    pub admin_email: Option<String>,

    /// Admin username.
    #[arg(long, value_name = "USER")]
    pub admin_user: Option<String>,

    /// Admin password.
    #[arg(long, value_name = "PASS")]
    pub admin_pass: Option<String>,

    /// Contractor user email address.
    #[arg(long, value_name = "EMAIL")]
    pub contractor_email: Option<String>,

    /// Contractor username.
    #[arg(long, value_name = "USER")]
    pub contractor_user: Option<String>,

    /// Contractor password.
    #[arg(long, value_name = "PASS")]
    pub contractor_pass: Option<String>,

    /// Contractor full name.
    #[arg(long, value_name = "NAME")]
    pub contractor_name: Option<String>,

    /// Contractor physical location.
    #[arg(long, value_name = "LOCATION")]
    pub contractor_location: Option<String>,

    /// Contractor extended public key.
    #[arg(long, value_name = "XPUB")]
    pub contractor_extended_public_key: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the config/data directory.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the configuration file.
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Logging level to use for the target servers.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Delete all existing data from recordsd and cmsweb before loading.
    #[arg(long)]
    pub delete_data: bool,

    /// Also run the command exercise suite after loading data.
    #[arg(long)]
    pub include_tests: bool,
}

impl Args {
    /// Overlay every supplied scalar option onto `cfg`.
    ///
    /// The path fields are applied by the loader, which owns expansion
    /// and absolutization.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(v) = &self.admin_email {
            cfg.admin_email = v.clone();
        }
        if let Some(v) = &self.admin_user {
            cfg.admin_user = v.clone();
        }
        if let Some(v) = &self.admin_pass {
            cfg.admin_pass = v.clone();
        }
        if let Some(v) = &self.contractor_email {
            cfg.contractor_email = v.clone();
        }
        if let Some(v) = &self.contractor_user {
            cfg.contractor_user = v.clone();
        }
        if let Some(v) = &self.contractor_pass {
            cfg.contractor_pass = v.clone();
        }
        if let Some(v) = &self.contractor_name {
            cfg.contractor_name = v.clone();
        }
        if let Some(v) = &self.contractor_location {
            cfg.contractor_location = v.clone();
        }
        if let Some(v) = &self.contractor_extended_public_key {
            cfg.contractor_extended_public_key = v.clone();
        }
        if self.verbose {
            cfg.verbose = true;
        }
        if let Some(v) = self.log_level {
            cfg.log_level = v;
        }
        if self.delete_data {
            cfg.delete_data = true;
        }
        if self.include_tests {
            cfg.include_tests = true;
        }
    }
}
