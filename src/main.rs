//! cmsload — test data loader for the CMS contractor-management stack.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

use std::ffi::OsString;
use std::process;

use anyhow::{Context, Result};
use colored::Colorize;

use cmsload::config::{self, Config, Paths, Resolution};
use cmsload::env::Env;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let paths = Paths::discover().context("unable to determine home directory")?;
    let env = Env::real();
    let argv: Vec<OsString> = std::env::args_os().collect();

    match config::load(&paths, &env, &argv)? {
        Resolution::Exit { output } => {
            println!("{output}");
            Ok(())
        }
        Resolution::Ready { config, warnings } => {
            for warning in &warnings {
                eprintln!("{} {warning}", "WARNING:".yellow().bold());
            }
            report(&config);
            Ok(())
        }
    }
}

/// Report the provisioned locations, plus the full effective settings
/// under `--verbose`.
fn report(cfg: &Config) {
    println!(
        "  {} {}",
        "data directory:".dimmed(),
        cfg.data_dir.display().to_string().bold()
    );
    println!(
        "  {}   {}",
        "recordsd log:".dimmed(),
        cfg.recordsd_log_file.display()
    );
    println!(
        "  {}     {}",
        "cmsweb log:".dimmed(),
        cfg.cmsweb_log_file.display()
    );

    if cfg.verbose {
        println!(
            "  {}    {}",
            "config file:".dimmed(),
            cfg.config_file.display()
        );
        println!("  {}      {}", "log level:".dimmed(), cfg.log_level);
        println!("  {}     {}", "admin user:".dimmed(), cfg.admin_user);
        println!("  {}    {}", "admin email:".dimmed(), cfg.admin_email);
        println!(
            "  {} {}",
            "contractor user:".dimmed(),
            cfg.contractor_user
        );
        println!(
            "  {} {}",
            "contractor email:".dimmed(),
            cfg.contractor_email
        );
        println!("  {}    {}", "delete data:".dimmed(), cfg.delete_data);
        println!("  {}  {}", "include tests:".dimmed(), cfg.include_tests);
    }
}
