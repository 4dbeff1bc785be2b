use crate::config::{DEFAULT_DB_PREFS, DEFAULT_JSS_PREFS, Settings};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Pulls mobile device inventory from a JSS into a database table.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to db prefs JSON file. Defaults to com.github.nmcspadden.prefs.json
    #[arg(long, value_name = "PATH")]
    pub dbprefs: Option<PathBuf>,

    /// Path to python-jss prefs plist. Defaults to com.github.sheagcraig.python-jss.plist
    #[arg(long, value_name = "PATH")]
    pub jssprefs: Option<PathBuf>,

    /// Increase verbosity to print status updates
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Skip devices that can't be fetched or parsed instead of aborting
    #[arg(long)]
    pub keep_going: bool,
}

impl Args {
    /// Resolves our arguments, filling in default paths.
    pub fn settings(&self) -> Settings {
        Settings {
            db_prefs_path: self
                .dbprefs
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PREFS)),
            jss_prefs_path: self
                .jssprefs
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JSS_PREFS)),
            keep_going: self.keep_going,
        }
    }

    /// The log filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
