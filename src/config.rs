use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Used when `--dbprefs` is not given.
pub const DEFAULT_DB_PREFS: &str = "com.github.nmcspadden.prefs.json";
/// Used when `--jssprefs` is not given.
pub const DEFAULT_JSS_PREFS: &str = "com.github.sheagcraig.python-jss.plist";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("couldn't access prefs file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in prefs file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid property list in prefs file {path}: {source}")]
    Plist {
        path: PathBuf,
        source: plist::Error,
    },
    #[error("invalid TOML in prefs file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Everything a single run needs, resolved from the command line.
#[derive(Clone, Debug)]
pub struct Settings {
    pub db_prefs_path: PathBuf,
    pub jss_prefs_path: PathBuf,
    pub keep_going: bool,
}

/// Where inventory is written to.
///
/// PostgreSQL keys are tried first, so a file carrying both kinds of keys
/// targets PostgreSQL.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DbPrefs {
    Postgres(PostgresPrefs),
    Sqlite(SqlitePrefs),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PostgresPrefs {
    pub postgres_host: String,
    pub postgres_db: String,
    pub postgres_user: String,
    pub postgres_password: String,
    #[serde(default)]
    pub postgres_port: Option<u16>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SqlitePrefs {
    pub sqlite_path: String,
}

/// Credentials for the JSS, using the key names python-jss writes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JssPrefs {
    pub jss_url: String,
    pub jss_user: String,
    pub jss_pass: String,
    #[serde(default = "default_verify")]
    pub verify: bool,
}

// python-jss verifies certificates unless told otherwise.
fn default_verify() -> bool {
    true
}

impl PostgresPrefs {
    /// Builds a libpq conninfo string from our preferences.
    pub fn conninfo(&self) -> String {
        let mut conninfo = format!(
            "host={} dbname={} user={} password={}",
            quote_conninfo(&self.postgres_host),
            quote_conninfo(&self.postgres_db),
            quote_conninfo(&self.postgres_user),
            quote_conninfo(&self.postgres_password),
        );
        if let Some(port) = self.postgres_port {
            conninfo.push_str(&format!(" port={port}"));
        }
        conninfo
    }
}

// libpq accepts single-quoted values, with backslash escaping quotes and itself.
fn quote_conninfo(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Loads a preferences file, picking the format by its extension.
///
/// `.plist` files are read as property lists (as python-jss writes them),
/// `.toml` files as TOML, and everything else as JSON.
pub fn load_prefs<T: DeserializeOwned>(path: &Path) -> Result<T, PrefsError> {
    let contents = fs::read(path).map_err(|source| PrefsError::Read {
        path: path.to_owned(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("plist") => {
            plist::from_reader(Cursor::new(&contents)).map_err(|source| PrefsError::Plist {
                path: path.to_owned(),
                source,
            })
        }
        Some("toml") => {
            let text = String::from_utf8_lossy(&contents);
            toml::from_str(&text).map_err(|source| PrefsError::Toml {
                path: path.to_owned(),
                source,
            })
        }
        _ => serde_json::from_slice(&contents).map_err(|source| PrefsError::Json {
            path: path.to_owned(),
            source,
        }),
    }
}
