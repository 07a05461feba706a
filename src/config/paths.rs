//! Well-known paths and path hygiene.
//!
//! The resolver never consults ambient process state directly: the app
//! home comes in through [`Paths`] and environment lookups go through
//! [`Env`], so resolution stays deterministic under test.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::constants;
use crate::env::Env;

/// Matches POSIX-style `$VAR` and `${VAR}` references.
static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap()
});

/// Well-known directories the resolver works against.
#[derive(Clone, Debug)]
pub struct Paths {
    /// The app home directory (`~/.cmsweb`), shared with the web service.
    pub home_dir: PathBuf,
}

impl Paths {
    /// Locate the app home under the user's home directory.
    ///
    /// Returns `None` when the platform reports no home directory.
    pub fn discover() -> Option<Self> {
        dirs::home_dir().map(|home| Self {
            home_dir: home.join(constants::HOME_DIR_NAME),
        })
    }

    /// Default data directory (`<home>/dataload`).
    pub fn default_data_dir(&self) -> PathBuf {
        self.home_dir.join(constants::DATA_DIR_NAME)
    }

    /// Default config file path inside the default data directory.
    pub fn default_config_file(&self) -> PathBuf {
        self.default_data_dir().join(constants::CONFIG_FILENAME)
    }

    /// Expand a leading `~` and any `$VAR` references in `path`, then
    /// clean the result.
    ///
    /// `~` maps to the directory the app home lives in, i.e. the user's
    /// home directory. Unset variables expand to the empty string.
    pub fn clean_and_expand(&self, env: &Env, path: &Path) -> PathBuf {
        let raw = path.to_string_lossy();
        let expanded = if let Some(rest) = raw.strip_prefix('~') {
            let home = self.home_dir.parent().unwrap_or(&self.home_dir);
            format!("{}{rest}", home.display())
        } else {
            raw.into_owned()
        };
        clean_path(Path::new(&expand_env_vars(env, &expanded)))
    }
}

/// Substitute `$VAR` / `${VAR}` references with values from `env`.
fn expand_env_vars(env: &Env, path: &str) -> String {
    ENV_VAR_RE
        .replace_all(path, |caps: &regex::Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            env.var(name).unwrap_or_default()
        })
        .into_owned()
}

/// Lexically normalise a path: drop `.` components, collapse repeated
/// separators, and resolve `..` against preceding components where
/// possible. Does not touch the filesystem.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
