//! Config file discovery.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

/// Config file names, in lookup priority.
pub const CONFIG_FILENAMES: [&str; 2] = ["svelte.config.js", "svelte.config.cjs"];

/// Error types for config resolution and loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file in the project root.
    #[error("could not find svelte.config.js or svelte.config.cjs in {searched}")]
    NotFound { searched: Utf8PathBuf },

    /// No config file in the file's directory or any of its ancestors.
    #[error(
        "could not find svelte.config.js or svelte.config.cjs in {start} or any parent directory"
    )]
    NotFoundUpward { start: Utf8PathBuf },

    /// The project root could not be determined.
    #[error("could not determine project root: {0}")]
    ProjectRoot(String),

    /// A config file was found but could not be loaded.
    #[error("failed to load {path}: {message}")]
    Load { path: Utf8PathBuf, message: String },
}

/// Where config discovery is allowed to look.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootMode {
    /// Only the project root.
    #[default]
    Auto,
    /// The transformed file's directory and each of its ancestors.
    Upward,
}

/// The host's `preprocess` option.
///
/// Deserializes from `false`/`null`/`""` (disabled), `true` (discover the
/// config) or a non-empty string (use that config path as-is).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPreprocess")]
pub enum PreprocessSetting {
    #[default]
    Disabled,
    Discover,
    Path(Utf8PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPreprocess {
    Flag(bool),
    Path(Utf8PathBuf),
    Unset(()),
}

impl From<RawPreprocess> for PreprocessSetting {
    fn from(raw: RawPreprocess) -> Self {
        match raw {
            RawPreprocess::Flag(true) => Self::Discover,
            RawPreprocess::Flag(false) | RawPreprocess::Unset(()) => Self::Disabled,
            RawPreprocess::Path(path) if path.as_str().is_empty() => Self::Disabled,
            RawPreprocess::Path(path) => Self::Path(path),
        }
    }
}

impl PreprocessSetting {
    /// Returns true if preprocessing was requested at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Locates the svelte config for a transformed file.
///
/// Nothing is cached: every call hits the filesystem, so edits to the config
/// are picked up without restarting the host.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    project_root: Utf8PathBuf,
}

impl ConfigResolver {
    /// Creates a resolver rooted at `project_root`.
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Creates a resolver rooted at the process working directory.
    pub fn from_current_dir() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::ProjectRoot(e.to_string()))?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| ConfigError::ProjectRoot("working directory is not valid UTF-8".into()))?;
        Ok(Self::new(cwd))
    }

    /// Returns the project root used by [`RootMode::Auto`].
    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// Resolves the config reference for `filename`.
    ///
    /// Returns `Ok(None)` when preprocessing is disabled. An explicit path is
    /// passed through without touching the filesystem.
    pub fn resolve(
        &self,
        root_mode: RootMode,
        filename: &Utf8Path,
        setting: &PreprocessSetting,
    ) -> Result<Option<Utf8PathBuf>, ConfigError> {
        match setting {
            PreprocessSetting::Disabled => Ok(None),
            PreprocessSetting::Path(path) => Ok(Some(path.clone())),
            PreprocessSetting::Discover => self.discover(root_mode, filename).map(Some),
        }
    }

    /// Searches for a config file according to `root_mode`.
    pub fn discover(
        &self,
        root_mode: RootMode,
        filename: &Utf8Path,
    ) -> Result<Utf8PathBuf, ConfigError> {
        match root_mode {
            RootMode::Auto => {
                find_in_dir(&self.project_root).ok_or_else(|| ConfigError::NotFound {
                    searched: self.project_root.clone(),
                })
            }
            RootMode::Upward => {
                let file = if filename.is_relative() {
                    self.project_root.join(filename)
                } else {
                    filename.to_path_buf()
                };
                let start = file.parent().unwrap_or(&self.project_root);

                let mut current = Some(start);
                while let Some(dir) = current {
                    if let Some(found) = find_in_dir(dir) {
                        return Ok(found);
                    }
                    current = dir.parent();
                }

                Err(ConfigError::NotFoundUpward {
                    start: start.to_path_buf(),
                })
            }
        }
    }
}

fn find_in_dir(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    for name in CONFIG_FILENAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            log::trace!("found svelte config at {}", candidate);
            return Some(candidate);
        }
    }
    None
}
