//! Request and response envelopes exchanged with the worker.

use crate::RunnerError;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ENV_SOURCE: &str = "source";
const ENV_FILENAME: &str = "filename";
const ENV_SVELTE_CONFIG: &str = "svelteConfig";
const ENV_SHOW_CONSOLE_LOG: &str = "showConsoleLog";

/// A preprocessing request, carried to the worker in its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessRequest {
    pub source: String,
    pub filename: Utf8PathBuf,
    /// Path of the config module the worker loads.
    pub svelte_config: Utf8PathBuf,
    /// Whether the worker keeps stdout logging of user code enabled.
    pub show_console_log: bool,
}

impl PreprocessRequest {
    /// Encodes the request as environment variables. Every value is text;
    /// the flag becomes `"true"` or `"false"`.
    pub fn to_env(&self) -> [(&'static str, String); 4] {
        [
            (ENV_SOURCE, self.source.clone()),
            (ENV_FILENAME, self.filename.to_string()),
            (ENV_SVELTE_CONFIG, self.svelte_config.to_string()),
            (ENV_SHOW_CONSOLE_LOG, self.show_console_log.to_string()),
        ]
    }

    /// Decodes a request from the current process environment.
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Decodes a request from an arbitrary variable lookup.
    ///
    /// Only the exact text `"true"` enables console logging.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let source = lookup(ENV_SOURCE).ok_or(RunnerError::Envelope(ENV_SOURCE))?;
        let filename = lookup(ENV_FILENAME).ok_or(RunnerError::Envelope(ENV_FILENAME))?;
        let svelte_config =
            lookup(ENV_SVELTE_CONFIG).ok_or(RunnerError::Envelope(ENV_SVELTE_CONFIG))?;
        let show_console_log = lookup(ENV_SHOW_CONSOLE_LOG).as_deref() == Some("true");

        Ok(Self {
            source,
            filename: filename.into(),
            svelte_config: svelte_config.into(),
            show_console_log,
        })
    }
}

/// Preprocessed source, as written by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessed {
    pub code: String,
    /// Source map of the preprocessing step, `null` when there is none.
    #[serde(default)]
    pub map: Option<Value>,
}

impl Preprocessed {
    /// Serializes the response as a single JSON line (without the newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the worker's captured stdout.
    ///
    /// Anything besides one JSON document (surrounding whitespace aside) is a
    /// protocol error, including log lines printed before the response.
    pub fn from_output(output: &str) -> Result<Self, RunnerError> {
        serde_json::from_str(output.trim()).map_err(|e| RunnerError::Protocol {
            message: e.to_string(),
            output: output.to_string(),
        })
    }
}
