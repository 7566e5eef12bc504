//! Worker side of the preprocess protocol.
//!
//! A worker binary reads its [`PreprocessRequest`] from the environment,
//! loads the referenced config, preprocesses, and writes one JSON line to
//! stdout:
//!
//! ```ignore
//! fn main() {
//!     if let Err(e) = preprocess_runner::worker::run_from_env(&MyLoader, &MyPreprocessor) {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

use crate::envelope::{PreprocessRequest, Preprocessed};
use crate::{PreprocessError, RunnerError};
use camino::Utf8Path;
use std::io::{self, Write};
use svelte_config::{ConfigError, ConfigLoader};
use thiserror::Error;

/// Runs user preprocessing inside the worker.
pub trait Preprocessor {
    /// The preprocess definition taken from the loaded config.
    type Definition;

    /// Preprocesses `source`.
    ///
    /// Anything the preprocessor wants to log goes to `console`. It shares
    /// stdout with the response when console logging is enabled and is
    /// discarded otherwise.
    fn preprocess(
        &self,
        source: &str,
        filename: &Utf8Path,
        definition: &Self::Definition,
        console: &mut dyn Write,
    ) -> Result<Preprocessed, PreprocessError>;
}

/// Errors raised inside the worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Envelope(#[from] RunnerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("preprocess failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("failed to serialize preprocess result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write preprocess result: {0}")]
    Io(#[from] io::Error),
}

/// Handles one request, writing the response line to `stdout`.
pub fn run<L, P, W>(
    request: &PreprocessRequest,
    loader: &L,
    preprocessor: &P,
    stdout: &mut W,
) -> Result<(), WorkerError>
where
    L: ConfigLoader,
    P: Preprocessor<Definition = L::Definition>,
    W: Write,
{
    let definition = loader.load(&request.svelte_config)?.into_preprocess();

    let processed = if request.show_console_log {
        preprocessor.preprocess(&request.source, &request.filename, &definition, stdout)?
    } else {
        preprocessor.preprocess(
            &request.source,
            &request.filename,
            &definition,
            &mut io::sink(),
        )?
    };

    let line = processed.to_line()?;
    stdout.write_all(line.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

/// Reads the request from the process environment and answers on stdout.
pub fn run_from_env<L, P>(loader: &L, preprocessor: &P) -> Result<(), WorkerError>
where
    L: ConfigLoader,
    P: Preprocessor<Definition = L::Definition>,
{
    let request = PreprocessRequest::from_env()?;
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    run(&request, loader, preprocessor, &mut stdout)
}
