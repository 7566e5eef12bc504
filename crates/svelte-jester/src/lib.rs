//! Svelte transformer for test runners.
//!
//! The host test runner calls the transformer once per imported file, either
//! synchronously ([`Transformer::process`], CommonJS hosts) or asynchronously
//! ([`Transformer::process_async`], ESM hosts). Compiling is delegated to a
//! [`Compiler`]. Preprocessing, when requested, goes through a child process
//! in synchronous mode and through an [`AsyncPreprocessor`] otherwise.
//!
//! # Example
//!
//! ```ignore
//! use camino::Utf8Path;
//! use svelte_config::ConfigResolver;
//! use svelte_jester::{ExecutionMode, TransformOptions, Transformer};
//!
//! let transformer = Transformer::new(
//!     ExecutionMode::CommonJs,
//!     MySvelteCompiler::default(),
//!     ConfigResolver::from_current_dir()?,
//! );
//! let options = TransformOptions::from_transformer_config(&host_config)?;
//! let result = transformer.process(&source, Utf8Path::new("src/App.svelte"), &options)?;
//! println!("{}", result.code);
//! ```

mod compiler;
mod console;
mod options;
mod transform;

pub use compiler::{
    CompileError, CompileOptions, CompileOutput, CompileTarget, Compiler, Generate,
    ModuleCompileOptions, ModuleFormat,
};
pub use console::{CapturedConsole, Channel, Console, StdConsole};
pub use options::{SvelteVersion, TransformOptions};
pub use preprocess_runner::{
    PreprocessError, PreprocessRunner, Preprocessed, RunnerError, WorkerCommand,
};
pub use transform::{
    format_result, AsyncPreprocessor, ExecutionMode, NoPreprocess, TransformError,
    TransformResult, Transformer, ES_INTEROP,
};
