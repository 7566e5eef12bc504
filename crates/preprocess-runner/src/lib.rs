//! Out-of-process svelte preprocessing.
//!
//! Svelte preprocessors are asynchronous, but a host running in CommonJS mode
//! can only call the transformer synchronously. [`PreprocessRunner`] bridges
//! the two by running the preprocessing in a fresh child process and blocking
//! until it exits:
//!
//! - the request travels in the child's environment ([`PreprocessRequest`])
//! - the child answers with exactly one JSON line on stdout ([`Preprocessed`])
//! - captured stdout is capped at `max_buffer` bytes
//!
//! The default worker is an embedded node script that calls
//! `svelte/compiler`'s `preprocess`. The [`worker`] module implements the same
//! protocol for workers written in Rust.

mod envelope;
mod error;
mod runner;
pub mod worker;

pub use envelope::{PreprocessRequest, Preprocessed};
pub use error::{PreprocessError, RunnerError};
pub use runner::{PreprocessRunner, WorkerCommand, DEFAULT_MAX_BUFFER};
