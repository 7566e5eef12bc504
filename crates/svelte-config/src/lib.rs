//! svelte.config discovery and loading.
//!
//! The transformer needs a project preprocessing configuration whenever the
//! host asks for preprocessing. This crate locates that file
//! ([`ConfigResolver`]) and defines the seam through which it gets loaded
//! ([`ConfigLoader`]). Loading is left to the caller because a config module
//! is executable code that only its own runtime can evaluate.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use svelte_config::{ConfigResolver, PreprocessSetting, RootMode};
//!
//! let resolver = ConfigResolver::from_current_dir().unwrap();
//! let config = resolver
//!     .resolve(
//!         RootMode::Upward,
//!         Utf8Path::new("src/lib/Counter.svelte"),
//!         &PreprocessSetting::Discover,
//!     )
//!     .unwrap();
//! println!("{:?}", config);
//! ```

mod loader;
mod resolver;

pub use loader::{ConfigLoader, LoadedConfig};
pub use resolver::{ConfigError, ConfigResolver, PreprocessSetting, RootMode, CONFIG_FILENAMES};
