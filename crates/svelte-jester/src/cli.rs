//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use preprocess_runner::DEFAULT_MAX_BUFFER;
use svelte_config::{PreprocessSetting, RootMode};

/// Inspect how svelte-jester resolves configs and preprocesses files.
#[derive(Debug, Parser)]
#[command(name = "svelte-jester")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the svelte config a file would be preprocessed with
    ResolveConfig(ConfigArgs),

    /// Preprocess a file through the node worker and print the response line
    Preprocess(PreprocessArgs),
}

#[derive(Debug, ClapArgs)]
pub struct ConfigArgs {
    /// The svelte file being transformed
    pub file: Utf8PathBuf,

    /// Config discovery mode
    #[arg(long = "root-mode", value_enum, default_value = "auto")]
    pub root_mode: RootModeArg,

    /// Use this config instead of discovering one
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Project root for `auto` discovery (defaults to the working directory)
    #[arg(long = "project-root")]
    pub project_root: Option<Utf8PathBuf>,
}

impl ConfigArgs {
    /// Returns the preprocess setting these arguments ask for.
    pub fn preprocess(&self) -> PreprocessSetting {
        match &self.config {
            Some(path) => PreprocessSetting::Path(path.clone()),
            None => PreprocessSetting::Discover,
        }
    }
}

#[derive(Debug, ClapArgs)]
pub struct PreprocessArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Cap on worker output in bytes
    #[arg(long = "max-buffer", default_value_t = DEFAULT_MAX_BUFFER)]
    pub max_buffer: usize,

    /// Let the config log to the worker's stdout
    #[arg(long = "show-console-log")]
    pub show_console_log: bool,

    /// Path to the node binary (defaults to node on PATH)
    #[arg(long)]
    pub node: Option<Utf8PathBuf>,
}

/// Config discovery mode.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum RootModeArg {
    /// Only the project root
    #[default]
    Auto,
    /// The file's directory and its ancestors
    Upward,
}

impl From<RootModeArg> for RootMode {
    fn from(arg: RootModeArg) -> Self {
        match arg {
            RootModeArg::Auto => RootMode::Auto,
            RootModeArg::Upward => RootMode::Upward,
        }
    }
}
