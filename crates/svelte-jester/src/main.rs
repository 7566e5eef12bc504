//! svelte-jester: inspect config resolution and preprocessing from the shell.

mod cli;

use camino::Utf8PathBuf;
use clap::Parser;
use cli::{Args, Command, ConfigArgs, PreprocessArgs};
use miette::{IntoDiagnostic, Result, WrapErr};
use preprocess_runner::{PreprocessRequest, PreprocessRunner};
use std::fs;
use svelte_config::ConfigResolver;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::ResolveConfig(config) => {
            let path = resolve_config(&config)?;
            println!("{}", path);
        }
        Command::Preprocess(preprocess) => {
            let line = preprocess_file(&preprocess)?;
            println!("{}", line);
        }
    }

    Ok(())
}

fn resolver(args: &ConfigArgs) -> Result<ConfigResolver> {
    match &args.project_root {
        Some(root) => Ok(ConfigResolver::new(root.clone())),
        None => ConfigResolver::from_current_dir().into_diagnostic(),
    }
}

fn resolve_config(args: &ConfigArgs) -> Result<Utf8PathBuf> {
    let resolved = resolver(args)?
        .resolve(args.root_mode.into(), &args.file, &args.preprocess())
        .into_diagnostic()?;
    resolved.ok_or_else(|| miette::miette!("preprocessing is disabled"))
}

fn preprocess_file(args: &PreprocessArgs) -> Result<String> {
    let source = fs::read_to_string(&args.config.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", args.config.file))?;
    let svelte_config = resolve_config(&args.config)?;

    let request = PreprocessRequest {
        source,
        filename: args.config.file.clone(),
        svelte_config,
        show_console_log: args.show_console_log,
    };

    let processed = PreprocessRunner::node(args.node.clone())
        .run(&request, args.max_buffer)
        .into_diagnostic()?;
    processed.to_line().into_diagnostic()
}
