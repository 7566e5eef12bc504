//! The transform pipeline.

use crate::compiler::{
    CompileError, CompileOptions, CompileOutput, CompileTarget, Compiler, ModuleFormat,
};
use crate::console::{Console, StdConsole};
use crate::options::TransformOptions;
use camino::Utf8Path;
use preprocess_runner::{
    PreprocessError, PreprocessRequest, PreprocessRunner, Preprocessed, RunnerError,
};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use svelte_config::{ConfigError, ConfigLoader, ConfigResolver, LoadedConfig};
use thiserror::Error;

/// Marks CommonJS output as an ES module for interop.
pub const ES_INTEROP: &str = r#"Object.defineProperty(exports, "__esModule", { value: true });"#;

/// Transform errors.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The entry point does not match the transformer's execution mode.
    #[error("running svelte-jester {entry} in unsupported {mode} mode")]
    ModeMismatch {
        entry: &'static str,
        mode: &'static str,
    },

    /// Synchronous transforms only support Svelte 3.
    #[error("svelte-jester is being called in CommonJS mode; Svelte 4+ requires ESM mode")]
    LegacyOnly,

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The preprocess worker failed. Passed through unchanged.
    #[error(transparent)]
    Preprocess(#[from] RunnerError),

    #[error("preprocess failed: {0}")]
    AsyncPreprocess(#[from] PreprocessError),

    /// The compiler rejected the source. Passed through unchanged.
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("failed to serialize source map: {0}")]
    SerializeMap(#[from] serde_json::Error),
}

/// How the host calls the transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Synchronous calls only; output is CommonJS.
    CommonJs,
    /// Asynchronous calls only; output is an ES module.
    Esm,
}

impl ExecutionMode {
    pub fn format(self) -> ModuleFormat {
        match self {
            Self::CommonJs => ModuleFormat::Cjs,
            Self::Esm => ModuleFormat::Esm,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::CommonJs => "CJS",
            Self::Esm => "ESM",
        }
    }
}

/// The transformed module handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub code: String,
    /// The source map, serialized as JSON.
    pub map: String,
}

/// Runs preprocessing in place, for hosts that can await.
pub trait AsyncPreprocessor {
    /// The preprocess definition taken from the loaded config.
    type Definition;

    fn preprocess(
        &self,
        source: &str,
        filename: &Utf8Path,
        definition: &Self::Definition,
    ) -> impl Future<Output = Result<Preprocessed, PreprocessError>>;
}

/// Stand-in loader and preprocessor for transformers that never preprocess
/// asynchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreprocess;

impl ConfigLoader for NoPreprocess {
    type Definition = ();

    fn load(&self, path: &Utf8Path) -> Result<LoadedConfig<()>, ConfigError> {
        Err(ConfigError::Load {
            path: path.to_path_buf(),
            message: "no config loader configured".to_string(),
        })
    }
}

impl AsyncPreprocessor for NoPreprocess {
    type Definition = ();

    fn preprocess(
        &self,
        _source: &str,
        _filename: &Utf8Path,
        _definition: &(),
    ) -> impl Future<Output = Result<Preprocessed, PreprocessError>> {
        std::future::ready(Err(PreprocessError::new(
            "no async preprocessor configured",
        )))
    }
}

/// Turns svelte source into module code.
///
/// Holds no per-call state; concurrent calls are independent and the same
/// inputs always produce the same output.
pub struct Transformer<C, L = NoPreprocess, P = NoPreprocess> {
    mode: ExecutionMode,
    compiler: C,
    resolver: ConfigResolver,
    runner: PreprocessRunner,
    loader: L,
    preprocessor: P,
    console: Arc<dyn Console>,
}

impl<C: Compiler> Transformer<C> {
    /// Creates a transformer using the node preprocess worker and the
    /// standard console.
    pub fn new(mode: ExecutionMode, compiler: C, resolver: ConfigResolver) -> Self {
        Self {
            mode,
            compiler,
            resolver,
            runner: PreprocessRunner::default(),
            loader: NoPreprocess,
            preprocessor: NoPreprocess,
            console: Arc::new(StdConsole),
        }
    }
}

impl<C, L, P> Transformer<C, L, P> {
    /// Replaces the preprocess worker used by [`Transformer::process`].
    pub fn with_runner(mut self, runner: PreprocessRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Replaces the diagnostic console.
    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    /// Sets the loader and preprocessor used by
    /// [`Transformer::process_async`].
    pub fn with_preprocessing<L2, P2>(
        self,
        loader: L2,
        preprocessor: P2,
    ) -> Transformer<C, L2, P2> {
        Transformer {
            mode: self.mode,
            compiler: self.compiler,
            resolver: self.resolver,
            runner: self.runner,
            loader,
            preprocessor,
            console: self.console,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    fn expect_mode(
        &self,
        expected: ExecutionMode,
        entry: &'static str,
    ) -> Result<(), TransformError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(TransformError::ModeMismatch {
                entry,
                mode: self.mode.label(),
            })
        }
    }
}

impl<C: Compiler, L, P> Transformer<C, L, P> {
    /// Transforms a file synchronously.
    ///
    /// Preprocessing, when requested, runs in a child process and blocks the
    /// calling thread until it exits.
    pub fn process(
        &self,
        source: &str,
        filename: &Utf8Path,
        options: &TransformOptions,
    ) -> Result<TransformResult, TransformError> {
        if !options.is_legacy(self.compiler.version()) {
            return Err(TransformError::LegacyOnly);
        }
        self.expect_mode(ExecutionMode::CommonJs, "sync")?;

        if options.debug {
            self.console.debug("Running svelte-jester transformer sync in mode cjs.");
        }

        let Some(svelte_config) =
            self.resolver
                .resolve(options.root_mode, filename, &options.preprocess)?
        else {
            return self.compile(self.mode.format(), options, filename, source, None);
        };

        let request = PreprocessRequest {
            source: source.to_string(),
            filename: filename.to_path_buf(),
            svelte_config,
            show_console_log: options.show_console_log,
        };
        let processed = self.runner.run(&request, options.max_buffer())?;

        self.compile(
            self.mode.format(),
            options,
            filename,
            &processed.code,
            processed.map,
        )
    }

    /// Compiles, then formats the result.
    ///
    /// Compiler errors are logged with their source frame and returned
    /// unchanged.
    fn compile(
        &self,
        format: ModuleFormat,
        options: &TransformOptions,
        filename: &Utf8Path,
        source: &str,
        sourcemap: Option<Value>,
    ) -> Result<TransformResult, TransformError> {
        let compile_options = CompileOptions::assemble(
            filename,
            options.is_legacy(self.compiler.version()),
            format,
            sourcemap,
            &options.compiler_options,
        );

        let target = CompileTarget::from_path(filename);
        log::debug!("compiling {} as {:?} ({})", filename, target, format.as_str());

        let output = match target {
            CompileTarget::Component => self.compiler.compile(source, &compile_options),
            CompileTarget::Module => self
                .compiler
                .compile_module(source, &compile_options.module_options()),
        };
        let output = output.map_err(|error| {
            self.console.error(&error.report());
            error
        })?;

        let result = format_result(output, format)?;
        if options.debug {
            self.console.log(&result.code);
        }
        Ok(result)
    }
}

impl<C, L, P> Transformer<C, L, P>
where
    C: Compiler,
    L: ConfigLoader,
    P: AsyncPreprocessor<Definition = L::Definition>,
{
    /// Transforms a file, awaiting preprocessing in place.
    pub async fn process_async(
        &self,
        source: &str,
        filename: &Utf8Path,
        options: &TransformOptions,
    ) -> Result<TransformResult, TransformError> {
        self.expect_mode(ExecutionMode::Esm, "async")?;

        if options.debug {
            self.console.debug("Running svelte-jester transformer async in mode esm.");
        }

        let Some(svelte_config) =
            self.resolver
                .resolve(options.root_mode, filename, &options.preprocess)?
        else {
            return self.compile(self.mode.format(), options, filename, source, None);
        };

        let definition = self.loader.load(&svelte_config)?.into_preprocess();
        let processed = self
            .preprocessor
            .preprocess(source, filename, &definition)
            .await?;

        self.compile(
            self.mode.format(),
            options,
            filename,
            &processed.code,
            processed.map,
        )
    }
}

/// Appends the interop marker for CommonJS and serializes the map.
pub fn format_result(
    output: CompileOutput,
    format: ModuleFormat,
) -> Result<TransformResult, serde_json::Error> {
    let mut code = output.code;
    if format == ModuleFormat::Cjs {
        code.push_str(ES_INTEROP);
    }
    let map = serde_json::to_string(&output.map)?;
    Ok(TransformResult { code, map })
}
