//! The compiler seam and the options handed to it.

use camino::Utf8Path;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Module format of the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Cjs,
    Esm,
}

impl ModuleFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cjs => "cjs",
            Self::Esm => "esm",
        }
    }
}

/// Which compiler entry point handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileTarget {
    /// A `.svelte` component.
    Component,
    /// A rune-using logic module (`*.svelte.js`, `*.svelte.ts`).
    Module,
}

impl CompileTarget {
    /// Decides the target from the file name.
    pub fn from_path(path: &Utf8Path) -> Self {
        let name = path.file_name().unwrap_or(path.as_str());
        if name.ends_with(".svelte.js") || name.ends_with(".svelte.ts") {
            Self::Module
        } else {
            Self::Component
        }
    }
}

/// Options for [`Compiler::compile`].
///
/// Kept as a JSON object because user overrides may carry any compiler
/// option, including ones this crate knows nothing about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompileOptions(Map<String, Value>);

impl CompileOptions {
    /// Builds the options for compiling `filename`.
    ///
    /// Defaults first, then `format` (Svelte 3 only), then every key of
    /// `overrides`, so user options always win.
    pub fn assemble(
        filename: &Utf8Path,
        legacy: bool,
        format: ModuleFormat,
        sourcemap: Option<Value>,
        overrides: &Map<String, Value>,
    ) -> Self {
        let mut options = Map::new();
        let basename = filename.file_name().unwrap_or(filename.as_str());
        options.insert("filename".into(), basename.into());
        options.insert(
            "css".into(),
            if legacy {
                Value::Bool(true)
            } else {
                "injected".into()
            },
        );
        options.insert("accessors".into(), Value::Bool(true));
        options.insert("dev".into(), Value::Bool(true));
        if let Some(map) = sourcemap {
            options.insert("sourcemap".into(), map);
        }
        if legacy {
            options.insert("format".into(), format.as_str().into());
        }

        for (key, value) in overrides {
            options.insert(key.clone(), value.clone());
        }

        Self(options)
    }

    /// Returns a raw option value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn filename(&self) -> Option<&str> {
        self.get("filename").and_then(Value::as_str)
    }

    pub fn dev(&self) -> bool {
        self.get("dev").is_some_and(is_truthy)
    }

    pub fn ssr(&self) -> bool {
        self.get("ssr").is_some_and(is_truthy)
    }

    /// Narrows the options to what [`Compiler::compile_module`] accepts.
    pub fn module_options(&self) -> ModuleCompileOptions {
        ModuleCompileOptions {
            filename: self.filename().map(str::to_string),
            dev: self.dev(),
            generate: if self.ssr() {
                Generate::Server
            } else {
                Generate::Client
            },
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Code generation target for modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Generate {
    Client,
    Server,
}

/// Options for [`Compiler::compile_module`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCompileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub dev: bool,
    pub generate: Generate,
}

/// Generated module code.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub code: String,
    /// The compiler's source map object.
    pub map: Value,
}

/// An error reported by the compiler.
///
/// Displays as the compiler's message alone, so hosts see the same text the
/// compiler would have produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    /// Compiler error code, e.g. `css_expected_identifier`.
    pub code: Option<String>,
    /// Source excerpt pointing at the error.
    pub frame: Option<String>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            frame: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    /// The message followed by the frame, for logging.
    pub fn report(&self) -> String {
        match &self.frame {
            Some(frame) => format!("{}\n{}", self.message, frame),
            None => self.message.clone(),
        }
    }
}

/// Compiles processed source into module code.
pub trait Compiler {
    /// The compiler's version, e.g. `"3.59.2"`. Consulted when the host
    /// gives no `svelteVersion` hint.
    fn version(&self) -> Option<&str>;

    /// Compiles a component.
    fn compile(&self, source: &str, options: &CompileOptions)
        -> Result<CompileOutput, CompileError>;

    /// Compiles a logic module.
    fn compile_module(
        &self,
        source: &str,
        options: &ModuleCompileOptions,
    ) -> Result<CompileOutput, CompileError>;
}

impl<C: Compiler + ?Sized> Compiler for &C {
    fn version(&self) -> Option<&str> {
        (**self).version()
    }

    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompileError> {
        (**self).compile(source, options)
    }

    fn compile_module(
        &self,
        source: &str,
        options: &ModuleCompileOptions,
    ) -> Result<CompileOutput, CompileError> {
        (**self).compile_module(source, options)
    }
}
