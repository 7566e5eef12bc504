//! Shared test doubles for the transformer integration tests.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{json, Value};
use std::fs;
use std::sync::Mutex;
use svelte_jester::{
    CompileError, CompileOptions, CompileOutput, Compiler, ModuleCompileOptions, TransformOptions,
};
use tempfile::TempDir;

/// A component with a scoped style, shaped like the svelte-jester fixtures.
pub const BASIC_COMP: &str = r#"<script>
  export let name = 'world';
  let count = 0;
</script>

<button class="counter active" on:click={() => count++}>Hello {name} {count}</button>

<style>
  .counter.active { color: red; }
</style>
"#;

/// A single-line component that survives shell quoting in `sh` workers.
pub const SASS_COMP: &str =
    "<p class=counter>Hello world</p><style lang=scss>.counter.active { color: red; }</style>";

pub const MODULE_SOURCE: &str = r#"export function createCounter() {
  let count = $state(0);
  return { get count() { return count; }, increment() { count += 1; } };
}
"#;

/// What the compiler was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Component { source: String, options: CompileOptions },
    Module { source: String, options: ModuleCompileOptions },
}

/// Produces svelte-3-shaped output from the source text and records calls.
///
/// Reports itself as Svelte 3 unless built with another version.
#[derive(Debug)]
pub struct FakeSvelteCompiler {
    version: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeSvelteCompiler {
    fn default() -> Self {
        Self::with_version(Some("3.59.2"))
    }
}

impl FakeSvelteCompiler {
    pub fn with_version(version: Option<&str>) -> Self {
        Self {
            version: version.map(str::to_string),
            calls: Mutex::default(),
        }
    }

    /// A Svelte 5 compiler.
    pub fn modern() -> Self {
        Self::with_version(Some("5.1.0"))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_component_options(&self) -> CompileOptions {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Component { options, .. } => Some(options),
                Call::Module { .. } => None,
            })
            .expect("no component compile recorded")
    }
}

fn between<'a>(source: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = source.find(open)?;
    let body_start = start + source[start..].find('>')? + 1;
    let end = body_start + source[body_start..].find(close)?;
    Some(&source[body_start..end])
}

fn markup(source: &str) -> String {
    let mut markup = source.to_string();
    for (open, close) in [("<script", "</script>"), ("<style", "</style>")] {
        if let (Some(start), Some(end)) = (markup.find(open), markup.find(close)) {
            markup.replace_range(start..end + close.len(), "");
        }
    }
    markup.trim().to_string()
}

impl Compiler for FakeSvelteCompiler {
    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompileError> {
        self.calls.lock().unwrap().push(Call::Component {
            source: source.to_string(),
            options: options.clone(),
        });

        if source.contains("{#if") && !source.contains("{/if}") {
            let first_line = source.lines().next().unwrap_or_default();
            return Err(CompileError::new("Expected {/if}")
                .with_code("expected_block_close")
                .with_frame(format!("1: {first_line}\n   ^")));
        }

        let filename = options.filename().unwrap_or("Component.svelte");
        let css = !matches!(options.get("css"), Some(Value::Bool(false)));

        let mut code = String::from(
            "import { SvelteComponent, init, safe_not_equal, text } from \"svelte/internal\";\n",
        );
        let style = between(source, "<style", "</style>").filter(|_| css);
        if let Some(style) = style {
            code.push_str(&format!(
                "function add_css(target) {{\n\tappend_styles(target, \"svelte-1\", {:?});\n}}\n",
                style.trim()
            ));
        }
        code.push_str(&format!(
            "function create_fragment(ctx) {{ return {{ c() {{ t = text({:?}); }} }}; }}\n",
            markup(source)
        ));
        code.push_str(&format!(
            "class Component extends SvelteComponent {{ constructor(options) {{ super(); \
             init(this, options, null, create_fragment, safe_not_equal, {{}}{}); }} }}\n",
            if style.is_some() { ", add_css" } else { "" }
        ));
        if options.get("format") == Some(&json!("cjs")) {
            code.push_str("exports.default = Component;\n");
        } else {
            code.push_str("export default Component;\n");
        }

        Ok(CompileOutput {
            code,
            map: json!({
                "version": 3,
                "file": filename,
                "sources": [filename],
                "names": [],
                "mappings": "AAAA",
            }),
        })
    }

    fn compile_module(
        &self,
        source: &str,
        options: &ModuleCompileOptions,
    ) -> Result<CompileOutput, CompileError> {
        self.calls.lock().unwrap().push(Call::Module {
            source: source.to_string(),
            options: options.clone(),
        });

        let generate = serde_json::to_value(options.generate).unwrap();
        Ok(CompileOutput {
            code: format!("/* generate: {} */\n{}", generate.as_str().unwrap(), source),
            map: json!({ "version": 3, "sources": [options.filename], "mappings": "" }),
        })
    }
}

/// Options carrying an explicit Svelte 3 hint.
pub fn legacy_options(extra: Value) -> TransformOptions {
    let mut config = json!({ "svelteVersion": "3.59.2" });
    if let (Value::Object(config), Value::Object(extra)) = (&mut config, extra) {
        config.extend(extra);
    }
    TransformOptions::from_transformer_config(&json!({ "transformerConfig": config })).unwrap()
}

/// Options as the host gives them, without adding a version hint.
pub fn host_options(config: Value) -> TransformOptions {
    TransformOptions::from_transformer_config(&json!({ "transformerConfig": config })).unwrap()
}

/// A temp project: `<tmp>/project/src/components/` with files written under
/// `project`.
pub struct Project {
    _dir: TempDir,
    pub root: Utf8PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().join("project")).unwrap();
        fs::create_dir_all(root.join("src/components")).unwrap();
        Self { _dir: dir, root }
    }

    pub fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(relative);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn component(&self, name: &str) -> Utf8PathBuf {
        self.root.join("src/components").join(name)
    }

    pub fn components_dir(&self) -> Utf8PathBuf {
        self.root.join("src/components")
    }
}

pub fn file_name(path: &Utf8Path) -> &str {
    path.file_name().unwrap()
}
