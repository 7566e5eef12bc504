//! Transformer options as supplied by the host.

use preprocess_runner::DEFAULT_MAX_BUFFER;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use svelte_config::{PreprocessSetting, RootMode};

/// Options for one transform call.
///
/// Deserializes from the host's `transformerConfig` object; every key is
/// optional and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Whether (and with which config) to preprocess before compiling.
    pub preprocess: PreprocessSetting,

    /// Where config discovery may look.
    pub root_mode: RootMode,

    /// Compiler options layered over the computed defaults. `null` counts
    /// as empty.
    #[serde(deserialize_with = "deserialize_compiler_options")]
    pub compiler_options: Map<String, Value>,

    /// Cap on preprocess worker output, in bytes.
    pub max_buffer: Option<usize>,

    /// Let user preprocessing code log to the worker's stdout.
    #[serde(deserialize_with = "deserialize_show_console_log")]
    pub show_console_log: bool,

    /// Log the generated code and the execution mode.
    pub debug: bool,

    /// Version of the installed svelte compiler.
    pub svelte_version: Option<SvelteVersion>,
}

impl TransformOptions {
    /// Reads options from the host's per-transform config object, which
    /// nests them under `transformerConfig`. A missing key yields defaults.
    pub fn from_transformer_config(config: &Value) -> Result<Self, serde_json::Error> {
        match config.get("transformerConfig") {
            Some(options) if !options.is_null() => Self::deserialize(options),
            _ => Ok(Self::default()),
        }
    }

    /// Returns the worker output cap. Zero falls back to the default.
    pub fn max_buffer(&self) -> usize {
        self.max_buffer
            .filter(|&limit| limit > 0)
            .unwrap_or(DEFAULT_MAX_BUFFER)
    }

    /// Returns true if the targeted compiler is Svelte 3.
    ///
    /// The `svelteVersion` hint wins; without one, `installed` (the
    /// compiler's own version) decides. No version at all means modern.
    pub fn is_legacy(&self, installed: Option<&str>) -> bool {
        match &self.svelte_version {
            Some(hint) => hint.is_legacy(),
            None => installed.is_some_and(|version| SvelteVersion::new(version).is_legacy()),
        }
    }
}

/// A svelte version hint such as `"3.59.2"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SvelteVersion(String);

impl SvelteVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the major version, ignoring range prefixes like `^` or `v`.
    pub fn major(&self) -> Option<u64> {
        self.0
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .split('.')
            .next()
            .and_then(|major| major.parse().ok())
    }

    /// Svelte 3 needs the legacy compiler options and is the only version
    /// that can run in CommonJS mode.
    pub fn is_legacy(&self) -> bool {
        self.major() == Some(3)
    }
}

fn deserialize_compiler_options<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `showConsoleLog` accepts booleans and strings. The string `"false"` is
/// false; other strings follow JavaScript truthiness.
fn deserialize_show_console_log<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
        Unset(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(flag) => flag,
        Raw::Text(text) => !text.is_empty() && text != "false",
        Raw::Unset(()) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(options: Value) -> TransformOptions {
        TransformOptions::from_transformer_config(&json!({ "transformerConfig": options })).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = TransformOptions::from_transformer_config(&json!({})).unwrap();
        assert_eq!(options, TransformOptions::default());
        assert_eq!(options.max_buffer(), 10 * 1024 * 1024);
        assert!(!options.show_console_log);
        assert!(!options.is_legacy(None));
        assert!(options.is_legacy(Some("3.59.2")));
    }

    #[test]
    fn test_all_fields() {
        let options = parse(json!({
            "preprocess": "./svelte.config.cjs",
            "rootMode": "upward",
            "compilerOptions": { "css": false },
            "maxBuffer": 1024,
            "showConsoleLog": true,
            "debug": true,
            "svelteVersion": "3.59.2",
            "somethingElse": 1
        }));

        assert_eq!(
            options.preprocess,
            PreprocessSetting::Path("./svelte.config.cjs".into())
        );
        assert_eq!(options.root_mode, RootMode::Upward);
        assert_eq!(options.compiler_options.get("css"), Some(&json!(false)));
        assert_eq!(options.max_buffer(), 1024);
        assert!(options.show_console_log);
        assert!(options.debug);
        assert!(options.is_legacy(Some("5.1.0")));
    }

    #[test]
    fn test_show_console_log_string_false_is_false() {
        assert!(!parse(json!({ "showConsoleLog": "false" })).show_console_log);
        assert!(!parse(json!({ "showConsoleLog": false })).show_console_log);
        assert!(!parse(json!({ "showConsoleLog": null })).show_console_log);
        assert!(!parse(json!({ "showConsoleLog": "" })).show_console_log);
        assert!(parse(json!({ "showConsoleLog": "true" })).show_console_log);
        assert!(parse(json!({ "showConsoleLog": "yes" })).show_console_log);
    }

    #[test]
    fn test_zero_max_buffer_uses_default() {
        assert_eq!(parse(json!({ "maxBuffer": 0 })).max_buffer(), DEFAULT_MAX_BUFFER);
    }

    #[test]
    fn test_version_hint_overrides_installed_compiler() {
        let options = parse(json!({ "svelteVersion": "4.2.19" }));
        assert!(!options.is_legacy(Some("3.59.2")));
        assert!(!parse(json!({})).is_legacy(Some("5.0.0")));
    }

    #[test]
    fn test_null_compiler_options_are_empty() {
        let options = parse(json!({ "compilerOptions": null }));
        assert!(options.compiler_options.is_empty());
    }

    #[test]
    fn test_empty_preprocess_disables_preprocessing() {
        assert_eq!(
            parse(json!({ "preprocess": "" })).preprocess,
            PreprocessSetting::Disabled
        );
    }

    #[test]
    fn test_version_hint() {
        assert!(SvelteVersion::new("3.0.0").is_legacy());
        assert!(SvelteVersion::new("^3.59.2").is_legacy());
        assert!(SvelteVersion::new("3").is_legacy());
        assert!(!SvelteVersion::new("4.2.19").is_legacy());
        assert!(!SvelteVersion::new("5.0.0-next.1").is_legacy());
        assert!(!SvelteVersion::new("30.1.0").is_legacy());
        assert_eq!(SvelteVersion::new("latest").major(), None);
    }
}
