//! Config loading seam.

use crate::ConfigError;
use camino::Utf8Path;

/// The parts of a loaded svelte config the transformer cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig<D> {
    /// The config's `preprocess` definition, if it declares one.
    pub preprocess: Option<D>,
}

impl<D: Default> LoadedConfig<D> {
    /// Returns the preprocess definition, or an empty one when the config
    /// declares none.
    pub fn into_preprocess(self) -> D {
        self.preprocess.unwrap_or_default()
    }
}

/// Loads a resolved config module.
///
/// `Definition` is whatever the paired preprocessor consumes; the transformer
/// only moves it from the loader to the preprocessor.
pub trait ConfigLoader {
    /// The preprocess definition type produced by this loader.
    type Definition: Default;

    /// Loads the config at `path`.
    fn load(&self, path: &Utf8Path) -> Result<LoadedConfig<Self::Definition>, ConfigError>;
}

impl<L: ConfigLoader + ?Sized> ConfigLoader for &L {
    type Definition = L::Definition;

    fn load(&self, path: &Utf8Path) -> Result<LoadedConfig<Self::Definition>, ConfigError> {
        (**self).load(path)
    }
}
