//! Input and output path derivation.
//!
//! The mapping is pure: a module root and a changed file name fully determine
//! where the generator reads from and writes to. The only I/O in this module
//! is [`ensure_output_dir`].

use camino::{Utf8Path, Utf8PathBuf};

use cw_core::{LayoutConfig, ModuleRoot};

use crate::error::GenerateError;

/// The paths involved in one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPaths {
    /// `<root>/<config_dir>/<file>`.
    pub input: Utf8PathBuf,
    /// `<root>/<config_dir>/<generated_dir>`.
    pub output_dir: Utf8PathBuf,
    /// `<output_dir>/<output_file_name>`.
    pub output: Utf8PathBuf,
    /// The changed file name with its input extension swapped.
    pub output_file_name: String,
}

/// Maps changed configuration files to generator paths.
///
/// # Examples
///
/// ```
/// use cw_core::{LayoutConfig, ModuleRoot};
/// use cw_generator::PathResolver;
/// use camino::Utf8Path;
///
/// let resolver = PathResolver::new(LayoutConfig::default());
/// let paths = resolver
///     .resolve(&ModuleRoot::new("/proj"), Utf8Path::new("/proj/config/settings.json"))
///     .unwrap();
///
/// assert_eq!(paths.input, "/proj/config/settings.json");
/// assert_eq!(paths.output, "/proj/config/generated/settings.go");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    layout: LayoutConfig,
}

impl PathResolver {
    /// Creates a resolver for the given module layout.
    #[must_use]
    pub const fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout in use.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Derives all paths for a change to `changed` inside `root`.
    ///
    /// Only the file name of `changed` is used. The input is always taken
    /// from the module's configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidPath`] if `changed` has no file name.
    pub fn resolve(&self, root: &ModuleRoot, changed: &Utf8Path) -> Result<GenerationPaths, GenerateError> {
        let file_name = changed
            .file_name()
            .ok_or_else(|| GenerateError::InvalidPath(changed.to_owned()))?;

        let config_dir = root.config_dir(&self.layout);
        let output_dir = config_dir.join(&self.layout.generated_dir);
        let output_file_name = self.output_file_name(file_name);

        Ok(GenerationPaths {
            input: config_dir.join(file_name),
            output: output_dir.join(&output_file_name),
            output_dir,
            output_file_name,
        })
    }

    /// Replaces a trailing `.<input_extension>` with `.<output_extension>`.
    ///
    /// Names without the input suffix get the output extension appended.
    ///
    /// # Examples
    ///
    /// ```
    /// use cw_core::LayoutConfig;
    /// use cw_generator::PathResolver;
    ///
    /// let resolver = PathResolver::new(LayoutConfig::default());
    /// assert_eq!(resolver.output_file_name("a.b.json"), "a.b.go");
    /// assert_eq!(resolver.output_file_name("json.json"), "json.go");
    /// ```
    #[must_use]
    pub fn output_file_name(&self, file_name: &str) -> String {
        let stem = file_name
            .strip_suffix(self.layout.input_extension.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .filter(|stem| !stem.is_empty())
            .unwrap_or(file_name);

        format!("{stem}.{}", self.layout.output_extension)
    }
}

/// Creates the output directory and its parents if they are missing.
///
/// # Errors
///
/// Returns [`GenerateError::OutputDirectory`] if the directory cannot be
/// created.
pub async fn ensure_output_dir(paths: &GenerationPaths) -> Result<(), GenerateError> {
    tokio::fs::create_dir_all(&paths.output_dir)
        .await
        .map_err(|e| GenerateError::output_directory(paths.output_dir.clone(), e))
}
