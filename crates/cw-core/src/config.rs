//! Configuration structures for the cfgo-watch tool.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`DiscoveryConfig`] - Where to look for modules and what to skip
//! - [`LayoutConfig`] - Names of the configuration and generated directories
//! - [`GeneratorConfig`] - The external generator command
//! - [`WatchConfig`] - File watcher settings (debouncing, manifest tracking)
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with the values of the
//! `cfgo` convention: `go.mod` manifests, a `config/` directory of JSON files
//! and Go sources generated into `config/generated/`.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for module discovery.
///
/// Controls how the workspace is walked when looking for manifest files.
///
/// # Examples
///
/// ```
/// use cw_core::DiscoveryConfig;
///
/// let config = DiscoveryConfig::default();
/// assert_eq!(config.manifest_name, "go.mod");
/// assert!(config.ignore_dirs.contains(&"node_modules".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Root directory of the workspace to scan and watch.
    pub workspace_root: Utf8PathBuf,

    /// File name that marks a module root.
    pub manifest_name: String,

    /// Directory names that are never descended into.
    pub ignore_dirs: Vec<String>,

    /// Whether `.gitignore` and `.ignore` files prune the walk.
    pub respect_gitignore: bool,

    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            workspace_root: Utf8PathBuf::from("."),
            manifest_name: "go.mod".to_owned(),
            ignore_dirs: vec!["node_modules".to_owned(), ".git".to_owned()],
            respect_gitignore: false,
            follow_links: false,
        }
    }
}

/// Directory layout inside a module.
///
/// # Examples
///
/// ```
/// use cw_core::LayoutConfig;
///
/// let layout = LayoutConfig::default();
/// assert_eq!(layout.config_dir, "config");
/// assert_eq!(layout.generated_dir, "generated");
/// assert_eq!(layout.output_extension, "go");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Name of the configuration directory directly under a module root.
    pub config_dir: String,

    /// Name of the output directory inside the configuration directory.
    pub generated_dir: String,

    /// Extension of watched input files (without the leading dot).
    pub input_extension: String,

    /// Extension of generated output files (without the leading dot).
    pub output_extension: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_owned(),
            generated_dir: "generated".to_owned(),
            input_extension: "json".to_owned(),
            output_extension: "go".to_owned(),
        }
    }
}

/// The external code generator.
///
/// The generator is invoked as `<command> [extra_args...] <input> <output>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program name or path of the generator.
    pub command: String,

    /// Arguments placed before the input and output paths.
    pub extra_args: Vec<String>,
}

impl GeneratorConfig {
    /// Returns the name used when reporting generator failures.
    ///
    /// This is the file name of the command, so `/usr/local/bin/cfgo`
    /// is reported as `cfgo`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cw_core::GeneratorConfig;
    ///
    /// let config = GeneratorConfig {
    ///     command: "/usr/local/bin/cfgo".to_owned(),
    ///     extra_args: Vec::new(),
    /// };
    /// assert_eq!(config.display_name(), "cfgo");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> &str {
        Utf8Path::new(&self.command)
            .file_name()
            .unwrap_or(&self.command)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: "cfgo".to_owned(),
            extra_args: Vec::new(),
        }
    }
}

/// Configuration for the file watcher.
///
/// # Examples
///
/// ```
/// use cw_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.debounce_ms, 0);
/// assert!(config.watch_manifests);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window in milliseconds.
    ///
    /// `0` dispatches one generation per raw change notification. Any other
    /// value coalesces notifications for the same file within the window.
    pub debounce_ms: u64,

    /// Whether manifest creation and deletion are tracked after startup.
    pub watch_manifests: bool,
}

impl WatchConfig {
    /// Returns `true` if change notifications are debounced.
    #[inline]
    #[must_use]
    pub const fn is_debounced(&self) -> bool {
        self.debounce_ms > 0
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            watch_manifests: true,
        }
    }
}

/// Root configuration for the cfgo-watch tool.
///
/// Combines all component configurations into a single structure that can be
/// loaded from a configuration file or constructed programmatically.
///
/// # Examples
///
/// ```
/// use cw_core::Config;
///
/// let config = Config::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Module discovery configuration.
    pub discovery: DiscoveryConfig,

    /// Module directory layout.
    pub layout: LayoutConfig,

    /// External generator configuration.
    pub generator: GeneratorConfig,

    /// File watcher configuration.
    pub watch: WatchConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// Fields missing from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid JSON for this structure.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Checks that the configuration can drive the watcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] naming the first invalid option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.command.trim().is_empty() {
            return Err(ConfigError::invalid_option(
                "generator.command",
                "must not be empty",
            ));
        }

        let manifest = &self.discovery.manifest_name;
        if manifest.is_empty() || manifest.contains(['/', '\\']) {
            return Err(ConfigError::invalid_option(
                "discovery.manifest_name",
                "must be a plain file name",
            ));
        }

        for (option, value) in [
            ("layout.config_dir", &self.layout.config_dir),
            ("layout.generated_dir", &self.layout.generated_dir),
        ] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(ConfigError::invalid_option(
                    option,
                    "must be a plain directory name",
                ));
            }
        }

        for (option, value) in [
            ("layout.input_extension", &self.layout.input_extension),
            ("layout.output_extension", &self.layout.output_extension),
        ] {
            if value.is_empty() {
                return Err(ConfigError::invalid_option(option, "must not be empty"));
            }
            if value.starts_with('.') {
                return Err(ConfigError::invalid_option(
                    option,
                    "must not start with a dot",
                ));
            }
        }

        Ok(())
    }
}
