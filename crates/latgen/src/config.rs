//! Configuration types for lattice generation.
//!
//! All types implement [`serde::Deserialize`] so that a configuration can be
//! loaded from TOML. Every section is optional and falls back to defaults.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`FactoryConfig`] - Which device kinds go into which construction pass.
//! - [`Precision`] - Geometric tolerance and number formatting.
//! - [`ExportConfig`] - XML document options.
//!
//! # Example
//!
//! ```
//! # use latgen::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [precision]
//!     epsilon = 1.0e-6
//!
//!     [export]
//!     include_markers = true
//! "#).unwrap();
//!
//! assert_eq!(config.precision().epsilon(), 1.0e-6);
//! assert!(config.export().include_markers());
//! assert!(config.factory().halve_magnets());
//! ```

use serde::Deserialize;

pub use latgen_core::precision::Precision;

pub use crate::factory::FactoryConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Factory configuration section.
    #[serde(default)]
    factory: FactoryConfig,

    /// Numeric precision section.
    #[serde(default)]
    precision: Precision,

    /// Export configuration section.
    #[serde(default)]
    export: ExportConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(factory: FactoryConfig, precision: Precision, export: ExportConfig) -> Self {
        Self {
            factory,
            precision,
            export,
        }
    }

    /// Returns the factory configuration.
    pub fn factory(&self) -> &FactoryConfig {
        &self.factory
    }

    /// Returns the precision policy.
    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Returns the export configuration.
    pub fn export(&self) -> &ExportConfig {
        &self.export
    }
}

/// Options for exported XML documents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write transient split markers as elements.
    include_markers: bool,

    /// Value of the `author` attribute of the root tag.
    author: String,

    /// Value of the `ver` attribute of the root tag.
    version: String,
}

impl ExportConfig {
    pub fn new(include_markers: bool, author: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            include_markers,
            author: author.into(),
            version: version.into(),
        }
    }

    /// Sets whether transient markers are written (builder style).
    pub fn with_include_markers(mut self, include_markers: bool) -> Self {
        self.include_markers = include_markers;
        self
    }

    pub fn include_markers(&self) -> bool {
        self.include_markers
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_markers: false,
            author: "latgen".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use latgen_core::hierarchy::DeviceKind;

    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config: AppConfig = toml::from_str("").expect("empty config");

        assert_eq!(config.factory(), &FactoryConfig::default());
        assert_eq!(config.precision(), &Precision::default());
        assert_eq!(config.export(), &ExportConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [factory]
            thin_kinds = ["BPM", "WS"]

            [export]
            author = "ops"
            "#,
        )
        .expect("valid config");

        assert_eq!(
            config.factory().thin_kinds(),
            &[DeviceKind::Bpm, DeviceKind::WireScanner]
        );
        assert!(config.factory().halve_magnets());
        assert!(!config.factory().thick_kinds().is_empty());
        assert_eq!(config.export().author(), "ops");
        assert!(!config.export().include_markers());
    }

    #[test]
    fn test_unknown_kind_tags_are_kept() {
        let config: AppConfig = toml::from_str(
            r#"
            [factory]
            thick_kinds = ["Septum"]
            "#,
        )
        .expect("valid config");

        assert_eq!(
            config.factory().thick_kinds(),
            &[DeviceKind::Other("Septum".to_string())]
        );
    }
}
