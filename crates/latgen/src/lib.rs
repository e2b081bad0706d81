//! Latgen - Lattice generation for accelerator device hierarchies.
//!
//! Turns a tree of sequences and devices into a flat, position-ordered
//! lattice of drifts, markers and device elements, keeps track of which
//! element stands for which device, and writes the result as XML.

pub mod association;
pub mod config;
pub mod diagnostic;
pub mod export;
pub mod factory;
pub mod lattice;

mod error;

pub use latgen_core::{element, hierarchy, identifier, precision};

pub use error::{LatgenError, LatticeError};

use log::{debug, info, trace};

use config::AppConfig;
use export::{ParameterSource, xml::XmlWriter};
use factory::{Generated, LatticeFactory};
use hierarchy::Sequence;
use lattice::Lattice;

/// Facade for loading device hierarchies, generating lattices and exporting
/// them.
///
/// # Examples
///
/// ```
/// use latgen::{Generator, config::AppConfig};
///
/// let source = r#"
///     id = "MEBT"
///     length = 10.0
///
///     [[device]]
///     id = "QH01"
///     kind = "QH"
///     position = 5.0
///     length = 1.0
/// "#;
///
/// let generator = Generator::new(AppConfig::default());
/// let hierarchy = generator.load(source).expect("Failed to load");
/// let generated = generator.build(&hierarchy).expect("Failed to build");
///
/// assert_eq!(generated.lattice().length(), 10.0);
///
/// let xml = generator
///     .render_xml(generated.lattice(), &hierarchy)
///     .expect("Failed to render");
/// assert!(xml.contains("ELEMENT_CENTER:QH01"));
/// ```
#[derive(Debug, Default)]
pub struct Generator {
    config: AppConfig,
}

impl Generator {
    /// Create a new generator with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a TOML device hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`LatgenError::Input`] if the document is not a valid
    /// hierarchy.
    pub fn load(&self, source: &str) -> Result<Sequence, LatgenError> {
        info!("Loading device hierarchy");
        let sequence: Sequence = toml::from_str(source)?;
        debug!(
            sequence = sequence.id().to_string(),
            devices = sequence.placed_devices().len();
            "Device hierarchy loaded"
        );
        trace!(sequence:?; "Parsed hierarchy");
        Ok(sequence)
    }

    /// Generate the lattice of `sequence`.
    ///
    /// # Errors
    ///
    /// Returns [`LatgenError::Lattice`] if the devices cannot be laid out.
    pub fn build(&self, sequence: &Sequence) -> Result<Generated, LatgenError> {
        let factory = LatticeFactory::new(self.config.factory().clone(), *self.config.precision());
        Ok(factory.build(sequence)?)
    }

    /// Render `lattice` as XML using design values.
    pub fn render_xml(&self, lattice: &Lattice, sequence: &Sequence) -> Result<String, LatgenError> {
        let writer = XmlWriter::new(*self.config.precision(), self.config.export());
        Ok(writer.render(lattice, sequence)?)
    }

    /// Render `lattice` as XML, reading device parameters from `source`.
    pub fn render_xml_with(
        &self,
        lattice: &Lattice,
        sequence: &Sequence,
        source: &dyn ParameterSource,
    ) -> Result<String, LatgenError> {
        let writer =
            XmlWriter::new(*self.config.precision(), self.config.export()).with_source(source);
        Ok(writer.render(lattice, sequence)?)
    }
}
