//! XML projection of a lattice.
//!
//! The document has the shape
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Lattice author=".." id=".." ver="..">
//! <comment text="document generated from latgen .."/>
//! <Sequence id="..">
//! <Element id=".." length=".." type="..">
//! <Parameter name="StartPosition" type="double" value=".."/>
//! <Parameter name="Position" type="double" value=".."/>
//! ..
//! </Element>
//! ..
//! </Sequence>
//! </Lattice>
//! ```
//!
//! Magnets, steerers and kickers add `MagField`, `EffLength` and
//! `Orientation`; RF gaps add `Frequency` (Hz), `Phase` (rad) and `ETL` (V).
//! The node tree is built with the generic element type of the `svg` crate.

use log::{debug, info, warn};
use svg::{Node, node::element::Element as XmlNode};

use latgen_core::{
    element::{Element, ElementKind},
    hierarchy::{Device, Sequence},
    precision::Precision,
};

use super::{DesignSource, Error, Parameter, ParameterSource};
use crate::{config::ExportConfig, lattice::Lattice};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Writes lattices as XML documents.
pub struct XmlWriter<'a> {
    precision: Precision,
    config: &'a ExportConfig,
    source: &'a dyn ParameterSource,
}

impl<'a> XmlWriter<'a> {
    /// Creates a writer reading device parameters from their design values.
    pub fn new(precision: Precision, config: &'a ExportConfig) -> Self {
        Self {
            precision,
            config,
            source: &DesignSource,
        }
    }

    /// Reads device parameters from `source` instead (builder style).
    ///
    /// A failed read is logged and replaced by the design value.
    pub fn with_source(mut self, source: &'a dyn ParameterSource) -> Self {
        self.source = source;
        self
    }

    /// Renders `lattice`, looking up device parameters in `hierarchy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDevice`] if an element refers to a device that
    /// `hierarchy` does not contain.
    pub fn render(&self, lattice: &Lattice, hierarchy: &Sequence) -> Result<String, Error> {
        info!(lattice = lattice.name(); "Rendering lattice XML");

        let mut root = XmlNode::new("Lattice");
        root.assign("id", lattice.name());
        root.assign("ver", self.config.version());
        root.assign("author", self.config.author());

        let mut comment = XmlNode::new("comment");
        comment.assign(
            "text",
            format!("document generated from latgen {}", env!("CARGO_PKG_VERSION")),
        );
        root.append(comment);

        let mut sequence = XmlNode::new("Sequence");
        sequence.assign("id", lattice.name());

        let mut written = 0usize;
        for element in lattice.iter() {
            if element.kind() == ElementKind::Marker && !self.config.include_markers() {
                continue;
            }
            let device = match element.device() {
                Some(id) => Some(
                    hierarchy
                        .find_device(id)
                        .ok_or_else(|| Error::UnknownDevice(id.to_string()))?,
                ),
                None => None,
            };
            sequence.append(self.element_node(lattice, element, device));
            written += 1;
        }
        root.append(sequence);

        debug!(elements = written; "Lattice XML rendered");
        Ok(format!("{XML_DECLARATION}\n{root}\n"))
    }

    fn element_node(&self, lattice: &Lattice, element: &Element, device: Option<&Device>) -> XmlNode {
        let mut node = XmlNode::new("Element");
        node.assign("type", element.kind().type_tag());
        node.assign("id", element.name());
        node.assign("length", self.precision.format(element.length()));

        node.append(parameter(
            "StartPosition",
            "double",
            self.precision
                .format(lattice.base() + element.start_position()),
        ));
        node.append(parameter(
            "Position",
            "double",
            self.precision.format(lattice.base() + element.position()),
        ));

        let Some(device) = device else {
            return node;
        };

        match element.kind() {
            ElementKind::Dipole
            | ElementKind::EDipole
            | ElementKind::Quadrupole
            | ElementKind::EQuad
            | ElementKind::SkewQuad
            | ElementKind::Sextupole
            | ElementKind::Solenoid
            | ElementKind::HSteerer
            | ElementKind::VSteerer
            | ElementKind::EKicker => {
                let field = self.read(device, Parameter::Field);
                node.append(parameter("MagField", "double", field.to_string()));
                node.append(parameter(
                    "EffLength",
                    "double",
                    effective_length(element, device).to_string(),
                ));
                node.append(parameter(
                    "Orientation",
                    "int",
                    device.orientation().code().to_string(),
                ));
            }
            ElementKind::RfGap => {
                let frequency = self.read(device, Parameter::Frequency) * 1.0e6;
                let phase = self.read(device, Parameter::Phase).to_radians();
                let etl = self.read(device, Parameter::EnergyGain) * 1.0e6;
                node.append(parameter("Frequency", "double", frequency.to_string()));
                node.append(parameter("Phase", "double", phase.to_string()));
                node.append(parameter("ETL", "double", etl.to_string()));
            }
            ElementKind::Drift
            | ElementKind::Marker
            | ElementKind::PermMarker
            | ElementKind::BPMonitor
            | ElementKind::BLMonitor
            | ElementKind::BSMonitor
            | ElementKind::BCMonitor
            | ElementKind::WireScanner => {}
        }

        node
    }

    /// Reads from the configured source, falling back to the design value.
    fn read(&self, device: &Device, parameter: Parameter) -> f64 {
        self.source.read(device, parameter).unwrap_or_else(|err| {
            warn!(
                device = device.id().to_string(),
                parameter = parameter.name(),
                err:%;
                "Parameter read failed, using design value"
            );
            DesignSource::value(device, parameter)
        })
    }
}

/// Effective length written for `element`.
///
/// Thick magnets carry the share of the device's effective length that
/// matches their share of its physical length. Steerers and kickers carry
/// the whole effective length.
fn effective_length(element: &Element, device: &Device) -> f64 {
    let scaled = element.is_thick() && device.length() > 0.0;
    if scaled {
        device.effective_length() * element.length() / device.length()
    } else {
        device.effective_length()
    }
}

fn parameter(name: &str, kind: &str, value: String) -> XmlNode {
    let mut node = XmlNode::new("Parameter");
    node.assign("name", name);
    node.assign("type", kind);
    node.assign("value", value);
    node
}
