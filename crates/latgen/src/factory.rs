//! Lattice generation from a device hierarchy.
//!
//! [`LatticeFactory::build`] turns a [`Sequence`] tree into a [`Lattice`] in
//! two passes:
//!
//! 1. **Thick pass.** Devices whose kind is in the thick set are converted to
//!    elements, sorted by position and appended. Magnets are halved about a
//!    permanent center marker; slim devices (RF gaps, current monitors) with an
//!    effective length reserve it as a pair of drifts. Thin elements produced
//!    here are inserted once all thick elements are in place, unless their
//!    device kind also belongs to the thin set. A trailing drift closes the
//!    lattice up to the declared sequence length.
//! 2. **Thin pass.** Devices whose kind is in the thin set are converted again
//!    and their thin elements inserted in position order.
//!
//! The finished lattice is checked for consistency before it is returned.

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use serde::Deserialize;

use latgen_core::{
    element::{Element, ElementKind},
    hierarchy::{Device, DeviceKind, Sequence},
    identifier::Id,
    precision::Precision,
};

use crate::{
    diagnostic::{Diagnostic, ErrorCode},
    error::LatticeError,
    lattice::Lattice,
};

/// Which device kinds take part in which pass.
///
/// # Examples
///
/// ```
/// # use latgen::factory::FactoryConfig;
/// let config: FactoryConfig = toml::from_str(r#"
///     thick_kinds = ["QH", "DH"]
///     halve_magnets = false
/// "#).unwrap();
///
/// assert_eq!(config.thick_kinds().len(), 2);
/// assert!(!config.halve_magnets());
/// assert!(!config.thin_kinds().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    thick_kinds: Vec<DeviceKind>,
    thin_kinds: Vec<DeviceKind>,
    halve_magnets: bool,
}

impl FactoryConfig {
    /// Creates a configuration with explicit kind sets.
    pub fn new(thick_kinds: Vec<DeviceKind>, thin_kinds: Vec<DeviceKind>, halve_magnets: bool) -> Self {
        Self {
            thick_kinds,
            thin_kinds,
            halve_magnets,
        }
    }

    /// Sets whether magnets are halved about a center marker (builder style).
    pub fn with_halve_magnets(mut self, halve_magnets: bool) -> Self {
        self.halve_magnets = halve_magnets;
        self
    }

    /// Device kinds collected in the thick pass.
    pub fn thick_kinds(&self) -> &[DeviceKind] {
        &self.thick_kinds
    }

    /// Device kinds collected in the thin pass.
    pub fn thin_kinds(&self) -> &[DeviceKind] {
        &self.thin_kinds
    }

    pub fn halve_magnets(&self) -> bool {
        self.halve_magnets
    }

    fn is_thick(&self, kind: &DeviceKind) -> bool {
        self.thick_kinds.contains(kind)
    }

    fn is_thin(&self, kind: &DeviceKind) -> bool {
        self.thin_kinds.contains(kind)
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        let thick = ["DH", "PQ", "S", "RG", "BCM", "SOL", "QUAD", "QSC", "EQ", "EDP"];
        let thin = [
            "DCH", "DCV", "EKick", "RG", "BCM", "BPM", "BLM", "BSM", "WS", "Foil", "marker",
        ];
        Self {
            thick_kinds: thick.into_iter().map(DeviceKind::from).collect(),
            thin_kinds: thin.into_iter().map(DeviceKind::from).collect(),
            halve_magnets: true,
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct Generated {
    lattice: Lattice,
    diagnostics: Vec<Diagnostic>,
}

impl Generated {
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Warnings collected while building, at most one per device.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Lattice, Vec<Diagnostic>) {
        (self.lattice, self.diagnostics)
    }
}

/// Builds lattices from device hierarchies.
#[derive(Debug, Clone, Default)]
pub struct LatticeFactory {
    config: FactoryConfig,
    precision: Precision,
}

impl LatticeFactory {
    pub fn new(config: FactoryConfig, precision: Precision) -> Self {
        Self { config, precision }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Builds the lattice of `sequence`.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError`] when devices overlap, when a thin device
    /// lies outside the lattice, or when the finished lattice fails its
    /// consistency check. No partial lattice is returned.
    pub fn build(&self, sequence: &Sequence) -> Result<Generated, LatticeError> {
        info!(sequence = sequence.id().to_string(); "Building lattice");

        let mut build = Build {
            factory: self,
            lattice: Lattice::new(sequence.id().to_string(), self.precision),
            diagnostics: IndexMap::new(),
        };

        build.thick_pass(sequence)?;
        build.thin_pass(sequence)?;
        build.lattice.check_consistency()?;

        let Build {
            lattice,
            diagnostics,
            ..
        } = build;

        info!(
            elements = lattice.len(),
            length = lattice.length(),
            warnings = diagnostics.len();
            "Lattice built"
        );

        Ok(Generated {
            lattice,
            diagnostics: diagnostics.into_values().collect(),
        })
    }
}

/// State of one build.
struct Build<'a> {
    factory: &'a LatticeFactory,
    lattice: Lattice,
    diagnostics: IndexMap<Id, Diagnostic>,
}

impl Build<'_> {
    fn thick_pass(&mut self, sequence: &Sequence) -> Result<(), LatticeError> {
        let factory = self.factory;
        let config = &factory.config;
        let candidates = self.collect(sequence, |kind| config.is_thick(kind))?;
        debug!(candidates = candidates.len(); "Thick pass");

        let mut deferred = Vec::new();
        for (kind, element) in candidates {
            if element.is_thick() {
                self.lattice.append(element)?;
            } else if !config.is_thin(&kind) {
                deferred.push(element);
            }
        }

        let declared = sequence.total_length();
        let remainder = declared - self.lattice.length();
        if factory.precision.is_positive(remainder) {
            trace!(declared, remainder; "Closing lattice with drift");
            self.lattice
                .append(Element::drift(declared - remainder * 0.5, remainder)?)?;
        }

        for element in deferred {
            self.lattice.insert(element)?;
        }
        Ok(())
    }

    fn thin_pass(&mut self, sequence: &Sequence) -> Result<(), LatticeError> {
        let factory = self.factory;
        let config = &factory.config;
        let candidates = self.collect(sequence, |kind| config.is_thin(kind))?;
        debug!(candidates = candidates.len(); "Thin pass");

        for (_, element) in candidates {
            if !element.is_thick() {
                self.lattice.insert(element)?;
            }
        }
        Ok(())
    }

    /// Elements of every device whose kind passes `filter`, stably sorted by
    /// position and tagged with the device kind.
    fn collect(
        &mut self,
        sequence: &Sequence,
        filter: impl Fn(&DeviceKind) -> bool,
    ) -> Result<Vec<(DeviceKind, Element)>, LatticeError> {
        let mut candidates = Vec::new();
        for (device, position) in sequence.placed_devices() {
            if !filter(device.kind()) {
                continue;
            }
            for element in self.device_elements(device, position)? {
                candidates.push((device.kind().clone(), element));
            }
        }
        candidates.sort_by(|(_, a), (_, b)| a.position().total_cmp(&b.position()));
        Ok(candidates)
    }

    /// Converts one device into its lattice elements.
    fn device_elements(&mut self, device: &Device, position: f64) -> Result<Vec<Element>, LatticeError> {
        let id = device.id();
        let name = id.to_string();
        let factory = self.factory;
        let precision = &factory.precision;

        let kind = match device.kind() {
            DeviceKind::Bend => ElementKind::Dipole,
            DeviceKind::EBend => ElementKind::EDipole,
            DeviceKind::Quadrupole | DeviceKind::PermQuadrupole => ElementKind::Quadrupole,
            DeviceKind::EQuad => ElementKind::EQuad,
            DeviceKind::SkewQuad => ElementKind::SkewQuad,
            DeviceKind::Sextupole => ElementKind::Sextupole,
            DeviceKind::Solenoid => ElementKind::Solenoid,
            DeviceKind::HSteerer => ElementKind::HSteerer,
            DeviceKind::VSteerer => ElementKind::VSteerer,
            DeviceKind::Kicker => ElementKind::EKicker,
            DeviceKind::RfGap => ElementKind::RfGap,
            DeviceKind::Bpm => ElementKind::BPMonitor,
            DeviceKind::Blm => ElementKind::BLMonitor,
            DeviceKind::Bsm => ElementKind::BSMonitor,
            DeviceKind::Bcm => ElementKind::BCMonitor,
            DeviceKind::WireScanner => ElementKind::WireScanner,
            DeviceKind::Marker => {
                let marker = ElementKind::PermMarker.construct(name, position, 0.0)?;
                return Ok(vec![marker.with_device(id)]);
            }
            DeviceKind::Other(tag) => {
                let marker = ElementKind::PermMarker.construct(name, position, 0.0)?;
                self.report_unknown_kind(id, tag);
                return Ok(vec![marker.with_device(id)]);
            }
        };

        // Electrostatic devices are modelled with their physical length.
        let length = if device.kind().is_electrostatic() {
            device.length()
        } else {
            device.effective_length()
        };

        let element = Element::new(kind, name, position, length)?.with_device(id);
        trace!(device = id.to_string(), kind:% = kind, position, length; "Device converted");

        if element.is_thick() {
            if !factory.config.halve_magnets {
                return Ok(vec![element]);
            }
            let center = Element::perm_marker(id.center_marker_name(), position).with_device(id);
            let pieces = element.split(center, precision)?;
            return Ok(pieces
                .into_iter()
                .filter(|piece| piece.kind() != ElementKind::Marker)
                .collect());
        }

        if kind.is_slim() && precision.is_positive(element.effective_length()) {
            return Ok(element.as_tuple(precision)?.into());
        }

        Ok(vec![element])
    }

    fn report_unknown_kind(&mut self, id: Id, tag: &str) {
        if self.diagnostics.contains_key(&id) {
            return;
        }
        warn!(device = id.to_string(), kind = tag; "Unknown device kind, placing marker");
        let diagnostic = Diagnostic::warning(format!("device `{id}` has unknown kind `{tag}`"))
            .with_code(ErrorCode::W001)
            .with_device(id)
            .with_help("the device is placed as a permanent marker at its position");
        self.diagnostics.insert(id, diagnostic);
    }
}
