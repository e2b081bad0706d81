//! The closed set of element kinds and their constructor table.

use std::fmt;

use super::{Element, ElementError, HardwareSection};

/// Kind of a lattice element.
///
/// The kind is the only dispatch key for elements. Consumers that need
/// per-kind behaviour match on it exhaustively, so adding a kind is a compile
/// error everywhere a decision has to be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Empty space between devices.
    Drift,
    /// Transient split boundary.
    Marker,
    /// Permanent bookkeeping point (sequence boundaries, device centers).
    PermMarker,
    /// Magnetic bending dipole.
    Dipole,
    /// Electrostatic bending dipole.
    EDipole,
    /// Normal magnetic quadrupole.
    Quadrupole,
    /// Electrostatic quadrupole.
    EQuad,
    /// Skew quadrupole.
    SkewQuad,
    /// Sextupole.
    Sextupole,
    /// Solenoid.
    Solenoid,
    /// Horizontal steering dipole.
    HSteerer,
    /// Vertical steering dipole.
    VSteerer,
    /// Kicker.
    EKicker,
    /// Radio-frequency accelerating gap.
    RfGap,
    /// Beam position monitor.
    BPMonitor,
    /// Beam loss monitor.
    BLMonitor,
    /// Bunch shape monitor.
    BSMonitor,
    /// Beam current monitor.
    BCMonitor,
    /// Wire scanner.
    WireScanner,
}

/// Per-kind element constructor.
///
/// Arguments are name, center position and length. Thick kinds interpret the
/// length as physical length; thin kinds store it as effective length and have
/// zero physical length.
pub type Constructor = fn(ElementKind, String, f64, f64) -> Result<Element, ElementError>;

impl ElementKind {
    /// All kinds, in declaration order.
    pub const ALL: [ElementKind; 19] = [
        ElementKind::Drift,
        ElementKind::Marker,
        ElementKind::PermMarker,
        ElementKind::Dipole,
        ElementKind::EDipole,
        ElementKind::Quadrupole,
        ElementKind::EQuad,
        ElementKind::SkewQuad,
        ElementKind::Sextupole,
        ElementKind::Solenoid,
        ElementKind::HSteerer,
        ElementKind::VSteerer,
        ElementKind::EKicker,
        ElementKind::RfGap,
        ElementKind::BPMonitor,
        ElementKind::BLMonitor,
        ElementKind::BSMonitor,
        ElementKind::BCMonitor,
        ElementKind::WireScanner,
    ];

    /// Type tag written to serialized lattices.
    pub fn type_tag(self) -> &'static str {
        match self {
            ElementKind::Drift => "drift",
            ElementKind::Marker => "marker",
            ElementKind::PermMarker => "pmarker",
            ElementKind::Dipole => "dipole",
            ElementKind::EDipole => "edipole",
            ElementKind::Quadrupole => "quadrupole",
            ElementKind::EQuad => "equad",
            ElementKind::SkewQuad => "skew_quadrupole",
            ElementKind::Sextupole => "sextupole",
            ElementKind::Solenoid => "solenoid",
            ElementKind::HSteerer => "hsteerer",
            ElementKind::VSteerer => "vsteerer",
            ElementKind::EKicker => "ekicker",
            ElementKind::RfGap => "rfgap",
            ElementKind::BPMonitor => "beampositionmonitor",
            ElementKind::BLMonitor => "beamlossmonitor",
            ElementKind::BSMonitor => "bunchshapemonitor",
            ElementKind::BCMonitor => "beamcurrentmonitor",
            ElementKind::WireScanner => "wirescanner",
        }
    }

    /// Returns `true` for kinds that occupy physical length and are appended
    /// in the thick pass.
    pub fn is_thick(self) -> bool {
        match self {
            ElementKind::Drift
            | ElementKind::Dipole
            | ElementKind::EDipole
            | ElementKind::Quadrupole
            | ElementKind::EQuad
            | ElementKind::SkewQuad
            | ElementKind::Sextupole
            | ElementKind::Solenoid => true,
            ElementKind::Marker
            | ElementKind::PermMarker
            | ElementKind::HSteerer
            | ElementKind::VSteerer
            | ElementKind::EKicker
            | ElementKind::RfGap
            | ElementKind::BPMonitor
            | ElementKind::BLMonitor
            | ElementKind::BSMonitor
            | ElementKind::BCMonitor
            | ElementKind::WireScanner => false,
        }
    }

    /// Returns `true` for thin kinds whose effective length reserves drift
    /// space around them.
    pub fn is_slim(self) -> bool {
        matches!(self, ElementKind::RfGap | ElementKind::BCMonitor)
    }

    /// Returns `true` for transient and permanent markers.
    pub fn is_marker(self) -> bool {
        matches!(self, ElementKind::Marker | ElementKind::PermMarker)
    }

    /// Hardware section given to freshly constructed elements of this kind.
    pub fn default_section(self) -> HardwareSection {
        match self {
            ElementKind::Drift | ElementKind::Marker | ElementKind::PermMarker => {
                HardwareSection::Unknown
            }
            kind if kind.is_thick() => HardwareSection::Whole,
            _ => HardwareSection::Point,
        }
    }

    /// Looks up the constructor for this kind.
    pub fn constructor(self) -> Constructor {
        if self.is_thick() {
            construct_thick
        } else {
            construct_thin
        }
    }

    /// Builds an element of this kind through the constructor table.
    pub fn construct(
        self,
        name: impl Into<String>,
        position: f64,
        length: f64,
    ) -> Result<Element, ElementError> {
        (self.constructor())(self, name.into(), position, length)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

fn check_finite(kind: ElementKind, name: &str, what: &str, value: f64) -> Result<(), ElementError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ElementError::Construction {
            kind,
            name: name.to_string(),
            reason: format!("{what} is not finite ({value})"),
        })
    }
}

fn construct_thick(
    kind: ElementKind,
    name: String,
    position: f64,
    length: f64,
) -> Result<Element, ElementError> {
    check_finite(kind, &name, "position", position)?;
    check_finite(kind, &name, "length", length)?;
    if length < 0.0 {
        return Err(ElementError::Construction {
            kind,
            name,
            reason: format!("length {length} is negative"),
        });
    }

    Ok(Element {
        kind,
        name,
        position,
        length,
        effective_length: length,
        section: kind.default_section(),
        device: None,
    })
}

fn construct_thin(
    kind: ElementKind,
    name: String,
    position: f64,
    length: f64,
) -> Result<Element, ElementError> {
    check_finite(kind, &name, "position", position)?;
    check_finite(kind, &name, "effective length", length)?;

    Ok(Element {
        kind,
        name,
        position,
        length: 0.0,
        effective_length: length.max(0.0),
        section: kind.default_section(),
        device: None,
    })
}
