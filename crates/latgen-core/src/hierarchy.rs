//! Device hierarchy model.
//!
//! A lattice is generated from a tree of [`Sequence`]s. Each sequence holds
//! leaf [`Device`]s positioned relative to the sequence start, and may nest
//! further sub-sequences positioned relative to their parent. The types
//! implement [`serde::Deserialize`] so that a hierarchy can be loaded from a
//! TOML document:
//!
//! ```toml
//! id = "MEBT"
//! length = 20.0
//!
//! [[device]]
//! id = "MEBT_Mag:QH01"
//! kind = "QH"
//! position = 10.0
//! length = 4.0
//!
//! [[sequence]]
//! id = "MEBT_Diag"
//! position = 12.0
//!
//! [[sequence.device]]
//! id = "MEBT_Diag:BPM01"
//! kind = "BPM"
//! position = 3.0
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::identifier::Id;

/// Kind of a device in the hierarchy.
///
/// Parsed case-insensitively from the kind tags used by device databases;
/// several tags may map to one kind (`QH`, `QV` and `QUAD` are all
/// [`DeviceKind::Quadrupole`]). Tags that match nothing are kept verbatim in
/// [`DeviceKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum DeviceKind {
    Bend,
    EBend,
    Quadrupole,
    PermQuadrupole,
    EQuad,
    SkewQuad,
    Sextupole,
    Solenoid,
    HSteerer,
    VSteerer,
    Kicker,
    RfGap,
    Bpm,
    Blm,
    Bsm,
    Bcm,
    WireScanner,
    Marker,
    Other(String),
}

impl DeviceKind {
    /// Canonical tag for this kind.
    pub fn tag(&self) -> &str {
        match self {
            DeviceKind::Bend => "DH",
            DeviceKind::EBend => "EDP",
            DeviceKind::Quadrupole => "QUAD",
            DeviceKind::PermQuadrupole => "PQ",
            DeviceKind::EQuad => "EQ",
            DeviceKind::SkewQuad => "QSC",
            DeviceKind::Sextupole => "S",
            DeviceKind::Solenoid => "SOL",
            DeviceKind::HSteerer => "DCH",
            DeviceKind::VSteerer => "DCV",
            DeviceKind::Kicker => "EKick",
            DeviceKind::RfGap => "RG",
            DeviceKind::Bpm => "BPM",
            DeviceKind::Blm => "BLM",
            DeviceKind::Bsm => "BSM",
            DeviceKind::Bcm => "BCM",
            DeviceKind::WireScanner => "WS",
            DeviceKind::Marker => "marker",
            DeviceKind::Other(tag) => tag,
        }
    }

    /// Returns `true` for electrostatic devices.
    pub fn is_electrostatic(&self) -> bool {
        matches!(self, DeviceKind::EBend | DeviceKind::EQuad | DeviceKind::Kicker)
    }
}

impl FromStr for DeviceKind {
    type Err = std::convert::Infallible;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let kind = match tag.to_ascii_uppercase().as_str() {
            "DH" | "DV" | "BEND" => DeviceKind::Bend,
            "EDP" | "EDIPOLE" => DeviceKind::EBend,
            "Q" | "QH" | "QV" | "QT" | "QTH" | "QTV" | "QUAD" => DeviceKind::Quadrupole,
            "PQ" => DeviceKind::PermQuadrupole,
            "EQ" | "EQUAD" => DeviceKind::EQuad,
            "QSC" | "SKEWQUAD" => DeviceKind::SkewQuad,
            "S" | "SH" | "SV" | "SEXT" => DeviceKind::Sextupole,
            "SOL" => DeviceKind::Solenoid,
            "DCH" => DeviceKind::HSteerer,
            "DCV" => DeviceKind::VSteerer,
            "EKICK" | "KICK" => DeviceKind::Kicker,
            "RG" | "RFGAP" => DeviceKind::RfGap,
            "BPM" | "RBPM" => DeviceKind::Bpm,
            "BLM" => DeviceKind::Blm,
            "BSM" => DeviceKind::Bsm,
            "BCM" => DeviceKind::Bcm,
            "WS" => DeviceKind::WireScanner,
            "MARKER" => DeviceKind::Marker,
            _ => DeviceKind::Other(tag.to_string()),
        };
        Ok(kind)
    }
}

impl From<String> for DeviceKind {
    fn from(tag: String) -> Self {
        match tag.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for DeviceKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Field orientation of a magnet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Integer code used in serialized lattices.
    pub fn code(self) -> i32 {
        match self {
            Orientation::None => 0,
            Orientation::Horizontal => 1,
            Orientation::Vertical => 2,
        }
    }
}

/// Static design values of a device.
///
/// Units follow device databases: frequency in MHz, phase in degrees, energy
/// gain (E0TL) in MV.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DesignValues {
    pub field: Option<f64>,
    pub orientation: Option<Orientation>,
    pub frequency: Option<f64>,
    pub phase: Option<f64>,
    pub energy_gain: Option<f64>,
}

/// A leaf device.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Device {
    id: Id,
    kind: DeviceKind,
    position: f64,
    #[serde(default)]
    length: f64,
    #[serde(default)]
    effective_length: Option<f64>,
    #[serde(default)]
    design: DesignValues,
}

impl Device {
    /// Creates a device positioned relative to its owning sequence.
    pub fn new(id: impl Into<Id>, kind: impl Into<DeviceKind>, position: f64, length: f64) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position,
            length,
            effective_length: None,
            design: DesignValues::default(),
        }
    }

    /// Sets an effective length distinct from the physical length (builder style).
    pub fn with_effective_length(mut self, effective_length: f64) -> Self {
        self.effective_length = Some(effective_length);
        self
    }

    /// Sets the design values (builder style).
    pub fn with_design(mut self, design: DesignValues) -> Self {
        self.design = design;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Position of the device center within its owning sequence.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Physical length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Effective length, falling back to the physical length.
    pub fn effective_length(&self) -> f64 {
        self.effective_length.unwrap_or(self.length)
    }

    pub fn design(&self) -> &DesignValues {
        &self.design
    }

    /// Orientation from the design values, or implied by the kind for steerers.
    pub fn orientation(&self) -> Orientation {
        match (self.design.orientation, &self.kind) {
            (Some(orientation), _) => orientation,
            (None, DeviceKind::HSteerer) => Orientation::Horizontal,
            (None, DeviceKind::VSteerer) => Orientation::Vertical,
            (None, _) => Orientation::None,
        }
    }
}

/// A sequence node of the device hierarchy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sequence {
    id: Id,
    #[serde(default)]
    position: f64,
    #[serde(default)]
    length: f64,
    #[serde(default, rename = "device")]
    devices: Vec<Device>,
    #[serde(default, rename = "sequence")]
    sequences: Vec<Sequence>,
}

impl Sequence {
    /// Creates an empty sequence.
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            position: 0.0,
            length: 0.0,
            devices: Vec::new(),
            sequences: Vec::new(),
        }
    }

    /// Sets the position within the parent sequence (builder style).
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    /// Sets the declared length (builder style). Zero means "derive from
    /// sub-sequences".
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Adds a device (builder style).
    pub fn with_device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    /// Adds a sub-sequence (builder style).
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Position within the parent sequence.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Declared length.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Total length of this sequence.
    ///
    /// A sequence with a non-zero declared length is taken at its word. A
    /// zero-length sequence with sub-sequences is the sum of their totals.
    pub fn total_length(&self) -> f64 {
        if self.length == 0.0 && !self.sequences.is_empty() {
            self.sequences.iter().map(Sequence::total_length).sum()
        } else {
            self.length
        }
    }

    /// Depth-first list of every device together with its position relative
    /// to the start of this sequence.
    ///
    /// Devices of a sequence come before the devices of its sub-sequences.
    pub fn placed_devices(&self) -> Vec<(&Device, f64)> {
        let mut placed = Vec::new();
        self.collect_placed(0.0, &mut placed);
        placed
    }

    fn collect_placed<'a>(&'a self, offset: f64, placed: &mut Vec<(&'a Device, f64)>) {
        placed.extend(
            self.devices
                .iter()
                .map(|device| (device, offset + device.position)),
        );
        for sequence in &self.sequences {
            sequence.collect_placed(offset + sequence.position, placed);
        }
    }

    /// Position of device `id` relative to the start of this sequence.
    pub fn position_of(&self, id: Id) -> Option<f64> {
        self.placed_devices()
            .into_iter()
            .find(|(device, _)| device.id == id)
            .map(|(_, position)| position)
    }

    /// Looks up device `id` anywhere below this sequence.
    pub fn find_device(&self, id: Id) -> Option<&Device> {
        self.devices
            .iter()
            .find(|device| device.id == id)
            .or_else(|| self.sequences.iter().find_map(|seq| seq.find_device(id)))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn nested() -> Sequence {
        Sequence::new("ROOT")
            .with_device(Device::new("Q1", "QH", 2.0, 0.5))
            .with_sequence(
                Sequence::new("A")
                    .with_position(0.0)
                    .with_length(10.0)
                    .with_device(Device::new("BPM1", "BPM", 4.0, 0.0)),
            )
            .with_sequence(
                Sequence::new("B")
                    .with_position(10.0)
                    .with_length(5.0)
                    .with_device(Device::new("WS1", "ws", 1.5, 0.0)),
            )
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(DeviceKind::from("QV"), DeviceKind::Quadrupole);
        assert_eq!(DeviceKind::from("qh"), DeviceKind::Quadrupole);
        assert_eq!(DeviceKind::from("PQ"), DeviceKind::PermQuadrupole);
        assert_eq!(DeviceKind::from("EKick"), DeviceKind::Kicker);
        assert_eq!(DeviceKind::from("marker"), DeviceKind::Marker);
        assert_eq!(
            DeviceKind::from("Foil"),
            DeviceKind::Other("Foil".to_string())
        );
    }

    #[test]
    fn test_total_length_derives_from_children() {
        let root = nested();
        assert_approx_eq!(f64, root.total_length(), 15.0);
        assert_approx_eq!(f64, root.clone().with_length(40.0).total_length(), 40.0);
    }

    #[test]
    fn test_placed_devices_accumulate_offsets() {
        let root = nested();
        let placed: Vec<_> = root
            .placed_devices()
            .into_iter()
            .map(|(device, position)| (device.id().to_string(), position))
            .collect();

        assert_eq!(placed.len(), 3);
        assert_eq!(placed[0].0, "Q1");
        assert_approx_eq!(f64, placed[2].1, 11.5);
    }

    #[test]
    fn test_position_of_and_find() {
        let root = nested();
        assert_eq!(root.position_of(Id::new("WS1")), Some(11.5));
        assert_eq!(root.position_of(Id::new("missing")), None);
        assert_eq!(
            root.find_device(Id::new("BPM1")).map(|d| d.kind().clone()),
            Some(DeviceKind::Bpm)
        );
    }

    #[test]
    fn test_effective_length_and_orientation() {
        let steerer = Device::new("DCV1", "DCV", 1.0, 0.2);
        assert_approx_eq!(f64, steerer.effective_length(), 0.2);
        assert_eq!(steerer.orientation(), Orientation::Vertical);

        let quad = Device::new("Q2", "QV", 1.0, 0.3).with_effective_length(0.25);
        assert_approx_eq!(f64, quad.effective_length(), 0.25);
        assert_eq!(quad.orientation(), Orientation::None);
    }

    #[test]
    fn test_deserialize_toml_hierarchy() {
        let source = r#"
            id = "MEBT"
            length = 20.0

            [[device]]
            id = "QH01"
            kind = "QH"
            position = 10.0
            length = 4.0
            effective_length = 3.8
            design = { field = 1.25, orientation = "horizontal" }

            [[sequence]]
            id = "DIAG"
            position = 12.0

            [[sequence.device]]
            id = "BPM01"
            kind = "BPM"
            position = 3.0
        "#;

        let root: Sequence = toml::from_str(source).expect("valid hierarchy");

        assert_eq!(root.id(), "MEBT");
        assert_eq!(root.devices().len(), 1);
        assert_eq!(root.devices()[0].kind(), &DeviceKind::Quadrupole);
        assert_eq!(root.devices()[0].design().field, Some(1.25));
        assert_eq!(root.devices()[0].orientation(), Orientation::Horizontal);
        assert_eq!(root.position_of(Id::new("BPM01")), Some(15.0));
    }
}
