//! Device-to-element association.
//!
//! Maps every device of the hierarchy to the single lattice element that
//! stands for it, and every device-backed element back to its device. The
//! choice of representative element depends on the kind:
//!
//! - A halved magnet is represented by its `ELEMENT_CENTER:<id>` permanent
//!   marker.
//! - An unhalved thick device is represented by its first piece.
//! - Thin devices and fallback markers represent themselves.
//!
//! Drifts and transient markers belong to no device.

use indexmap::IndexMap;

use latgen_core::{
    element::{Element, ElementKind},
    identifier::Id,
};

/// Bidirectional device/element map of one lattice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    by_device: IndexMap<Id, usize>,
    by_element: IndexMap<usize, Id>,
}

impl Association {
    /// Builds the association for `elements`, indexed by position in the slice.
    pub fn build(elements: &[Element]) -> Self {
        let mut association = Self::default();

        for (index, element) in elements.iter().enumerate() {
            let Some(device) = element.device() else {
                continue;
            };

            match element.kind() {
                ElementKind::Drift | ElementKind::Marker => continue,
                ElementKind::PermMarker
                | ElementKind::HSteerer
                | ElementKind::VSteerer
                | ElementKind::EKicker
                | ElementKind::RfGap
                | ElementKind::BPMonitor
                | ElementKind::BLMonitor
                | ElementKind::BSMonitor
                | ElementKind::BCMonitor
                | ElementKind::WireScanner => {
                    association.by_device.insert(device, index);
                }
                ElementKind::Dipole
                | ElementKind::EDipole
                | ElementKind::Quadrupole
                | ElementKind::EQuad
                | ElementKind::SkewQuad
                | ElementKind::Sextupole
                | ElementKind::Solenoid => {
                    association.by_device.entry(device).or_insert(index);
                }
            }
            association.by_element.insert(index, device);
        }

        association
    }

    /// Index of the element representing `device`.
    pub fn element_index(&self, device: Id) -> Option<usize> {
        self.by_device.get(&device).copied()
    }

    /// Device of the element at `index`.
    pub fn device(&self, index: usize) -> Option<Id> {
        self.by_element.get(&index).copied()
    }

    /// Number of associated devices.
    pub fn len(&self) -> usize {
        self.by_device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_device.is_empty()
    }

    /// Devices with their representative element index, in lattice order of
    /// first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (Id, usize)> + '_ {
        self.by_device
            .iter()
            .map(|(device, index)| (*device, *index))
    }
}
