//! Hardware sections: which portion of a real device an element models.

use std::fmt;

/// Portion of a physical device represented by a lattice element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HardwareSection {
    /// Not tied to a device portion (drifts, markers).
    #[default]
    Unknown,
    /// A point-like device.
    Point,
    /// The upstream end of a device, up to an internal cut.
    Upstream,
    /// The downstream end of a device, from an internal cut.
    Downstream,
    /// The complete device.
    Whole,
    /// A slice strictly inside a device, touching neither end.
    Internal,
}

impl HardwareSection {
    /// Sections of the upstream and downstream pieces when an element with
    /// this section is cut in two.
    ///
    /// # Examples
    ///
    /// ```
    /// use latgen_core::element::HardwareSection;
    ///
    /// assert_eq!(
    ///     HardwareSection::Whole.split(),
    ///     (HardwareSection::Upstream, HardwareSection::Downstream)
    /// );
    /// assert_eq!(
    ///     HardwareSection::Upstream.split(),
    ///     (HardwareSection::Upstream, HardwareSection::Internal)
    /// );
    /// ```
    pub fn split(self) -> (HardwareSection, HardwareSection) {
        match self {
            HardwareSection::Whole => (HardwareSection::Upstream, HardwareSection::Downstream),
            HardwareSection::Upstream => (HardwareSection::Upstream, HardwareSection::Internal),
            HardwareSection::Downstream => {
                (HardwareSection::Internal, HardwareSection::Downstream)
            }
            HardwareSection::Internal | HardwareSection::Point | HardwareSection::Unknown => {
                (self, self)
            }
        }
    }
}

impl fmt::Display for HardwareSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HardwareSection::Unknown => "unknown",
            HardwareSection::Point => "point",
            HardwareSection::Upstream => "upstream",
            HardwareSection::Downstream => "downstream",
            HardwareSection::Whole => "whole",
            HardwareSection::Internal => "internal",
        };
        f.write_str(name)
    }
}
