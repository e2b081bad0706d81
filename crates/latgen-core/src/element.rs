//! Lattice elements.
//!
//! An [`Element`] is a single entry of a lattice: a physical device (or a
//! slice of one), a drift space, or a marker. Elements are plain values; the
//! lattice that holds them owns them outright, and the only link back to the
//! device hierarchy is an interned [`Id`].
//!
//! # Overview
//!
//! - [`ElementKind`] - The closed set of kinds and the per-kind constructor table
//! - [`HardwareSection`] - Which portion of a device an element models
//! - [`Element::split`] - Cut a thick element around a zero-length insert
//! - [`Element::as_tuple`] - Surround a slim element with its reserved drifts

mod kind;
mod section;
mod thin;

pub use kind::{Constructor, ElementKind};
pub use section::HardwareSection;

use log::trace;
use thiserror::Error;

use crate::{identifier::Id, precision::Precision};

/// Name given to drift fillers.
pub const DRIFT_NAME: &str = "DRIFT";

/// Name given to transient split markers.
pub const MARKER_NAME: &str = "MARKER";

/// Errors raised while constructing or splitting elements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    /// A slice computed during a split or an append came out negative.
    #[error("negative slice in `{name}`: length {length}, remainder {remainder}")]
    NegativeSlice {
        name: String,
        length: f64,
        remainder: f64,
    },

    /// The constructor for a kind could not produce an element.
    #[error("cannot construct {kind} `{name}`: {reason}")]
    Construction {
        kind: ElementKind,
        name: String,
        reason: String,
    },
}

/// A single lattice entry.
///
/// Positions are centers measured relative to the base offset of the lattice
/// that owns the element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    name: String,
    position: f64,
    length: f64,
    effective_length: f64,
    section: HardwareSection,
    device: Option<Id>,
}

impl Element {
    /// Builds an element of `kind` through the constructor table.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Construction`] if the position or length is not
    /// finite, or if a thick kind is given a negative length.
    pub fn new(
        kind: ElementKind,
        name: impl Into<String>,
        position: f64,
        length: f64,
    ) -> Result<Self, ElementError> {
        kind.construct(name, position, length)
    }

    /// Builds a drift filler.
    pub fn drift(position: f64, length: f64) -> Result<Self, ElementError> {
        ElementKind::Drift.construct(DRIFT_NAME, position, length)
    }

    /// Builds a transient split marker.
    pub fn marker(position: f64) -> Self {
        Self::point(ElementKind::Marker, MARKER_NAME.to_string(), position)
    }

    /// Builds a permanent marker.
    pub fn perm_marker(name: impl Into<String>, position: f64) -> Self {
        Self::point(ElementKind::PermMarker, name.into(), position)
    }

    fn point(kind: ElementKind, name: String, position: f64) -> Self {
        Self {
            kind,
            name,
            position,
            length: 0.0,
            effective_length: 0.0,
            section: kind.default_section(),
            device: None,
        }
    }

    /// Sets the device this element was produced from (builder style).
    pub fn with_device(mut self, device: Id) -> Self {
        self.device = Some(device);
        self
    }

    /// Sets the hardware section (builder style).
    pub fn with_section(mut self, section: HardwareSection) -> Self {
        self.section = section;
        self
    }

    /// Overrides the effective length (builder style).
    pub fn with_effective_length(mut self, effective_length: f64) -> Self {
        self.effective_length = effective_length;
        self
    }

    /// Returns the element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the element.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns `true` if this element is appended in the thick pass.
    pub fn is_thick(&self) -> bool {
        self.kind.is_thick()
    }

    /// Returns the center position.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Moves the element so that its center lies at `position`.
    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    /// Moves the element by `offset`.
    pub fn translate(&mut self, offset: f64) {
        self.position += offset;
    }

    /// Returns the physical length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Returns the effective length.
    pub fn effective_length(&self) -> f64 {
        self.effective_length
    }

    /// Returns the upstream end, never below zero.
    pub fn start_position(&self) -> f64 {
        (self.position - self.length * 0.5).max(0.0)
    }

    /// Returns the downstream end.
    pub fn end_position(&self) -> f64 {
        self.position + self.length * 0.5
    }

    /// Returns the hardware section.
    pub fn section(&self) -> HardwareSection {
        self.section
    }

    /// Returns the device this element was produced from, if any.
    pub fn device(&self) -> Option<Id> {
        self.device
    }

    /// Cuts this element around `insert` and returns the replacement pieces.
    ///
    /// Thin elements are point-like and come back as `[self, insert]`. Thick
    /// elements are cut at the insert's position:
    ///
    /// - cut at the upstream end: `[insert, marker, self]`
    /// - cut at the downstream end: `[self, marker, insert]`
    /// - otherwise: `[upstream, marker, insert, marker, downstream]`
    ///
    /// Both pieces keep the kind and name of `self`; their hardware sections
    /// follow [`HardwareSection::split`] and the effective length is shared in
    /// proportion to the physical length.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::NegativeSlice`] when the cut lies outside the
    /// element by more than the tolerance, and [`ElementError::Construction`]
    /// if a piece cannot be built.
    pub fn split(&self, insert: Element, precision: &Precision) -> Result<Vec<Element>, ElementError> {
        if !self.is_thick() {
            return Ok(self.split_thin(insert));
        }

        let cut = insert.position();
        let up_len = precision.snap(cut - self.start_position());
        let dn_len = precision.snap(self.length - up_len);

        for remainder in [up_len, dn_len] {
            if precision.is_negative(remainder) {
                return Err(ElementError::NegativeSlice {
                    name: self.name.clone(),
                    length: self.length,
                    remainder,
                });
            }
        }

        if up_len == 0.0 {
            return Ok(vec![insert, Element::marker(cut), self.clone()]);
        }
        if dn_len == 0.0 {
            return Ok(vec![self.clone(), Element::marker(cut), insert]);
        }

        trace!(element = self.name, cut, up_len, dn_len; "Splitting element");

        let up_pos = self.start_position() + up_len * 0.5;
        let dn_pos = self.end_position() - dn_len * 0.5;
        let (up_section, dn_section) = self.section.split();

        let upstream = self.slice(up_pos, up_len, up_section)?;
        let downstream = self.slice(dn_pos, dn_len, dn_section)?;

        Ok(vec![
            upstream,
            Element::marker(cut),
            insert,
            Element::marker(cut),
            downstream,
        ])
    }

    /// Rebuilds a same-kind, same-name piece of this element.
    fn slice(
        &self,
        position: f64,
        length: f64,
        section: HardwareSection,
    ) -> Result<Element, ElementError> {
        let share = if self.length > 0.0 {
            length / self.length
        } else {
            0.0
        };

        let mut piece = self
            .kind
            .construct(self.name.clone(), position, length)?
            .with_section(section)
            .with_effective_length(self.effective_length * share);
        piece.device = self.device;
        Ok(piece)
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // =========================================================================
    // Strategies
    // =========================================================================

    /// A thick element between 0 and 100 with length up to 10.
    fn thick_element() -> impl Strategy<Value = Element> {
        (0.0f64..100.0, 0.1f64..10.0).prop_map(|(start, length)| {
            Element::new(ElementKind::Solenoid, "SOL", start + length * 0.5, length)
                .expect("valid solenoid")
        })
    }

    // =========================================================================
    // Property Check Functions
    // =========================================================================

    fn check_split_conserves_length(element: &Element, fraction: f64) -> Result<(), TestCaseError> {
        let precision = Precision::default();
        let cut = element.start_position() + element.length() * fraction;

        let pieces = element
            .split(Element::marker(cut), &precision)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let total: f64 = pieces.iter().map(Element::length).sum();
        prop_assert!((total - element.length()).abs() < 1.0e-9);

        for pair in pieces.windows(2) {
            let gap = pair[1].start_position() - pair[0].end_position();
            prop_assert!(
                precision.is_negligible(gap),
                "gap {} between `{}` and `{}`",
                gap,
                pair[0].name(),
                pair[1].name()
            );
        }
        Ok(())
    }

    fn check_split_outside_fails(element: &Element, overshoot: f64) -> Result<(), TestCaseError> {
        let precision = Precision::default();
        let cut = element.end_position() + overshoot;

        let result = element.split(Element::marker(cut), &precision);
        prop_assert!(
            matches!(result, Err(ElementError::NegativeSlice { .. })),
            "expected negative slice"
        );
        Ok(())
    }

    // =========================================================================
    // Property Tests
    // =========================================================================

    proptest! {
        #[test]
        fn split_conserves_length(element in thick_element(), fraction in 0.0f64..=1.0) {
            check_split_conserves_length(&element, fraction)?;
        }

        #[test]
        fn split_outside_fails(element in thick_element(), overshoot in 1.0e-3f64..5.0) {
            check_split_outside_fails(&element, overshoot)?;
        }
    }
}
