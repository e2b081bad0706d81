//! Behaviour shared by thin elements.
//!
//! Thin elements have no physical length. Some of them (RF gaps, current
//! monitors) still carry an effective length; in the thick pass that length is
//! reserved as a pair of drifts so that the element can later be inserted into
//! the gap between them.

use super::{Element, ElementError};
use crate::precision::Precision;

impl Element {
    /// Splitting a point-like element leaves it in place and puts `insert`
    /// right behind it.
    pub(super) fn split_thin(&self, insert: Element) -> Vec<Element> {
        vec![self.clone(), insert]
    }

    /// Drift covering the upstream half of the effective length.
    ///
    /// Returns a transient marker at the element position when the half length
    /// is negligible.
    pub fn upstream_drift(&self, precision: &Precision) -> Result<Element, ElementError> {
        self.reserved_drift(-1.0, precision)
    }

    /// Drift covering the downstream half of the effective length.
    ///
    /// Returns a transient marker at the element position when the half length
    /// is negligible.
    pub fn downstream_drift(&self, precision: &Precision) -> Result<Element, ElementError> {
        self.reserved_drift(1.0, precision)
    }

    /// Returns `[upstream drift, self, downstream drift]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use latgen_core::element::{Element, ElementKind};
    /// use latgen_core::precision::Precision;
    ///
    /// let gap = Element::new(ElementKind::RfGap, "RG1", 10.0, 2.0).unwrap();
    /// let tuple = gap.as_tuple(&Precision::default()).unwrap();
    ///
    /// assert_eq!(tuple[0].kind(), ElementKind::Drift);
    /// assert_eq!(tuple[0].end_position(), 10.0);
    /// assert_eq!(tuple[1].name(), "RG1");
    /// assert_eq!(tuple[2].start_position(), 10.0);
    /// ```
    pub fn as_tuple(&self, precision: &Precision) -> Result<[Element; 3], ElementError> {
        Ok([
            self.upstream_drift(precision)?,
            self.clone(),
            self.downstream_drift(precision)?,
        ])
    }

    fn reserved_drift(&self, direction: f64, precision: &Precision) -> Result<Element, ElementError> {
        let half = self.effective_length * 0.5;
        if precision.is_negligible(half) {
            return Ok(Element::marker(self.position));
        }
        Element::drift(self.position + direction * half * 0.5, half)
    }
}
