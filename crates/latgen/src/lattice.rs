//! The lattice: an ordered, gap-free sequence of elements.
//!
//! A [`Lattice`] always starts with a `BEGIN_<name>` and ends with an
//! `END_<name>` permanent marker. In between, elements follow each other
//! without gaps or overlaps: for every neighbouring pair the downstream end of
//! the first coincides with the upstream end of the second, within the
//! tolerance of the lattice [`Precision`].
//!
//! Lattices grow in two ways:
//!
//! - [`Lattice::append`] places an element behind the current tail, filling
//!   any gap with a drift.
//! - [`Lattice::insert`] cuts the element covering a position and places a
//!   zero-length element there.
//!
//! Transient markers are left at every boundary produced by these operations
//! so that later insertions can locate their target quickly.

use std::cell::OnceCell;

use log::{debug, trace};

use latgen_core::{
    element::{Element, ElementKind},
    identifier::Id,
    precision::Precision,
};

use crate::{association::Association, error::LatticeError};

/// An ordered sequence of elements between two boundary markers.
#[derive(Debug, Clone)]
pub struct Lattice {
    name: String,
    base: f64,
    precision: Precision,
    elements: Vec<Element>,
    association: OnceCell<Association>,
}

impl Lattice {
    /// Creates an empty lattice: `[BEGIN_<name>, marker, END_<name>]`, all at 0.
    pub fn new(name: impl Into<String>, precision: Precision) -> Self {
        let name = name.into();
        let elements = vec![
            Element::perm_marker(begin_name(&name), 0.0),
            Element::marker(0.0),
            Element::perm_marker(end_name(&name), 0.0),
        ];

        Self {
            name,
            base: 0.0,
            precision,
            elements,
            association: OnceCell::new(),
        }
    }

    /// Sets the base offset (builder style).
    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset added to element positions to obtain absolute positions.
    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn set_base(&mut self, base: f64) {
        self.base = base;
    }

    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Total length: the position of the end marker.
    pub fn length(&self) -> f64 {
        self.elements
            .last()
            .map(Element::end_position)
            .unwrap_or_default()
    }

    /// Number of elements, boundary markers included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`: the boundary markers are never removed.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Absolute position of the element at `index`.
    pub fn absolute_position(&self, index: usize) -> Option<f64> {
        self.elements
            .get(index)
            .map(|element| self.base + element.position())
    }

    /// Device association of this lattice, built on first use.
    pub fn association(&self) -> &Association {
        self.association
            .get_or_init(|| Association::build(&self.elements))
    }

    /// Element standing for `device`.
    pub fn element_for(&self, device: Id) -> Option<&Element> {
        self.association()
            .element_index(device)
            .and_then(|index| self.elements.get(index))
    }

    /// Device the element at `index` was produced from.
    pub fn device_for(&self, index: usize) -> Option<Id> {
        self.association().device(index)
    }

    /// Appends `element` behind the current tail.
    ///
    /// A gap between the tail and the element start is filled with a drift
    /// followed by a transient marker. The element is followed by a transient
    /// marker at its downstream end, and the end marker moves there too.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::ConstructionFailure`] if the element's position or
    ///   length is not finite.
    /// - [`LatticeError::GeometryInconsistency`] if the element starts
    ///   upstream of the tail by more than the tolerance.
    ///
    /// The lattice is left unchanged on error.
    pub fn append(&mut self, element: Element) -> Result<(), LatticeError> {
        check_finite(&element)?;
        let tail_index = self.elements.len().saturating_sub(2);
        let tail = self.elements[tail_index].end_position();
        let gap = element.start_position() - tail;

        if self.precision.is_negative(gap) {
            return Err(LatticeError::GeometryInconsistency {
                name: element.name().to_string(),
                length: element.length(),
                remainder: gap,
            });
        }

        let filler = if self.precision.is_negligible(gap) {
            None
        } else {
            Some(Element::drift(tail + gap * 0.5, gap)?)
        };

        trace!(name = element.name(), position = element.position(), gap; "Appending element");
        self.association.take();

        let mut end = self
            .elements
            .pop()
            .unwrap_or_else(|| Element::perm_marker(end_name(&self.name), tail));
        if let Some(filler) = filler {
            self.elements.push(filler);
            self.elements.push(Element::marker(element.start_position()));
        }
        let downstream = element.end_position();
        self.elements.push(element);
        self.elements.push(Element::marker(downstream));
        end.set_position(downstream);
        self.elements.push(end);

        Ok(())
    }

    /// Inserts the zero-length `element` at its position.
    ///
    /// The element covering the position is located between the nearest
    /// transient markers around it and replaced by the pieces of
    /// [`Element::split`]. Without transient markers (after
    /// [`Lattice::clear_markers`]) the target is the last element before the
    /// end marker, so only positions inside that element can be inserted.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::ConstructionFailure`] if the position is not finite.
    /// - [`LatticeError::InsertNotThin`] if `element` has a length.
    /// - [`LatticeError::GeometryInconsistency`] if the position lies outside
    ///   the lattice or outside the located target.
    /// - [`LatticeError::ConstructionFailure`] if a piece cannot be built.
    pub fn insert(&mut self, element: Element) -> Result<(), LatticeError> {
        check_finite(&element)?;
        if !self.precision.is_negligible(element.length()) {
            return Err(LatticeError::InsertNotThin {
                name: element.name().to_string(),
                length: element.length(),
            });
        }

        let position = element.position();
        let length = self.length();
        for remainder in [position, length - position] {
            if self.precision.is_negative(remainder) {
                return Err(LatticeError::GeometryInconsistency {
                    name: element.name().to_string(),
                    length,
                    remainder,
                });
            }
        }

        let target = self.insertion_target(position);
        trace!(
            name = element.name(),
            position,
            into = self.elements[target].name();
            "Inserting element"
        );

        let pieces = self.elements[target].split(element, &self.precision)?;
        self.association.take();
        self.elements.splice(target..=target, pieces);

        Ok(())
    }

    /// Index of the element preceding the first transient marker downstream
    /// of `position`, or preceding the end marker if there is none.
    fn insertion_target(&self, position: f64) -> usize {
        let last = self.elements.len() - 1;
        let after = self.elements[1..last]
            .iter()
            .position(|element| {
                element.kind() == ElementKind::Marker && element.position() > position
            })
            .map_or(last, |offset| offset + 1);
        after - 1
    }

    /// Merges neighbouring drifts until no two drifts touch.
    ///
    /// The merged drift spans both: its length is the sum of the lengths and
    /// its center lies half that length after the upstream drift's start.
    pub fn join_drifts(&mut self) -> Result<(), LatticeError> {
        let mut index = 0;
        let mut merged = 0usize;

        while index + 1 < self.elements.len() {
            let (upstream, downstream) = (&self.elements[index], &self.elements[index + 1]);
            if upstream.kind() != ElementKind::Drift || downstream.kind() != ElementKind::Drift {
                index += 1;
                continue;
            }

            let length = upstream.length() + downstream.length();
            let joined = Element::drift(upstream.start_position() + length * 0.5, length)?;
            self.elements.splice(index..=index + 1, [joined]);
            merged += 1;
        }

        if merged > 0 {
            debug!(lattice = self.name.as_str(), merged; "Joined drifts");
            self.association.take();
        }
        Ok(())
    }

    /// Removes all transient markers. Boundary and permanent markers stay.
    ///
    /// Transient markers are what [`Lattice::insert`] uses to find its
    /// target, so clear them only once no further insertions follow.
    pub fn clear_markers(&mut self) {
        let before = self.elements.len();
        self.elements
            .retain(|element| element.kind() != ElementKind::Marker);
        if self.elements.len() != before {
            self.association.take();
        }
    }

    /// Checks that every element touches its neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::StructuralInconsistency`] naming the first
    /// offending pair.
    pub fn check_consistency(&self) -> Result<(), LatticeError> {
        for pair in self.elements.windows(2) {
            let [upstream, downstream] = pair else {
                continue;
            };
            let mismatch = upstream.position() + (upstream.length() + downstream.length()) * 0.5
                - downstream.position();
            if !self.precision.is_negligible(mismatch) {
                return Err(LatticeError::StructuralInconsistency {
                    upstream: upstream.name().to_string(),
                    downstream: downstream.name().to_string(),
                    mismatch,
                });
            }
        }
        Ok(())
    }

    /// Builds the lattice `<left>+<right>`: `left` followed by `right`.
    ///
    /// Both inputs are cloned. The interior of `right` is moved downstream by
    /// the length of `left`, and the boundary markers are renamed after the
    /// combined lattice. Precision and base offset are taken from `left`; the
    /// base of `right` is replaced, so its elements end up at
    /// `left.base() + left.length()` plus their own position.
    pub fn concatenate(left: &Lattice, right: &Lattice) -> Lattice {
        let name = format!("{}+{}", left.name, right.name);
        let offset = left.length();

        let mut elements = Vec::with_capacity(left.len() + right.len());
        elements.extend(left.elements[..left.len() - 1].iter().cloned());
        elements.extend(right.elements[1..].iter().cloned().map(|mut element| {
            element.translate(offset);
            element
        }));

        if let Some(begin) = elements.first_mut() {
            begin.set_name(begin_name(&name));
        }
        if let Some(end) = elements.last_mut() {
            end.set_name(end_name(&name));
        }

        debug!(lattice = name.as_str(), length = offset + right.length(); "Concatenated lattices");

        Lattice {
            name,
            base: left.base,
            precision: left.precision,
            elements,
            association: OnceCell::new(),
        }
    }
}

fn begin_name(lattice: &str) -> String {
    format!("BEGIN_{lattice}")
}

fn end_name(lattice: &str) -> String {
    format!("END_{lattice}")
}

fn check_finite(element: &Element) -> Result<(), LatticeError> {
    for (what, value) in [("position", element.position()), ("length", element.length())] {
        if !value.is_finite() {
            return Err(LatticeError::ConstructionFailure {
                kind: element.kind(),
                name: element.name().to_string(),
                reason: format!("{what} is not finite ({value})"),
            });
        }
    }
    Ok(())
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Gap before and length of each thick element.
    fn layout_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((0.0f64..5.0, 0.1f64..4.0), 1..12)
    }

    /// Insertion points as fractions of the lattice length.
    fn fractions_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..=1.0, 0..12)
    }

    fn build(name: &str, layout: &[(f64, f64)], fractions: &[f64]) -> Lattice {
        let mut lattice = Lattice::new(name, Precision::default());
        let mut cursor = 0.0;
        for (index, (gap, length)) in layout.iter().enumerate() {
            let position = cursor + gap + length * 0.5;
            let element = Element::new(ElementKind::Quadrupole, format!("Q{index}"), position, *length)
                .expect("valid quadrupole");
            lattice.append(element).expect("append succeeds");
            cursor += gap + length;
        }
        let total = lattice.length();
        for (index, fraction) in fractions.iter().enumerate() {
            let element = Element::new(ElementKind::BPMonitor, format!("BPM{index}"), total * fraction, 0.0)
                .expect("valid bpm");
            lattice.insert(element).expect("insert succeeds");
        }
        lattice
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every neighbouring pair touches after appends and inserts.
    fn check_adjacency_holds(layout: Vec<(f64, f64)>, fractions: Vec<f64>) -> Result<(), TestCaseError> {
        let lattice = build("P", &layout, &fractions);

        prop_assert!(
            lattice.check_consistency().is_ok(),
            "inconsistent lattice: {:?}",
            lattice.check_consistency()
        );
        Ok(())
    }

    /// Splitting never loses length: the pieces add up to the lattice length.
    fn check_length_is_conserved(layout: Vec<(f64, f64)>, fractions: Vec<f64>) -> Result<(), TestCaseError> {
        let lattice = build("P", &layout, &fractions);
        let expected: f64 = layout.iter().map(|(gap, length)| gap + length).sum();
        let covered: f64 = lattice.iter().map(Element::length).sum();

        prop_assert!(approx_eq!(f64, lattice.length(), expected, epsilon = 1.0e-9));
        prop_assert!(approx_eq!(f64, covered, expected, epsilon = 1.0e-3));
        Ok(())
    }

    /// Joining drifts twice gives the same lattice as joining once.
    fn check_join_drifts_is_idempotent(
        layout: Vec<(f64, f64)>,
        fractions: Vec<f64>,
    ) -> Result<(), TestCaseError> {
        let mut lattice = build("P", &layout, &fractions);
        lattice.clear_markers();
        lattice.join_drifts().expect("join succeeds");
        let once = lattice.elements().to_vec();

        lattice.join_drifts().expect("join succeeds");

        prop_assert_eq!(lattice.elements(), once.as_slice());
        prop_assert!(lattice.check_consistency().is_ok());
        Ok(())
    }

    /// Concatenation adds lengths and keeps the result consistent.
    fn check_concatenate_adds_lengths(
        left: Vec<(f64, f64)>,
        right: Vec<(f64, f64)>,
    ) -> Result<(), TestCaseError> {
        let left = build("A", &left, &[]);
        let right = build("B", &right, &[]);

        let joined = Lattice::concatenate(&left, &right);

        prop_assert!(approx_eq!(
            f64,
            joined.length(),
            left.length() + right.length(),
            epsilon = 1.0e-9
        ));
        prop_assert_eq!(joined.len(), left.len() + right.len() - 2);
        prop_assert!(joined.check_consistency().is_ok());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn adjacency_holds(layout in layout_strategy(), fractions in fractions_strategy()) {
            check_adjacency_holds(layout, fractions)?;
        }

        #[test]
        fn length_is_conserved(layout in layout_strategy(), fractions in fractions_strategy()) {
            check_length_is_conserved(layout, fractions)?;
        }

        #[test]
        fn join_drifts_is_idempotent(layout in layout_strategy(), fractions in fractions_strategy()) {
            check_join_drifts_is_idempotent(layout, fractions)?;
        }

        #[test]
        fn concatenate_adds_lengths(left in layout_strategy(), right in layout_strategy()) {
            check_concatenate_adds_lengths(left, right)?;
        }
    }
}
