//! Export of generated lattices.
//!
//! Lattices are written as XML documents by [`xml::XmlWriter`]. Device
//! parameters that go into the document (fields, RF settings) are read
//! through a [`ParameterSource`], so the same writer serves design values and
//! values read from a running machine.
//!
//! # Pipeline Position
//!
//! ```text
//! Device hierarchy (TOML)
//!     ↓ factory
//! Lattice + association
//!     ↓ export (this module)
//! XML document
//! ```

pub mod xml;

use thiserror::Error;

use latgen_core::hierarchy::Device;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum Error {
    /// An element refers to a device the hierarchy does not contain.
    #[error("device `{0}` is not part of the hierarchy")]
    UnknownDevice(String),
}

/// A device parameter written to exported lattices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Magnetic or electric field.
    Field,
    /// RF frequency in MHz.
    Frequency,
    /// RF phase in degrees.
    Phase,
    /// Energy gain `E0TL` in MV.
    EnergyGain,
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Field => "field",
            Parameter::Frequency => "frequency",
            Parameter::Phase => "phase",
            Parameter::EnergyGain => "energy gain",
        }
    }
}

/// Failure to read a parameter from a [`ParameterSource`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read {} of `{device}`: {reason}", .parameter.name())]
pub struct ReadError {
    pub device: String,
    pub parameter: Parameter,
    pub reason: String,
}

/// Where exported device parameters come from.
///
/// Values are in the units of [`latgen_core::hierarchy::DesignValues`].
pub trait ParameterSource {
    /// Reads `parameter` of `device`.
    fn read(&self, device: &Device, parameter: Parameter) -> Result<f64, ReadError>;
}

/// Reads the static design values of each device.
///
/// Parameters without a design value read as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesignSource;

impl DesignSource {
    /// Design value of `parameter`, zero when not set.
    pub fn value(device: &Device, parameter: Parameter) -> f64 {
        let design = device.design();
        let value = match parameter {
            Parameter::Field => design.field,
            Parameter::Frequency => design.frequency,
            Parameter::Phase => design.phase,
            Parameter::EnergyGain => design.energy_gain,
        };
        value.unwrap_or_default()
    }
}

impl ParameterSource for DesignSource {
    fn read(&self, device: &Device, parameter: Parameter) -> Result<f64, ReadError> {
        Ok(Self::value(device, parameter))
    }
}
