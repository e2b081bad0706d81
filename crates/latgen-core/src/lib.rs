//! Latgen Core Types and Definitions
//!
//! This crate provides the foundational types shared by the latgen lattice
//! generator. It includes:
//!
//! - **Identifiers**: String-interned device identities ([`identifier::Id`])
//! - **Precision**: The numeric tolerance policy ([`precision::Precision`])
//! - **Elements**: Lattice element kinds, hardware sections, thin-element
//!   behaviour and the split primitive ([`element`] module)
//! - **Hierarchy**: The device hierarchy a lattice is generated from
//!   ([`hierarchy`] module)

pub mod element;
pub mod hierarchy;
pub mod identifier;
pub mod precision;
