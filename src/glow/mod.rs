//! Glow module - the Ember+ element tree and its BER wire codec.
//!
//! Provides:
//! - The arena-backed live [`Tree`] shared by all connections
//! - The detached [`Element`]/[`Root`] wire model for decoded requests
//!   and constructed responses
//! - BER encode/decode between the wire model and payload bytes
//! - JSON configuration loading ([`Tree::from_json`])

mod ber;
mod element;
mod json;
mod matrix;
mod tree;
mod value;
mod wire;

pub use element::{Command, Element, ElementKind, NodeContents, ParameterContents, Root};
pub use json::ElementSpec;
pub use matrix::{
    MatrixConnection, MatrixContents, MatrixDisposition, MatrixLabel, MatrixMode,
    MatrixOperation, MatrixType,
};
pub use tree::{ElementId, ElementPayload, Tree};
pub(crate) use tree::validate_matrix_target;
pub use value::{ParameterAccess, ParameterType, Value};
pub use wire::{decode, encode};
