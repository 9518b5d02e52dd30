//! Matrix types, crosspoint connections and operations.

use serde::{Deserialize, Serialize};

/// Connection semantics of a matrix.
///
/// The type constraints (at most one source per target for `OneToN`, plus
/// source exclusivity for `OneToOne`) are documented invariants of the
/// published tree; they are not enforced when applying connection requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixType {
    /// Each target takes at most one source.
    OneToN,
    /// Additionally, no source feeds two targets.
    OneToOne,
    /// Unconstrained crosspoints.
    NToN,
}

impl MatrixType {
    /// Wire integer for this type.
    pub fn to_wire(self) -> i64 {
        match self {
            MatrixType::OneToN => 0,
            MatrixType::OneToOne => 1,
            MatrixType::NToN => 2,
        }
    }

    /// Decode a wire integer; unknown values degrade to `OneToN`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => MatrixType::OneToOne,
            2 => MatrixType::NToN,
            _ => MatrixType::OneToN,
        }
    }
}

impl Default for MatrixType {
    fn default() -> Self {
        MatrixType::OneToN
    }
}

/// Addressing mode of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixMode {
    /// Targets and sources are dense 0..count ranges.
    Linear,
    /// Explicit target/source number lists.
    NonLinear,
}

impl MatrixMode {
    /// Wire integer for this mode.
    pub fn to_wire(self) -> i64 {
        match self {
            MatrixMode::Linear => 0,
            MatrixMode::NonLinear => 1,
        }
    }

    /// Decode a wire integer; unknown values degrade to `Linear`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => MatrixMode::NonLinear,
            _ => MatrixMode::Linear,
        }
    }
}

impl Default for MatrixMode {
    fn default() -> Self {
        MatrixMode::Linear
    }
}

/// Operation requested for a crosspoint update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixOperation {
    /// Replace the target's source set.
    Absolute,
    /// Union sources into the target's set.
    Connect,
    /// Remove sources from the target's set.
    Disconnect,
}

impl MatrixOperation {
    /// Wire integer for this operation.
    pub fn to_wire(self) -> i64 {
        match self {
            MatrixOperation::Absolute => 0,
            MatrixOperation::Connect => 1,
            MatrixOperation::Disconnect => 2,
        }
    }

    /// Decode a wire integer; unknown values degrade to `Absolute`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => MatrixOperation::Connect,
            2 => MatrixOperation::Disconnect,
            _ => MatrixOperation::Absolute,
        }
    }
}

/// Result tag attached to a connection in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixDisposition {
    /// Reported state without a preceding request.
    Tally,
    /// The request was applied.
    Modified,
    /// The request is queued.
    Pending,
    /// The target is locked.
    Locked,
}

impl MatrixDisposition {
    /// Wire integer for this disposition.
    pub fn to_wire(self) -> i64 {
        match self {
            MatrixDisposition::Tally => 0,
            MatrixDisposition::Modified => 1,
            MatrixDisposition::Pending => 2,
            MatrixDisposition::Locked => 3,
        }
    }

    /// Decode a wire integer; unknown values degrade to `Tally`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => MatrixDisposition::Modified,
            2 => MatrixDisposition::Pending,
            3 => MatrixDisposition::Locked,
            _ => MatrixDisposition::Tally,
        }
    }
}

/// A label bank attached to a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixLabel {
    /// Tree path of the node holding the label parameters.
    pub base_path: String,
    /// Label bank description, e.g. "Primary".
    pub description: String,
}

/// Static description of a matrix element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MatrixContents {
    pub identifier: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub matrix_type: MatrixType,
    #[serde(default)]
    pub mode: MatrixMode,
    pub target_count: Option<u32>,
    pub source_count: Option<u32>,
    #[serde(default)]
    pub labels: Vec<MatrixLabel>,
}

/// One crosspoint update: a target, its sources and the requested operation.
///
/// In responses the operation is absent and `disposition` reports the
/// outcome together with the target's *resulting* source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConnection {
    pub target: u32,
    pub sources: Vec<u32>,
    /// Absent on the wire means `Absolute`.
    pub operation: Option<MatrixOperation>,
    pub disposition: Option<MatrixDisposition>,
}

impl MatrixConnection {
    /// A request-side connection with an explicit operation.
    pub fn request(target: u32, sources: Vec<u32>, operation: MatrixOperation) -> Self {
        Self {
            target,
            sources,
            operation: Some(operation),
            disposition: None,
        }
    }

    /// The effective operation, defaulting absent to `Absolute`.
    #[inline]
    pub fn effective_operation(&self) -> MatrixOperation {
        self.operation.unwrap_or(MatrixOperation::Absolute)
    }
}
