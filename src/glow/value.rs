//! Parameter values, types and access levels.

use serde::{Deserialize, Serialize};

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Boolean(bool),
    /// Signed integer value.
    Integer(i64),
    /// IEEE-754 double value.
    Real(f64),
    /// UTF-8 string value.
    String(String),
    /// Raw octet string.
    Octets(Vec<u8>),
}

impl Value {
    /// The Ember+ parameter type this value maps to.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Value::Integer(_) => ParameterType::Integer,
            Value::Real(_) => ParameterType::Real,
            Value::String(_) => ParameterType::String,
            Value::Boolean(_) => ParameterType::Boolean,
            Value::Octets(_) => ParameterType::Octets,
        }
    }
}

/// Ember+ parameter type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Integer,
    Real,
    String,
    Boolean,
    Trigger,
    Enum,
    Octets,
}

impl ParameterType {
    /// Wire integer for this type.
    pub fn to_wire(self) -> i64 {
        match self {
            ParameterType::Integer => 1,
            ParameterType::Real => 2,
            ParameterType::String => 3,
            ParameterType::Boolean => 4,
            ParameterType::Trigger => 5,
            ParameterType::Enum => 6,
            ParameterType::Octets => 7,
        }
    }

    /// Decode a wire integer; unknown values degrade to `Integer`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            2 => ParameterType::Real,
            3 => ParameterType::String,
            4 => ParameterType::Boolean,
            5 => ParameterType::Trigger,
            6 => ParameterType::Enum,
            7 => ParameterType::Octets,
            _ => ParameterType::Integer,
        }
    }
}

/// Access level of a parameter.
///
/// Ordered so that write permission can be tested with a comparison:
/// `access > ParameterAccess::Read` holds exactly for `Write` and
/// `ReadWrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterAccess {
    /// Not accessible.
    None,
    /// Read-only.
    Read,
    /// Write-only.
    Write,
    /// Readable and writable.
    ReadWrite,
}

impl ParameterAccess {
    /// Check whether a set-value request may mutate the parameter.
    #[inline]
    pub fn allows_write(self) -> bool {
        self > ParameterAccess::Read
    }

    /// Wire integer for this access level.
    pub fn to_wire(self) -> i64 {
        match self {
            ParameterAccess::None => 0,
            ParameterAccess::Read => 1,
            ParameterAccess::Write => 2,
            ParameterAccess::ReadWrite => 3,
        }
    }

    /// Decode a wire integer; out-of-range values degrade to `Read`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            0 => ParameterAccess::None,
            2 => ParameterAccess::Write,
            3 => ParameterAccess::ReadWrite,
            _ => ParameterAccess::Read,
        }
    }
}

impl Default for ParameterAccess {
    fn default() -> Self {
        ParameterAccess::Read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_write_gate() {
        assert!(!ParameterAccess::None.allows_write());
        assert!(!ParameterAccess::Read.allows_write());
        assert!(ParameterAccess::Write.allows_write());
        assert!(ParameterAccess::ReadWrite.allows_write());
    }

    #[test]
    fn test_access_wire_roundtrip() {
        for access in [
            ParameterAccess::None,
            ParameterAccess::Read,
            ParameterAccess::Write,
            ParameterAccess::ReadWrite,
        ] {
            assert_eq!(ParameterAccess::from_wire(access.to_wire()), access);
        }
    }

    #[test]
    fn test_parameter_type_wire_roundtrip() {
        for ty in [
            ParameterType::Integer,
            ParameterType::Real,
            ParameterType::String,
            ParameterType::Boolean,
            ParameterType::Trigger,
            ParameterType::Enum,
            ParameterType::Octets,
        ] {
            assert_eq!(ParameterType::from_wire(ty.to_wire()), ty);
        }
    }

    #[test]
    fn test_value_parameter_type() {
        assert_eq!(Value::Integer(3).parameter_type(), ParameterType::Integer);
        assert_eq!(Value::Boolean(true).parameter_type(), ParameterType::Boolean);
        assert_eq!(
            Value::String("gain".into()).parameter_type(),
            ParameterType::String
        );
    }

    #[test]
    fn test_value_json_untagged() {
        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::Integer(42));
        let v: Value = serde_json::from_str("true").unwrap();
        assert_eq!(v, Value::Boolean(true));
        let v: Value = serde_json::from_str("\"label\"").unwrap();
        assert_eq!(v, Value::String("label".into()));
    }
}
