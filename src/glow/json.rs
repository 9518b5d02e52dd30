//! JSON configuration loading for the published tree.
//!
//! The server's tree is defined once, at startup, from a JSON document:
//! an array of elements tagged by `kind`, mirroring the wire model. This
//! is the only element-creation path besides programmatic
//! [`Tree::insert`](super::Tree::insert).
//!
//! ```json
//! [
//!   { "kind": "node", "number": 1, "identifier": "audio", "children": [
//!     { "kind": "parameter", "number": 2, "identifier": "gain",
//!       "value": 10, "access": "readWrite" }
//!   ]},
//!   { "kind": "matrix", "number": 3, "identifier": "router",
//!     "targetCount": 4, "sourceCount": 8 }
//! ]
//! ```

use serde::Deserialize;

use super::element::{NodeContents, ParameterContents};
use super::matrix::{MatrixContents, MatrixLabel, MatrixMode, MatrixType};
use super::tree::{ElementId, ElementPayload, Tree};
use super::value::{ParameterAccess, ParameterType, Value};
use crate::error::Result;

/// One element of the JSON tree definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementSpec {
    #[serde(rename_all = "camelCase")]
    Node {
        number: u32,
        identifier: Option<String>,
        description: Option<String>,
        is_online: Option<bool>,
        #[serde(default)]
        children: Vec<ElementSpec>,
    },
    #[serde(rename_all = "camelCase")]
    Parameter {
        number: u32,
        identifier: Option<String>,
        description: Option<String>,
        value: Option<Value>,
        minimum: Option<Value>,
        maximum: Option<Value>,
        #[serde(default)]
        access: ParameterAccess,
        stream_identifier: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Matrix {
        number: u32,
        identifier: Option<String>,
        description: Option<String>,
        #[serde(default)]
        matrix_type: MatrixType,
        #[serde(default)]
        mode: MatrixMode,
        target_count: Option<u32>,
        source_count: Option<u32>,
        #[serde(default)]
        labels: Vec<MatrixLabel>,
    },
}

impl Tree {
    /// Build a tree from a JSON document (an array of [`ElementSpec`]).
    pub fn from_json(json: &str) -> Result<Self> {
        let specs: Vec<ElementSpec> = serde_json::from_str(json)?;
        let mut tree = Tree::new();
        let root = tree.root();
        for spec in &specs {
            insert_spec(&mut tree, root, spec);
        }
        Ok(tree)
    }
}

fn insert_spec(tree: &mut Tree, parent: ElementId, spec: &ElementSpec) {
    match spec {
        ElementSpec::Node {
            number,
            identifier,
            description,
            is_online,
            children,
        } => {
            let id = tree.insert(
                parent,
                *number,
                ElementPayload::Node(NodeContents {
                    identifier: identifier.clone(),
                    description: description.clone(),
                    is_online: *is_online,
                }),
            );
            for child in children {
                insert_spec(tree, id, child);
            }
        }
        ElementSpec::Parameter {
            number,
            identifier,
            description,
            value,
            minimum,
            maximum,
            access,
            stream_identifier,
        } => {
            tree.insert(
                parent,
                *number,
                ElementPayload::Parameter(ParameterContents {
                    identifier: identifier.clone(),
                    description: description.clone(),
                    value: value.clone(),
                    minimum: minimum.clone(),
                    maximum: maximum.clone(),
                    access: Some(*access),
                    // The advertised type follows the initial value.
                    parameter_type: value.as_ref().map(Value::parameter_type),
                    stream_identifier: *stream_identifier,
                }),
            );
        }
        ElementSpec::Matrix {
            number,
            identifier,
            description,
            matrix_type,
            mode,
            target_count,
            source_count,
            labels,
        } => {
            tree.insert_matrix(
                parent,
                *number,
                MatrixContents {
                    identifier: identifier.clone(),
                    description: description.clone(),
                    matrix_type: *matrix_type,
                    mode: *mode,
                    target_count: *target_count,
                    source_count: *source_count,
                    labels: labels.clone(),
                },
            );
        }
    }
}
