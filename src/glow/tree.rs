//! Arena-backed live tree.
//!
//! The published tree is shared by every connection, so parent/child links
//! are numeric handles into a slot vector instead of owning references:
//! [`ElementId`] indexes the arena, each slot stores its parent handle and
//! ordered child handles. Detached [`Element`] trees for responses are
//! rebuilt by cloning along the handle chain.
//!
//! Slot 0 is a synthetic root that carries no contents and is not
//! addressable by path; its children are the tree's top-level elements.
//! Child lists are append-only and never reordered.

use std::collections::{BTreeMap, BTreeSet};

use super::element::{Element, ElementKind, NodeContents, ParameterContents, Root};
use super::matrix::MatrixContents;
use crate::error::{EmberError, Result};

/// Handle of an element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    /// The synthetic root handle.
    pub const ROOT: ElementId = ElementId(0);
}

/// Kind-specific payload of an arena slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementPayload {
    /// The synthetic root.
    Root,
    Node(NodeContents),
    Parameter(ParameterContents),
    Matrix {
        contents: MatrixContents,
        /// Live crosspoint state: target -> active sources.
        connections: BTreeMap<u32, BTreeSet<u32>>,
    },
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    number: u32,
    payload: ElementPayload,
}

/// The live element tree.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
}

impl Tree {
    /// Create a tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                parent: None,
                children: Vec::new(),
                number: 0,
                payload: ElementPayload::Root,
            }],
        }
    }

    /// The synthetic root handle.
    #[inline]
    pub fn root(&self) -> ElementId {
        ElementId::ROOT
    }

    /// Insert a child under `parent` and return its handle.
    ///
    /// Children keep insertion order; numbers are not required to be dense
    /// but must be unique among siblings for path lookup to be meaningful.
    pub fn insert(&mut self, parent: ElementId, number: u32, payload: ElementPayload) -> ElementId {
        let id = ElementId(self.slots.len());
        self.slots.push(Slot {
            parent: Some(parent),
            children: Vec::new(),
            number,
            payload,
        });
        self.slots[parent.0].children.push(id);
        id
    }

    /// The local child index of an element.
    #[inline]
    pub fn number_of(&self, id: ElementId) -> u32 {
        self.slots[id.0].number
    }

    /// The parent handle, `None` for the synthetic root.
    #[inline]
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.slots[id.0].parent
    }

    /// Ordered child handles of an element.
    #[inline]
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        &self.slots[id.0].children
    }

    /// Kind-specific payload of an element.
    #[inline]
    pub fn payload(&self, id: ElementId) -> &ElementPayload {
        &self.slots[id.0].payload
    }

    /// Mutable payload access (parameter set, matrix updates).
    #[inline]
    pub fn payload_mut(&mut self, id: ElementId) -> &mut ElementPayload {
        &mut self.slots[id.0].payload
    }

    #[inline]
    pub fn is_parameter(&self, id: ElementId) -> bool {
        matches!(self.slots[id.0].payload, ElementPayload::Parameter(_))
    }

    #[inline]
    pub fn is_matrix(&self, id: ElementId) -> bool {
        matches!(self.slots[id.0].payload, ElementPayload::Matrix { .. })
    }

    /// Whether the element is a streaming parameter (stream identifier set).
    pub fn is_stream(&self, id: ElementId) -> bool {
        matches!(
            &self.slots[id.0].payload,
            ElementPayload::Parameter(contents) if contents.stream_identifier.is_some()
        )
    }

    /// Derived dot-joined path, e.g. `"1.3.2"`. Empty for the root.
    pub fn path_of(&self, id: ElementId) -> String {
        let mut numbers = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.slots[cursor.0].parent {
            numbers.push(self.slots[cursor.0].number);
            cursor = parent;
        }
        numbers.reverse();
        numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Resolve a dot-joined path to a handle.
    ///
    /// The empty path resolves to the synthetic root.
    pub fn element_by_path(&self, path: &str) -> Option<ElementId> {
        if path.is_empty() {
            return Some(self.root());
        }

        let mut cursor = self.root();
        for segment in path.split('.') {
            let number: u32 = segment.parse().ok()?;
            cursor = *self.slots[cursor.0]
                .children
                .iter()
                .find(|&&child| self.slots[child.0].number == number)?;
        }
        Some(cursor)
    }

    /// Follow an unqualified child chain starting at the root.
    ///
    /// Returns the handle of the deepest element that exists in the tree.
    pub fn resolve_chain(&self, numbers: &[u32]) -> Option<ElementId> {
        let mut cursor = self.root();
        for &number in numbers {
            cursor = *self.slots[cursor.0]
                .children
                .iter()
                .find(|&&child| self.slots[child.0].number == number)?;
        }
        Some(cursor)
    }

    /// Detached copy of an element: contents cloned, children trimmed.
    ///
    /// The root duplicates to an empty node.
    pub fn duplicate(&self, id: ElementId) -> Element {
        let slot = &self.slots[id.0];
        let kind = match &slot.payload {
            ElementPayload::Root => ElementKind::Node(None),
            ElementPayload::Node(contents) => ElementKind::Node(Some(contents.clone())),
            ElementPayload::Parameter(contents) => ElementKind::Parameter(Some(contents.clone())),
            ElementPayload::Matrix { contents, .. } => ElementKind::Matrix {
                contents: Some(contents.clone()),
                connections: Vec::new(),
            },
        };
        Element {
            number: slot.number,
            path: None,
            kind,
            children: Vec::new(),
        }
    }

    /// Detached qualified copy: [`Tree::duplicate`] with the absolute path set.
    pub fn qualified(&self, id: ElementId) -> Element {
        self.duplicate(id).qualified(self.path_of(id))
    }

    /// Rebuild the path root -> `id` as nested single-child elements.
    ///
    /// When `leaf` is given it replaces the target's own duplicate as the
    /// innermost element (used to attach an updated parameter or a matrix
    /// response). The root handle produces a root holding `leaf` or nothing.
    pub fn tree_branch(&self, id: ElementId, leaf: Option<Element>) -> Root {
        if id == self.root() {
            return match leaf {
                Some(element) => Root::with_element(element),
                None => Root::empty(),
            };
        }

        let mut element = leaf.unwrap_or_else(|| self.duplicate(id));
        let mut cursor = id;
        while let Some(parent) = self.slots[cursor.0].parent {
            if parent == self.root() {
                break;
            }
            element = Element {
                number: self.slots[parent.0].number,
                path: None,
                kind: ElementKind::Node(None),
                children: vec![element],
            };
            cursor = parent;
        }
        Root::with_element(element)
    }

    /// Live source set of a matrix target, if the element is a matrix.
    pub fn matrix_sources(&self, id: ElementId, target: u32) -> Option<Vec<u32>> {
        match &self.slots[id.0].payload {
            ElementPayload::Matrix { connections, .. } => Some(
                connections
                    .get(&target)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    /// Number of elements, synthetic root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 1
    }

    /// Convenience: insert a matrix with empty live connections.
    pub fn insert_matrix(
        &mut self,
        parent: ElementId,
        number: u32,
        contents: MatrixContents,
    ) -> ElementId {
        self.insert(
            parent,
            number,
            ElementPayload::Matrix {
                contents,
                connections: BTreeMap::new(),
            },
        )
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation helper for matrix connection requests.
///
/// Checks the invariants required before any mutation: the element is a
/// matrix, its contents declare a target count, and the target is in range.
pub(crate) fn validate_matrix_target(tree: &Tree, id: ElementId, target: u32) -> Result<()> {
    let ElementPayload::Matrix { contents, .. } = tree.payload(id) else {
        return Err(EmberError::InvalidMatrixOperation(format!(
            "element at {:?} is not a matrix",
            tree.path_of(id)
        )));
    };
    let Some(target_count) = contents.target_count else {
        return Err(EmberError::InvalidMatrixOperation(
            "matrix has no targetCount".into(),
        ));
    };
    if target >= target_count {
        return Err(EmberError::InvalidMatrixOperation(format!(
            "target {target} out of range 0..{target_count}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glow::value::{ParameterAccess, Value};

    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        let node1 = tree.insert(
            root,
            1,
            ElementPayload::Node(NodeContents {
                identifier: Some("audio".into()),
                ..Default::default()
            }),
        );
        tree.insert(
            node1,
            2,
            ElementPayload::Parameter(ParameterContents {
                identifier: Some("gain".into()),
                value: Some(Value::Integer(10)),
                access: Some(ParameterAccess::ReadWrite),
                ..Default::default()
            }),
        );
        let node3 = tree.insert(node1, 3, ElementPayload::Node(NodeContents::default()));
        tree.insert(
            node3,
            2,
            ElementPayload::Parameter(ParameterContents::default()),
        );
        tree.insert_matrix(
            root,
            3,
            MatrixContents {
                identifier: Some("router".into()),
                target_count: Some(4),
                source_count: Some(8),
                ..Default::default()
            },
        );
        tree
    }

    #[test]
    fn test_path_of() {
        let tree = sample_tree();
        let id = tree.element_by_path("1.3.2").unwrap();
        assert_eq!(tree.path_of(id), "1.3.2");
        assert_eq!(tree.path_of(tree.root()), "");
    }

    #[test]
    fn test_element_by_path() {
        let tree = sample_tree();
        assert!(tree.element_by_path("1.2").is_some());
        assert!(tree.element_by_path("1.9").is_none());
        assert!(tree.element_by_path("not.a.path").is_none());
        assert_eq!(tree.element_by_path(""), Some(tree.root()));
    }

    #[test]
    fn test_resolve_chain() {
        let tree = sample_tree();
        let id = tree.resolve_chain(&[1, 3]).unwrap();
        assert_eq!(tree.path_of(id), "1.3");
        assert!(tree.resolve_chain(&[2]).is_none());
    }

    #[test]
    fn test_duplicate_trims_children() {
        let tree = sample_tree();
        let id = tree.element_by_path("1").unwrap();
        let detached = tree.duplicate(id);
        assert!(detached.children.is_empty());
        assert!(matches!(detached.kind, ElementKind::Node(Some(_))));
    }

    #[test]
    fn test_qualified_sets_path() {
        let tree = sample_tree();
        let id = tree.element_by_path("1.2").unwrap();
        let qualified = tree.qualified(id);
        assert_eq!(qualified.path.as_deref(), Some("1.2"));
        assert!(qualified.is_parameter());
    }

    #[test]
    fn test_tree_branch_chain() {
        let tree = sample_tree();
        let id = tree.element_by_path("1.3.2").unwrap();
        let root = tree.tree_branch(id, None);

        let outer = root.single_element().unwrap();
        assert_eq!(outer.number, 1);
        assert_eq!(outer.children.len(), 1);
        assert_eq!(outer.children[0].number, 3);
        assert_eq!(outer.children[0].children[0].number, 2);
        assert!(outer.children[0].children[0].is_parameter());
    }

    #[test]
    fn test_tree_branch_custom_leaf() {
        let tree = sample_tree();
        let id = tree.element_by_path("1.2").unwrap();
        let leaf = Element::parameter(
            2,
            ParameterContents {
                value: Some(Value::Integer(42)),
                ..Default::default()
            },
        );
        let root = tree.tree_branch(id, Some(leaf));
        let inner = &root.single_element().unwrap().children[0];
        assert_eq!(
            inner.parameter_contents().unwrap().value,
            Some(Value::Integer(42))
        );
    }

    #[test]
    fn test_is_stream() {
        let mut tree = Tree::new();
        let root = tree.root();
        let plain = tree.insert(
            root,
            1,
            ElementPayload::Parameter(ParameterContents::default()),
        );
        let stream = tree.insert(
            root,
            2,
            ElementPayload::Parameter(ParameterContents {
                stream_identifier: Some(7),
                ..Default::default()
            }),
        );
        assert!(!tree.is_stream(plain));
        assert!(tree.is_stream(stream));
    }

    #[test]
    fn test_validate_matrix_target() {
        let tree = sample_tree();
        let matrix = tree.element_by_path("3").unwrap();
        let param = tree.element_by_path("1.2").unwrap();

        assert!(validate_matrix_target(&tree, matrix, 0).is_ok());
        assert!(validate_matrix_target(&tree, matrix, 3).is_ok());
        assert!(validate_matrix_target(&tree, matrix, 4).is_err());
        assert!(validate_matrix_target(&tree, param, 0).is_err());
    }

    #[test]
    fn test_matrix_sources_default_empty() {
        let tree = sample_tree();
        let matrix = tree.element_by_path("3").unwrap();
        let param = tree.element_by_path("1.2").unwrap();
        assert_eq!(tree.matrix_sources(matrix, 1), Some(vec![]));
        assert_eq!(tree.matrix_sources(param, 1), None);
    }
}
