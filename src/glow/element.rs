//! Detached element model for decoded requests and constructed responses.
//!
//! A [`Root`] is what a BER payload decodes to and what responses are built
//! from: a small owned tree, detached from the live arena. Elements carry
//! either a local `number` (unqualified, nested form) or an absolute `path`
//! (qualified form).

use super::matrix::{MatrixConnection, MatrixContents};
use super::value::{ParameterAccess, ParameterType, Value};

/// Ember+ command numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Subscribe to change notifications for the target path.
    Subscribe,
    /// Remove a subscription; absence is a no-op.
    Unsubscribe,
    /// Enumerate the target's children.
    GetDirectory,
}

impl Command {
    /// Wire number of this command.
    pub fn number(self) -> u32 {
        match self {
            Command::Subscribe => 30,
            Command::Unsubscribe => 31,
            Command::GetDirectory => 32,
        }
    }

    /// Decode a wire number.
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            30 => Some(Command::Subscribe),
            31 => Some(Command::Unsubscribe),
            32 => Some(Command::GetDirectory),
            _ => None,
        }
    }
}

/// Static description of a node element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeContents {
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub is_online: Option<bool>,
}

/// Static description and state of a parameter element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterContents {
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub value: Option<Value>,
    pub minimum: Option<Value>,
    pub maximum: Option<Value>,
    pub access: Option<ParameterAccess>,
    pub parameter_type: Option<ParameterType>,
    pub stream_identifier: Option<i64>,
}

/// The kind-specific part of a detached element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Node(Option<NodeContents>),
    Parameter(Option<ParameterContents>),
    Matrix {
        contents: Option<MatrixContents>,
        connections: Vec<MatrixConnection>,
    },
    Command(Command),
}

/// One element of a detached tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Local child index within the parent.
    pub number: u32,
    /// Absolute dot-joined path; present exactly for qualified elements.
    pub path: Option<String>,
    pub kind: ElementKind,
    pub children: Vec<Element>,
}

impl Element {
    /// A node element with no contents.
    pub fn node(number: u32) -> Self {
        Self {
            number,
            path: None,
            kind: ElementKind::Node(None),
            children: Vec::new(),
        }
    }

    /// A node element with contents.
    pub fn node_with(number: u32, contents: NodeContents) -> Self {
        Self {
            number,
            path: None,
            kind: ElementKind::Node(Some(contents)),
            children: Vec::new(),
        }
    }

    /// A parameter element with contents.
    pub fn parameter(number: u32, contents: ParameterContents) -> Self {
        Self {
            number,
            path: None,
            kind: ElementKind::Parameter(Some(contents)),
            children: Vec::new(),
        }
    }

    /// A matrix element.
    pub fn matrix(
        number: u32,
        contents: Option<MatrixContents>,
        connections: Vec<MatrixConnection>,
    ) -> Self {
        Self {
            number,
            path: None,
            kind: ElementKind::Matrix {
                contents,
                connections,
            },
            children: Vec::new(),
        }
    }

    /// A command element.
    pub fn command(command: Command) -> Self {
        Self {
            number: command.number(),
            path: None,
            kind: ElementKind::Command(command),
            children: Vec::new(),
        }
    }

    /// Mark this element as qualified by an absolute path.
    pub fn qualified(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Append a child and return self (builder style).
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this element is qualified by an absolute path.
    #[inline]
    pub fn is_qualified(&self) -> bool {
        self.path.is_some()
    }

    #[inline]
    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, ElementKind::Parameter(_))
    }

    #[inline]
    pub fn is_matrix(&self) -> bool {
        matches!(self.kind, ElementKind::Matrix { .. })
    }

    #[inline]
    pub fn is_command(&self) -> bool {
        matches!(self.kind, ElementKind::Command(_))
    }

    /// The command carried by this element, if it is one.
    pub fn as_command(&self) -> Option<Command> {
        match self.kind {
            ElementKind::Command(command) => Some(command),
            _ => None,
        }
    }

    /// Parameter contents, if this is a parameter.
    pub fn parameter_contents(&self) -> Option<&ParameterContents> {
        match &self.kind {
            ElementKind::Parameter(contents) => contents.as_ref(),
            _ => None,
        }
    }

    /// Matrix connection requests, if this is a matrix.
    pub fn matrix_connections(&self) -> Option<&[MatrixConnection]> {
        match &self.kind {
            ElementKind::Matrix { connections, .. } => Some(connections),
            _ => None,
        }
    }
}

/// The decoded top level of an Ember+ message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Root {
    pub elements: Vec<Element>,
}

impl Root {
    /// An empty root (the minimal response form).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A root holding a single element.
    pub fn with_element(element: Element) -> Self {
        Self {
            elements: vec![element],
        }
    }

    /// The single top-level element, if there is exactly one.
    pub fn single_element(&self) -> Option<&Element> {
        match self.elements.as_slice() {
            [element] => Some(element),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_numbers() {
        assert_eq!(Command::Subscribe.number(), 30);
        assert_eq!(Command::Unsubscribe.number(), 31);
        assert_eq!(Command::GetDirectory.number(), 32);
        assert_eq!(Command::from_number(32), Some(Command::GetDirectory));
        assert_eq!(Command::from_number(33), None);
    }

    #[test]
    fn test_single_element() {
        let root = Root::with_element(Element::node(1));
        assert!(root.single_element().is_some());

        let two = Root {
            elements: vec![Element::node(1), Element::node(2)],
        };
        assert!(two.single_element().is_none());
        assert!(Root::empty().single_element().is_none());
    }

    #[test]
    fn test_qualified_builder() {
        let element = Element::parameter(2, ParameterContents::default()).qualified("1.2");
        assert!(element.is_qualified());
        assert!(element.is_parameter());
        assert_eq!(element.path.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_nested_children() {
        let root = Element::node(1).with_child(Element::node(3).with_child(Element::command(
            Command::GetDirectory,
        )));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children[0].as_command(), Some(Command::GetDirectory));
    }
}
