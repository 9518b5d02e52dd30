//! Glow wire codec: detached [`Root`] trees to and from BER payload bytes.
//!
//! Element classes use application tags, fields use context tags, contents
//! use a SET of context-tagged fields. Qualified element classes carry a
//! RELATIVE-OID path where their nested counterparts carry a local number.

use bytes::Bytes;

use super::ber::{self, tag, BerReader, Tlv};
use super::element::{Command, Element, ElementKind, NodeContents, ParameterContents, Root};
use super::matrix::{
    MatrixConnection, MatrixContents, MatrixDisposition, MatrixLabel, MatrixMode,
    MatrixOperation, MatrixType,
};
use super::value::{ParameterAccess, ParameterType, Value};
use crate::error::{EmberError, Result};

/// Application tags for element classes.
mod app {
    use super::tag;

    pub const ROOT: u8 = tag::application(0);
    pub const PARAMETER: u8 = tag::application(1);
    pub const COMMAND: u8 = tag::application(2);
    pub const NODE: u8 = tag::application(3);
    pub const QUALIFIED_PARAMETER: u8 = tag::application(9);
    pub const QUALIFIED_NODE: u8 = tag::application(10);
    pub const MATRIX: u8 = tag::application(13);
    pub const CONNECTION: u8 = tag::application(16);
    pub const QUALIFIED_MATRIX: u8 = tag::application(17);
    pub const LABEL: u8 = tag::application(18);
}

/// Context field numbers shared by all element classes.
mod field {
    /// Number (nested) or path (qualified).
    pub const ADDRESS: u8 = 0;
    pub const CONTENTS: u8 = 1;
    pub const CHILDREN: u8 = 2;
    /// Matrix connection collection.
    pub const CONNECTIONS: u8 = 5;
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a detached root to BER payload bytes.
pub fn encode(root: &Root) -> Bytes {
    let mut content = Vec::new();
    for element in &root.elements {
        content.extend(encode_element(element));
    }
    Bytes::from(ber::tlv(app::ROOT, &content))
}

fn encode_element(element: &Element) -> Vec<u8> {
    let address = match &element.path {
        Some(path) => ber::tlv(tag::context(field::ADDRESS), &encode_path(path)),
        None => ber::tlv(
            tag::context(field::ADDRESS),
            &ber::integer(element.number as i64),
        ),
    };

    let mut content = address;

    let class = match &element.kind {
        ElementKind::Command(command) => {
            // Commands carry only their number.
            let inner = ber::tlv(
                tag::context(field::ADDRESS),
                &ber::integer(command.number() as i64),
            );
            return ber::tlv(app::COMMAND, &inner);
        }
        ElementKind::Node(contents) => {
            if let Some(contents) = contents {
                content.extend(ber::tlv(
                    tag::context(field::CONTENTS),
                    &encode_node_contents(contents),
                ));
            }
            if element.is_qualified() {
                app::QUALIFIED_NODE
            } else {
                app::NODE
            }
        }
        ElementKind::Parameter(contents) => {
            if let Some(contents) = contents {
                content.extend(ber::tlv(
                    tag::context(field::CONTENTS),
                    &encode_parameter_contents(contents),
                ));
            }
            if element.is_qualified() {
                app::QUALIFIED_PARAMETER
            } else {
                app::PARAMETER
            }
        }
        ElementKind::Matrix {
            contents,
            connections,
        } => {
            if let Some(contents) = contents {
                content.extend(ber::tlv(
                    tag::context(field::CONTENTS),
                    &encode_matrix_contents(contents),
                ));
            }
            if !connections.is_empty() {
                let mut encoded = Vec::new();
                for connection in connections {
                    encoded.extend(encode_connection(connection));
                }
                content.extend(ber::tlv(tag::context(field::CONNECTIONS), &encoded));
            }
            if element.is_qualified() {
                app::QUALIFIED_MATRIX
            } else {
                app::MATRIX
            }
        }
    };

    if !element.children.is_empty() {
        let mut encoded = Vec::new();
        for child in &element.children {
            encoded.extend(encode_element(child));
        }
        content.extend(ber::tlv(tag::context(field::CHILDREN), &encoded));
    }

    ber::tlv(class, &content)
}

fn encode_path(path: &str) -> Vec<u8> {
    let subids: Vec<u32> = path
        .split('.')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    ber::relative_oid(&subids)
}

fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::Integer(v) => ber::integer(*v),
        Value::Real(v) => ber::real(*v),
        Value::String(v) => ber::utf8(v),
        Value::Boolean(v) => ber::boolean(*v),
        Value::Octets(v) => ber::octets(v),
    }
}

fn encode_node_contents(contents: &NodeContents) -> Vec<u8> {
    let mut fields = Vec::new();
    if let Some(identifier) = &contents.identifier {
        fields.extend(ber::tlv(tag::context(0), &ber::utf8(identifier)));
    }
    if let Some(description) = &contents.description {
        fields.extend(ber::tlv(tag::context(1), &ber::utf8(description)));
    }
    if let Some(is_online) = contents.is_online {
        fields.extend(ber::tlv(tag::context(3), &ber::boolean(is_online)));
    }
    ber::tlv(tag::SET, &fields)
}

fn encode_parameter_contents(contents: &ParameterContents) -> Vec<u8> {
    let mut fields = Vec::new();
    if let Some(identifier) = &contents.identifier {
        fields.extend(ber::tlv(tag::context(0), &ber::utf8(identifier)));
    }
    if let Some(description) = &contents.description {
        fields.extend(ber::tlv(tag::context(1), &ber::utf8(description)));
    }
    if let Some(value) = &contents.value {
        fields.extend(ber::tlv(tag::context(2), &encode_value(value)));
    }
    if let Some(minimum) = &contents.minimum {
        fields.extend(ber::tlv(tag::context(3), &encode_value(minimum)));
    }
    if let Some(maximum) = &contents.maximum {
        fields.extend(ber::tlv(tag::context(4), &encode_value(maximum)));
    }
    if let Some(access) = contents.access {
        fields.extend(ber::tlv(tag::context(5), &ber::integer(access.to_wire())));
    }
    if let Some(parameter_type) = contents.parameter_type {
        fields.extend(ber::tlv(
            tag::context(13),
            &ber::integer(parameter_type.to_wire()),
        ));
    }
    if let Some(stream_identifier) = contents.stream_identifier {
        fields.extend(ber::tlv(tag::context(14), &ber::integer(stream_identifier)));
    }
    ber::tlv(tag::SET, &fields)
}

fn encode_matrix_contents(contents: &MatrixContents) -> Vec<u8> {
    let mut fields = Vec::new();
    if let Some(identifier) = &contents.identifier {
        fields.extend(ber::tlv(tag::context(0), &ber::utf8(identifier)));
    }
    if let Some(description) = &contents.description {
        fields.extend(ber::tlv(tag::context(1), &ber::utf8(description)));
    }
    fields.extend(ber::tlv(
        tag::context(2),
        &ber::integer(contents.matrix_type.to_wire()),
    ));
    fields.extend(ber::tlv(
        tag::context(3),
        &ber::integer(contents.mode.to_wire()),
    ));
    if let Some(target_count) = contents.target_count {
        fields.extend(ber::tlv(tag::context(4), &ber::integer(target_count as i64)));
    }
    if let Some(source_count) = contents.source_count {
        fields.extend(ber::tlv(tag::context(5), &ber::integer(source_count as i64)));
    }
    if !contents.labels.is_empty() {
        let mut labels = Vec::new();
        for label in &contents.labels {
            labels.extend(encode_label(label));
        }
        fields.extend(ber::tlv(tag::context(6), &labels));
    }
    ber::tlv(tag::SET, &fields)
}

fn encode_label(label: &MatrixLabel) -> Vec<u8> {
    let mut content = ber::tlv(tag::context(0), &ber::utf8(&label.base_path));
    content.extend(ber::tlv(tag::context(1), &ber::utf8(&label.description)));
    ber::tlv(app::LABEL, &content)
}

fn encode_connection(connection: &MatrixConnection) -> Vec<u8> {
    let mut content = ber::tlv(
        tag::context(0),
        &ber::integer(connection.target as i64),
    );
    content.extend(ber::tlv(
        tag::context(1),
        &ber::relative_oid(&connection.sources),
    ));
    if let Some(operation) = connection.operation {
        content.extend(ber::tlv(tag::context(2), &ber::integer(operation.to_wire())));
    }
    if let Some(disposition) = connection.disposition {
        content.extend(ber::tlv(
            tag::context(3),
            &ber::integer(disposition.to_wire()),
        ));
    }
    ber::tlv(app::CONNECTION, &content)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode BER payload bytes to a detached root.
pub fn decode(data: &[u8]) -> Result<Root> {
    let mut reader = BerReader::new(data);
    let root = reader.read()?.expect(app::ROOT)?;

    let mut elements = Vec::new();
    let mut inner = BerReader::new(root);
    while !inner.is_empty() {
        elements.push(decode_element(inner.read()?)?);
    }
    Ok(Root { elements })
}

/// Context-tagged fields common to every element class.
#[derive(Default)]
struct RawFields<'a> {
    address: Option<Tlv<'a>>,
    contents: Option<&'a [u8]>,
    children: Option<&'a [u8]>,
    connections: Option<&'a [u8]>,
}

fn read_fields(content: &[u8]) -> Result<RawFields<'_>> {
    let mut fields = RawFields::default();
    let mut reader = BerReader::new(content);
    while !reader.is_empty() {
        let tlv = reader.read()?;
        if tlv.tag == tag::context(field::ADDRESS) {
            fields.address = Some(BerReader::new(tlv.content).read()?);
        } else if tlv.tag == tag::context(field::CONTENTS) {
            fields.contents = Some(tlv.content);
        } else if tlv.tag == tag::context(field::CHILDREN) {
            fields.children = Some(tlv.content);
        } else if tlv.tag == tag::context(field::CONNECTIONS) {
            fields.connections = Some(tlv.content);
        }
        // Unknown fields are skipped for forward compatibility.
    }
    Ok(fields)
}

fn decode_address(address: Option<Tlv<'_>>, qualified: bool) -> Result<(u32, Option<String>)> {
    let address =
        address.ok_or_else(|| EmberError::Decode("element without number or path".into()))?;
    if qualified {
        let subids = address.as_relative_oid()?;
        let path = subids
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let number = subids.last().copied().unwrap_or(0);
        Ok((number, Some(path)))
    } else {
        Ok((address.as_integer()? as u32, None))
    }
}

fn decode_children(children: Option<&[u8]>) -> Result<Vec<Element>> {
    let Some(content) = children else {
        return Ok(Vec::new());
    };
    let mut elements = Vec::new();
    let mut reader = BerReader::new(content);
    while !reader.is_empty() {
        elements.push(decode_element(reader.read()?)?);
    }
    Ok(elements)
}

fn decode_element(tlv: Tlv<'_>) -> Result<Element> {
    match tlv.tag {
        app::COMMAND => {
            let fields = read_fields(tlv.content)?;
            let (number, _) = decode_address(fields.address, false)?;
            let command = Command::from_number(number).ok_or_else(|| {
                EmberError::Protocol(format!("unknown command number {number}"))
            })?;
            Ok(Element::command(command))
        }
        app::NODE | app::QUALIFIED_NODE => {
            let qualified = tlv.tag == app::QUALIFIED_NODE;
            let fields = read_fields(tlv.content)?;
            let (number, path) = decode_address(fields.address, qualified)?;
            let contents = fields
                .contents
                .map(decode_node_contents)
                .transpose()?;
            Ok(Element {
                number,
                path,
                kind: ElementKind::Node(contents),
                children: decode_children(fields.children)?,
            })
        }
        app::PARAMETER | app::QUALIFIED_PARAMETER => {
            let qualified = tlv.tag == app::QUALIFIED_PARAMETER;
            let fields = read_fields(tlv.content)?;
            let (number, path) = decode_address(fields.address, qualified)?;
            let contents = fields
                .contents
                .map(decode_parameter_contents)
                .transpose()?;
            Ok(Element {
                number,
                path,
                kind: ElementKind::Parameter(contents),
                children: decode_children(fields.children)?,
            })
        }
        app::MATRIX | app::QUALIFIED_MATRIX => {
            let qualified = tlv.tag == app::QUALIFIED_MATRIX;
            let fields = read_fields(tlv.content)?;
            let (number, path) = decode_address(fields.address, qualified)?;
            let contents = fields
                .contents
                .map(decode_matrix_contents)
                .transpose()?;
            Ok(Element {
                number,
                path,
                kind: ElementKind::Matrix {
                    contents,
                    connections: decode_connections(fields.connections)?,
                },
                children: decode_children(fields.children)?,
            })
        }
        other => Err(EmberError::Decode(format!(
            "unknown element tag 0x{other:02X}"
        ))),
    }
}

fn decode_value(tlv: Tlv<'_>) -> Result<Value> {
    match tlv.tag {
        tag::INTEGER => Ok(Value::Integer(tlv.as_integer()?)),
        tag::REAL => Ok(Value::Real(tlv.as_real()?)),
        tag::UTF8_STRING => Ok(Value::String(tlv.as_utf8()?)),
        tag::BOOLEAN => Ok(Value::Boolean(tlv.as_boolean()?)),
        tag::OCTET_STRING => Ok(Value::Octets(tlv.content.to_vec())),
        other => Err(EmberError::Decode(format!("unknown value tag 0x{other:02X}"))),
    }
}

fn decode_node_contents(content: &[u8]) -> Result<NodeContents> {
    let set = BerReader::new(content).read()?.expect(tag::SET)?;
    let mut contents = NodeContents::default();
    let mut reader = BerReader::new(set);
    while !reader.is_empty() {
        let tlv = reader.read()?;
        let mut inner = BerReader::new(tlv.content);
        match tlv.tag {
            t if t == tag::context(0) => contents.identifier = Some(inner.read()?.as_utf8()?),
            t if t == tag::context(1) => contents.description = Some(inner.read()?.as_utf8()?),
            t if t == tag::context(3) => contents.is_online = Some(inner.read()?.as_boolean()?),
            _ => {}
        }
    }
    Ok(contents)
}

fn decode_parameter_contents(content: &[u8]) -> Result<ParameterContents> {
    let set = BerReader::new(content).read()?.expect(tag::SET)?;
    let mut contents = ParameterContents::default();
    let mut reader = BerReader::new(set);
    while !reader.is_empty() {
        let tlv = reader.read()?;
        let mut inner = BerReader::new(tlv.content);
        match tlv.tag {
            t if t == tag::context(0) => contents.identifier = Some(inner.read()?.as_utf8()?),
            t if t == tag::context(1) => contents.description = Some(inner.read()?.as_utf8()?),
            t if t == tag::context(2) => contents.value = Some(decode_value(inner.read()?)?),
            t if t == tag::context(3) => contents.minimum = Some(decode_value(inner.read()?)?),
            t if t == tag::context(4) => contents.maximum = Some(decode_value(inner.read()?)?),
            t if t == tag::context(5) => {
                contents.access = Some(ParameterAccess::from_wire(inner.read()?.as_integer()?))
            }
            t if t == tag::context(13) => {
                contents.parameter_type = Some(ParameterType::from_wire(inner.read()?.as_integer()?))
            }
            t if t == tag::context(14) => {
                contents.stream_identifier = Some(inner.read()?.as_integer()?)
            }
            _ => {}
        }
    }
    Ok(contents)
}

fn decode_matrix_contents(content: &[u8]) -> Result<MatrixContents> {
    let set = BerReader::new(content).read()?.expect(tag::SET)?;
    let mut contents = MatrixContents::default();
    let mut reader = BerReader::new(set);
    while !reader.is_empty() {
        let tlv = reader.read()?;
        let mut inner = BerReader::new(tlv.content);
        match tlv.tag {
            t if t == tag::context(0) => contents.identifier = Some(inner.read()?.as_utf8()?),
            t if t == tag::context(1) => contents.description = Some(inner.read()?.as_utf8()?),
            t if t == tag::context(2) => {
                contents.matrix_type = MatrixType::from_wire(inner.read()?.as_integer()?)
            }
            t if t == tag::context(3) => {
                contents.mode = MatrixMode::from_wire(inner.read()?.as_integer()?)
            }
            t if t == tag::context(4) => {
                contents.target_count = Some(inner.read()?.as_integer()? as u32)
            }
            t if t == tag::context(5) => {
                contents.source_count = Some(inner.read()?.as_integer()? as u32)
            }
            t if t == tag::context(6) => {
                while !inner.is_empty() {
                    contents.labels.push(decode_label(inner.read()?)?);
                }
            }
            _ => {}
        }
    }
    Ok(contents)
}

fn decode_label(tlv: Tlv<'_>) -> Result<MatrixLabel> {
    let content = tlv.expect(app::LABEL)?;
    let mut base_path = String::new();
    let mut description = String::new();
    let mut reader = BerReader::new(content);
    while !reader.is_empty() {
        let tlv = reader.read()?;
        let mut inner = BerReader::new(tlv.content);
        if tlv.tag == tag::context(0) {
            base_path = inner.read()?.as_utf8()?;
        } else if tlv.tag == tag::context(1) {
            description = inner.read()?.as_utf8()?;
        }
    }
    Ok(MatrixLabel {
        base_path,
        description,
    })
}

fn decode_connections(content: Option<&[u8]>) -> Result<Vec<MatrixConnection>> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    let mut connections = Vec::new();
    let mut reader = BerReader::new(content);
    while !reader.is_empty() {
        connections.push(decode_connection(reader.read()?)?);
    }
    Ok(connections)
}

fn decode_connection(tlv: Tlv<'_>) -> Result<MatrixConnection> {
    let content = tlv.expect(app::CONNECTION)?;
    let mut target = None;
    let mut sources = Vec::new();
    let mut operation = None;
    let mut disposition = None;

    let mut reader = BerReader::new(content);
    while !reader.is_empty() {
        let tlv = reader.read()?;
        let mut inner = BerReader::new(tlv.content);
        match tlv.tag {
            t if t == tag::context(0) => target = Some(inner.read()?.as_integer()? as u32),
            t if t == tag::context(1) => sources = inner.read()?.as_relative_oid()?,
            t if t == tag::context(2) => {
                operation = Some(MatrixOperation::from_wire(inner.read()?.as_integer()?))
            }
            t if t == tag::context(3) => {
                disposition = Some(MatrixDisposition::from_wire(inner.read()?.as_integer()?))
            }
            _ => {}
        }
    }

    Ok(MatrixConnection {
        target: target.ok_or_else(|| EmberError::Decode("connection without target".into()))?,
        sources,
        operation,
        disposition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(root: &Root) -> Root {
        decode(&encode(root)).unwrap()
    }

    #[test]
    fn test_command_roundtrip() {
        let root = Root::with_element(
            Element::node(1).with_child(Element::command(Command::GetDirectory)),
        );
        assert_eq!(roundtrip(&root), root);
    }

    #[test]
    fn test_qualified_parameter_roundtrip() {
        let root = Root::with_element(
            Element::parameter(
                2,
                ParameterContents {
                    identifier: Some("gain".into()),
                    value: Some(Value::Integer(42)),
                    minimum: Some(Value::Integer(-128)),
                    maximum: Some(Value::Integer(15)),
                    access: Some(ParameterAccess::ReadWrite),
                    parameter_type: Some(ParameterType::Integer),
                    ..Default::default()
                },
            )
            .qualified("1.2"),
        );
        assert_eq!(roundtrip(&root), root);
    }

    #[test]
    fn test_value_variants_roundtrip() {
        for value in [
            Value::Integer(-7),
            Value::Real(3.25),
            Value::String("mono".into()),
            Value::Boolean(true),
            Value::Octets(vec![0xFE, 0xFF, 0x00]),
        ] {
            let root = Root::with_element(Element::parameter(
                1,
                ParameterContents {
                    value: Some(value.clone()),
                    ..Default::default()
                },
            ));
            let decoded = roundtrip(&root);
            assert_eq!(
                decoded.elements[0].parameter_contents().unwrap().value,
                Some(value)
            );
        }
    }

    #[test]
    fn test_qualified_matrix_with_connections_roundtrip() {
        let root = Root::with_element(
            Element::matrix(
                3,
                Some(MatrixContents {
                    identifier: Some("router".into()),
                    matrix_type: MatrixType::OneToN,
                    target_count: Some(4),
                    source_count: Some(8),
                    labels: vec![MatrixLabel {
                        base_path: "3.1000".into(),
                        description: "Primary".into(),
                    }],
                    ..Default::default()
                }),
                vec![MatrixConnection {
                    target: 1,
                    sources: vec![0, 2],
                    operation: Some(MatrixOperation::Connect),
                    disposition: None,
                }],
            )
            .qualified("3"),
        );
        assert_eq!(roundtrip(&root), root);
    }

    #[test]
    fn test_connection_without_operation() {
        let root = Root::with_element(Element::matrix(
            3,
            None,
            vec![MatrixConnection {
                target: 0,
                sources: vec![5],
                operation: None,
                disposition: Some(MatrixDisposition::Modified),
            }],
        ));
        let decoded = roundtrip(&root);
        let connections = decoded.elements[0].matrix_connections().unwrap();
        assert_eq!(connections[0].effective_operation(), MatrixOperation::Absolute);
        assert_eq!(connections[0].disposition, Some(MatrixDisposition::Modified));
    }

    #[test]
    fn test_nested_tree_roundtrip() {
        let root = Root::with_element(
            Element::node_with(
                1,
                NodeContents {
                    identifier: Some("audio".into()),
                    description: Some("Audio section".into()),
                    is_online: Some(true),
                },
            )
            .with_child(Element::node(3).with_child(Element::parameter(
                2,
                ParameterContents {
                    stream_identifier: Some(9),
                    ..Default::default()
                },
            ))),
        );
        assert_eq!(roundtrip(&root), root);
    }

    #[test]
    fn test_empty_root_roundtrip() {
        assert_eq!(roundtrip(&Root::empty()), Root::empty());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode(&[0x13, 0x37]).is_err());
        assert!(decode(&[]).is_err());
        // Valid outer tag, truncated content length.
        assert!(decode(&[app::ROOT, 0x05, 0x01]).is_err());
    }

    #[test]
    fn test_unknown_command_number_fails() {
        // Hand-encode a command with number 99.
        let inner = ber::tlv(tag::context(0), &ber::integer(99));
        let command = ber::tlv(app::COMMAND, &inner);
        let payload = ber::tlv(app::ROOT, &command);
        assert!(decode(&payload).is_err());
    }
}
