//! Tree dispatcher: applies decoded Ember+ requests against the live tree.
//!
//! Entry point is [`handle_root`]: classify the request, resolve its target
//! in the arena, run the command / parameter set / matrix operation, send
//! the shaped response to the requesting client and fan the same response
//! out to every other subscriber of the touched path.
//!
//! All work happens under the coarse state lock; every send is a
//! non-blocking enqueue on the target client's writer channel, so the lock
//! is never held across an await point.

use std::sync::Mutex;

use crate::glow::{
    Command, Element, ElementKind, ElementPayload, MatrixConnection, MatrixDisposition,
    MatrixOperation, Root, Tree, Value,
};
use crate::glow::{validate_matrix_target, ElementId};

use super::connection::ClientHandle;
use super::events::{EventSink, ServerEvent};
use super::subscriptions::SubscriptionRegistry;
use super::ServerState;

/// Shape of the response, mirroring the shape of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryForm {
    /// Single element addressed by absolute path.
    Qualified,
    /// Nested single-child elements from the root down.
    TreeBranch,
}

/// A request reduced to its operative element and resolved target.
#[derive(Debug)]
enum Request {
    Command {
        target: ElementId,
        command: Command,
        form: QueryForm,
    },
    MatrixConnect {
        target: ElementId,
        connections: Vec<MatrixConnection>,
        form: QueryForm,
    },
    ParameterSet {
        target: ElementId,
        value: Value,
        form: QueryForm,
    },
}

impl Request {
    fn target(&self) -> ElementId {
        match self {
            Request::Command { target, .. }
            | Request::MatrixConnect { target, .. }
            | Request::ParameterSet { target, .. } => *target,
        }
    }
}

/// Apply one decoded root for one client.
pub(crate) fn handle_root(
    state: &Mutex<ServerState>,
    events: &EventSink,
    origin: &ClientHandle,
    root: &Root,
) {
    let mut guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let state = &mut *guard;

    let Some(element) = root.single_element() else {
        events.error(format!(
            "request from {} must carry exactly one top-level element",
            origin.remote_address()
        ));
        send_minimal(origin);
        return;
    };

    let request = match classify(&state.tree, element) {
        Ok(request) => request,
        Err(message) => {
            events.error(message);
            send_minimal(origin);
            return;
        }
    };

    events.emit(ServerEvent::Request {
        remote: origin.remote_address(),
        path: state.tree.path_of(request.target()),
    });

    match request {
        Request::Command {
            target,
            command,
            form,
        } => handle_command(state, origin, target, command, form),
        Request::MatrixConnect {
            target,
            connections,
            form,
        } => apply_matrix(state, events, origin, target, &connections, form),
        Request::ParameterSet {
            target,
            value,
            form,
        } => set_parameter(state, events, origin, target, value, form),
    }
}

/// The minimal tree-root reply: the peer observes an empty response
/// instead of a hang.
fn send_minimal(origin: &ClientHandle) {
    let _ = origin.queue_message(&Root::empty());
}

/// Resolve the request's target element and classify the operation.
fn classify(tree: &Tree, element: &Element) -> Result<Request, String> {
    if let Some(path) = &element.path {
        let target = tree
            .element_by_path(path)
            .ok_or_else(|| format!("no element at path {path}"))?;

        // A qualified element may carry its command as a single child.
        if let [child] = element.children.as_slice() {
            if let Some(command) = child.as_command() {
                return Ok(Request::Command {
                    target,
                    command,
                    form: QueryForm::Qualified,
                });
            }
        }
        return classify_operative(tree, target, element, QueryForm::Qualified);
    }

    // Unqualified: follow the child chain to the deepest element or command.
    let mut numbers: Vec<u32> = Vec::new();
    let mut cursor = element;
    loop {
        if let Some(command) = cursor.as_command() {
            let target = tree
                .resolve_chain(&numbers)
                .ok_or_else(|| format!("no element at path {}", join_path(&numbers)))?;
            return Ok(Request::Command {
                target,
                command,
                form: QueryForm::TreeBranch,
            });
        }

        if let [child] = cursor.children.as_slice() {
            numbers.push(cursor.number);
            cursor = child;
            continue;
        }

        numbers.push(cursor.number);
        let target = tree
            .resolve_chain(&numbers)
            .ok_or_else(|| format!("no element at path {}", join_path(&numbers)))?;
        return classify_operative(tree, target, cursor, QueryForm::TreeBranch);
    }
}

fn classify_operative(
    tree: &Tree,
    target: ElementId,
    element: &Element,
    form: QueryForm,
) -> Result<Request, String> {
    match &element.kind {
        ElementKind::Matrix { connections, .. } if !connections.is_empty() => {
            Ok(Request::MatrixConnect {
                target,
                connections: connections.clone(),
                form,
            })
        }
        ElementKind::Parameter(Some(contents)) => match &contents.value {
            Some(value) => Ok(Request::ParameterSet {
                target,
                value: value.clone(),
                form,
            }),
            None => Err(format!(
                "parameter request on {} carries no value",
                tree.path_of(target)
            )),
        },
        _ => Err(format!(
            "request on {} has no actionable content",
            tree.path_of(target)
        )),
    }
}

fn join_path(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// GetDirectory / Subscribe / Unsubscribe.
fn handle_command(
    state: &mut ServerState,
    origin: &ClientHandle,
    target: ElementId,
    command: Command,
    form: QueryForm,
) {
    let ServerState {
        tree,
        subscriptions,
    } = state;

    match command {
        Command::GetDirectory => get_directory(tree, subscriptions, origin, target, form),
        Command::Subscribe => {
            subscriptions.subscribe(tree.path_of(target), origin);
        }
        Command::Unsubscribe => {
            subscriptions.unsubscribe(&tree.path_of(target), origin.id());
        }
    }
}

/// Directory listing plus the automatic subscriptions the command implies.
fn get_directory(
    tree: &Tree,
    subscriptions: &mut SubscriptionRegistry,
    origin: &ClientHandle,
    target: ElementId,
    form: QueryForm,
) {
    // A matrix or a non-streaming parameter subscribes the requester to the
    // target itself; anything else subscribes it to each immediate child.
    if tree.is_matrix(target) || (tree.is_parameter(target) && !tree.is_stream(target)) {
        subscriptions.subscribe(tree.path_of(target), origin);
    } else {
        for &child in tree.children_of(target) {
            subscriptions.subscribe(tree.path_of(child), origin);
        }
    }

    let listing: Vec<Element> = tree
        .children_of(target)
        .iter()
        .map(|&child| tree.duplicate(child))
        .collect();

    let response = match form {
        QueryForm::Qualified => {
            let mut element = tree.qualified(target);
            element.children = listing;
            Root::with_element(element)
        }
        QueryForm::TreeBranch => {
            if target == tree.root() {
                Root { elements: listing }
            } else {
                let mut element = tree.duplicate(target);
                element.children = listing;
                tree.tree_branch(target, Some(element))
            }
        }
    };

    let _ = origin.queue_message(&response);
}

/// Parameter write: gated on access, previous value captured for the event.
fn set_parameter(
    state: &mut ServerState,
    events: &EventSink,
    origin: &ClientHandle,
    target: ElementId,
    value: Value,
    form: QueryForm,
) {
    let ServerState {
        tree,
        subscriptions,
    } = state;
    let path = tree.path_of(target);

    let ElementPayload::Parameter(contents) = tree.payload_mut(target) else {
        events.error(format!("element at {path} is not a parameter"));
        send_minimal(origin);
        return;
    };

    // A write to a read-only parameter silently succeeds without effect:
    // the reply echoes the unchanged value and nothing is fanned out.
    let writable = contents.access.unwrap_or_default().allows_write();
    let previous = contents.value.clone();
    if writable {
        contents.parameter_type = Some(value.parameter_type());
        contents.value = Some(value);
    }

    let response = match form {
        QueryForm::Qualified => Root::with_element(tree.qualified(target)),
        QueryForm::TreeBranch => tree.tree_branch(target, None),
    };
    let _ = origin.queue_message(&response);

    if writable {
        events.emit(ServerEvent::ValueChange {
            path: path.clone(),
            previous,
        });
        subscriptions.update_subscribers(&path, &response, origin.id());
    }
}

/// Matrix absolute / connect / disconnect.
fn apply_matrix(
    state: &mut ServerState,
    events: &EventSink,
    origin: &ClientHandle,
    target: ElementId,
    requests: &[MatrixConnection],
    form: QueryForm,
) {
    let ServerState {
        tree,
        subscriptions,
    } = state;
    let path = tree.path_of(target);
    let remote = origin.remote_address();

    // All invariants are checked before any mutation; a violation produces
    // an error event and no client response.
    for request in requests {
        if let Err(error) = validate_matrix_target(tree, target, request.target) {
            events.error(error.to_string());
            return;
        }
    }

    let mut touched = Vec::with_capacity(requests.len());
    for request in requests {
        let ElementPayload::Matrix { connections, .. } = tree.payload_mut(target) else {
            return;
        };
        let sources = connections.entry(request.target).or_default();

        let operation = request.effective_operation();
        match operation {
            MatrixOperation::Absolute => {
                sources.clear();
                sources.extend(request.sources.iter().copied());
            }
            MatrixOperation::Connect => {
                sources.extend(request.sources.iter().copied());
            }
            MatrixOperation::Disconnect => {
                for source in &request.sources {
                    sources.remove(source);
                }
            }
        }
        let resulting: Vec<u32> = sources.iter().copied().collect();

        events.emit(match operation {
            MatrixOperation::Absolute => ServerEvent::MatrixChange {
                path: path.clone(),
                target: request.target,
                sources: request.sources.clone(),
                remote,
            },
            MatrixOperation::Connect => ServerEvent::MatrixConnect {
                path: path.clone(),
                target: request.target,
                sources: request.sources.clone(),
                remote,
            },
            MatrixOperation::Disconnect => ServerEvent::MatrixDisconnect {
                path: path.clone(),
                target: request.target,
                sources: request.sources.clone(),
                remote,
            },
        });

        touched.push(MatrixConnection {
            target: request.target,
            sources: resulting,
            operation: None,
            disposition: Some(MatrixDisposition::Modified),
        });
    }

    let response = match form {
        QueryForm::Qualified => {
            let mut element = tree.qualified(target);
            if let ElementKind::Matrix { connections, .. } = &mut element.kind {
                *connections = touched;
            }
            Root::with_element(element)
        }
        QueryForm::TreeBranch => {
            let mut element = tree.duplicate(target);
            if let ElementKind::Matrix { connections, .. } = &mut element.kind {
                *connections = touched;
            }
            tree.tree_branch(target, Some(element))
        }
    };

    let _ = origin.queue_message(&response);
    subscriptions.update_subscribers(&path, &response, origin.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glow::{MatrixContents, ParameterAccess, ParameterContents, Tree};
    use crate::server::connection::testing::{drain_roots, loopback};

    fn test_state() -> Mutex<ServerState> {
        let tree = Tree::from_json(
            r#"[
                { "kind": "node", "number": 1, "identifier": "audio", "children": [
                    { "kind": "parameter", "number": 2, "identifier": "gain",
                      "value": 10, "access": "readWrite" },
                    { "kind": "parameter", "number": 4, "identifier": "serial",
                      "value": "X-100", "access": "read" },
                    { "kind": "parameter", "number": 5, "identifier": "vu",
                      "value": -20, "streamIdentifier": 7 }
                ]},
                { "kind": "matrix", "number": 3, "identifier": "router",
                  "targetCount": 4, "sourceCount": 8 }
            ]"#,
        )
        .unwrap();
        ServerState::new(tree)
    }

    fn qualified_set(path: &str, value: Value) -> Root {
        Root::with_element(
            Element::parameter(
                0,
                ParameterContents {
                    value: Some(value),
                    ..Default::default()
                },
            )
            .qualified(path),
        )
    }

    #[test]
    fn test_get_directory_on_root() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let request = Root::with_element(Element::command(Command::GetDirectory));
        handle_root(&state, &events, &client, &request);

        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 1);
        // All root children listed, children trimmed, contents present.
        let elements = &responses[0].elements;
        assert_eq!(elements.len(), 2);
        assert!(elements.iter().all(|e| e.children.is_empty()));
        assert!(elements.iter().any(|e| e.is_matrix()));

        // The requester is now subscribed to each child path.
        let guard = state.lock().unwrap();
        assert!(guard.subscriptions.is_subscribed("1", 1));
        assert!(guard.subscriptions.is_subscribed("3", 1));
    }

    #[test]
    fn test_get_directory_on_matrix_subscribes_target() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let request = Root::with_element(
            Element::matrix(3, None, Vec::new())
                .qualified("3")
                .with_child(Element::command(Command::GetDirectory)),
        );
        handle_root(&state, &events, &client, &request);

        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 1);
        let element = responses[0].single_element().unwrap();
        assert_eq!(element.path.as_deref(), Some("3"));

        let guard = state.lock().unwrap();
        assert!(guard.subscriptions.is_subscribed("3", 1));
    }

    #[test]
    fn test_get_directory_on_stream_parameter_subscribes_children() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (client, _rx) = loopback(1);

        let request = Root::with_element(
            Element::parameter(5, ParameterContents::default())
                .qualified("1.5")
                .with_child(Element::command(Command::GetDirectory)),
        );
        handle_root(&state, &events, &client, &request);

        // Stream parameters are not auto-subscribed.
        let guard = state.lock().unwrap();
        assert!(!guard.subscriptions.is_subscribed("1.5", 1));
    }

    #[test]
    fn test_parameter_set_and_fanout_excludes_origin() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (writer, mut writer_rx) = loopback(1);
        let (observer, mut observer_rx) = loopback(2);
        let (_bystander, mut bystander_rx) = loopback(3);

        {
            let mut guard = state.lock().unwrap();
            guard.subscriptions.subscribe("1.2", &writer);
            guard.subscriptions.subscribe("1.2", &observer);
        }

        handle_root(&state, &events, &writer, &qualified_set("1.2", Value::Integer(42)));

        // Value mutated in the tree.
        {
            let guard = state.lock().unwrap();
            let id = guard.tree.element_by_path("1.2").unwrap();
            match guard.tree.payload(id) {
                ElementPayload::Parameter(contents) => {
                    assert_eq!(contents.value, Some(Value::Integer(42)));
                }
                other => panic!("unexpected payload: {other:?}"),
            }
        }

        // Originator gets exactly one response; the subscriber gets the same
        // message; non-subscribers get nothing.
        let writer_roots = drain_roots(&mut writer_rx);
        let observer_roots = drain_roots(&mut observer_rx);
        assert_eq!(writer_roots.len(), 1);
        assert_eq!(observer_roots.len(), 1);
        assert_eq!(writer_roots[0], observer_roots[0]);
        assert!(drain_roots(&mut bystander_rx).is_empty());

        let element = writer_roots[0].single_element().unwrap();
        assert_eq!(element.path.as_deref(), Some("1.2"));
        assert_eq!(
            element.parameter_contents().unwrap().value,
            Some(Value::Integer(42))
        );

        // ValueChange carries the previous value.
        let mut saw_change = false;
        while let Ok(event) = events_rx.try_recv() {
            if let ServerEvent::ValueChange { path, previous } = event {
                assert_eq!(path, "1.2");
                assert_eq!(previous, Some(Value::Integer(10)));
                saw_change = true;
            }
        }
        assert!(saw_change);
    }

    #[test]
    fn test_read_only_write_succeeds_without_effect() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        handle_root(&state, &events, &client, &qualified_set("1.4", Value::String("hacked".into())));

        // Unchanged value echoed back, no ValueChange event.
        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 1);
        let element = responses[0].single_element().unwrap();
        assert_eq!(
            element.parameter_contents().unwrap().value,
            Some(Value::String("X-100".into()))
        );

        while let Ok(event) = events_rx.try_recv() {
            assert!(!matches!(event, ServerEvent::ValueChange { .. }));
        }
    }

    #[test]
    fn test_tree_branch_parameter_set_response_form() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        // Unqualified nested form: node 1 -> parameter 2 with value.
        let request = Root::with_element(Element::node(1).with_child(Element::parameter(
            2,
            ParameterContents {
                value: Some(Value::Integer(7)),
                ..Default::default()
            },
        )));
        handle_root(&state, &events, &client, &request);

        let responses = drain_roots(&mut rx);
        let outer = responses[0].single_element().unwrap();
        assert!(outer.path.is_none());
        assert_eq!(outer.number, 1);
        assert_eq!(
            outer.children[0].parameter_contents().unwrap().value,
            Some(Value::Integer(7))
        );
    }

    #[test]
    fn test_matrix_connect_unions_sources() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let connect = |sources: Vec<u32>, operation| {
            Root::with_element(
                Element::matrix(
                    3,
                    None,
                    vec![MatrixConnection::request(1, sources, operation)],
                )
                .qualified("3"),
            )
        };

        handle_root(&state, &events, &client, &connect(vec![0], MatrixOperation::Absolute));
        handle_root(&state, &events, &client, &connect(vec![2], MatrixOperation::Connect));

        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 2);
        let connections = responses[1]
            .single_element()
            .unwrap()
            .matrix_connections()
            .unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].target, 1);
        assert_eq!(connections[0].sources, vec![0, 2]);
        assert_eq!(connections[0].disposition, Some(MatrixDisposition::Modified));

        let mut saw_connect = false;
        while let Ok(event) = events_rx.try_recv() {
            if let ServerEvent::MatrixConnect { target, sources, .. } = event {
                assert_eq!(target, 1);
                assert_eq!(sources, vec![2]);
                saw_connect = true;
            }
        }
        assert!(saw_connect);

        let guard = state.lock().unwrap();
        let id = guard.tree.element_by_path("3").unwrap();
        assert_eq!(guard.tree.matrix_sources(id, 1), Some(vec![0, 2]));
    }

    #[test]
    fn test_matrix_disconnect_removes_sources() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let request = |connection: MatrixConnection| {
            Root::with_element(Element::matrix(3, None, vec![connection]).qualified("3"))
        };

        handle_root(
            &state,
            &events,
            &client,
            &request(MatrixConnection::request(2, vec![1, 3, 5], MatrixOperation::Absolute)),
        );
        handle_root(
            &state,
            &events,
            &client,
            &request(MatrixConnection::request(2, vec![3], MatrixOperation::Disconnect)),
        );

        let responses = drain_roots(&mut rx);
        let connections = responses[1]
            .single_element()
            .unwrap()
            .matrix_connections()
            .unwrap();
        assert_eq!(connections[0].sources, vec![1, 5]);
    }

    #[test]
    fn test_matrix_target_out_of_range_no_response() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let request = Root::with_element(
            Element::matrix(
                3,
                None,
                vec![MatrixConnection::request(9, vec![0], MatrixOperation::Connect)],
            )
            .qualified("3"),
        );
        handle_root(&state, &events, &client, &request);

        // Error event, no client response, no mutation.
        assert!(drain_roots(&mut rx).is_empty());
        let mut saw_error = false;
        while let Ok(event) = events_rx.try_recv() {
            if matches!(event, ServerEvent::Error { .. }) {
                saw_error = true;
            }
        }
        assert!(saw_error);

        let guard = state.lock().unwrap();
        let id = guard.tree.element_by_path("3").unwrap();
        assert_eq!(guard.tree.matrix_sources(id, 9), Some(vec![]));
    }

    #[test]
    fn test_unknown_path_yields_minimal_root() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        handle_root(&state, &events, &client, &qualified_set("9.9", Value::Integer(1)));

        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 1);
        assert!(responses[0].elements.is_empty());

        assert!(matches!(
            events_rx.try_recv(),
            Ok(ServerEvent::Error { .. })
        ));
    }

    #[test]
    fn test_subscribe_then_unsubscribe_is_stable() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (writer, _writer_rx) = loopback(1);
        let (observer, mut observer_rx) = loopback(2);

        let command = |command| {
            Root::with_element(
                Element::parameter(2, ParameterContents::default())
                    .qualified("1.2")
                    .with_child(Element::command(command)),
            )
        };

        handle_root(&state, &events, &observer, &command(Command::Subscribe));
        assert!(state.lock().unwrap().subscriptions.is_subscribed("1.2", 2));

        handle_root(&state, &events, &observer, &command(Command::Unsubscribe));
        assert!(!state.lock().unwrap().subscriptions.is_subscribed("1.2", 2));

        // After unsubscribe, a write by another client produces no fan-out.
        drain_roots(&mut observer_rx);
        handle_root(&state, &events, &writer, &qualified_set("1.2", Value::Integer(1)));
        assert!(drain_roots(&mut observer_rx).is_empty());
    }

    #[test]
    fn test_multi_element_root_is_an_error() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let request = Root {
            elements: vec![Element::node(1), Element::node(3)],
        };
        handle_root(&state, &events, &client, &request);

        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 1);
        assert!(responses[0].elements.is_empty());
        assert!(matches!(
            events_rx.try_recv(),
            Ok(ServerEvent::Error { .. })
        ));
    }

    #[test]
    fn test_stale_subscriber_is_reaped_on_fanout() {
        let state = test_state();
        let (events, _events_rx) = EventSink::new();
        let (writer, _writer_rx) = loopback(1);
        let (stale, stale_rx) = loopback(2);

        state.lock().unwrap().subscriptions.subscribe("1.2", &stale);
        drop(stale_rx); // Receiver gone: sends will fail.

        handle_root(&state, &events, &writer, &qualified_set("1.2", Value::Integer(5)));

        assert_eq!(state.lock().unwrap().subscriptions.subscriber_count("1.2"), 0);
    }

    #[test]
    fn test_matrix_contents_in_request_without_connections_is_error() {
        let state = test_state();
        let (events, mut events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        let request = Root::with_element(
            Element::matrix(3, Some(MatrixContents::default()), Vec::new()).qualified("3"),
        );
        handle_root(&state, &events, &client, &request);

        let responses = drain_roots(&mut rx);
        assert_eq!(responses.len(), 1);
        assert!(responses[0].elements.is_empty());
        assert!(matches!(
            events_rx.try_recv(),
            Ok(ServerEvent::Error { .. })
        ));
    }

    #[test]
    fn test_write_access_none_is_ignored() {
        let state = ServerState::new({
            let mut tree = Tree::new();
            let root = tree.root();
            tree.insert(
                root,
                1,
                ElementPayload::Parameter(ParameterContents {
                    value: Some(Value::Integer(1)),
                    access: Some(ParameterAccess::None),
                    ..Default::default()
                }),
            );
            tree
        });
        let (events, _events_rx) = EventSink::new();
        let (client, mut rx) = loopback(1);

        handle_root(&state, &events, &client, &qualified_set("1", Value::Integer(2)));

        let responses = drain_roots(&mut rx);
        assert_eq!(
            responses[0]
                .single_element()
                .unwrap()
                .parameter_contents()
                .unwrap()
                .value,
            Some(Value::Integer(1))
        );
    }
}
