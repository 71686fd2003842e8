//! Tests for mutation routing: direct targets, ready frames, and mutations
//! deferred until a frame fires `load`.

use framedom_api::{Dispatch, DomApi, FrameState, Mutation, OperationKind};
use framedom_dom::{DomError, DomTree, FrameLoading, NodeId};

fn body(api: &DomApi<DomTree>) -> NodeId {
    api.environment().body(NodeId::ROOT).unwrap()
}

fn nested_body(api: &DomApi<DomTree>, frame: NodeId) -> NodeId {
    let tree = api.environment();
    tree.body(tree.content_document(frame).unwrap()).unwrap()
}

/// An iframe attached to the ambient body, its document still loading.
fn loading_frame(api: &mut DomApi<DomTree>) -> NodeId {
    let body = body(api);
    let frame = api.create_element("iframe");
    assert_eq!(api.append_child(&body, &frame), Ok(Dispatch::Applied));
    frame
}

/// An iframe whose nested document has finished loading.
fn ready_frame(api: &mut DomApi<DomTree>) -> NodeId {
    let frame = loading_frame(api);
    let _ = api.run_until_idle();
    assert_eq!(api.frame_state(&frame), FrameState::Ready);
    frame
}

fn child_tags(api: &DomApi<DomTree>, parent: NodeId) -> Vec<String> {
    api.environment()
        .children(parent)
        .iter()
        .map(|&id| api.tag_name(&id))
        .collect()
}

#[test]
fn test_plain_targets_are_mutated_directly() {
    let mut api = DomApi::new(DomTree::html_document());
    let body = body(&api);
    let list = api.create_element("ul");
    let item = api.create_element("li");

    assert_eq!(api.append_child(&body, &list), Ok(Dispatch::Applied));
    assert_eq!(api.append_child(&list, &item), Ok(Dispatch::Applied));
    assert_eq!(api.parent_node(&item), Some(list));
    assert_eq!(api.set_text_content(&item, "one"), Ok(Dispatch::Applied));
    assert_eq!(api.environment().text_content(list).as_deref(), Some("one"));

    assert_eq!(api.remove_child(&list, &item), Ok(Dispatch::Applied));
    assert_eq!(api.parent_node(&item), None);
    assert_eq!(api.environment().pending_tasks(), 0);
}

#[test]
fn test_insert_before_without_reference_appends() {
    let mut api = DomApi::new(DomTree::html_document());
    let list = api.create_element("ul");
    let first = api.create_element("li");
    let last = api.create_element("p");
    let _ = api.append_child(&list, &first).unwrap();

    assert_eq!(api.insert_before(&list, &last, None), Ok(Dispatch::Applied));
    assert_eq!(child_tags(&api, list), ["LI", "P"]);

    let front = api.create_element("b");
    let _ = api.insert_before(&list, &front, Some(&first)).unwrap();
    assert_eq!(child_tags(&api, list), ["B", "LI", "P"]);
}

#[test]
fn test_synchronous_host_errors_are_propagated() {
    let mut api = DomApi::new(DomTree::html_document());
    let body = body(&api);
    let stranger = api.create_element("div");
    assert!(matches!(
        api.remove_child(&body, &stranger),
        Err(DomError::NotFound { .. })
    ));
    assert!(matches!(
        api.append_child(&stranger, &stranger),
        Err(DomError::HierarchyRequest(_))
    ));
}

#[test]
fn test_ready_frame_text_goes_to_nested_body() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = ready_frame(&mut api);

    assert_eq!(api.set_text_content(&frame, "hello"), Ok(Dispatch::Applied));

    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().text_content(nested).as_deref(), Some("hello"));
    assert!(api.environment().children(frame).is_empty());
}

#[test]
fn test_ready_frame_append_goes_to_nested_body() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = ready_frame(&mut api);
    let child = api.create_element("section");

    assert_eq!(api.append_child(&frame, &child), Ok(Dispatch::Applied));

    let nested = nested_body(&api, frame);
    assert_eq!(api.parent_node(&child), Some(nested));
    // Adopted into the nested document.
    let nested_doc = api.environment().content_document(frame).unwrap();
    assert_eq!(api.environment().node_document(child), Some(nested_doc));
}

#[test]
fn test_loading_frame_defers_until_load() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    assert_eq!(api.frame_state(&frame), FrameState::Loading);

    let child = api.create_element("p");
    assert_eq!(api.append_child(&frame, &child), Ok(Dispatch::Deferred));
    assert_eq!(api.parent_node(&child), None);
    assert_eq!(api.pending_operations(&frame), 1);
    assert!(api.environment().children(frame).is_empty());

    let _ = api.run_until_idle();

    let nested = nested_body(&api, frame);
    assert_eq!(api.parent_node(&child), Some(nested));
    assert_eq!(api.environment().children(nested), [child]);
    assert_eq!(api.pending_operations(&frame), 0);
}

#[test]
fn test_unattached_frame_waits_for_attachment_and_load() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = api.create_element("iframe");
    assert_eq!(api.frame_state(&frame), FrameState::Uninitialized);

    let child = api.create_element("p");
    assert_eq!(api.append_child(&frame, &child), Ok(Dispatch::Deferred));

    let body = body(&api);
    let _ = api.append_child(&body, &frame).unwrap();
    assert_eq!(api.parent_node(&child), None);

    let _ = api.run_until_idle();
    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().first_child(nested), Some(child));
}

#[test]
fn test_deferred_operations_replay_in_issue_order() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    let a = api.create_element("a");
    let b = api.create_element("b");
    let i = api.create_element("i");

    let _ = api.append_child(&frame, &a).unwrap();
    let _ = api.append_child(&frame, &b).unwrap();
    let _ = api.insert_before(&frame, &i, Some(&b)).unwrap();
    let _ = api.remove_child(&frame, &a).unwrap();
    assert_eq!(api.pending_operations(&frame), 4);

    let kinds: Vec<_> = api
        .router()
        .pending(&frame)
        .iter()
        .map(|op| op.mutation.kind())
        .collect();
    assert_eq!(
        kinds,
        [
            OperationKind::AppendChild,
            OperationKind::AppendChild,
            OperationKind::InsertBefore,
            OperationKind::RemoveChild,
        ]
    );

    let _ = api.run_until_idle();
    let nested = nested_body(&api, frame);
    assert_eq!(child_tags(&api, nested), ["I", "B"]);
    assert_eq!(api.parent_node(&a), None);
}

#[test]
fn test_text_then_append_replays_in_order() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    let child = api.create_element("em");

    let _ = api.set_text_content(&frame, "before").unwrap();
    let _ = api.append_child(&frame, &child).unwrap();
    let _ = api.run_until_idle();

    let nested = nested_body(&api, frame);
    let tree = api.environment();
    assert_eq!(tree.children(nested).len(), 2);
    assert_eq!(tree.as_text(tree.children(nested)[0]), Some("before"));
    assert_eq!(tree.children(nested)[1], child);
}

#[test]
fn test_deferred_operation_runs_exactly_once() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    let _ = api.set_text_content(&frame, "x").unwrap();
    let _ = api.run_until_idle();

    // A later load of the same document fires nothing queued.
    assert!(!api.environment_mut().finish_frame_load(frame));
    assert_eq!(api.environment().load_listener_count(frame), 0);

    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().text_content(nested).as_deref(), Some("x"));
    assert_eq!(api.environment().children(nested).len(), 1);
}

#[test]
fn test_one_load_listener_per_backlog() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    for text in ["a", "b", "c"] {
        let _ = api.set_text_content(&frame, text).unwrap();
    }
    assert_eq!(api.environment().load_listener_count(frame), 1);

    let _ = api.run_until_idle();
    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().text_content(nested).as_deref(), Some("c"));
}

#[test]
fn test_frames_have_independent_queues() {
    let mut api = DomApi::new(DomTree::html_document());
    let first = loading_frame(&mut api);
    let second = loading_frame(&mut api);

    let _ = api.set_text_content(&first, "one").unwrap();
    let _ = api.set_text_content(&second, "two").unwrap();
    let _ = api.set_text_content(&first, "three").unwrap();
    assert_eq!(api.pending_operations(&first), 2);
    assert_eq!(api.pending_operations(&second), 1);

    let mut waiting = api.router().waiting_frames();
    waiting.sort_by_key(|id| id.0);
    assert_eq!(waiting, [first, second]);

    let _ = api.run_until_idle();
    let one = nested_body(&api, first);
    let two = nested_body(&api, second);
    assert_eq!(api.environment().text_content(one).as_deref(), Some("three"));
    assert_eq!(api.environment().text_content(two).as_deref(), Some("two"));
}

#[test]
fn test_pending_records_keep_sequence_and_payload() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    let child = api.create_element("p");
    let _ = api.insert_before(&frame, &child, None).unwrap();
    let _ = api.set_text_content(&frame, "t").unwrap();

    let pending = api.router().pending(&frame);
    assert_eq!(pending.len(), 2);
    assert!(pending[0].sequence < pending[1].sequence);
    assert_eq!(pending[0].frame, frame);
    assert_eq!(
        pending[0].mutation,
        Mutation::InsertBefore {
            child,
            reference: None
        }
    );
    assert_eq!(
        pending[1].mutation,
        Mutation::SetTextContent {
            text: "t".to_string()
        }
    );
}

#[test]
fn test_operations_behind_backlog_are_deferred() {
    let mut tree = DomTree::html_document();
    tree.set_frame_loading(FrameLoading::Stalled);
    let mut api = DomApi::new(tree);
    let frame = loading_frame(&mut api);
    let first = api.create_element("h1");
    let _ = api.append_child(&frame, &first).unwrap();

    let second = api.create_element("h2");
    assert_eq!(api.append_child(&frame, &second), Ok(Dispatch::Deferred));
    assert!(api.environment_mut().finish_frame_load(frame));

    let nested = nested_body(&api, frame);
    assert_eq!(child_tags(&api, nested), ["H1", "H2"]);
    assert_eq!(api.pending_operations(&frame), 0);
}

#[test]
fn test_stalled_frame_keeps_operations_queued() {
    let mut tree = DomTree::html_document();
    tree.set_frame_loading(FrameLoading::Stalled);
    let mut api = DomApi::new(tree);
    let frame = loading_frame(&mut api);

    let _ = api.set_text_content(&frame, "never").unwrap();
    assert_eq!(api.run_until_idle(), 0);
    assert_eq!(api.frame_state(&frame), FrameState::Loading);
    assert_eq!(api.pending_operations(&frame), 1);

    assert!(api.environment_mut().finish_frame_load(frame));
    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().text_content(nested).as_deref(), Some("never"));
}

#[test]
fn test_detached_frame_keeps_queue_until_reattached() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    let _ = api.set_text_content(&frame, "late").unwrap();

    let body = body(&api);
    let _ = api.remove_child(&body, &frame).unwrap();
    let _ = api.run_until_idle();
    assert_eq!(api.frame_state(&frame), FrameState::Uninitialized);
    assert_eq!(api.pending_operations(&frame), 1);

    let _ = api.append_child(&body, &frame).unwrap();
    let _ = api.run_until_idle();
    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().text_content(nested).as_deref(), Some("late"));
}

#[test]
fn test_failed_replay_does_not_block_later_operations() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = loading_frame(&mut api);
    let stranger = api.create_element("span");
    let child = api.create_element("p");

    // Removing a node that is not a child fails during replay.
    assert_eq!(api.remove_child(&frame, &stranger), Ok(Dispatch::Deferred));
    let _ = api.append_child(&frame, &child).unwrap();
    let _ = api.run_until_idle();

    let nested = nested_body(&api, frame);
    assert_eq!(api.environment().children(nested), [child]);
    assert_eq!(api.pending_operations(&frame), 0);
}

#[test]
fn test_reads_are_not_redirected() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = ready_frame(&mut api);
    let body = body(&api);

    assert_eq!(api.tag_name(&frame), "IFRAME");
    assert_eq!(api.parent_node(&frame), Some(body));
    assert_eq!(api.next_sibling(&frame), None);

    let after = api.create_element("footer");
    let _ = api.append_child(&body, &after).unwrap();
    assert_eq!(api.next_sibling(&frame), Some(after));
}

#[test]
fn test_frame_inside_ready_frame_defers_on_inner_frame() {
    let mut api = DomApi::new(DomTree::html_document());
    let outer = ready_frame(&mut api);
    let inner = api.create_element("iframe");
    let _ = api.append_child(&outer, &inner).unwrap();
    assert_eq!(api.frame_state(&inner), FrameState::Loading);

    let _ = api.set_text_content(&inner, "deep").unwrap();
    assert_eq!(api.pending_operations(&inner), 1);

    let _ = api.run_until_idle();
    let nested = nested_body(&api, inner);
    assert_eq!(api.environment().text_content(nested).as_deref(), Some("deep"));
}

#[test]
fn test_ready_frame_without_body_reports_missing_body() {
    let mut api = DomApi::new(DomTree::html_document());
    let frame = ready_frame(&mut api);
    let nested = nested_body(&api, frame);
    let html = api.parent_node(&nested).unwrap();
    let _ = api.remove_child(&html, &nested).unwrap();

    let child = api.create_element("p");
    assert_eq!(api.append_child(&frame, &child), Err(DomError::MissingBody));
    assert_eq!(api.pending_operations(&frame), 0);
}

#[test]
fn test_operation_kind_and_frame_state_round_trip_through_strings() {
    assert_eq!(OperationKind::InsertBefore.to_string(), "insertBefore");
    assert_eq!(
        "textContent".parse::<OperationKind>().unwrap(),
        OperationKind::SetTextContent
    );
    assert!("appendchild".parse::<OperationKind>().is_err());

    assert_eq!(FrameState::Uninitialized.to_string(), "uninitialized");
    assert_eq!("ready".parse::<FrameState>().unwrap(), FrameState::Ready);
}
