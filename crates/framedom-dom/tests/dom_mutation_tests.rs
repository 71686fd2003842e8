//! Tests for DOM tree mutation methods: append_child, remove_child,
//! insert_before, text content and adoption.

use framedom_dom::{DomError, DomTree, NodeId, SVG_NAMESPACE};

/// Helper to create an element in the top-level document.
fn element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.create_element(NodeId::ROOT, tag)
}

/// Helper to create a connected `<div>` under the body.
fn connected_parent(tree: &mut DomTree) -> NodeId {
    let body = tree.body(NodeId::ROOT).unwrap();
    let parent = element(tree, "div");
    tree.append_child(body, parent).unwrap();
    parent
}

// ========== append_child ==========

#[test]
fn test_append_child_sets_links() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    tree.append_child(parent, a).unwrap();
    tree.append_child(parent, b).unwrap();

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.parent(b), Some(parent));
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
    assert_eq!(tree.next_sibling(b), None);
}

#[test]
fn test_append_child_moves_existing_child() {
    let mut tree = DomTree::html_document();
    let from = connected_parent(&mut tree);
    let to = connected_parent(&mut tree);

    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    tree.append_child(from, a).unwrap();
    tree.append_child(from, b).unwrap();

    tree.append_child(to, a).unwrap();

    assert_eq!(tree.children(from), &[b]);
    assert_eq!(tree.prev_sibling(b), None);
    assert_eq!(tree.children(to), &[a]);
    assert_eq!(tree.parent(a), Some(to));
}

#[test]
fn test_append_ancestor_is_hierarchy_error() {
    let mut tree = DomTree::html_document();
    let outer = connected_parent(&mut tree);
    let inner = element(&mut tree, "span");
    tree.append_child(outer, inner).unwrap();

    let err = tree.append_child(inner, outer).unwrap_err();
    assert!(matches!(err, DomError::HierarchyRequest(_)));
    assert_eq!(tree.append_child(outer, outer).unwrap_err(), DomError::HierarchyRequest("node is an ancestor of parent"));
}

#[test]
fn test_append_text_to_document_is_hierarchy_error() {
    let mut tree = DomTree::new();
    let text = tree.create_text_node(NodeId::ROOT, "loose");
    assert!(matches!(
        tree.append_child(NodeId::ROOT, text),
        Err(DomError::HierarchyRequest(_))
    ));
}

#[test]
fn test_append_to_text_node_is_hierarchy_error() {
    let mut tree = DomTree::html_document();
    let text = tree.create_text_node(NodeId::ROOT, "leaf");
    let child = element(&mut tree, "b");
    assert!(matches!(
        tree.append_child(text, child),
        Err(DomError::HierarchyRequest(_))
    ));
}

#[test]
fn test_unknown_node_is_reported() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);
    let bogus = NodeId(10_000);
    assert_eq!(
        tree.append_child(parent, bogus),
        Err(DomError::UnknownNode(bogus))
    );
}

// ========== remove_child ==========

#[test]
fn test_remove_child_single_child() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let child = element(&mut tree, "p");
    tree.append_child(parent, child).unwrap();

    assert_eq!(tree.children(parent).len(), 1);

    tree.remove_child(parent, child).unwrap();

    assert_eq!(tree.children(parent).len(), 0);
    assert_eq!(tree.parent(child), None);
    assert_eq!(tree.prev_sibling(child), None);
    assert_eq!(tree.next_sibling(child), None);
}

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    let c = element(&mut tree, "c");
    tree.append_child(parent, a).unwrap();
    tree.append_child(parent, b).unwrap();
    tree.append_child(parent, c).unwrap();

    tree.remove_child(parent, b).unwrap();

    // a and c are siblings now
    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_remove_child_of_other_parent_is_not_found() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);
    let other = connected_parent(&mut tree);
    let child = element(&mut tree, "p");
    tree.append_child(other, child).unwrap();

    assert_eq!(
        tree.remove_child(parent, child),
        Err(DomError::NotFound { parent, child })
    );
    assert_eq!(tree.parent(child), Some(other));
}

// ========== insert_before ==========

#[test]
fn test_insert_before_first_child() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let existing = element(&mut tree, "b");
    tree.append_child(parent, existing).unwrap();

    let new_child = element(&mut tree, "a");
    tree.insert_before(parent, new_child, Some(existing)).unwrap();

    // new_child should be first, existing second
    assert_eq!(tree.children(parent), &[new_child, existing]);
    assert_eq!(tree.parent(new_child), Some(parent));
    assert_eq!(tree.next_sibling(new_child), Some(existing));
    assert_eq!(tree.prev_sibling(new_child), None);
    assert_eq!(tree.prev_sibling(existing), Some(new_child));
}

#[test]
fn test_insert_before_middle() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let a = element(&mut tree, "a");
    let c = element(&mut tree, "c");
    tree.append_child(parent, a).unwrap();
    tree.append_child(parent, c).unwrap();

    let b = element(&mut tree, "b");
    tree.insert_before(parent, b, Some(c)).unwrap();

    assert_eq!(tree.children(parent), &[a, b, c]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
    assert_eq!(tree.next_sibling(b), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(b));
}

#[test]
fn test_insert_before_none_appends() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    tree.append_child(parent, a).unwrap();
    tree.insert_before(parent, b, None).unwrap();

    assert_eq!(tree.last_child(parent), Some(b));
}

#[test]
fn test_insert_before_self_reference_keeps_position() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);

    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    let c = element(&mut tree, "c");
    for child in [a, b, c] {
        tree.append_child(parent, child).unwrap();
    }

    tree.insert_before(parent, b, Some(b)).unwrap();

    assert_eq!(tree.children(parent), &[a, b, c]);
}

#[test]
fn test_insert_before_foreign_reference_is_not_found() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);
    let stranger = element(&mut tree, "i");
    let child = element(&mut tree, "b");

    assert_eq!(
        tree.insert_before(parent, child, Some(stranger)),
        Err(DomError::NotFound {
            parent,
            child: stranger
        })
    );
}

// ========== text content ==========

#[test]
fn test_set_text_content_replaces_children() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);
    let a = element(&mut tree, "a");
    tree.append_child(parent, a).unwrap();

    tree.set_text_content(parent, "hello").unwrap();

    assert_eq!(tree.children(parent).len(), 1);
    assert_eq!(tree.parent(a), None);
    assert_eq!(tree.text_content(parent).as_deref(), Some("hello"));
}

#[test]
fn test_set_empty_text_content_clears() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);
    tree.set_text_content(parent, "x").unwrap();
    tree.set_text_content(parent, "").unwrap();

    assert!(tree.children(parent).is_empty());
    assert_eq!(tree.text_content(parent).as_deref(), Some(""));
}

#[test]
fn test_set_text_content_on_text_node_replaces_data() {
    let mut tree = DomTree::html_document();
    let text = tree.create_text_node(NodeId::ROOT, "before");
    tree.set_text_content(text, "after").unwrap();
    assert_eq!(tree.as_text(text), Some("after"));
}

#[test]
fn test_text_content_concatenates_descendants() {
    let mut tree = DomTree::html_document();
    let parent = connected_parent(&mut tree);
    let span = element(&mut tree, "span");
    let one = tree.create_text_node(NodeId::ROOT, "one ");
    let two = tree.create_text_node(NodeId::ROOT, "two");
    tree.append_child(parent, one).unwrap();
    tree.append_child(parent, span).unwrap();
    tree.append_child(span, two).unwrap();

    assert_eq!(tree.text_content(parent).as_deref(), Some("one two"));
    assert_eq!(tree.text_content(NodeId::ROOT), None);
}

// ========== names and documents ==========

#[test]
fn test_tag_name_uppercases_html_only() {
    let mut tree = DomTree::html_document();
    let div = element(&mut tree, "Div");
    let svg = tree.create_element_ns(NodeId::ROOT, Some(SVG_NAMESPACE), "svg");

    assert_eq!(tree.tag_name(div).as_deref(), Some("DIV"));
    assert_eq!(tree.tag_name(svg).as_deref(), Some("svg"));
    assert_eq!(tree.namespace_uri(svg), Some(SVG_NAMESPACE));
}

#[test]
fn test_head_and_body_of_skeleton() {
    let tree = DomTree::html_document();
    let html = tree.document_element(NodeId::ROOT).unwrap();
    assert_eq!(tree.tag_name(html).as_deref(), Some("HTML"));
    assert_eq!(tree.parent(tree.head(NodeId::ROOT).unwrap()), Some(html));
    assert_eq!(tree.parent(tree.body(NodeId::ROOT).unwrap()), Some(html));
    assert_eq!(tree.len(), 4);
    assert!(!tree.is_empty());
    assert!(DomTree::new().body(NodeId::ROOT).is_none());
}

#[test]
fn test_comments_carry_data_but_no_tag_name() {
    let mut tree = DomTree::html_document();
    let body = tree.body(NodeId::ROOT).unwrap();
    let comment = tree.create_comment(NodeId::ROOT, "note");
    tree.append_child(body, comment).unwrap();

    assert_eq!(tree.tag_name(comment), None);
    assert_eq!(tree.text_content(comment).as_deref(), Some("note"));
    // Comment data is not part of an element's text.
    assert_eq!(tree.text_content(body).as_deref(), Some(""));

    tree.set_text_content(comment, "edited").unwrap();
    assert_eq!(tree.text_content(comment).as_deref(), Some("edited"));
}
