use super::*;

use std::sync::Arc;

use kurbo::Affine;

use crate::frame::tree::LeafContent;

fn content(width: u32) -> Arc<LeafContent> {
    Arc::new(LeafContent { width, height: 1 })
}

fn transform(dx: f64) -> FrameTransform {
    FrameTransform {
        affine: Affine::translate((dx, 0.0)),
        opacity: 0.9,
    }
}

/// A nested fixture: group(transform) -> [leaf(t), group(t) -> [leaf, leaf]].
fn fixture() -> FrameTree {
    FrameTree::group(vec![
        FrameTree::leaf(content(1)).with_transform(transform(1.0)),
        FrameTree::group(vec![
            FrameTree::leaf(content(2)),
            FrameTree::leaf(content(3)).with_transform(transform(3.0)),
        ])
        .with_transform(transform(2.0)),
    ])
    .with_transform(transform(0.5))
}

fn node_count(tree: &FrameTree) -> usize {
    match &tree.kind {
        FrameKind::Leaf(_) => 1,
        FrameKind::Group(children) => 1 + children.iter().map(node_count).sum::<usize>(),
    }
}

fn depth(tree: &FrameTree) -> usize {
    match &tree.kind {
        FrameKind::Leaf(_) => 1,
        FrameKind::Group(children) => 1 + children.iter().map(depth).max().unwrap_or(0),
    }
}

fn collect_tags(tree: &FrameTree, out: &mut Vec<StreamTag>) {
    match &tree.kind {
        FrameKind::Leaf(leaf) => out.push(leaf.tag),
        FrameKind::Group(children) => {
            for child in children {
                collect_tags(child, out);
            }
        }
    }
}

fn assert_isomorphic_except_tags(a: &FrameTree, b: &FrameTree) {
    assert_eq!(a.transform, b.transform);
    match (&a.kind, &b.kind) {
        (FrameKind::Leaf(la), FrameKind::Leaf(lb)) => {
            assert!(Arc::ptr_eq(&la.content, &lb.content), "leaf content must be shared");
        }
        (FrameKind::Group(ca), FrameKind::Group(cb)) => {
            assert_eq!(ca.len(), cb.len());
            for (child_a, child_b) in ca.iter().zip(cb.iter()) {
                assert_isomorphic_except_tags(child_a, child_b);
            }
        }
        _ => panic!("node kinds differ"),
    }
}

#[test]
fn rewrite_preserves_structure_and_transforms() {
    let tree = fixture();
    let rewritten = TagRewriter::new(0xABCD).rewrite(&tree);
    assert_eq!(node_count(&tree), node_count(&rewritten));
    assert_eq!(depth(&tree), depth(&rewritten));
    assert_isomorphic_except_tags(&tree, &rewritten);
}

#[test]
fn rewrite_changes_every_leaf_tag() {
    let tree = fixture();
    let rewritten = TagRewriter::new(0xABCD).rewrite(&tree);

    let mut original = Vec::new();
    let mut routed = Vec::new();
    collect_tags(&tree, &mut original);
    collect_tags(&rewritten, &mut routed);
    assert_eq!(original.len(), routed.len());
    for (a, b) in original.iter().zip(routed.iter()) {
        assert_ne!(a, b);
    }
}

#[test]
fn rewrite_is_deterministic() {
    let tree = fixture();
    let rewriter = TagRewriter::new(42);

    let mut pass1 = Vec::new();
    let mut pass2 = Vec::new();
    collect_tags(&rewriter.rewrite(&tree), &mut pass1);
    collect_tags(&rewriter.rewrite(&tree), &mut pass2);
    assert_eq!(pass1, pass2);
}

#[test]
fn distinct_route_identities_yield_distinct_tags() {
    let tag = StreamTag(0xDEAD_BEEF);
    let a = TagRewriter::new(1).rewrite_tag(tag);
    let b = TagRewriter::new(2).rewrite_tag(tag);
    assert_ne!(a, b);

    // Collision requires r1 ^ t1 == r2 ^ t2 before salting.
    let t1 = StreamTag(0x10);
    let t2 = StreamTag(0x20);
    assert_eq!(
        TagRewriter::new(0x30 ^ 0x10).rewrite_tag(t1),
        TagRewriter::new(0x30 ^ 0x20).rewrite_tag(t2),
    );
}

#[test]
fn route_identity_is_exposed() {
    assert_eq!(TagRewriter::new(5).route_id(), 5);
}

#[test]
fn rewrite_tag_is_an_involution_composable_with_itself() {
    // XOR structure: rewriting under the same identity twice restores the tag.
    let rewriter = TagRewriter::new(0x77);
    let tag = StreamTag(0x1234);
    assert_eq!(rewriter.rewrite_tag(rewriter.rewrite_tag(tag)), tag);
}

#[test]
fn rewrite_of_empty_tree_is_empty() {
    let rewritten = TagRewriter::new(9).rewrite(&FrameTree::empty());
    assert!(rewritten.is_empty());
    assert_eq!(node_count(&rewritten), 1);
}

#[test]
fn rewriter_state_does_not_leak_between_calls() {
    let rewriter = TagRewriter::new(5);
    let big = fixture();
    let small = FrameTree::leaf(content(7));

    // A large traversal followed by a small one must not inherit children.
    let _ = rewriter.rewrite(&big);
    let rewritten = rewriter.rewrite(&small);
    assert_eq!(node_count(&rewritten), 1);
    match &rewritten.kind {
        FrameKind::Leaf(leaf) => assert_eq!(leaf.content.width, 7),
        _ => panic!("expected leaf"),
    }
}

#[test]
fn rewrite_pair_covers_both_fields() {
    let pair = FramePair::interlaced(fixture(), FrameTree::leaf(content(9)));
    let rewritten = TagRewriter::new(11).rewrite_pair(&pair);

    let mut first = Vec::new();
    let mut second = Vec::new();
    collect_tags(&rewritten.first, &mut first);
    collect_tags(&rewritten.second, &mut second);
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 1);

    let mut original_second = Vec::new();
    collect_tags(&pair.second, &mut original_second);
    assert_ne!(second, original_second);
}
