use crate::frame::tree::{
    FrameKind, FrameLeaf, FramePair, FrameTransform, FrameTree, FrameVisitor, StreamTag,
};

/// Mixed into every rewritten tag so routed tags land far away from raw
/// address-derived native tags even when the route identity is small.
const TAG_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Rewrites every leaf tag of a frame tree to a route-specific value.
///
/// Downstream caching recognizes repeated content by [`StreamTag`]; content
/// arriving through a route must therefore never carry the tags of the frames
/// it was cloned from, or the destination channel's cache would alias it with
/// the source channel's identical-looking native content. Each producer owns
/// one rewriter keyed by its route identity.
///
/// Rewritten tags are a pure function of `(route_id, original tag)`:
/// `route_id XOR tag XOR SALT`. Repeated rewrites of the same tree under the
/// same rewriter are identical, and two distinct route identities can only
/// collide by adversarial construction of the inputs.
///
/// The rebuild preserves structure exactly: same nesting, same transform at
/// every node, only leaf tags differ. Traversal state lives on a per-call
/// stack, so nothing can leak between frames.
pub struct TagRewriter {
    route_id: u64,
}

impl TagRewriter {
    /// A rewriter for the given route identity.
    pub fn new(route_id: u64) -> Self {
        Self { route_id }
    }

    /// The identity this rewriter derives tags from.
    pub fn route_id(&self) -> u64 {
        self.route_id
    }

    /// Derive the rewritten form of one tag.
    pub fn rewrite_tag(&self, tag: StreamTag) -> StreamTag {
        StreamTag(self.route_id ^ tag.0 ^ TAG_SALT)
    }

    /// Rebuild `tree` with every leaf tag rewritten.
    pub fn rewrite(&self, tree: &FrameTree) -> FrameTree {
        let mut visitor = RewriteVisitor::new(self);
        tree.accept(&mut visitor);
        visitor.finish()
    }

    /// Rewrite both fields of a frame pair.
    pub fn rewrite_pair(&self, pair: &FramePair) -> FramePair {
        FramePair {
            first: self.rewrite(&pair.first),
            second: self.rewrite(&pair.second),
        }
    }
}

struct StackFrame {
    transform: FrameTransform,
    children: Vec<FrameTree>,
}

/// Reconstructs an isomorphic tree while the traversal runs.
///
/// `push` opens a stack frame for the entered node; a visited leaf becomes the
/// pending replacement; `pop` closes the frame, wrapping either the pending
/// leaf or the accumulated children under the popped transform and appending
/// the result to the parent frame. The sentinel frame pushed at construction
/// collects the finished root.
struct RewriteVisitor<'a> {
    rewriter: &'a TagRewriter,
    stack: Vec<StackFrame>,
    pending: Option<FrameLeaf>,
}

impl<'a> RewriteVisitor<'a> {
    fn new(rewriter: &'a TagRewriter) -> Self {
        Self {
            rewriter,
            stack: vec![StackFrame {
                transform: FrameTransform::default(),
                children: Vec::new(),
            }],
            pending: None,
        }
    }

    fn finish(mut self) -> FrameTree {
        debug_assert_eq!(self.stack.len(), 1, "unbalanced frame tree traversal");
        self.stack
            .pop()
            .and_then(|sentinel| sentinel.children.into_iter().next())
            .unwrap_or_else(FrameTree::empty)
    }
}

impl FrameVisitor for RewriteVisitor<'_> {
    fn push(&mut self, transform: FrameTransform) {
        self.stack.push(StackFrame {
            transform,
            children: Vec::new(),
        });
    }

    fn visit(&mut self, leaf: &FrameLeaf) {
        self.pending = Some(leaf.retagged(self.rewriter.rewrite_tag(leaf.tag)));
    }

    fn pop(&mut self) {
        // Balanced accept keeps the sentinel below every pop.
        let Some(frame) = self.stack.pop() else {
            debug_assert!(false, "pop without matching push");
            return;
        };
        let rebuilt = if let Some(leaf) = self.pending.take() {
            FrameTree {
                transform: frame.transform,
                kind: FrameKind::Leaf(leaf),
            }
        } else {
            FrameTree {
                transform: frame.transform,
                kind: FrameKind::Group(frame.children),
            }
        };
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(rebuilt);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/route/rewrite.rs"]
mod tests;
