use std::sync::Arc;

use kurbo::Affine;

use crate::foundation::core::VideoField;

/// Opaque per-leaf content identity token.
///
/// Downstream renderers use stream tags to recognize repeated content and skip
/// re-uploading or re-compositing it. Native tags are derived from the heap
/// address of the leaf's shared content, so two leaves sharing the same
/// allocation compare equal and distinct allocations never collide while both
/// are alive. Routed content gets its tags rewritten (see
/// [`TagRewriter`](crate::TagRewriter)) so it can never alias the destination
/// channel's own content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StreamTag(pub u64);

impl StreamTag {
    /// Derive the native tag for a shared content allocation.
    pub fn of<T>(content: &Arc<T>) -> Self {
        Self(Arc::as_ptr(content) as usize as u64)
    }
}

/// Geometric/visual transform carried by every frame tree node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransform {
    /// 2D affine placement of this node's content.
    pub affine: Affine,
    /// Opacity in `[0, 1]`, multiplied down the tree.
    pub opacity: f64,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            affine: Affine::IDENTITY,
            opacity: 1.0,
        }
    }
}

impl FrameTransform {
    /// Whether this is the identity transform.
    pub fn is_identity(&self) -> bool {
        self.affine == Affine::IDENTITY && self.opacity == 1.0
    }
}

/// Opaque drawable payload of a leaf.
///
/// Decoding and pixel storage are external collaborators; the routing core
/// only needs the payload to be shareable and to have a stable identity for
/// the duration it is referenced.
#[derive(Debug)]
pub struct LeafContent {
    /// Payload width in pixels.
    pub width: u32,
    /// Payload height in pixels.
    pub height: u32,
}

/// A drawable leaf: shared content plus its identity tag.
#[derive(Clone, Debug)]
pub struct FrameLeaf {
    /// Content identity used by downstream caching/deduplication.
    pub tag: StreamTag,
    /// The shared drawable payload.
    pub content: Arc<LeafContent>,
}

impl FrameLeaf {
    /// Build a leaf with its native (content-address-derived) tag.
    pub fn new(content: Arc<LeafContent>) -> Self {
        let tag = StreamTag::of(&content);
        Self { tag, content }
    }

    /// The same leaf content under a different identity tag.
    pub fn retagged(&self, tag: StreamTag) -> Self {
        Self {
            tag,
            content: Arc::clone(&self.content),
        }
    }
}

/// What a frame tree node contains.
#[derive(Clone, Debug)]
pub enum FrameKind {
    /// A drawable leaf.
    Leaf(FrameLeaf),
    /// An ordered group of child trees. The empty frame is `Group([])`.
    Group(Vec<FrameTree>),
}

/// An immutable, possibly nested composition of drawable content.
///
/// Every node carries a [`FrameTransform`]; leaves additionally carry a
/// [`StreamTag`]. Trees are cheap to clone: leaf payloads are shared via
/// `Arc` and only the node structure is duplicated.
#[derive(Clone, Debug)]
pub struct FrameTree {
    /// Transform applied to this node's content.
    pub transform: FrameTransform,
    /// Leaf payload or child list.
    pub kind: FrameKind,
}

impl FrameTree {
    /// The empty frame (a group with no children, identity transform).
    pub fn empty() -> Self {
        Self {
            transform: FrameTransform::default(),
            kind: FrameKind::Group(Vec::new()),
        }
    }

    /// A leaf node with its native tag and identity transform.
    pub fn leaf(content: Arc<LeafContent>) -> Self {
        Self {
            transform: FrameTransform::default(),
            kind: FrameKind::Leaf(FrameLeaf::new(content)),
        }
    }

    /// A group node over `children` with identity transform.
    pub fn group(children: Vec<FrameTree>) -> Self {
        Self {
            transform: FrameTransform::default(),
            kind: FrameKind::Group(children),
        }
    }

    /// The same tree under a different transform.
    pub fn with_transform(mut self, transform: FrameTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Whether this tree draws nothing.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            FrameKind::Leaf(_) => false,
            FrameKind::Group(children) => children.iter().all(FrameTree::is_empty),
        }
    }

    /// Depth-first traversal with double dispatch.
    ///
    /// For each node the visitor sees `push(transform)`, then either
    /// `visit(leaf)` or the children's own traversals, then `pop()`. Push and
    /// pop calls are always balanced for any tree.
    pub fn accept(&self, visitor: &mut dyn FrameVisitor) {
        visitor.push(self.transform);
        match &self.kind {
            FrameKind::Leaf(leaf) => visitor.visit(leaf),
            FrameKind::Group(children) => {
                for child in children {
                    child.accept(visitor);
                }
            }
        }
        visitor.pop();
    }
}

/// Visitor over a [`FrameTree`] traversal.
pub trait FrameVisitor {
    /// Entering a node; `transform` is the node's own transform.
    fn push(&mut self, transform: FrameTransform);
    /// A leaf inside the most recently pushed node.
    fn visit(&mut self, leaf: &FrameLeaf);
    /// Leaving the most recently pushed node.
    fn pop(&mut self);
}

/// One rendered frame: two trees, one per video field.
///
/// Progressive formats carry the same tree in both fields. A pair is immutable
/// once published and may be shared between the route and every subscriber
/// holding it buffered.
#[derive(Clone, Debug)]
pub struct FramePair {
    /// First (or only) field.
    pub first: FrameTree,
    /// Second field; equal to `first` for progressive content.
    pub second: FrameTree,
}

impl FramePair {
    /// A progressive frame: the single tree fills both fields.
    pub fn progressive(frame: FrameTree) -> Self {
        Self {
            first: frame.clone(),
            second: frame,
        }
    }

    /// An interlaced frame from two distinct fields.
    pub fn interlaced(first: FrameTree, second: FrameTree) -> Self {
        Self { first, second }
    }

    /// Select a field of the pair.
    pub fn field(&self, field: VideoField) -> &FrameTree {
        match field {
            VideoField::First => &self.first,
            VideoField::Second => &self.second,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/tree.rs"]
mod tests;
