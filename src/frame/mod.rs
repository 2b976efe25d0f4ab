/// The generic frame source contract layers hold content by.
pub mod source;
/// Frame trees: nested drawable composition with transforms and tags.
pub mod tree;
