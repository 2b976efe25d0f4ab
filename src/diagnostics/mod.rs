/// Diagnostics graphs: named, colored numeric event signals.
pub mod graph;
