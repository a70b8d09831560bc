/// Per-task frame derivation.
pub mod builder;
