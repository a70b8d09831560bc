//! Result tables: the in-memory column model and file loaders.

/// CSV and JSON loaders.
pub mod load;
/// Column-oriented table model and schema column names.
pub mod model;
