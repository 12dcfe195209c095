// trellis-common: shared domain types and the pure tree builder.

pub mod title;
pub mod tree;
pub mod types;
