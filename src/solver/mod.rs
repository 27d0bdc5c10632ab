pub mod constraint;
pub mod engine;
pub mod lit_mapping;
pub(crate) mod minimize;
pub mod sat;
pub(crate) mod search;
pub mod stats;
pub mod tracer;
pub mod variable;
