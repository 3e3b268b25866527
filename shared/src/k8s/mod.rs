pub mod equality;
pub mod field;
pub mod quantity;
pub mod selector;
pub mod validation;

pub use equality::semantic_eq;
pub use field::{to_aggregate, ErrorList, FieldError, Path};
