// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
pub mod text;
pub mod timing;
pub mod validation;

pub use timing::{OperationTimer, with_deadline};
pub use validation::{Validator, paginate};
