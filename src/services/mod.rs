//! Request-independent building blocks shared by every resource handler.

pub mod lookup;
pub mod update;
pub mod validation;

pub use lookup::{find_existing, require_existing};
pub use update::update_for_each;
pub use validation::{get_validation_error, ValidationFailure};
