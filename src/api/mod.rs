pub mod envelope;

pub use envelope::{failure, success};
