//! CLI command implementations

pub mod count;
pub mod fetch;
pub mod inspect;
pub mod restore;
pub mod sync;
