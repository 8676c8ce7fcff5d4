pub mod measurements;
pub mod registry;
pub mod store;
