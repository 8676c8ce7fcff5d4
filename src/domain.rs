pub mod index;
pub mod location;
pub mod measurement;
pub mod window;
