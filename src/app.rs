pub mod clock;
pub mod context;
pub mod events;
pub mod params;
pub mod poller;
pub mod report;
pub mod settings;
