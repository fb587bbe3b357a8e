pub mod status_badge;

pub use status_badge::status_badge;
