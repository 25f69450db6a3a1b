pub mod alerts;
pub mod device;
pub mod reminders;
pub mod rest;
pub mod sched;
pub mod state;
pub mod weather;

pub use rest::ApiDoc;
pub use state::AppState;
