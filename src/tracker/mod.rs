pub mod controller;
pub mod loop_worker;
pub mod state;
pub mod templates;

pub use controller::TrackerController;
pub use loop_worker::{tracking_loop, TrackerContext};
pub use state::{window_transition, TrackerState, WindowTransition};
pub use templates::IconTemplates;
