pub mod seat;
pub mod selection;

pub use seat::Seat;
pub use selection::{SelectionView, ValidationOutcome};
