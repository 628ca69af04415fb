pub mod circuit_breaker;
pub mod inventory;
pub mod seat_validator;
pub mod selection;
