pub mod controller;
pub mod envelope;
pub mod error;
