pub mod error;
pub mod exposed;
pub mod page;
pub mod version;
