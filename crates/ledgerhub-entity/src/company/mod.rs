//! Company entities.

pub mod model;

pub use model::Company;
