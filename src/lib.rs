pub mod error;
pub mod render;
pub mod search;
pub mod solver;
pub mod types;
