pub mod catalog;
pub mod eval;
