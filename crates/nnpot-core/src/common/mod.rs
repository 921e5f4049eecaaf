pub mod elements;
pub mod units;

pub use elements::{Element, atomic_number_for_symbol};
