pub mod configs;
pub mod input;
pub mod rmse;
pub mod scaling;
pub mod serialization;
pub mod weights;
