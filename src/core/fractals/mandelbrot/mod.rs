pub mod algorithm;
pub mod bailout;
pub mod errors;
pub mod params;
