pub mod administered;
pub mod budget;
pub mod consumption;
pub mod engine;
pub mod scenario;
