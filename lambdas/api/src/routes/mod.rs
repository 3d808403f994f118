pub mod analyses;
pub mod patients;
