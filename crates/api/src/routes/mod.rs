pub mod predictions;
pub mod students;
