pub mod message;
pub mod student;
