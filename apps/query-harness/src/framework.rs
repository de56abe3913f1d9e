pub mod queries;
pub mod testing;
