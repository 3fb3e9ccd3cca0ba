pub mod map;
pub mod summary;
