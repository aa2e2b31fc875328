pub mod blog;
pub mod db;
pub mod in_memory;
pub mod portfolio;
pub mod text;
