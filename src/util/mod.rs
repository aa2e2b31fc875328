pub mod identifiers;
pub mod user_input;

pub use identifiers::Identifier;
