pub mod documents;
pub mod error;
pub mod money;
pub mod text;
pub mod validation;
