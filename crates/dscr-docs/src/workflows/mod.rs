pub mod documents;
pub mod manifest;
