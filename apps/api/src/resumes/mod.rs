pub mod handlers;
pub mod registry;
pub mod upload;
pub mod validation;
