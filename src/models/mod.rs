pub mod auth_model;
pub mod tag_model;
