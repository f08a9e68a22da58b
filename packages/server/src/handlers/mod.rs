pub mod auth;
pub mod image;
pub mod import;
pub mod inventory;
pub mod plant;
