pub mod plant;
pub mod plant_additional_image;
pub mod plant_image;
pub mod plant_inventory;
pub mod user;
