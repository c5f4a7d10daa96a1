pub mod admin;
pub mod posts_controller;
pub mod users_controller;
