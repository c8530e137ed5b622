pub mod auth;
pub mod catalog;
pub mod media;
pub mod recipes;
pub mod users;
