pub mod auth;
pub mod catalog;
pub mod recipe;
pub mod shared;
pub mod shopping_list;
pub mod user;
