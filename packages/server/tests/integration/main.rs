mod catalog;
mod common;
mod subscriptions;
