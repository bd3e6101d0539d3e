pub mod admin;
pub mod subscriptions;
pub mod webhook;
