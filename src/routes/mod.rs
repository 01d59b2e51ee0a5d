pub mod auth;
pub mod health;
pub mod import;
pub mod recipes;
pub mod shopping;
pub mod tags;
