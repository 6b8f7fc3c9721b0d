pub mod app;
pub mod auth;
pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod projects;
pub mod state;
pub mod store;
pub mod tasks;
pub mod users;

#[cfg(test)]
mod test_support;
