pub mod accounts;
pub mod active;
pub mod aws_cli;
pub mod commands;
pub mod credentials_file;
pub mod error;
pub mod paths;
pub mod profile;
pub mod prompt;
pub mod roles;
pub mod selector;
pub mod session;
pub mod state;
pub mod store;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
