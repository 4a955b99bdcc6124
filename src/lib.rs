pub mod error;

pub mod client;
pub mod config;
pub mod environment;
pub mod request;
pub mod session_name;

pub mod cmd;

#[cfg(test)]
mod dev;
