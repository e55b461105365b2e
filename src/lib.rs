#![forbid(unsafe_code)]

pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod notion;
pub mod search;
pub mod server;
