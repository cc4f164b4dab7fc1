pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod mvi;
pub mod outcome;
pub mod pagination;
pub mod session;
pub mod shell;
