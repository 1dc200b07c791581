pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod countdown;
pub mod notify;
pub mod output;
pub mod page;
pub mod storage;
pub mod table;
pub mod utils;
pub mod views;

#[cfg(test)]
mod tests;
