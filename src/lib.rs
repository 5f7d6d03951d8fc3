pub mod actions;
pub mod amount;
pub mod chain;
pub mod classify;
pub mod config;
pub mod contracts;
pub mod error;
pub mod formatters;
pub mod notify;
pub mod readers;
pub mod rpc;
pub mod wallet;

#[cfg(test)]
mod testing;
