pub mod config;
pub mod display;
pub mod executor;
pub mod messages;
pub mod motion;
pub mod queue;
pub mod report;
pub mod robot;
pub mod runtime;
pub mod settings;
pub mod sim;

#[cfg(test)]
pub mod mock;
