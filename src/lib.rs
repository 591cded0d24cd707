pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod navigator;
pub mod resolver;
pub mod ui;
