pub mod backend;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod observer;
pub mod route;
pub mod runner;
pub mod script;
pub mod stats;
pub mod var;
