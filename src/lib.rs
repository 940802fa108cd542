pub mod animation;
pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod interactive;
pub mod llm;
pub mod location;
pub mod report;
pub mod scanner;
