pub mod archive;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod installer;
pub mod layout;
pub mod pipeline;
pub mod resolver;
pub mod runtime;
pub mod staging;
