//! Keel - an extensible command-line tool built around a service container.
//!
//! This library exposes the container, dispatcher and provider modules so
//! plugins and integration tests can register their own services.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod logging;
pub mod messages;
pub mod output;
pub mod providers;
pub mod reporter;
