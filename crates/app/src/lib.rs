//! `trackers` command-line front end.

pub mod app;
pub mod cli;
pub mod commands;
pub mod render;
