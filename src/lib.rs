pub mod app;
pub mod calendar;
pub mod camera;
pub mod cmds;
pub mod config;
pub mod error;
pub mod events;
pub mod render;
pub mod scroll;
pub mod sheet;
pub mod shell;
pub mod timeline;
