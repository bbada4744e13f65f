//! Editor window built on eframe/egui

mod components;
pub mod constants;
mod shell;

pub use shell::run_gui;
