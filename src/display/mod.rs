// src/display/mod.rs
//! Display modules for the terminal interface

pub mod surface;
pub mod terminal;

pub use surface::TextMapSurface;
pub use terminal::TerminalDisplay;
