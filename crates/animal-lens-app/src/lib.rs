//! Application service layer - config, dispatch, formatting, picking

pub mod batch;
pub mod config;
pub mod dispatch;
pub mod format;
pub mod models;
pub mod scanner;
pub mod screen;
pub mod source;
