// src/handlers/mod.rs

pub mod dialog;
pub mod editor;
pub mod library;
