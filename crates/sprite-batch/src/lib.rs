//! Sprite batch crate.
//!
//! Turns a high-frequency stream of draw requests (textures, rectangles,
//! lines, glyphs) into the minimum number of instanced GPU draws per frame,
//! and packs every texture into a single atlas so that batches stay large.

pub mod atlas;
pub mod batch;
pub mod canvas;
pub mod command;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod text;
pub mod texture;
pub mod window;
