//! Local filesystem storage for downloaded event pictures.

pub mod image_fs;

pub use image_fs::ImageStore;
