pub mod archive;
pub mod batch;
pub mod compress;
pub mod config;
pub mod error;
pub mod raster;
pub mod render;
pub mod store;
