pub mod contacts;
pub mod image_pipeline;
pub mod staging;
pub mod store;
pub mod thumbnail;
