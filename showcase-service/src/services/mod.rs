pub mod annotator;
pub mod catalog;
pub mod database;
pub mod staging;

pub use catalog::ProductCatalog;
pub use database::MongoDb;
pub use staging::StagedImage;
