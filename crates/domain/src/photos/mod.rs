/// Photo model
pub mod model;

/// Storage port for photo rows
pub mod repository;

/// DynamoDB adapter
pub mod dynamo;

pub use dynamo::DynamoPhotoRepository;
pub use model::{NewPhoto, Photo, PhotoTag};
pub use repository::PhotoRepository;
