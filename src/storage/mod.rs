//! Storage backends and external media

pub mod cloudinary;
pub mod in_memory;
pub mod local_uploads;
pub mod mongodb;

pub use cloudinary::CloudinaryMediaStore;
pub use in_memory::{InMemoryConnector, InMemoryDataService};
pub use local_uploads::LocalUploads;
pub use self::mongodb::{MongoConnector, MongoDataService};
