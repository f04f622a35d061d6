pub mod auth;
pub mod blobstore;
pub mod docstore;
