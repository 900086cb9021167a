pub mod backend;
pub mod key_codec;
pub mod memory_backend;
pub mod s3_backend;
pub mod transfer_service;
