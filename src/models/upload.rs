use bytes::Bytes;

/// A file received through a multipart upload, held in memory.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub folder: Option<String>,
    pub subfolder: Option<String>,
    pub file_bytes: Bytes,
    pub original_name: String,
    pub mime_type: String,
}

impl UploadRequest {
    pub fn size(&self) -> usize {
        self.file_bytes.len()
    }
}
