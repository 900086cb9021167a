//! JSON bodies returned by the gateway's success paths.

use super::{folder::FolderEntry, object::ObjectRecord};
use serde::Serialize;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
    pub key: String,
    /// Folder label, `root` when the upload named no folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Subfolder label, `none` when the upload named no subfolder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    /// The queried prefix, or `root` for the bucket root.
    pub current_path: String,
    pub files: Vec<ObjectRecord>,
    pub folders: Vec<FolderEntry>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub deleted_key: String,
}

#[derive(Serialize, Debug)]
pub struct CreateFolderResponse {
    pub message: String,
    pub path: String,
}
