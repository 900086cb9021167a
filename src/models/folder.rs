use serde::Serialize;

/// One immediate child folder in a delimiter listing.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FolderEntry {
    /// Last path segment, without the trailing slash.
    pub name: String,

    /// Full common prefix, trailing slash included.
    pub path: String,
}
