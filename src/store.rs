//! Path-keyed remote content storage (a repository's file contents on one branch).

mod github;
#[cfg(test)]
pub(crate) mod memory;

pub(crate) use github::{GitHubStore, Repository};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("revision conflict while writing {path}: {body}")]
    Conflict { path: String, body: String },
    #[error("request for {path} failed with status {status}: {body}")]
    Http {
        path: String,
        status: u16,
        body: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// A stored file together with the revision token needed to overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredFile {
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Dir,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub download_url: Option<String>,
}

pub(crate) trait ContentStore {
    /// `Ok(None)` when nothing is stored at `path`.
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Create `path`, or overwrite it when `sha` names its current revision.
    fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<(), StoreError>;

    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError>;

    /// Plain GET of a public URL.
    fn fetch_raw(&self, url: &str) -> Result<String, StoreError>;
}
