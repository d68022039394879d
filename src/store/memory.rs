use std::{cell::RefCell, collections::BTreeMap};

use super::{ContentStore, EntryKind, StoreEntry, StoreError, StoredFile};

/// In-process store with the same revision-token rules as the remote one.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub files: RefCell<BTreeMap<String, StoredFile>>,
    pub revision: RefCell<u64>,
    /// Every successful `put` path, in order.
    pub writes: RefCell<Vec<String>>,
    pub fail_listing: bool,
    pub fail_raw: Vec<String>,
}

impl MemoryStore {
    pub fn insert(&self, path: &str, content: &str) {
        let sha = self.next_sha();
        self.files.borrow_mut().insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha,
            },
        );
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).map(|f| f.content.clone())
    }

    fn next_sha(&self) -> String {
        let mut rev = self.revision.borrow_mut();
        *rev += 1;
        format!("sha-{rev}")
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn put(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let current = self.files.borrow().get(path).map(|f| f.sha.clone());
        if current.as_deref() != sha {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                body: format!("expected {current:?}, got {sha:?}"),
            });
        }
        self.insert(path, content);
        self.writes.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Transport("listing disabled".to_string()));
        }
        let prefix = format!("{}/", dir.trim_matches('/'));
        Ok(self
            .files
            .borrow()
            .keys()
            .filter_map(|path| {
                let name = path.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| StoreEntry {
                    name: name.to_string(),
                    path: path.clone(),
                    kind: EntryKind::File,
                    download_url: Some(format!("mem://{path}")),
                })
            })
            .collect())
    }

    fn fetch_raw(&self, url: &str) -> Result<String, StoreError> {
        let path = url.strip_prefix("mem://").unwrap_or(url);
        if self.fail_raw.iter().any(|p| p == path) {
            return Err(StoreError::Http {
                path: path.to_string(),
                status: 500,
                body: String::new(),
            });
        }
        self.content(path).ok_or_else(|| StoreError::Http {
            path: path.to_string(),
            status: 404,
            body: String::new(),
        })
    }
}
