use std::path::PathBuf;

use crate::store::{GitHubStore, Repository};

const INDEX_FILE: &str = "index.json";

/// Where posts and their index live, relative to the repository root
/// (and to the local site checkout).
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    posts_dir: String,
}

impl Layout {
    pub fn new(posts_dir: &str) -> Self {
        Self {
            posts_dir: posts_dir.trim_matches('/').to_string(),
        }
    }

    pub fn posts_dir(&self) -> &str {
        &self.posts_dir
    }

    pub fn post_path(&self, file: &str) -> String {
        format!("{}/{}", self.posts_dir, file)
    }

    pub fn index_path(&self) -> String {
        self.post_path(INDEX_FILE)
    }
}

/// Settings for one invocation, built once in `main`.
#[derive(Debug)]
pub(crate) struct Context {
    pub repo: Repository,
    pub token: Option<String>,
    pub layout: Layout,
    pub site_dir: PathBuf,

    pub blog_name: String,
    pub blog_url: String,
}

impl Context {
    /// Store for reading; public repositories need no token.
    pub fn reader(&self) -> GitHubStore {
        GitHubStore::new(self.repo.clone(), self.token.clone())
    }

    pub fn publisher(&self, token: &str) -> GitHubStore {
        GitHubStore::new(self.repo.clone(), Some(token.to_string()))
    }

    pub fn local_index_path(&self) -> PathBuf {
        self.site_dir.join(self.layout.index_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_ignore_surrounding_slashes() {
        let layout = Layout::new("/posts/");
        assert_eq!(layout.posts_dir(), "posts");
        assert_eq!(layout.post_path("1-a.md"), "posts/1-a.md");
        assert_eq!(layout.index_path(), "posts/index.json");
    }
}
