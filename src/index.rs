use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use log::info;
use serde::{Deserialize, Serialize};

use crate::metadata::PostMeta;

/// The JSON document listing every published post, newest first.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct IndexDocument {
    #[serde(default)]
    pub posts: Vec<PostMeta>,
}

impl IndexDocument {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// `max(id) + 1`, or 1 for an empty index.
    pub fn next_id(&self) -> u64 {
        self.posts.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    pub fn prepend(&mut self, meta: PostMeta) {
        self.posts.insert(0, meta);
    }
}

/// Read a pre-built index document from the local site checkout.
pub(crate) fn load_index(index_path: &Path) -> anyhow::Result<IndexDocument> {
    let fd = File::open(index_path)
        .with_context(|| format!("local index {index_path:?} not found"))?;
    let reader = BufReader::new(fd);
    let index: IndexDocument = serde_json::from_reader(reader)
        .with_context(|| format!("while parsing {index_path:?}"))?;
    info!("Loaded {} posts from {index_path:?}", index.posts.len());
    Ok(index)
}
