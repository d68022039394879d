use serde::{Deserialize, Serialize};

/// One record of the posts index document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct PostMeta {
    pub id: u64,
    pub file: String,
    pub title: String,
    pub category: String,
    pub excerpt: String,
    pub date: String,
    #[serde(rename = "readTime")]
    pub read_time: String,
}

/// A post as shown to readers: index metadata plus where its markdown lives.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,
    pub url: String,
}

impl Post {
    /// File name without the markdown extension; used for rendered page names.
    pub fn stem(&self) -> &str {
        strip_markdown_extension(&self.meta.file)
    }
}

pub(crate) fn is_markdown_file(name: &str) -> bool {
    name.to_lowercase().ends_with(".md")
}

pub(crate) fn strip_markdown_extension(name: &str) -> &str {
    if is_markdown_file(name) {
        &name[..name.len() - 3]
    } else {
        name
    }
}

/// Reading time at 200 words per minute, never below one minute.
pub(crate) fn estimate_read_time(markdown: &str) -> String {
    let words = markdown.split_whitespace().count();
    let minutes = ((words as f64 / 200.0).round() as u64).max(1);
    format!("{minutes} min read")
}
