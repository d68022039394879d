use chrono::NaiveDate;
use log::info;
use regex::Regex;

use crate::{
    context::Layout,
    index::IndexDocument,
    metadata::{estimate_read_time, PostMeta},
    store::{ContentStore, StoreError},
};

const DEFAULT_CATEGORY: &str = "uncategorized";

#[derive(Debug, thiserror::Error)]
pub(crate) enum PublishError {
    #[error("Provide a GitHub token (repo scope) with --token or GITHUB_TOKEN")]
    MissingToken,
    #[error("Title and content are required (missing {0})")]
    MissingField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("posts index is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the operator typed into the publish form.
#[derive(Debug, Clone, Default)]
pub(crate) struct Draft {
    pub title: String,
    pub category: String,
    pub excerpt: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Published {
    pub meta: PostMeta,
    pub path: String,
}

impl Draft {
    /// Trims the fields and fills the default category.
    pub fn validate(self) -> Result<Draft, PublishError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(PublishError::MissingField("title"));
        }
        if self.content.is_empty() {
            return Err(PublishError::MissingField("content"));
        }
        let category = match self.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            c => c.to_string(),
        };
        Ok(Draft {
            title,
            category,
            excerpt: self.excerpt.trim().to_string(),
            content: self.content,
        })
    }
}

pub(crate) fn require_token(token: Option<&str>) -> Result<&str, PublishError> {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(PublishError::MissingToken),
    }
}

pub(crate) fn slugify(title: &str) -> String {
    let non_alnum = Regex::new(r"[^a-z0-9]+").unwrap();
    let lowered = title.trim().to_lowercase();
    let slug = non_alnum.replace_all(&lowered, "-");
    match slug.trim_matches('-') {
        "" => "post".to_string(),
        s => s.to_string(),
    }
}

/// Write the post, then prepend it to the index.
///
/// The markdown file lands before the index entry that points at it. A failure
/// between the two writes leaves an unlisted file behind, never a dangling entry.
pub(crate) fn publish<S: ContentStore>(
    store: &S,
    layout: &Layout,
    draft: Draft,
    today: NaiveDate,
) -> Result<Published, PublishError> {
    let draft = draft.validate()?;

    let (mut index, index_sha) = match store.get(&layout.index_path())? {
        Some(stored) => (IndexDocument::from_json(&stored.content)?, Some(stored.sha)),
        None => {
            info!("No posts index yet; starting a new one");
            (IndexDocument::default(), None)
        }
    };

    let id = index.next_id();
    let file = format!("{id}-{}.md", slugify(&draft.title));
    let path = layout.post_path(&file);

    let meta = PostMeta {
        id,
        file: file.clone(),
        title: draft.title.clone(),
        category: draft.category,
        excerpt: draft.excerpt,
        date: today.format("%Y-%m-%d").to_string(),
        read_time: estimate_read_time(&draft.content),
    };

    store.put(
        &path,
        &draft.content,
        &format!("Add post: {}", draft.title),
        None,
    )?;
    info!("Created {path}");

    index.prepend(meta.clone());
    store.put(
        &layout.index_path(),
        &index.to_json()?,
        &format!("Update posts index: add {file}"),
        index_sha.as_deref(),
    )?;
    info!("Updated {} ({} posts)", layout.index_path(), index.posts.len());

    Ok(Published { meta, path })
}
