use std::{cmp::Ordering, path::Path};

use chrono::NaiveDate;
use log::{debug, info, warn};
use regex::Regex;

use crate::{
    context::Layout,
    frontmatter::parse_frontmatter,
    index::load_index,
    metadata::{estimate_read_time, is_markdown_file, strip_markdown_extension, Post, PostMeta},
    store::{ContentStore, EntryKind, StoreEntry, StoreError},
};

const EXCERPT_LIMIT: usize = 200;
const ELLIPSIS: &str = "...";
const DEFAULT_CATEGORY: &str = "uncategorized";
pub(crate) const NOT_FOUND_MARKDOWN: &str =
    "# Post not found\n\nCould not load the requested post.";

/// Result of looking for posts: the live listing, the local index, or neither.
#[derive(Debug)]
pub(crate) enum Discovery {
    Listed(Vec<Post>),
    FellBack { posts: Vec<Post>, reason: String },
    Unavailable { primary: String, fallback: String },
}

impl Discovery {
    pub fn posts(&self) -> &[Post] {
        match self {
            Discovery::Listed(posts) | Discovery::FellBack { posts, .. } => posts,
            Discovery::Unavailable { .. } => &[],
        }
    }

    pub fn into_posts(self) -> Vec<Post> {
        match self {
            Discovery::Listed(posts) | Discovery::FellBack { posts, .. } => posts,
            Discovery::Unavailable { .. } => vec![],
        }
    }
}

pub(crate) fn extract_title(body: &str) -> Option<String> {
    let heading = Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap();
    heading
        .captures(body)
        .map(|caps| caps[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// First non-heading paragraph on one line, at most 200 characters.
pub(crate) fn extract_excerpt(body: &str) -> String {
    let blank_line = Regex::new(r"\n\s*\n").unwrap();
    let atx_heading = Regex::new(r"^#{1,6}([ \t]|$)").unwrap();
    let Some(paragraph) = blank_line
        .split(body.trim())
        .map(str::trim)
        .find(|p| !p.is_empty() && !atx_heading.is_match(p))
    else {
        return String::new();
    };
    let line = paragraph.replace("\r\n", " ").replace('\n', " ");
    let line = line.trim();
    if line.chars().count() > EXCERPT_LIMIT {
        let cut: String = line.chars().take(EXCERPT_LIMIT - ELLIPSIS.len()).collect();
        format!("{cut}{ELLIPSIS}")
    } else {
        line.to_string()
    }
}

/// Build display metadata for one markdown file from its raw text.
pub(crate) fn derive_post(file: &str, url: &str, text: &str) -> Post {
    let (meta, body) = parse_frontmatter(text);
    let field = |key: &str| meta.get(key).map(|v| v.text()).filter(|v| !v.is_empty());

    let title = field("title")
        .or_else(|| extract_title(body))
        .unwrap_or_else(|| strip_markdown_extension(file).to_string());
    let category = meta
        .get("category")
        .and_then(|v| v.first())
        .filter(|c| !c.is_empty())
        .or_else(|| meta.get("tags").and_then(|v| v.first()))
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_lowercase();
    let excerpt = field("excerpt").unwrap_or_else(|| extract_excerpt(body));

    Post {
        meta: PostMeta {
            id: 0,
            file: file.to_string(),
            title,
            category,
            excerpt,
            date: field("date").unwrap_or_default(),
            read_time: estimate_read_time(body),
        },
        url: url.to_string(),
    }
}

/// Dates compare as ISO strings once normalized, which orders them in time.
fn date_key(post: &Post) -> Option<String> {
    let raw = post.meta.date.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// Newest first when both posts are dated, file name order otherwise.
pub(crate) fn compare_posts(a: &Post, b: &Post) -> Ordering {
    match (date_key(a), date_key(b)) {
        (Some(a_date), Some(b_date)) => b_date
            .cmp(&a_date)
            .then_with(|| a.meta.file.cmp(&b.meta.file)),
        // dated before undated, so the order stays total
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.meta.file.cmp(&b.meta.file),
    }
}

pub(crate) fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(compare_posts);
    for (i, post) in posts.iter_mut().enumerate() {
        post.meta.id = i as u64 + 1;
    }
}

fn fetch_entry<S: ContentStore>(
    store: &S,
    entry: &StoreEntry,
) -> Result<Option<(String, String)>, StoreError> {
    match &entry.download_url {
        Some(url) => store.fetch_raw(url).map(|text| Some((url.clone(), text))),
        None => Ok(store
            .get(&entry.path)?
            .map(|stored| (entry.path.clone(), stored.content))),
    }
}

/// List the posts directory and derive every markdown file found there.
///
/// Only the listing itself is fatal; a file that cannot be fetched is skipped.
pub(crate) fn list_remote<S: ContentStore>(
    store: &S,
    layout: &Layout,
) -> Result<Vec<Post>, StoreError> {
    let entries = store.list(layout.posts_dir())?;
    let mut posts = vec![];
    for entry in entries
        .iter()
        .filter(|e| e.kind == EntryKind::File && is_markdown_file(&e.name))
    {
        match fetch_entry(store, entry) {
            Ok(Some((url, text))) => {
                debug!("Fetched {} ({} bytes)", entry.name, text.len());
                posts.push(derive_post(&entry.name, &url, &text));
            }
            Ok(None) => warn!("{} disappeared while listing; skipping", entry.path),
            Err(e) => warn!("Failed to fetch {}: {e}; skipping", entry.name),
        }
    }
    sort_posts(&mut posts);
    Ok(posts)
}

/// Posts from the pre-built index, keeping their persisted ids.
pub(crate) fn load_fallback(index_path: &Path, layout: &Layout) -> anyhow::Result<Vec<Post>> {
    let index = load_index(index_path)?;
    Ok(index
        .posts
        .into_iter()
        .map(|meta| Post {
            url: layout.post_path(&meta.file),
            meta,
        })
        .collect())
}

pub(crate) fn discover<S: ContentStore>(
    store: &S,
    layout: &Layout,
    local_index: &Path,
) -> Discovery {
    let primary = match list_remote(store, layout) {
        Ok(posts) => {
            info!("Discovered {} posts in {}/", posts.len(), layout.posts_dir());
            return Discovery::Listed(posts);
        }
        Err(e) => e.to_string(),
    };

    warn!("Directory listing unavailable ({primary}); using {local_index:?}");
    match load_fallback(local_index, layout) {
        Ok(posts) => Discovery::FellBack {
            posts,
            reason: primary,
        },
        Err(e) => Discovery::Unavailable {
            primary,
            fallback: format!("{e:#}"),
        },
    }
}

/// `all` (or nothing) keeps every post.
pub(crate) fn filter_by_category<'a>(
    posts: &'a [Post],
    category: Option<&str>,
) -> Vec<&'a Post> {
    match category {
        None | Some("all") => posts.iter().collect(),
        Some(c) => posts.iter().filter(|p| p.meta.category == c).collect(),
    }
}

/// Markdown of one post, or a short not-found document.
pub(crate) fn open_post<S: ContentStore>(store: &S, site_dir: &Path, url: &str) -> String {
    let fetched = if url.contains("://") {
        store.fetch_raw(url).map_err(anyhow::Error::from)
    } else {
        std::fs::read_to_string(site_dir.join(url)).map_err(anyhow::Error::from)
    };
    fetched.unwrap_or_else(|e| {
        warn!("Could not load {url}: {e}");
        NOT_FOUND_MARKDOWN.to_string()
    })
}
