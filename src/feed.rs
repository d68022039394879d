use atom_syndication::{Category, Entry, Feed, FixedDateTime, Link, Text};
use chrono::NaiveDate;

use crate::metadata::Post;

fn post_date(post: &Post) -> Option<FixedDateTime> {
    NaiveDate::parse_from_str(post.meta.date.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

fn link(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link
}

/// Public page of a post; the markdown location when no blog URL is configured.
fn post_href(blog_url: &str, post: &Post) -> String {
    if blog_url.is_empty() {
        post.url.clone()
    } else {
        format!("{}/posts/{}.html", blog_url.trim_end_matches('/'), post.stem())
    }
}

fn entry(blog_url: &str, post: &Post, now: FixedDateTime) -> Entry {
    let href = post_href(blog_url, post);
    let mut category = Category::default();
    category.set_term(post.meta.category.clone());

    let mut entry = Entry::default();
    entry.set_title(post.meta.title.clone());
    entry.set_id(href.clone());
    entry.set_updated(post_date(post).unwrap_or(now));
    entry.set_links(vec![link(href)]);
    entry.set_categories(vec![category]);
    if !post.meta.excerpt.is_empty() {
        entry.set_summary(Some(Text::plain(post.meta.excerpt.clone())));
    }
    entry
}

pub(crate) fn build_feed(
    blog_name: &str,
    blog_url: &str,
    posts: &[&Post],
    now: FixedDateTime,
) -> String {
    let updated = posts.iter().filter_map(|p| post_date(p)).max().unwrap_or(now);

    let mut feed = Feed::default();
    feed.set_title(blog_name.to_string());
    feed.set_id(if blog_url.is_empty() {
        format!("urn:{}", env!("CARGO_PKG_NAME"))
    } else {
        blog_url.to_string()
    });
    feed.set_updated(updated);
    if !blog_url.is_empty() {
        feed.set_links(vec![link(blog_url.to_string())]);
    }
    feed.set_entries(
        posts
            .iter()
            .map(|p| entry(blog_url, p, now))
            .collect::<Vec<_>>(),
    );
    feed.to_string()
}
