use std::{fs::OpenOptions, path::Path};

use anyhow::Context as _;
use handlebars::{handlebars_helper, Handlebars};
use log::info;
use maud::html;
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Serialize;

use crate::{
    discovery::open_post,
    metadata::{Post, PostMeta},
    store::ContentStore,
};

const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{#if title}}{{title}} - {{/if}}{{blog_name}}</title>
<link rel="alternate" type="application/atom+xml" href="{{root}}feed.xml">
</head>
<body>
<header class="nav"><a class="nav-link" href="{{root}}index.html">{{blog_name}}</a></header>
<main class="container">
{{> @partial-block}}
</main>
</body>
</html>
"#;

const INDEX: &str = r#"{{#> layout}}
<section id="blog">
<div id="blog-posts" class="blog-grid">
{{{cards}}}
</div>
</section>
{{/layout}}"#;

const ARTICLE: &str = r#"{{#> layout}}
<p><a id="back-to-list" class="filter-btn" href="{{root}}index.html">&larr; Back</a></p>
<article class="blog-article">
<p class="blog-card-meta"><span class="blog-card-category">{{upper meta.category}}</span> {{meta.date}} {{meta.readTime}}</p>
{{{body}}}
</article>
{{/layout}}"#;

handlebars_helper!(upper: |s: str| s.to_uppercase());

#[derive(Serialize, Debug)]
struct IndexPageData<'a> {
    blog_name: &'a str,
    title: Option<&'a str>,
    root: &'static str,
    cards: String,
}

#[derive(Serialize, Debug)]
struct ArticlePageData<'a> {
    blog_name: &'a str,
    title: &'a str,
    root: &'static str,
    body: String,
    meta: &'a PostMeta,
}

/// Markdown to an HTML fragment. Single newlines are kept as line breaks.
pub(crate) fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        _ => event,
    });

    let mut body_html = String::new();
    html::push_html(&mut body_html, parser);
    body_html
}

pub(crate) fn render_card(post: &Post) -> String {
    html! {
        article.blog-card data-url=(post.url) data-file=(post.meta.file) data-id=(post.meta.id) {
            a.blog-card-link href={ "posts/" (post.stem()) ".html" } {
                div.blog-card-content {
                    span.blog-card-category { (post.meta.category) }
                    h3.blog-card-title { (post.meta.title) }
                    p.blog-card-excerpt { (post.meta.excerpt) }
                    div.blog-card-meta {
                        span { (post.meta.date) }
                        span { (post.meta.read_time) }
                    }
                }
            }
        }
    }
    .into_string()
}

pub(crate) struct Renderer {
    handlebars: Handlebars<'static>,
    blog_name: String,
}

impl Renderer {
    pub fn new(blog_name: &str) -> anyhow::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("upper", Box::new(upper));
        handlebars
            .register_partial("layout", LAYOUT)
            .context("layout template")?;
        handlebars
            .register_template_string("index", INDEX)
            .context("index template")?;
        handlebars
            .register_template_string("article", ARTICLE)
            .context("article template")?;
        Ok(Self {
            handlebars,
            blog_name: blog_name.to_string(),
        })
    }

    pub fn render_index(&self, posts: &[&Post]) -> anyhow::Result<String> {
        let data = IndexPageData {
            blog_name: &self.blog_name,
            title: None,
            root: "",
            cards: posts.iter().map(|p| render_card(p)).collect(),
        };
        self.handlebars
            .render("index", &data)
            .context("while rendering index.html")
    }

    pub fn render_article(&self, meta: &PostMeta, markdown: &str) -> anyhow::Result<String> {
        let data = ArticlePageData {
            blog_name: &self.blog_name,
            title: &meta.title,
            root: "../",
            body: render_markdown(markdown),
            meta,
        };
        self.handlebars
            .render("article", &data)
            .with_context(|| format!("while rendering {:?}", meta.file))
    }

    /// Write the listing, one page per post and the feed into `out_dir`.
    /// Existing contents of `out_dir` are removed first.
    pub fn build_site<S: ContentStore>(
        &self,
        store: &S,
        site_dir: &Path,
        posts: &[&Post],
        feed_xml: &str,
        out_dir: &Path,
    ) -> anyhow::Result<()> {
        fs_extra::dir::remove(out_dir)?;
        fs_extra::dir::create_all(out_dir.join("posts"), false)?;

        write_file(&out_dir.join("index.html"), &self.render_index(posts)?)?;
        for post in posts {
            let markdown = open_post(store, site_dir, &post.url);
            let page = self.render_article(&post.meta, &markdown)?;
            write_file(
                &out_dir.join("posts").join(format!("{}.html", post.stem())),
                &page,
            )?;
        }
        write_file(&out_dir.join("feed.xml"), feed_xml)?;

        info!("Wrote {} posts to {out_dir:?}", posts.len());
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    use std::io::Write as _;

    let mut fd = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("while creating {path:?}"))?;
    fd.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn post(file: &str, title: &str) -> Post {
        Post {
            meta: PostMeta {
                id: 1,
                file: file.to_string(),
                title: title.to_string(),
                category: "focus".to_string(),
                excerpt: "Short & sweet".to_string(),
                date: "2024-01-02".to_string(),
                read_time: "1 min read".to_string(),
            },
            url: format!("mem://posts/{file}"),
        }
    }

    #[test]
    fn markdown_keeps_line_breaks_and_tables() {
        let out = render_markdown("line one\nline two\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(out.contains("line one<br />"));
        assert!(out.contains("<table>"));
        assert!(render_markdown("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn card_escapes_text_and_links_to_page() {
        let card = render_card(&post("1-hello.md", "<Hello>"));
        assert!(card.contains("&lt;Hello&gt;"));
        assert!(card.contains("Short &amp; sweet"));
        assert!(card.contains(r#"href="posts/1-hello.html""#));
        assert!(card.contains(r#"data-id="1""#));
    }

    #[test]
    fn index_page_lists_cards_inside_layout() {
        let renderer = Renderer::new("Tomato Blog").unwrap();
        let a = post("1-a.md", "Alpha");
        let b = post("2-b.md", "Beta");
        let page = renderer.render_index(&[&a, &b]).unwrap();
        assert!(page.contains("<title>Tomato Blog</title>"));
        assert!(page.contains("Alpha"));
        assert!(page.contains("Beta"));
    }

    #[test]
    fn article_page_renders_body_and_meta() {
        let renderer = Renderer::new("Tomato Blog").unwrap();
        let p = post("1-a.md", "Alpha");
        let page = renderer.render_article(&p.meta, "# Alpha\n\nBody").unwrap();
        assert!(page.contains("<title>Alpha - Tomato Blog</title>"));
        assert!(page.contains("<h1>Alpha</h1>"));
        assert!(page.contains("FOCUS"));
        assert!(page.contains("1 min read"));
        assert!(page.contains(r#"href="../index.html""#));
    }

    #[test]
    fn build_site_writes_every_page() {
        let store = MemoryStore::default();
        store.insert("posts/1-a.md", "# Alpha\n\nBody");
        let out = tempfile::tempdir().unwrap();
        let out_dir = out.path().join("site");
        std::fs::create_dir_all(&out_dir).unwrap();
        std::fs::write(out_dir.join("stale.html"), "old").unwrap();

        let renderer = Renderer::new("Blog").unwrap();
        let p = post("1-a.md", "Alpha");
        renderer
            .build_site(&store, out.path(), &[&p], "<feed/>", &out_dir)
            .unwrap();

        assert!(!out_dir.join("stale.html").exists());
        assert!(out_dir.join("index.html").exists());
        let article = std::fs::read_to_string(out_dir.join("posts/1-a.html")).unwrap();
        assert!(article.contains("<h1>Alpha</h1>"));
        assert_eq!(std::fs::read_to_string(out_dir.join("feed.xml")).unwrap(), "<feed/>");
    }
}
