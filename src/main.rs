use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use context::{Context, Layout};
use discovery::{discover, filter_by_category, Discovery};
use log::info;
use metadata::Post;
use renderer::Renderer;
use store::Repository;

mod context;
mod discovery;
mod feed;
mod frontmatter;
mod index;
mod metadata;
mod publish;
mod renderer;
mod store;
mod timer;

fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .args(&[
            Arg::new("repo")
                .long("repo")
                .global(true)
                .help("Repository holding the posts, as owner/name [env: BLOG_REPO]"),
            Arg::new("branch")
                .long("branch")
                .global(true)
                .default_value("main"),
            Arg::new("posts_dir")
                .long("posts-dir")
                .global(true)
                .help("Directory of posts inside the repository and the site checkout")
                .default_value("posts"),
            Arg::new("site_dir")
                .long("site-dir")
                .global(true)
                .help("Local site checkout; its posts index is used when listing fails")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("."),
            Arg::new("token")
                .long("token")
                .global(true)
                .help("GitHub token with repo scope [env: GITHUB_TOKEN]"),
            Arg::new("blog_name")
                .long("blog-name")
                .global(true)
                .help("Blog title used in pages and the feed [env: BLOG_NAME]"),
            Arg::new("api_url")
                .long("api-url")
                .global(true)
                .default_value("https://api.github.com"),
        ])
        .subcommands([
            Command::new("list")
                .about("List posts, newest first")
                .args(&[
                    Arg::new("category")
                        .long("category")
                        .help("Only show one category (`all` shows everything)"),
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print posts as JSON"),
                ]),
            Command::new("show")
                .about("Render one post as HTML")
                .args(&[
                    Arg::new("post")
                        .required(true)
                        .help("Post file name, display id, URL or site-relative path"),
                    Arg::new("raw")
                        .long("raw")
                        .action(ArgAction::SetTrue)
                        .help("Print the markdown instead of HTML"),
                ]),
            Command::new("build")
                .about("Write a static blog (index, post pages and feed)")
                .args(&[
                    Arg::new("out_dir")
                        .long("out")
                        .help("Directory path of output. Existing contents will be removed.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("out"),
                    Arg::new("category").long("category"),
                ]),
            Command::new("feed").about("Print an Atom feed of all posts"),
            Command::new("preview")
                .about("Render a local markdown draft as HTML")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Markdown file, or - for stdin"),
                ),
            Command::new("publish")
                .about("Publish a markdown post to the repository")
                .args(&[
                    Arg::new("title").long("title").required(true),
                    Arg::new("category").long("category"),
                    Arg::new("excerpt").long("excerpt"),
                    Arg::new("file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Markdown file, or - for stdin"),
                ]),
            Command::new("timer")
                .about("Run a Pomodoro countdown in the terminal")
                .args(&[
                    Arg::new("minutes")
                        .long("minutes")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("25"),
                    Arg::new("paused")
                        .long("paused")
                        .action(ArgAction::SetTrue)
                        .help("Wait for `s` instead of starting right away"),
                ]),
        ])
}

fn arg_or_env(matches: &ArgMatches, id: &str, var: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .or_else(|| std::env::var(var).ok())
        .filter(|v| !v.trim().is_empty())
}

fn build_context(matches: &ArgMatches) -> anyhow::Result<Context> {
    let Some(repo) = arg_or_env(matches, "repo", "BLOG_REPO") else {
        bail!("repository must be given with --repo owner/name or BLOG_REPO.");
    };
    let Some((owner, name)) = repo.trim().split_once('/') else {
        bail!("repository must look like owner/name, got {repo:?}.");
    };
    let site_dir: &PathBuf = matches.get_one("site_dir").unwrap();
    if !site_dir.is_dir() {
        bail!("site_dir must be a directory.");
    }

    Ok(Context {
        repo: Repository {
            api_url: matches.get_one::<String>("api_url").unwrap().clone(),
            owner: owner.to_string(),
            name: name.to_string(),
            branch: matches.get_one::<String>("branch").unwrap().clone(),
        },
        token: arg_or_env(matches, "token", "GITHUB_TOKEN"),
        layout: Layout::new(matches.get_one::<String>("posts_dir").unwrap()),
        site_dir: site_dir.to_owned(),
        blog_name: arg_or_env(matches, "blog_name", "BLOG_NAME").unwrap_or("Blog".to_string()),
        blog_url: std::env::var("BLOG_URL").unwrap_or("".to_string()),
    })
}

fn read_markdown(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("while reading {path:?}"))
    }
}

fn load_posts(ctx: &Context) -> anyhow::Result<Vec<Post>> {
    match discover(&ctx.reader(), &ctx.layout, &ctx.local_index_path()) {
        Discovery::Unavailable { primary, fallback } => {
            bail!("No posts available (listing: {primary}; local index: {fallback})")
        }
        discovery @ Discovery::FellBack { .. } => {
            info!("Showing {} posts from the local index", discovery.posts().len());
            Ok(discovery.into_posts())
        }
        discovery => Ok(discovery.into_posts()),
    }
}

fn list(ctx: &Context, matches: &ArgMatches) -> anyhow::Result<()> {
    let posts = load_posts(ctx)?;
    let category = matches.get_one::<String>("category").map(String::as_str);
    let posts = filter_by_category(&posts, category);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }
    for post in posts {
        println!(
            "{:>3}  {:<10}  {:<14}  {}  ({})",
            post.meta.id,
            post.meta.date,
            post.meta.category,
            post.meta.title,
            post.meta.read_time
        );
    }
    Ok(())
}

fn show(ctx: &Context, matches: &ArgMatches) -> anyhow::Result<()> {
    let target: &String = matches.get_one("post").unwrap();
    let store = ctx.reader();

    let (meta, url) = if target.contains("://") || target.contains('/') {
        (None, target.clone())
    } else {
        let posts = load_posts(ctx)?;
        let Some(post) = posts
            .into_iter()
            .find(|p| p.meta.file == *target || p.meta.id.to_string() == *target)
        else {
            bail!("no post named {target:?}.");
        };
        (Some(post.meta), post.url)
    };

    let markdown = discovery::open_post(&store, &ctx.site_dir, &url);
    if matches.get_flag("raw") {
        print!("{markdown}");
        return Ok(());
    }
    let meta = meta.unwrap_or_else(|| discovery::derive_post(&url, &url, &markdown).meta);
    println!("{}", Renderer::new(&ctx.blog_name)?.render_article(&meta, &markdown)?);
    Ok(())
}

fn atom_feed(ctx: &Context, posts: &[&Post]) -> String {
    feed::build_feed(
        &ctx.blog_name,
        &ctx.blog_url,
        posts,
        chrono::Utc::now().fixed_offset(),
    )
}

fn build(ctx: &Context, matches: &ArgMatches) -> anyhow::Result<()> {
    let out_dir: &PathBuf = matches.get_one("out_dir").unwrap();
    if out_dir.exists() && !out_dir.is_dir() {
        bail!("if out_dir exists, it must be directory.");
    }
    let posts = load_posts(ctx)?;
    let category = matches.get_one::<String>("category").map(String::as_str);
    let posts = filter_by_category(&posts, category);

    Renderer::new(&ctx.blog_name)?.build_site(
        &ctx.reader(),
        &ctx.site_dir,
        &posts,
        &atom_feed(ctx, &posts),
        out_dir,
    )
}

fn publish_post(matches: &ArgMatches) -> anyhow::Result<()> {
    let token = arg_or_env(matches, "token", "GITHUB_TOKEN");
    let token = publish::require_token(token.as_deref())?;
    let draft = publish::Draft {
        title: matches.get_one::<String>("title").unwrap().clone(),
        category: matches.get_one::<String>("category").cloned().unwrap_or_default(),
        excerpt: matches.get_one::<String>("excerpt").cloned().unwrap_or_default(),
        content: read_markdown(matches.get_one::<PathBuf>("file").unwrap())?,
    }
    .validate()?;

    let ctx = build_context(matches)?;
    let published = publish::publish(
        &ctx.publisher(token),
        &ctx.layout,
        draft,
        chrono::Utc::now().date_naive(),
    )?;
    println!(
        "Published successfully: {} (id {})",
        published.path, published.meta.id
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("list", sub)) => list(&build_context(sub)?, sub),
        Some(("show", sub)) => show(&build_context(sub)?, sub),
        Some(("build", sub)) => build(&build_context(sub)?, sub),
        Some(("feed", sub)) => {
            let ctx = build_context(sub)?;
            let posts = load_posts(&ctx)?;
            let posts: Vec<&Post> = posts.iter().collect();
            println!("{}", atom_feed(&ctx, &posts));
            Ok(())
        }
        Some(("preview", sub)) => {
            let markdown = read_markdown(sub.get_one::<PathBuf>("file").unwrap())?;
            print!("{}", renderer::render_markdown(&markdown));
            Ok(())
        }
        Some(("publish", sub)) => publish_post(sub),
        Some(("timer", sub)) => {
            let minutes: u32 = *sub.get_one("minutes").unwrap();
            timer::run(minutes, !sub.get_flag("paused"))
        }
        _ => unreachable!("subcommand_required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn context_comes_from_global_flags() {
        let site = tempfile::tempdir().unwrap();
        let matches = cli().get_matches_from([
            "postbox",
            "list",
            "--repo",
            "octo/blog",
            "--branch",
            "pages",
            "--site-dir",
            site.path().to_str().unwrap(),
            "--blog-name",
            "Tomatoes",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let ctx = build_context(sub).unwrap();
        assert_eq!(ctx.repo.owner, "octo");
        assert_eq!(ctx.repo.name, "blog");
        assert_eq!(ctx.repo.branch, "pages");
        assert_eq!(ctx.blog_name, "Tomatoes");
        assert_eq!(ctx.local_index_path(), site.path().join("posts/index.json"));
    }

    #[test]
    fn malformed_repository_is_rejected() {
        let matches = cli().get_matches_from(["postbox", "feed", "--repo", "no-slash"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(build_context(sub).is_err());
    }
}
