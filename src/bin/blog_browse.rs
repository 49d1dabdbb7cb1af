// Blog Browse - command line client for the blog read API

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use blogsite_store::{
    client::BlogClient,
    config::Config,
    core::strong_types::{DocumentId, UserId},
    error::AppResult,
    models::{BlogView, PageRequest, PagedResponse, DEFAULT_PAGE_SIZE},
};

/// Browse published blogs through the HTTP API.
#[derive(Parser)]
#[clap(name = "blog-browse", version)]
struct Cli {
    /// Base URL of the API server, defaults to BLOG_API_URL.
    #[clap(global = true, long)]
    url: Option<String>,
    /// Print raw JSON instead of a summary.
    #[clap(global = true, long)]
    json: bool,
    #[clap(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// List category names that have a category document.
    Categories,
    /// List blogs in a category, optionally between two dates (yyyy-MM-dd).
    Category {
        name: String,
        #[clap(long, requires = "end")]
        start: Option<String>,
        #[clap(long, requires = "start")]
        end: Option<String>,
        #[clap(long, default_value_t = 0)]
        page: u64,
        #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u64,
    },
    /// Show one published blog.
    Post { id: String },
    /// List blogs written by an author.
    Author {
        id: i64,
        #[clap(long, default_value_t = 0)]
        page: u64,
        #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u64,
    },
    /// Full-text search over titles and content.
    Search {
        terms: String,
        #[clap(long, default_value_t = 0)]
        page: u64,
        #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut config = Config::from_env()
        .map_err(|e| blogsite_store::AppError::ConfigurationError(e.to_string()))?;
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    let client = BlogClient::from_config(&config)?;

    match cli.action {
        Action::Categories => {
            let names = client.categories().await?;
            if cli.json {
                print_json(&names)?;
            } else {
                names.iter().for_each(|name| println!("{}", name));
            }
        }
        Action::Category { name, start, end, page, size } => {
            let request = PageRequest::new(page, size);
            let blogs = match (start, end) {
                (Some(start), Some(end)) => {
                    client.blogs_by_category_and_dates(&name, &start, &end, request).await?
                }
                _ => client.blogs_by_category(&name, request).await?,
            };
            print_page(&blogs, cli.json)?;
        }
        Action::Post { id } => {
            let blog = client.blog_by_id(&DocumentId::new(id)).await?;
            if cli.json {
                print_json(&blog)?;
            } else {
                print_blog(&blog);
                println!();
                println!("{}", blog.article);
            }
        }
        Action::Author { id, page, size } => {
            let blogs = client.blogs_by_author(UserId(id), PageRequest::new(page, size)).await?;
            print_page(&blogs, cli.json)?;
        }
        Action::Search { terms, page, size } => {
            let blogs = client.search(&terms, PageRequest::new(page, size)).await?;
            print_page(&blogs, cli.json)?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_page(blogs: &PagedResponse<BlogView>, json: bool) -> AppResult<()> {
    if json {
        return print_json(blogs);
    }
    for blog in &blogs.content {
        print_blog(blog);
    }
    println!(
        "page {} of {} ({} blogs)",
        blogs.page + 1,
        blogs.total_pages.max(1),
        blogs.total_elements
    );
    Ok(())
}

fn print_blog(blog: &BlogView) {
    println!(
        "{}  {}  [{}]  by {}  {} words  {} likes  {}",
        blog.post_id,
        blog.blog_name,
        blog.category,
        blog.author.author_name,
        blog.word_count,
        blog.like_count,
        blog.created_at.format("%Y-%m-%d"),
    );
}
