// HTTP client for the blog read API

pub mod blog_client;

pub use blog_client::BlogClient;
