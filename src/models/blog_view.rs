// Blog view - the read-side projection of a published post

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{DocumentId, UserId};
use crate::models::category::Category;
use crate::models::post::Post;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

pub const UNKNOWN_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub author_id: UserId,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub post_id: DocumentId,
    pub blog_name: String,
    pub article: String,
    pub category: String,
    pub category_id: DocumentId,
    pub tag_ids: Vec<DocumentId>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
    pub word_count: usize,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub author: AuthorView,
}

impl BlogView {
    pub fn from_post(post: Post, category: Option<&Category>) -> Self {
        Self {
            word_count: word_count(&post.content),
            category: category
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            post_id: post.id,
            blog_name: post.title,
            article: post.content,
            category_id: post.category_id,
            tag_ids: post.tag_ids,
            created_at: post.created_at,
            updated_at: post.updated_at,
            view_count: post.view_count,
            like_count: post.like_count,
            comment_count: post.comment_count,
            author: AuthorView {
                author_id: post.author_id,
                author_name: post.author_name,
            },
        }
    }
}

/// Words in an article after stripping HTML tags
pub fn word_count(article: &str) -> usize {
    HTML_TAG.replace_all(article, " ").split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::NewPost;

    #[test]
    fn test_word_count_ignores_markup() {
        assert_eq!(word_count("<p>Hello <b>brave</b> new world</p>"), 4);
        assert_eq!(word_count("one<br/>two"), 2);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_view_fields() {
        let post = Post::new(NewPost {
            title: "Rust Ownership Explained Simply".to_string(),
            content: "<p>Every value has an owner.</p>".to_string(),
            category_id: DocumentId::new("c1"),
            author_id: UserId(3),
            author_name: "Lin".to_string(),
            tag_ids: vec![DocumentId::new("t1")],
            publish: true,
        });
        let category = Category::new("Technology and Innovation", None);

        let view = BlogView::from_post(post.clone(), Some(&category));
        assert_eq!(view.blog_name, post.title);
        assert_eq!(view.category, "Technology and Innovation");
        assert_eq!(view.word_count, 5);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["postId"], post.id.as_str());
        assert_eq!(json["author"]["authorName"], "Lin");
        assert_eq!(json["commentCount"], 0);

        let orphan = BlogView::from_post(post, None);
        assert_eq!(orphan.category, UNKNOWN_CATEGORY);
    }
}
