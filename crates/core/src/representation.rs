//! Wire representations of local objects.
//!
//! Peers see authors and posts through these shapes. UUIDs inside `id` and
//! `url` are rendered without hyphens; incoming identifiers are accepted in
//! either form.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;
use socialdist_common::{Config, canonicalize};
use socialdist_db::entities::{
    author, comment, like,
    post::{self, ContentType, Visibility},
};
use uuid::Uuid;

/// `{ type: "author", ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRepresentation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub url: String,
    pub host: String,
    pub display_name: String,
    pub github: Option<String>,
    pub profile_image: Option<String>,
    pub posts: String,
}

/// `{ type: "post", ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRepresentation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub title: String,
    pub source: String,
    pub origin: String,
    pub description: String,
    pub content_type: ContentType,
    pub content: String,
    pub author: AuthorRepresentation,
    pub categories: Value,
    pub count: u64,
    pub comments: String,
    pub published: DateTime<FixedOffset>,
    pub visibility: Visibility,
    pub unlisted: bool,
}

/// `{ type: "comment", ... }`. The author may be remote, hence raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRepresentation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub author: Value,
    pub comment: String,
    pub content_type: ContentType,
    pub published: DateTime<FixedOffset>,
}

/// `{ type: "like", ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRepresentation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub summary: String,
    pub author: Value,
    pub object: String,
}

/// Builds URLs and representations for this node.
#[derive(Debug, Clone)]
pub struct Representer {
    base_url: String,
    api_prefix: String,
}

impl Representer {
    #[must_use]
    pub fn new(base_url: &str, api_prefix: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: api_prefix.trim_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url(), &config.federation.api_prefix)
    }

    /// `https://node/` as peers expect it in `host`.
    #[must_use]
    pub fn host(&self) -> String {
        format!("{}/", self.base_url)
    }

    #[must_use]
    pub fn author_url(&self, author: Uuid) -> String {
        format!(
            "{}/{}/author/{}",
            self.base_url,
            self.api_prefix,
            canonicalize(&author.to_string())
        )
    }

    #[must_use]
    pub fn post_url(&self, author: Uuid, post: Uuid) -> String {
        format!(
            "{}/posts/{}",
            self.author_url(author),
            canonicalize(&post.to_string())
        )
    }

    #[must_use]
    pub fn comment_url(&self, author: Uuid, post: Uuid, comment: Uuid) -> String {
        format!(
            "{}/comments/{}",
            self.post_url(author, post),
            canonicalize(&comment.to_string())
        )
    }

    #[must_use]
    pub fn author(&self, author: &author::Model) -> AuthorRepresentation {
        let url = self.author_url(author.id);
        AuthorRepresentation {
            kind: "author",
            id: url.clone(),
            posts: format!("{url}/posts"),
            url,
            host: self.host(),
            display_name: author.display_name.clone(),
            github: author.github_url.clone(),
            profile_image: author.profile_image.clone(),
        }
    }

    /// Serialized author, for mixing with remote authors.
    #[must_use]
    pub fn author_value(&self, author: &author::Model) -> Value {
        serde_json::to_value(self.author(author)).unwrap_or(Value::Null)
    }

    /// A post. `source` and `origin` default to the post's own URL.
    #[must_use]
    pub fn post(
        &self,
        post: &post::Model,
        author: &author::Model,
        comment_count: u64,
    ) -> PostRepresentation {
        let id = self.post_url(author.id, post.id);
        PostRepresentation {
            kind: "post",
            title: post.title.clone(),
            source: post.source.clone().unwrap_or_else(|| id.clone()),
            origin: post.origin.clone().unwrap_or_else(|| id.clone()),
            description: post.description.clone(),
            content_type: post.content_type,
            content: post.content.clone(),
            author: self.author(author),
            categories: post.categories.clone(),
            count: comment_count,
            comments: format!("{id}/comments"),
            published: post.published,
            visibility: post.visibility,
            unlisted: post.unlisted,
            id,
        }
    }

    #[must_use]
    pub fn comment(
        &self,
        post_author: Uuid,
        comment: &comment::Model,
        author: Value,
    ) -> CommentRepresentation {
        CommentRepresentation {
            kind: "comment",
            id: self.comment_url(post_author, comment.post_id, comment.id),
            author,
            comment: comment.comment.clone(),
            content_type: comment.content_type,
            published: comment.published,
        }
    }

    /// A like on `object`, by an author given as JSON.
    #[must_use]
    pub fn like(&self, author: Value, object: String) -> LikeRepresentation {
        let name = author
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or("Someone")
            .to_string();
        LikeRepresentation {
            kind: "like",
            summary: format!("{name} likes your post"),
            author,
            object,
        }
    }

    /// A stored like. The object URL is only known for local targets.
    #[must_use]
    pub fn stored_like(&self, like: &like::Model, author: Value, object: String) -> LikeRepresentation {
        let mut representation = self.like(author, object);
        if matches!(like.target(), like::LikeTarget::Comment(_)) {
            representation.summary = representation.summary.replace("post", "comment");
        }
        representation
    }

    /// A follow request from `actor` to `object`.
    #[must_use]
    pub fn follow(&self, actor: Value, object: Value) -> Value {
        let name = |author: &Value| {
            author
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or("Someone")
                .to_string()
        };
        serde_json::json!({
            "type": "follow",
            "summary": format!("{} wants to follow {}", name(&actor), name(&object)),
            "actor": actor,
            "object": object,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alice() -> author::Model {
        author::Model {
            id: Uuid::parse_str("1234abcd-0000-4000-8000-0123456789ab").unwrap_or_default(),
            user_id: "u1".to_string(),
            display_name: "Alice".to_string(),
            github_url: Some("https://github.com/alice".to_string()),
            profile_image: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_author_representation_uses_compact_uuid() {
        let representer = Representer::new("https://social.example/", "/service/");
        let value = representer.author_value(&alice());

        assert_eq!(value["type"], "author");
        assert_eq!(
            value["id"],
            "https://social.example/service/author/1234abcd0000400080000123456789ab"
        );
        assert_eq!(value["host"], "https://social.example/");
        assert_eq!(value["displayName"], "Alice");
        assert_eq!(value["github"], "https://github.com/alice");
    }

    #[test]
    fn test_post_source_and_origin_default_to_id() {
        let representer = Representer::new("https://social.example", "service");
        let author = alice();
        let post = post::Model {
            id: Uuid::now_v7(),
            author_id: author.id,
            content_type: ContentType::Plain,
            title: "t".to_string(),
            description: "d".to_string(),
            content: "c".to_string(),
            categories: serde_json::json!(["a"]),
            visibility: Visibility::Public,
            recipient_id: None,
            unlisted: false,
            source: None,
            origin: Some("https://elsewhere.example/p".to_string()),
            published: Utc::now().into(),
        };

        let representation = representer.post(&post, &author, 3);
        let value = serde_json::to_value(&representation).unwrap_or_default();

        assert_eq!(representation.source, representation.id);
        assert_eq!(representation.origin, "https://elsewhere.example/p");
        assert_eq!(value["contentType"], "text/plain");
        assert_eq!(value["visibility"], "PUBLIC");
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn test_follow_summary_names_both_parties() {
        let representer = Representer::new("https://social.example", "service");
        let follow = representer.follow(
            serde_json::json!({ "displayName": "Bob" }),
            representer.author_value(&alice()),
        );

        assert_eq!(follow["type"], "follow");
        assert_eq!(follow["summary"], "Bob wants to follow Alice");
    }
}
