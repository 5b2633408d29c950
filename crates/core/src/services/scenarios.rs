//! End-to-end service scenarios against an in-memory database and a
//! scripted peer.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Method;
use sea_orm::{IntoActiveModel, Set};
use serde_json::{Value, json};
use socialdist_common::{AppError, canonicalize};
use socialdist_db::{
    entities::{author, like::LikeTarget, node, post::Visibility, user},
    repositories::{
        AuthorRepository, CommentRepository, FollowerRepository, FollowingRepository,
        InboxRepository, LikeRepository, NodeRepository, PostRepository, UserRepository,
    },
    test_utils::TestDatabase,
};
use socialdist_federation::{AdapterRegistry, RemoteResolver, testing::StubTransport};
use uuid::Uuid;

use crate::representation::Representer;
use crate::services::{
    AuthService, AuthorService, CommentService, CreateCommentInput, CreatePostInput,
    FriendshipService, InboxService, LikeService, PostService, Principal, RegisterInput,
};

const BASE: &str = "https://social.example";
const PEER: &str = "https://peer.example";

struct Fixture {
    db: TestDatabase,
    transport: Arc<StubTransport>,
}

impl Fixture {
    async fn new(transport: StubTransport) -> Self {
        Self {
            db: TestDatabase::memory().await.unwrap(),
            transport: Arc::new(transport),
        }
    }

    fn representer(&self) -> Representer {
        Representer::new(BASE, "service")
    }

    fn resolver(&self) -> RemoteResolver {
        RemoteResolver::new(
            self.db.connection(),
            Arc::new(AdapterRegistry::builtin()),
            self.transport.clone(),
        )
    }

    fn friendship(&self) -> FriendshipService {
        let db = self.db.connection();
        FriendshipService::new(
            AuthorRepository::new(db.clone()),
            FollowerRepository::new(db.clone()),
            FollowingRepository::new(db.clone()),
            InboxRepository::new(db),
            self.resolver(),
            self.representer(),
        )
    }

    fn posts(&self) -> PostService {
        let db = self.db.connection();
        PostService::new(
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            AuthorRepository::new(db.clone()),
            FollowerRepository::new(db.clone()),
            FollowingRepository::new(db),
            self.representer(),
        )
    }

    fn inbox(&self) -> InboxService {
        let db = self.db.connection();
        InboxService::new(
            AuthorRepository::new(db.clone()),
            InboxRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            LikeRepository::new(db),
            Arc::new(AdapterRegistry::builtin()),
        )
    }

    fn likes(&self) -> LikeService {
        let db = self.db.connection();
        LikeService::new(
            LikeRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            AuthorRepository::new(db.clone()),
            FollowerRepository::new(db.clone()),
            FollowingRepository::new(db.clone()),
            InboxRepository::new(db),
            self.resolver(),
            self.representer(),
        )
    }

    fn comments(&self) -> CommentService {
        let db = self.db.connection();
        CommentService::new(
            CommentRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            AuthorRepository::new(db.clone()),
            FollowerRepository::new(db.clone()),
            FollowingRepository::new(db.clone()),
            InboxRepository::new(db),
            self.resolver(),
            self.representer(),
        )
    }

    async fn author(&self, name: &str) -> author::Model {
        let user_id = format!("{name}-user");
        let (_, author) = AuthorRepository::new(self.db.connection())
            .create_with_user(
                user::ActiveModel {
                    id: Set(user_id.clone()),
                    username: Set(name.to_string()),
                    password_hash: Set("unused".to_string()),
                    created_at: Set(Utc::now().into()),
                },
                author::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    display_name: Set(name.to_string()),
                    github_url: Set(None),
                    profile_image: Set(None),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await
            .unwrap();
        author
    }

    async fn peer(&self) -> node::Model {
        let model = node::Model {
            id: "peer".to_string(),
            host: PEER.to_string(),
            display_name: None,
            prefix: "service".to_string(),
            auth_username: "peer".to_string(),
            auth_password: "peer-secret".to_string(),
            node_username: "us".to_string(),
            node_password: "us-secret".to_string(),
            adapter: "default".to_string(),
            created_at: (Utc::now() - Duration::seconds(1)).into(),
        };
        NodeRepository::new(self.db.connection())
            .create(model.into_active_model())
            .await
            .unwrap()
    }
}

fn compact(uuid: Uuid) -> String {
    canonicalize(&uuid.to_string())
}

fn peer_author_url(uuid: Uuid) -> String {
    format!("{PEER}/service/author/{}", compact(uuid))
}

fn peer_author(uuid: Uuid) -> Value {
    json!({
        "type": "author",
        "id": peer_author_url(uuid),
        "host": format!("{PEER}/"),
        "displayName": "Remote",
    })
}

fn post_input(title: &str, visibility: Visibility, recipient: Option<Uuid>) -> CreatePostInput {
    serde_json::from_value(json!({
        "title": title,
        "contentType": "text/plain",
        "content": "body",
        "categories": ["test"],
        "visibility": visibility,
        "recipient": recipient.map(|uuid| uuid.to_string()),
    }))
    .unwrap()
}

#[tokio::test]
async fn test_friendship_requires_all_four_edges() {
    let fx = Fixture::new(StubTransport::new()).await;
    let friendship = fx.friendship();
    let a = fx.author("a").await;
    let b = fx.author("b").await;

    // A follows B: Following(A,B) and Follower(B,A).
    friendship.follow(&a, b.id).await.unwrap();
    assert!(!friendship.friends_with(a.id, b.id).await.unwrap());
    assert!(!friendship.friends_with(b.id, a.id).await.unwrap());

    // B follows back: Following(B,A) and Follower(A,B).
    friendship.follow(&b, a.id).await.unwrap();
    assert!(friendship.friends_with(a.id, b.id).await.unwrap());
    assert!(friendship.friends_with(b.id, a.id).await.unwrap());

    let friends = friendship.get_author_friends(&a).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0]["id"], fx.representer().author_url(b.id));

    // Drop the first pair again.
    friendship.unfollow(&a, b.id).await.unwrap();
    assert!(!friendship.friends_with(a.id, b.id).await.unwrap());
    assert!(!friendship.friends_with(b.id, a.id).await.unwrap());
    assert!(fx.transport.requests().is_empty());
}

#[tokio::test]
async fn test_follow_is_idempotent_and_leaves_one_request() {
    let fx = Fixture::new(StubTransport::new()).await;
    let friendship = fx.friendship();
    let a = fx.author("a").await;
    let b = fx.author("b").await;

    assert!(friendship.follow(&a, b.id).await.unwrap());
    assert!(!friendship.follow(&a, b.id).await.unwrap());
    assert_eq!(friendship.count_followers(b.id).await.unwrap(), 1);

    let pending = friendship.pending_friend_requests(&b).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["type"], "follow");
    assert_eq!(pending[0]["actor"]["id"], fx.representer().author_url(a.id));

    // Once friends, the request is no longer pending.
    friendship.follow(&b, a.id).await.unwrap();
    assert!(friendship.pending_friend_requests(&b).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_self_follow_is_rejected() {
    let fx = Fixture::new(StubTransport::new()).await;
    let a = fx.author("a").await;

    let result = fx.friendship().follow(&a, a.id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_remote_follow_delivers_request_and_writes_only_following() {
    let remote = Uuid::new_v4();
    let fx = Fixture::new(
        StubTransport::new()
            .on(Method::GET, format!("{}/", peer_author_url(remote)), 200, peer_author(remote))
            .on(
                Method::POST,
                format!("{}/inbox/", peer_author_url(remote)),
                201,
                json!({}),
            ),
    )
    .await;
    fx.peer().await;
    let a = fx.author("a").await;
    let friendship = fx.friendship();

    assert!(friendship.follow(&a, remote).await.unwrap());

    let requests = fx.transport.requests();
    assert_eq!(requests.len(), 2);
    let delivered = requests[1].body.clone().unwrap();
    assert_eq!(delivered["type"], "follow");
    assert_eq!(delivered["object"]["id"], peer_author_url(remote));

    let following = FollowingRepository::new(fx.db.connection());
    let followers = FollowerRepository::new(fx.db.connection());
    assert!(following.is_following(a.id, remote).await.unwrap());
    assert!(followers.follower_uuids(a.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_remote_follow_delivers_once() {
    let remote = Uuid::new_v4();
    let fx = Fixture::new(
        StubTransport::new()
            .on(Method::GET, format!("{}/", peer_author_url(remote)), 200, peer_author(remote))
            .on(
                Method::POST,
                format!("{}/inbox/", peer_author_url(remote)),
                201,
                json!({}),
            ),
    )
    .await;
    fx.peer().await;
    let a = fx.author("a").await;
    let friendship = fx.friendship();

    assert!(friendship.follow(&a, remote).await.unwrap());
    assert!(!friendship.follow(&a, remote).await.unwrap());

    let posts: Vec<String> = fx
        .transport
        .request_lines()
        .into_iter()
        .filter(|line| line.starts_with("POST"))
        .collect();
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn test_failed_remote_unfollow_keeps_following_for_retry() {
    let remote = Uuid::new_v4();
    let fx = Fixture::new(
        StubTransport::new()
            .on(Method::GET, format!("{}/", peer_author_url(remote)), 200, peer_author(remote))
            .on(
                Method::POST,
                format!("{}/inbox/", peer_author_url(remote)),
                201,
                json!({}),
            ),
    )
    .await;
    fx.peer().await;
    let a = fx.author("a").await;
    let friendship = fx.friendship();
    friendship.follow(&a, remote).await.unwrap();

    // The peer is cached but has no route for the DELETE.
    let result = friendship.unfollow(&a, remote).await;
    assert!(matches!(result, Err(AppError::Federation(_))));
    let following = FollowingRepository::new(fx.db.connection());
    assert!(following.is_following(a.id, remote).await.unwrap());

    let retry = friendship.unfollow(&a, remote).await;
    assert!(matches!(retry, Err(AppError::Federation(_))));
    let delete = format!("DELETE {}/followers/{}/", peer_author_url(remote), compact(a.id));
    let deletes = fx
        .transport
        .request_lines()
        .into_iter()
        .filter(|line| *line == delete)
        .count();
    assert_eq!(deletes, 2);
}

#[tokio::test]
async fn test_remote_unfollow_accepts_peer_without_follower_row() {
    let remote = Uuid::new_v4();
    let setup = Fixture::new(StubTransport::new()).await;
    let a = setup.author("a").await;
    let fx = Fixture {
        db: setup.db,
        transport: Arc::new(
            StubTransport::new()
                .on(Method::GET, format!("{}/", peer_author_url(remote)), 200, peer_author(remote))
                .on(
                    Method::POST,
                    format!("{}/inbox/", peer_author_url(remote)),
                    201,
                    json!({}),
                )
                .on(
                    Method::DELETE,
                    format!("{}/followers/{}/", peer_author_url(remote), compact(a.id)),
                    404,
                    json!({ "error": "not a follower" }),
                ),
        ),
    };
    fx.peer().await;
    let friendship = fx.friendship();
    friendship.follow(&a, remote).await.unwrap();

    assert!(friendship.unfollow(&a, remote).await.unwrap());
    let following = FollowingRepository::new(fx.db.connection());
    assert!(!following.is_following(a.id, remote).await.unwrap());

    // Nothing left to remove: no second DELETE.
    assert!(!friendship.unfollow(&a, remote).await.unwrap());
    let deletes = fx
        .transport
        .request_lines()
        .into_iter()
        .filter(|line| line.starts_with("DELETE"))
        .count();
    assert_eq!(deletes, 1);
}

#[tokio::test]
async fn test_remote_friend_needs_peer_corroboration() {
    let remote = Uuid::new_v4();
    let fx = Fixture::new(
        StubTransport::new()
            .on(Method::GET, format!("{}/", peer_author_url(remote)), 200, peer_author(remote))
            .on(
                Method::GET,
                format!("{}/followers/", peer_author_url(remote)),
                200,
                json!({ "type": "followers", "items": [] }),
            ),
    )
    .await;
    fx.peer().await;
    let a = fx.author("a").await;
    let friendship = fx.friendship();

    friendship.add_follower(a.id, remote).await.unwrap();
    FollowingRepository::new(fx.db.connection())
        .insert_if_absent(socialdist_db::entities::following::ActiveModel {
            id: Set("f1".to_string()),
            author_id: Set(a.id),
            following_uuid: Set(remote),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    // Locally mutual, but the peer does not list A as a follower.
    assert!(friendship.friends_with(a.id, remote).await.unwrap());
    assert!(friendship.get_author_friends(&a).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_visible_posts_routes_by_visibility() {
    let fx = Fixture::new(StubTransport::new()).await;
    let friendship = fx.friendship();
    let posts = fx.posts();
    let viewer = fx.author("viewer").await;
    let friend = fx.author("friend").await;
    let stranger = fx.author("stranger").await;

    friendship.follow(&viewer, friend.id).await.unwrap();
    friendship.follow(&friend, viewer.id).await.unwrap();

    let public = posts
        .create(&stranger, post_input("public", Visibility::Public, None))
        .await
        .unwrap();
    let mutual = posts
        .create(&friend, post_input("mutual", Visibility::Friends, None))
        .await
        .unwrap();
    posts
        .create(&stranger, post_input("not mutual", Visibility::Friends, None))
        .await
        .unwrap();
    let private = posts
        .create(&stranger, post_input("private", Visibility::Private, Some(viewer.id)))
        .await
        .unwrap();
    posts
        .create(&stranger, post_input("someone else", Visibility::Private, Some(friend.id)))
        .await
        .unwrap();

    let mut visible: Vec<Uuid> = posts
        .visible_posts(viewer.id, 100, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|post| post.id)
        .collect();
    visible.sort();
    let mut expected = vec![public.id, mutual.id, private.id];
    expected.sort();

    assert_eq!(visible, expected);
}

#[tokio::test]
async fn test_recipient_dropped_for_public_post() {
    let fx = Fixture::new(StubTransport::new()).await;
    let a = fx.author("a").await;

    let post = fx
        .posts()
        .create(&a, post_input("p", Visibility::Public, Some(Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(post.recipient_id, None);
}

#[tokio::test]
async fn test_follow_addressed_to_another_inbox_is_not_stored() {
    let fx = Fixture::new(StubTransport::new()).await;
    let owner = fx.author("owner").await;
    let other = fx.author("other").await;
    let sender = fx.author("sender").await;
    let representer = fx.representer();
    let inbox = fx.inbox();

    let follow = representer.follow(
        representer.author_value(&sender),
        representer.author_value(&other),
    );
    let result = inbox
        .receive(&Principal::Author(sender.clone()), owner.id, follow)
        .await;

    assert!(matches!(
        result,
        Err(AppError::InvalidField { ref field, .. }) if field == "object.id"
    ));
    let stored = inbox
        .list(&Principal::Author(owner.clone()), owner.id, 10, 0)
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_inbox_round_trips_payload_for_owner_only() {
    let fx = Fixture::new(StubTransport::new()).await;
    let owner = fx.author("owner").await;
    let sender = fx.author("sender").await;
    let inbox = fx.inbox();
    let payload = json!({ "type": "Comment", "comment": "nice", "extra": [1, 2] });

    inbox
        .receive(&Principal::Author(sender.clone()), owner.id, payload.clone())
        .await
        .unwrap();

    let items = inbox
        .list(&Principal::Author(owner.clone()), owner.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(items, vec![payload]);

    let result = inbox
        .list(&Principal::Author(sender), owner.id, 10, 0)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_peer_like_on_local_post_is_counted_once() {
    let fx = Fixture::new(StubTransport::new()).await;
    let peer = fx.peer().await;
    let owner = fx.author("owner").await;
    let post = fx
        .posts()
        .create(&owner, post_input("p", Visibility::Public, None))
        .await
        .unwrap();
    let like = json!({
        "type": "like",
        "author": peer_author(Uuid::new_v4()),
        "object": fx.representer().post_url(owner.id, post.id),
    });
    let inbox = fx.inbox();

    inbox
        .receive(&Principal::Node(peer.clone()), owner.id, like.clone())
        .await
        .unwrap();
    inbox
        .receive(&Principal::Node(peer), owner.id, like)
        .await
        .unwrap();

    let likes = fx.likes();
    assert_eq!(likes.count(LikeTarget::Post(post.id)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_local_like_notifies_post_author() {
    let fx = Fixture::new(StubTransport::new()).await;
    let owner = fx.author("owner").await;
    let fan = fx.author("fan").await;
    let post = fx
        .posts()
        .create(&owner, post_input("p", Visibility::Public, None))
        .await
        .unwrap();
    let likes = fx.likes();

    assert!(likes.like(&fan, LikeTarget::Post(post.id)).await.unwrap());
    assert!(!likes.like(&fan, LikeTarget::Post(post.id)).await.unwrap());

    let listed = likes.list(LikeTarget::Post(post.id), 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].author["displayName"], "fan");

    let inbox = fx
        .inbox()
        .list(&Principal::Author(owner.clone()), owner.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["type"], "like");

    let missing = likes.like(&fan, LikeTarget::Comment(Uuid::new_v4())).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_hidden_post_cannot_be_liked_or_commented() {
    let fx = Fixture::new(StubTransport::new()).await;
    let a = fx.author("a").await;
    let b = fx.author("b").await;
    let c = fx.author("c").await;
    let post = fx
        .posts()
        .create(&a, post_input("secret", Visibility::Private, Some(b.id)))
        .await
        .unwrap();
    let input: CreateCommentInput = serde_json::from_value(json!({ "comment": "hi" })).unwrap();

    let like = fx.likes().like_post(&c, a.id, post.id).await;
    assert!(matches!(like, Err(AppError::PostNotFound(_))));
    let comment = fx.comments().create(&c, a.id, post.id, input.clone()).await;
    assert!(matches!(comment, Err(AppError::PostNotFound(_))));
    assert_eq!(fx.likes().count(LikeTarget::Post(post.id)).await.unwrap(), 0);
    assert_eq!(fx.comments().count(post.id).await.unwrap(), 0);
    let inbox = fx
        .inbox()
        .list(&Principal::Author(a.clone()), a.id, 10, 0)
        .await
        .unwrap();
    assert!(inbox.is_empty());

    // The recipient may.
    fx.likes().like_post(&b, a.id, post.id).await.unwrap();
    fx.comments().create(&b, a.id, post.id, input).await.unwrap();
    assert_eq!(fx.likes().count(LikeTarget::Post(post.id)).await.unwrap(), 1);
    assert_eq!(fx.comments().count(post.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_registered_user_authenticates_as_their_author() {
    let fx = Fixture::new(StubTransport::new()).await;
    let db = fx.db.connection();
    let authors = AuthorService::new(
        AuthorRepository::new(db.clone()),
        UserRepository::new(db.clone()),
        fx.representer(),
    );
    let auth = AuthService::new(
        NodeRepository::new(db.clone()),
        UserRepository::new(db.clone()),
        AuthorRepository::new(db),
    );

    let author = authors
        .register(RegisterInput {
            username: "alice".to_string(),
            password: "correct horse".to_string(),
            display_name: Some("Alice".to_string()),
            github_url: None,
        })
        .await
        .unwrap();

    let principal = auth.authenticate_basic("alice", "correct horse").await.unwrap();
    assert!(principal.is_author(author.id));
    assert!(matches!(
        auth.authenticate_basic("alice", "wrong").await,
        Err(AppError::Unauthorized)
    ));

    let duplicate = authors
        .register(RegisterInput {
            username: "alice".to_string(),
            password: "another pass".to_string(),
            display_name: None,
            github_url: None,
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}
