//! Friendship engine.
//!
//! Follows are two independent one-directional edges. This node only writes
//! the rows it is authoritative for: Follower/Following rows of its own
//! authors. A friendship is a mutual follow; when the other side is remote,
//! its half is corroborated by asking the peer for its follower list.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::Set;
use serde_json::Value;
use socialdist_common::{AppError, AppResult, IdGenerator, extract_author_uuid, parse_uuid};
use socialdist_db::{
    entities::{author, follower, following, inbox_item, inbox_item::InboxKind},
    repositories::{AuthorRepository, FollowerRepository, FollowingRepository, InboxRepository},
};
use socialdist_federation::RemoteResolver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    representation::Representer,
    services::author::{AuthorRef, resolve_local_author},
};

/// Friendship service for business logic.
#[derive(Clone)]
pub struct FriendshipService {
    author_repo: AuthorRepository,
    follower_repo: FollowerRepository,
    following_repo: FollowingRepository,
    inbox_repo: InboxRepository,
    resolver: RemoteResolver,
    representer: Representer,
    id_gen: IdGenerator,
}

impl FriendshipService {
    #[must_use]
    pub fn new(
        author_repo: AuthorRepository,
        follower_repo: FollowerRepository,
        following_repo: FollowingRepository,
        inbox_repo: InboxRepository,
        resolver: RemoteResolver,
        representer: Representer,
    ) -> Self {
        Self {
            author_repo,
            follower_repo,
            following_repo,
            inbox_repo,
            resolver,
            representer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Whether `author` and `other` follow each other, from local rows only.
    ///
    /// When `other` is also local, its two rows must exist as well.
    pub async fn friends_with(&self, author: Uuid, other: Uuid) -> AppResult<bool> {
        if !self.mutual_rows(author, other).await? {
            return Ok(false);
        }
        if self.author_repo.find_by_id(other).await?.is_some() {
            return self.mutual_rows(other, author).await;
        }
        Ok(true)
    }

    async fn mutual_rows(&self, author: Uuid, other: Uuid) -> AppResult<bool> {
        Ok(self.following_repo.is_following(author, other).await?
            && self.follower_repo.is_follower(author, other).await?)
    }

    /// Confirmed friends of `author` as author representations.
    ///
    /// Remote candidates are only admitted when their own node lists
    /// `author` as a follower. Candidates that cannot be resolved are left
    /// out.
    pub async fn get_author_friends(&self, author: &author::Model) -> AppResult<Vec<Value>> {
        Ok(self
            .confirmed_friends(author)
            .await?
            .into_iter()
            .map(|(_, representation)| representation)
            .collect())
    }

    async fn confirmed_friends(&self, author: &author::Model) -> AppResult<Vec<(Uuid, Value)>> {
        let followers: HashSet<Uuid> = self
            .follower_repo
            .follower_uuids(author.id)
            .await?
            .into_iter()
            .collect();
        let candidates: Vec<Uuid> = self
            .following_repo
            .following_uuids(author.id)
            .await?
            .into_iter()
            .filter(|uuid| followers.contains(uuid))
            .collect();

        let mut friends = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(local) = self.author_repo.find_by_id(candidate).await? {
                if self.mutual_rows(candidate, author.id).await? {
                    friends.push((candidate, self.representer.author_value(&local)));
                }
                continue;
            }

            match self.confirm_remote_friend(candidate, author.id).await {
                Ok(Some(remote)) => friends.push((candidate, remote)),
                Ok(None) => {
                    debug!(author = %author.id, candidate = %candidate, "Remote friendship not corroborated");
                }
                Err(err) => {
                    warn!(author = %author.id, candidate = %candidate, error = %err, "Skipping unresolvable friend");
                }
            }
        }
        Ok(friends)
    }

    async fn confirm_remote_friend(&self, remote: Uuid, local: Uuid) -> AppResult<Option<Value>> {
        let Some(representation) = self.resolver.resolve_author(remote).await? else {
            return Ok(None);
        };
        if self.resolver.approved_follow(remote, local).await? {
            Ok(Some(representation))
        } else {
            Ok(None)
        }
    }

    /// Follow requests in `author`'s inbox from actors who are not yet
    /// friends, one per actor, newest first.
    pub async fn pending_friend_requests(&self, author: &author::Model) -> AppResult<Vec<Value>> {
        let friends: HashSet<Uuid> = self
            .confirmed_friends(author)
            .await?
            .into_iter()
            .map(|(uuid, _)| uuid)
            .collect();

        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for item in self
            .inbox_repo
            .find_by_author_and_kind(author.id, InboxKind::Follow)
            .await?
        {
            let Some(actor) = follow_actor(&item.payload) else {
                debug!(item = %item.id, "Follow item without a decodable actor");
                continue;
            };
            if friends.contains(&actor) || !seen.insert(actor) {
                continue;
            }
            pending.push(item.payload);
        }
        Ok(pending)
    }

    /// `author` starts following `target`.
    ///
    /// For a local target both rows are written here and a follow item is
    /// dropped into the target's inbox. For a remote target the follow item
    /// is delivered to the target's node first, once; only the local
    /// Following row is written. Returns whether a new Following row was
    /// created.
    pub async fn follow(&self, author: &author::Model, target: Uuid) -> AppResult<bool> {
        if author.id == target {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let actor = self.representer.author_value(author);

        if let Some(local) = self.author_repo.find_by_id(target).await? {
            let created = self.insert_following(author.id, target).await?;
            self.insert_follower(target, author.id).await?;
            if created {
                let payload = self
                    .representer
                    .follow(actor, self.representer.author_value(&local));
                self.store_inbox_item(target, InboxKind::Follow, payload)
                    .await?;
            }
            info!(author = %author.id, target = %target, created, "Followed local author");
            return Ok(created);
        }

        if self.following_repo.is_following(author.id, target).await? {
            info!(author = %author.id, target = %target, "Already following remote author");
            return Ok(false);
        }

        let object = self
            .resolver
            .resolve_author(target)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(target.to_string()))?;
        let payload = self.representer.follow(actor, object);
        self.resolver
            .send_friend_request(target, &payload)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(target.to_string()))?;

        let created = self.insert_following(author.id, target).await?;
        info!(author = %author.id, target = %target, created, "Sent friend request");
        Ok(created)
    }

    /// `author` stops following `target`. Returns whether a Following row
    /// was removed.
    ///
    /// For a remote target the follower row on its node is removed first, so
    /// a failed removal leaves the Following row in place to retry.
    pub async fn unfollow(&self, author: &author::Model, target: Uuid) -> AppResult<bool> {
        if self.author_repo.find_by_id(target).await?.is_some() {
            self.follower_repo.delete_by_pair(target, author.id).await?;
        } else if self.following_repo.is_following(author.id, target).await?
            && self
                .resolver
                .remove_follower(author.id, target)
                .await?
                .is_none()
        {
            warn!(author = %author.id, target = %target, "No peer accepted follower removal");
        }

        let removed = self
            .following_repo
            .delete_by_pair(author.id, target)
            .await?;

        info!(author = %author.id, target = %target, removed, "Unfollowed");
        Ok(removed)
    }

    /// Record that `follower_uuid` follows the local `author_id`.
    pub async fn add_follower(&self, author_id: Uuid, follower_uuid: Uuid) -> AppResult<bool> {
        if author_id == follower_uuid {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }
        let created = self.insert_follower(author_id, follower_uuid).await?;
        info!(author = %author_id, follower = %follower_uuid, created, "Added follower");
        Ok(created)
    }

    pub async fn remove_follower(&self, author_id: Uuid, follower_uuid: Uuid) -> AppResult<bool> {
        let removed = self
            .follower_repo
            .delete_by_pair(author_id, follower_uuid)
            .await?;
        info!(author = %author_id, follower = %follower_uuid, removed, "Removed follower");
        Ok(removed)
    }

    pub async fn is_follower(&self, author_id: Uuid, follower_uuid: Uuid) -> AppResult<bool> {
        self.follower_repo.is_follower(author_id, follower_uuid).await
    }

    pub async fn count_followers(&self, author_id: Uuid) -> AppResult<u64> {
        self.follower_repo.count_by_author(author_id).await
    }

    /// A page of `author_id`'s followers as author representations.
    /// Followers that cannot be resolved anywhere are left out.
    pub async fn followers(&self, author_id: Uuid, limit: u64, offset: u64) -> AppResult<Vec<Value>> {
        let rows = self
            .follower_repo
            .find_by_author(author_id, limit, offset)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(representation) = self.represent_follower(row).await? {
                items.push(representation);
            }
        }
        Ok(items)
    }

    /// `foreign` as a follower of `author_id`, or not-found.
    pub async fn follower(&self, author_id: Uuid, foreign: Uuid) -> AppResult<Value> {
        let row = self
            .follower_repo
            .find_by_pair(author_id, foreign)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{foreign} does not follow {author_id}")))?;

        self.represent_follower(&row)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(foreign.to_string()))
    }

    async fn represent_follower(&self, row: &follower::Model) -> AppResult<Option<Value>> {
        match resolve_local_author(&self.author_repo, AuthorRef::Follower(row)).await {
            Ok(local) => Ok(Some(self.representer.author_value(&local))),
            Err(AppError::AuthorNotFound(_)) => {
                match self.resolver.resolve_author(row.follower_uuid).await {
                    Ok(remote) => Ok(remote),
                    Err(err) => {
                        warn!(follower = %row.follower_uuid, error = %err, "Omitting unresolvable follower");
                        Ok(None)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn insert_following(&self, author_id: Uuid, following_uuid: Uuid) -> AppResult<bool> {
        self.following_repo
            .insert_if_absent(following::ActiveModel {
                id: Set(self.id_gen.generate()),
                author_id: Set(author_id),
                following_uuid: Set(following_uuid),
                created_at: Set(Utc::now().into()),
            })
            .await
    }

    async fn insert_follower(&self, author_id: Uuid, follower_uuid: Uuid) -> AppResult<bool> {
        self.follower_repo
            .insert_if_absent(follower::ActiveModel {
                id: Set(self.id_gen.generate()),
                author_id: Set(author_id),
                follower_uuid: Set(follower_uuid),
                created_at: Set(Utc::now().into()),
            })
            .await
    }

    async fn store_inbox_item(&self, owner: Uuid, kind: InboxKind, payload: Value) -> AppResult<()> {
        self.inbox_repo
            .create(inbox_item::ActiveModel {
                id: Set(self.id_gen.generate()),
                author_id: Set(owner),
                kind: Set(kind),
                payload: Set(payload),
                received_at: Set(Utc::now().into()),
            })
            .await?;
        Ok(())
    }
}

/// UUID of the actor of a stored follow item.
fn follow_actor(payload: &Value) -> Option<Uuid> {
    let id = payload.get("actor")?.get("id")?.as_str()?;
    extract_author_uuid(id).or_else(|| parse_uuid(id))
}
