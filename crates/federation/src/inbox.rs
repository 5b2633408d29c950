//! Inbound inbox item validation.
//!
//! Dispatch is on the `type` discriminator (case and surrounding whitespace
//! ignored). Each kind has its own checklist; the first failure is reported
//! with the offending field's name. A `follow` must be addressed to the
//! inbox owner: its `object.id` has to decode to the owner's UUID.

use serde_json::{Map, Value};
use socialdist_common::{AppError, AppResult, extract_author_uuid, parse_uuid};
use socialdist_db::entities::inbox_item::InboxKind;
use uuid::Uuid;

const POST_FIELDS: &[&str] = &[
    "title",
    "id",
    "description",
    "contentType",
    "content",
    "author",
    "visibility",
];

const PARTY_FIELDS: &[&str] = &["type", "id", "host"];

/// Classify and validate an item pushed to `owner`'s inbox.
///
/// On success the payload is returned unchanged together with its kind.
pub fn validate_inbox_item(owner: Uuid, payload: Value) -> AppResult<(InboxKind, Value)> {
    let Value::Object(map) = &payload else {
        return Err(AppError::Validation(
            "inbox item must be a JSON object".to_string(),
        ));
    };

    let discriminator = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_field("type", "missing required field"))?;

    let kind = InboxKind::from_discriminator(discriminator).ok_or_else(|| {
        AppError::invalid_field("type", format!("unsupported inbox item type `{discriminator}`"))
    })?;

    match kind {
        InboxKind::Post => require_fields(map, POST_FIELDS, "")?,
        // Comments and likes are accepted as delivered.
        InboxKind::Comment | InboxKind::Like => {}
        InboxKind::Follow => validate_follow(owner, map)?,
    }

    Ok((kind, payload))
}

fn require_fields(map: &Map<String, Value>, fields: &[&str], path: &str) -> AppResult<()> {
    for field in fields {
        if map.get(*field).is_none_or(Value::is_null) {
            return Err(AppError::invalid_field(
                format!("{path}{field}"),
                "missing required field",
            ));
        }
    }
    Ok(())
}

fn party<'a>(map: &'a Map<String, Value>, name: &str) -> AppResult<&'a Map<String, Value>> {
    let party = map
        .get(name)
        .ok_or_else(|| AppError::invalid_field(name, "missing required field"))?
        .as_object()
        .ok_or_else(|| AppError::invalid_field(name, "must be an object"))?;
    require_fields(party, PARTY_FIELDS, &format!("{name}."))?;
    Ok(party)
}

fn validate_follow(owner: Uuid, map: &Map<String, Value>) -> AppResult<()> {
    party(map, "actor")?;
    let object = party(map, "object")?;

    let object_id = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_field("object.id", "must be a string"))?;

    let addressee = extract_author_uuid(object_id)
        .or_else(|| parse_uuid(object_id))
        .ok_or_else(|| AppError::invalid_field("object.id", "not an author identifier"))?;

    if addressee != owner {
        return Err(AppError::invalid_field(
            "object.id",
            "follow request is addressed to a different author",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const OWNER: &str = "1234abcd-0000-4000-8000-0123456789ab";

    fn owner() -> Uuid {
        Uuid::parse_str(OWNER).unwrap()
    }

    fn follow_to(object_id: &str) -> Value {
        json!({
            "type": "Follow",
            "summary": "Bob wants to follow Alice",
            "actor": { "type": "author", "id": "https://peer.example/author/b", "host": "https://peer.example/" },
            "object": { "type": "author", "id": object_id, "host": "https://social.example/" },
        })
    }

    fn field_of(err: AppError) -> String {
        match err {
            AppError::InvalidField { field, .. } => field,
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn test_follow_addressed_to_owner_is_accepted() {
        let payload = follow_to("https://social.example/service/author/1234abcd0000400080000123456789ab");
        let (kind, stored) = validate_inbox_item(owner(), payload.clone()).unwrap();

        assert_eq!(kind, InboxKind::Follow);
        assert_eq!(stored, payload);
    }

    #[test]
    fn test_follow_to_other_author_is_rejected() {
        let payload = follow_to(&format!("https://social.example/author/{}", Uuid::new_v4()));
        let err = validate_inbox_item(owner(), payload).unwrap_err();

        assert_eq!(field_of(err), "object.id");
    }

    #[test]
    fn test_follow_missing_actor_host() {
        let mut payload = follow_to(OWNER);
        payload["actor"].as_object_mut().unwrap().remove("host");

        let err = validate_inbox_item(owner(), payload).unwrap_err();
        assert_eq!(field_of(err), "actor.host");
    }

    #[test]
    fn test_follow_object_must_be_an_object() {
        let mut payload = follow_to(OWNER);
        payload["object"] = json!("https://social.example/author/x");

        let err = validate_inbox_item(owner(), payload).unwrap_err();
        assert_eq!(field_of(err), "object");
    }

    #[test]
    fn test_post_requires_fields() {
        let payload = json!({
            "type": " post ",
            "title": "t",
            "id": "https://peer.example/author/a/posts/p",
            "description": "d",
            "content": "c",
            "author": {},
            "visibility": "PUBLIC",
        });

        let err = validate_inbox_item(owner(), payload).unwrap_err();
        assert_eq!(field_of(err), "contentType");
    }

    #[test]
    fn test_comment_and_like_are_permissive() {
        let (kind, _) = validate_inbox_item(owner(), json!({ "type": "comment" })).unwrap();
        assert_eq!(kind, InboxKind::Comment);

        let (kind, _) = validate_inbox_item(owner(), json!({ "type": "LIKE" })).unwrap();
        assert_eq!(kind, InboxKind::Like);
    }

    #[test]
    fn test_unknown_and_missing_type() {
        let err = validate_inbox_item(owner(), json!({ "type": "announce" })).unwrap_err();
        assert_eq!(field_of(err), "type");

        let err = validate_inbox_item(owner(), json!({ "title": "x" })).unwrap_err();
        assert_eq!(field_of(err), "type");

        assert!(matches!(
            validate_inbox_item(owner(), json!([1, 2])).unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
