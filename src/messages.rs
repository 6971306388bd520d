//! Message client: two-party conversations over the messages collection

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::store::{CollectionClient, Query};

/// A directional message record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The document id
    #[serde(rename = "$id")]
    pub id: String,

    /// The sending identity
    pub sender_id: String,

    /// The receiving identity
    pub receiver_id: String,

    /// The text content
    pub content: String,

    /// Assigned at send time from the sender's local clock
    pub timestamp: DateTime<Utc>,

    /// Read flag; transitions false to true only
    pub read: bool,
}

impl Message {
    /// The other participant, relative to `user_id`; `None` when the
    /// message does not involve `user_id` at all
    pub fn peer_of(&self, user_id: &str) -> Option<&str> {
        if self.sender_id == user_id {
            Some(&self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewMessage<'a> {
    sender_id: &'a str,
    receiver_id: &'a str,
    content: &'a str,
    timestamp: DateTime<Utc>,
    read: bool,
}

/// Client for the messages collection
#[derive(Clone)]
pub struct MessageClient {
    collection: CollectionClient,
    scan_cap: u32,
}

impl MessageClient {
    /// Create a new MessageClient
    pub(crate) fn new(collection: CollectionClient, scan_cap: u32) -> Self {
        Self {
            collection,
            scan_cap,
        }
    }

    fn between(user_a: &str, user_b: &str) -> Query {
        Query::or(vec![
            Query::and(vec![
                Query::equal("senderId", user_a),
                Query::equal("receiverId", user_b),
            ]),
            Query::and(vec![
                Query::equal("senderId", user_b),
                Query::equal("receiverId", user_a),
            ]),
        ])
    }

    /// Fetch the conversation between two users, ascending by timestamp.
    /// Fails with [`Error::CollectionUnavailable`] when the messages
    /// collection has not been created on the store.
    pub async fn conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<Message>, Error> {
        let queries = [
            Self::between(user_a, user_b),
            Query::order_asc("timestamp"),
        ];
        let result = self.collection.list::<Message>(&queries).await?;
        Ok(result.documents)
    }

    /// Create one message record and return it. Not idempotent: calling
    /// twice creates two records. Content is not validated here; callers
    /// must not pass blank content.
    pub async fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, Error> {
        let document_id = Uuid::new_v4().to_string();
        let record = NewMessage {
            sender_id,
            receiver_id,
            content,
            timestamp: Utc::now(),
            read: false,
        };

        debug!(%document_id, sender_id, receiver_id, "sending message");
        self.collection.create::<Message, _>(&document_id, &record).await
    }

    /// Set `read = true` on one message. Marking an already-read message
    /// again is a no-op success.
    pub async fn mark_read(&self, message_id: &str) -> Result<Message, Error> {
        self.collection
            .update::<Message, _>(message_id, &json!({ "read": true }))
            .await
    }

    fn unread_up_to(viewer_id: &str, peer_id: &str, up_to: DateTime<Utc>) -> Query {
        Query::and(vec![
            Query::equal("senderId", peer_id),
            Query::equal("receiverId", viewer_id),
            Query::equal("read", false),
            // Rendered exactly like the stored `timestamp` field so a
            // message right at the bound still matches
            Query::less_than_equal(
                "timestamp",
                up_to.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
        ])
    }

    /// Mark every unread message from `peer_id` to `viewer_id` with
    /// timestamp up to `up_to` as read, in one remote call. Returns the
    /// updated records.
    pub async fn mark_read_up_to(
        &self,
        viewer_id: &str,
        peer_id: &str,
        up_to: DateTime<Utc>,
    ) -> Result<Vec<Message>, Error> {
        let queries = [Self::unread_up_to(viewer_id, peer_id, up_to)];

        self.collection
            .update_matching::<Message, _>(&queries, &json!({ "read": true }))
            .await
    }

    /// Most recent message per distinct peer, derived from a capped,
    /// time-descending fetch. Approximate: a peer whose conversation has
    /// no message among the most recent `scan_cap` is omitted.
    pub async fn last_per_peer(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, Message>, Error> {
        let queries = [
            Query::or(vec![
                Query::equal("senderId", user_id),
                Query::equal("receiverId", user_id),
            ]),
            Query::order_desc("timestamp"),
            Query::limit(self.scan_cap),
        ];
        let result = self.collection.list::<Message>(&queries).await?;
        Ok(reduce_last_per_peer(user_id, result.documents))
    }
}

/// Reduce a time-descending message list to the first (most recent)
/// message per distinct peer. Messages not involving `user_id` are
/// skipped.
pub(crate) fn reduce_last_per_peer(
    user_id: &str,
    messages: Vec<Message>,
) -> HashMap<String, Message> {
    let mut index = HashMap::new();
    for message in messages {
        let Some(peer) = message.peer_of(user_id) else {
            continue;
        };
        let peer = peer.to_string();
        index.entry(peer).or_insert(message);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, sender: &str, receiver: &str, secs: i64) -> Message {
        Message {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            content: format!("msg {}", id),
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
            read: false,
        }
    }

    #[test]
    fn reduction_keeps_first_occurrence_per_peer() {
        // Descending order, as the store returns them
        let messages = vec![
            message("m3", "u1", "p1", 30),
            message("m2", "p2", "u1", 20),
            message("m1", "p1", "u1", 10),
        ];
        let index = reduce_last_per_peer("u1", messages);

        assert_eq!(index.len(), 2);
        assert_eq!(index["p1"].id, "m3");
        assert_eq!(index["p2"].id, "m2");
    }

    #[test]
    fn reduction_skips_messages_not_involving_the_user() {
        let messages = vec![message("m1", "p1", "p2", 10)];
        let index = reduce_last_per_peer("u1", messages);
        assert!(index.is_empty());
    }

    #[test]
    fn mark_read_bound_renders_like_the_stored_timestamp_field() {
        let up_to: DateTime<Utc> = "2026-01-01T00:00:02Z".parse().unwrap();
        let rendered = MessageClient::unread_up_to("u1", "p1", up_to).render();

        let stored = serde_json::to_value(up_to).unwrap();
        assert!(rendered.contains(stored.as_str().unwrap()));
        assert!(rendered.contains("2026-01-01T00:00:02Z"));
    }

    #[test]
    fn peer_of_is_directional() {
        let msg = message("m1", "a", "b", 10);
        assert_eq!(msg.peer_of("a"), Some("b"));
        assert_eq!(msg.peer_of("b"), Some("a"));
        assert_eq!(msg.peer_of("c"), None);
    }
}
