//! Roster and directory tools.
//!
//! Backends cap participant listings per query and do not reliably report
//! true totals beyond the cap, so full enumeration partitions the search
//! space: admins and bots first, then the membership by search prefix,
//! subdividing any partition whose returned count suggests truncation by
//! appending each alphabet letter to the prefix.  Results deduplicate by
//! member id across all partitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::observability;
use crate::session::Session;
use crate::transport::{Dialog, Member, ParticipantFilter, Peer, PeerKind, RecipientId};

/// Prefix letters tried at the search root, spanning the scripts a mixed
/// membership is likely to use.
const SEARCH_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789абвгдежзиклмнопрстуфхцчшщэюя";

/// Letters appended below the root: a branch stays within the script its
/// prefix is anchored on.
fn descent_alphabet(prefix: &str) -> &'static str {
    match prefix.chars().next() {
        Some(c) if c.is_ascii() => "abcdefghijklmnopqrstuvwxyz0123456789",
        Some(_) => "абвгдежзиклмнопрстуфхцчшщэюя0123456789",
        None => SEARCH_ALPHABET,
    }
}

/// Tunables for the partitioned participant search.
///
/// The defaults mirror one backend's observed pagination behavior; a
/// transport with different caps should adjust these rather than rely on
/// the literals.
#[derive(Clone, Debug)]
pub struct SearchLimits {
    /// Participants requested per page.
    pub page_size: usize,
    /// Hard stop for one partition's pagination.
    pub max_fetch: usize,
    /// A count within this distance of the branch maximum suggests
    /// truncation.
    pub truncation_margin: usize,
    /// Counts that land exactly on a known backend cap.
    pub cap_values: Vec<usize>,
    /// Longest search prefix before a branch is abandoned.
    pub max_depth: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            page_size: 200,
            max_fetch: 1024,
            truncation_margin: 100,
            cap_values: vec![200, 1000],
            max_depth: 4,
        }
    }
}

impl SearchLimits {
    /// Returns true when a partition's `count` suggests the backend
    /// truncated it.  `branch_max` is the largest count seen among the
    /// partition's ancestors; zero means no ancestor, where only the cap
    /// values can signal truncation.
    fn truncated(&self, count: usize, branch_max: usize) -> bool {
        if count == 0 {
            return false;
        }
        if self.cap_values.contains(&count) || count >= self.max_fetch {
            return true;
        }
        branch_max > 0 && branch_max.saturating_sub(count) <= self.truncation_margin
    }
}

/// A dialog-list entry with its preview trimmed for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogSummary {
    /// Backend-assigned dialog id.
    pub id: i64,
    /// Display name of the conversation.
    pub name: String,
    /// Last-message preview, truncated to 50 characters.
    pub last_message: String,
    /// Count of unread messages.
    pub unread_count: u32,
    /// What kind of entity the dialog is with.
    pub kind: PeerKind,
}

impl From<Dialog> for DialogSummary {
    fn from(dialog: Dialog) -> Self {
        let last_message = match dialog.last_message {
            Some(text) if text.chars().count() > 50 => {
                let mut preview: String = text.chars().take(50).collect();
                preview.push_str("...");
                preview
            }
            Some(text) => text,
            None => "No messages".to_string(),
        };
        Self {
            id: dialog.id,
            name: dialog.name,
            last_message,
            unread_count: dialog.unread_count,
            kind: dialog.kind,
        }
    }
}

/// Paginated, filter-partitioned enumeration of chats and their members.
pub struct RosterTools {
    session: Arc<Session>,
    limits: SearchLimits,
}

impl RosterTools {
    /// Creates roster tools with default search limits.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            limits: SearchLimits::default(),
        }
    }

    /// Creates roster tools with explicit search limits.
    pub fn with_limits(session: Arc<Session>, limits: SearchLimits) -> Self {
        Self { session, limits }
    }

    /// Resolves a chat by id or name, falling back to a dialog-list scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChatNotFound`] when neither direct resolution nor
    /// the dialog scan finds a match.
    pub async fn find_chat(&self, identifier: &RecipientId) -> Result<Peer> {
        match self.session.resolve_peer(identifier).await {
            Ok(peer) => return Ok(peer),
            Err(err) if err.is_session_closed() => return Err(err),
            Err(err) => {
                debug!(identifier = %identifier, "direct resolution failed: {err}");
            }
        }
        let dialogs = self.session.dialogs(usize::MAX).await?;
        let matched = dialogs.into_iter().find(|dialog| match identifier {
            RecipientId::Id(id) => dialog.id == *id,
            RecipientId::Handle(name) => dialog.name.eq_ignore_ascii_case(name),
            RecipientId::Phone(phone) => dialog.name == *phone,
        });
        match matched {
            Some(dialog) => {
                self.session
                    .resolve_peer(&RecipientId::Id(dialog.id))
                    .await
            }
            None => Err(Error::chat_not_found(
                "no dialog matched",
                Some(identifier.to_string()),
            )),
        }
    }

    /// Enumerates a chat's members, deduplicated by id.
    ///
    /// A single user resolves to its one record.  Groups and channels are
    /// enumerated partition by partition: admins, bots, the prefix search
    /// over the full membership, and, when requested, the kicked and banned
    /// lists.
    pub async fn get_chat_members(
        &self,
        identifier: &RecipientId,
        include_kicked_and_banned: bool,
    ) -> Result<Vec<Member>> {
        let chat = self.find_chat(identifier).await?;
        info!(chat = chat.id, "fetching members");
        if chat.is_user() {
            let record = self.session.user_record(&chat).await?;
            return Ok(vec![record]);
        }

        let mut seen: BTreeMap<i64, Member> = BTreeMap::new();
        self.collect_partition(&chat, &ParticipantFilter::Admins, &mut seen)
            .await?;
        self.collect_partition(&chat, &ParticipantFilter::Bots, &mut seen)
            .await?;
        self.prefix_search(&chat, ParticipantFilter::Search, &mut seen)
            .await?;
        if include_kicked_and_banned {
            self.prefix_search(&chat, ParticipantFilter::Kicked, &mut seen)
                .await?;
            self.prefix_search(&chat, ParticipantFilter::Banned, &mut seen)
                .await?;
        }
        info!(chat = chat.id, members = seen.len(), "member fetch complete");
        Ok(seen.into_values().collect())
    }

    /// Lists up to `limit` dialogs with display-ready previews.
    pub async fn get_dialogs(&self, limit: usize) -> Result<Vec<DialogSummary>> {
        info!("fetching dialogs");
        let dialogs = self.session.dialogs(limit).await?;
        Ok(dialogs.into_iter().map(DialogSummary::from).collect())
    }

    /// Walks one filter partition to exhaustion (or the fetch cap),
    /// deduplicating into `seen`.  Returns the number of members the
    /// backend returned for this partition.
    async fn collect_partition(
        &self,
        chat: &Peer,
        filter: &ParticipantFilter,
        seen: &mut BTreeMap<i64, Member>,
    ) -> Result<usize> {
        let mut offset = 0;
        let mut collected = 0;
        loop {
            let page = self
                .session
                .participants(chat, filter, offset, self.limits.page_size)
                .await?;
            observability::ROSTER_PAGES.click();
            let returned = page.members.len();
            for member in page.members {
                seen.insert(member.id, member);
            }
            collected += returned;
            offset += returned;
            if returned < self.limits.page_size || collected >= self.limits.max_fetch {
                break;
            }
        }
        Ok(collected)
    }

    /// Alphabet-partitioned search over one filter family.
    ///
    /// Each partition whose count suggests truncation is subdivided by
    /// appending each alphabet letter to the prefix; `branch_max` carries
    /// the largest ancestor count down each branch.
    async fn prefix_search(
        &self,
        chat: &Peer,
        make_filter: fn(String) -> ParticipantFilter,
        seen: &mut BTreeMap<i64, Member>,
    ) -> Result<()> {
        let mut pending: Vec<(String, usize)> = vec![(String::new(), 0)];
        while let Some((prefix, branch_max)) = pending.pop() {
            let filter = make_filter(prefix.clone());
            let count = self.collect_partition(chat, &filter, seen).await?;
            if !self.limits.truncated(count, branch_max) {
                continue;
            }
            if prefix.chars().count() >= self.limits.max_depth {
                warn!(
                    chat = chat.id,
                    prefix = %prefix,
                    count,
                    "partition still truncated at maximum search depth"
                );
                continue;
            }
            observability::ROSTER_SUBDIVISIONS.click();
            debug!(chat = chat.id, prefix = %prefix, count, "subdividing partition");
            let alphabet = descent_alphabet(&prefix);
            let branch_max = branch_max.max(count);
            for letter in alphabet.chars() {
                pending.push((format!("{prefix}{letter}"), branch_max));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_heuristic() {
        let limits = SearchLimits::default();
        // Landing exactly on a cap always subdivides.
        assert!(limits.truncated(200, 0));
        assert!(limits.truncated(1000, 0));
        // The root has no ancestor: an odd count is taken at face value.
        assert!(!limits.truncated(830, 0));
        // Deeper partitions compare against the branch maximum.
        assert!(limits.truncated(950, 1000));
        assert!(!limits.truncated(300, 1000));
        // Empty partitions never subdivide.
        assert!(!limits.truncated(0, 1000));
    }

    #[test]
    fn dialog_preview_truncated_to_50_chars() {
        let long = "x".repeat(80);
        let summary = DialogSummary::from(Dialog {
            id: 1,
            name: "chat".to_string(),
            last_message: Some(long),
            unread_count: 2,
            kind: PeerKind::Group,
        });
        assert_eq!(summary.last_message.chars().count(), 53);
        assert!(summary.last_message.ends_with("..."));
    }

    #[test]
    fn dialog_preview_short_passthrough() {
        let summary = DialogSummary::from(Dialog {
            id: 1,
            name: "chat".to_string(),
            last_message: Some("hello".to_string()),
            unread_count: 0,
            kind: PeerKind::User,
        });
        assert_eq!(summary.last_message, "hello");
    }

    #[test]
    fn dialog_preview_absent_message() {
        let summary = DialogSummary::from(Dialog {
            id: 1,
            name: "chat".to_string(),
            last_message: None,
            unread_count: 0,
            kind: PeerKind::Channel,
        });
        assert_eq!(summary.last_message, "No messages");
    }
}
