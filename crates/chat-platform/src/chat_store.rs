//! Chat repository on top of a key-value [`StoragePort`].
//!
//! Layout:
//!
//! ```text
//! chat:session:<chat_id>               → ChatSession (JSON)
//! chat:message:<chat_id>:<seq:010>     → Message (JSON)
//! ```
//!
//! Zero-padded sequence numbers make a prefix scan return a chat's log in
//! append order. Several repositories may share one store (one per browser
//! tab), so the next sequence number is always derived from the stored log
//! and an occupied key is never overwritten.
//!
//! Live queries are served from a listener registry: every write through
//! this repository re-runs the affected queries and pushes the full result
//! set to their subscribers. Writes made by another repository over the same
//! store are picked up by [`ChatRepository::refresh`], which re-runs every
//! live query and pushes the ones whose result changed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use chat_core::ports::{ChatRepository, StoragePort};
use chat_core::subscription::{Subscription, SubscriptionSender};
use chat_types::{
    language::Language,
    message::{sort_append_order, Message, NewMessage, SenderType},
    session::{sort_newest_first, ChatSession, NewSession, SessionQuery, SessionStatus},
    ChatError, Result,
};

const SESSION_PREFIX: &str = "chat:session:";
const MESSAGE_PREFIX: &str = "chat:message:";

fn session_key(chat_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, chat_id)
}

fn message_prefix(chat_id: &str) -> String {
    format!("{}{}:", MESSAGE_PREFIX, chat_id)
}

fn message_key(chat_id: &str, seq: u64) -> String {
    format!("{}{:010}", message_prefix(chat_id), seq)
}

fn parse_seq(key: &str, prefix: &str) -> Option<u64> {
    key.strip_prefix(prefix)?.parse().ok()
}

/// Lower bound for a chat's next append, so appends racing inside this
/// repository never reuse a sequence number or go back in time. The stored
/// log can only push it further.
struct AppendCursor {
    next_seq: u64,
    last_timestamp: DateTime<Utc>,
}

/// One live query plus the result it was last given.
struct Listener<K, T> {
    id: u64,
    key: K,
    tx: SubscriptionSender<T>,
    last: Option<Vec<T>>,
}

impl<K, T: Clone + PartialEq> Listener<K, T> {
    /// Push `items` unless it equals the last delivery. Returns false once
    /// the subscriber is gone.
    fn deliver(&mut self, items: &[T]) -> bool {
        if self.last.as_deref() == Some(items) {
            return !self.tx.is_closed();
        }
        self.last = Some(items.to_vec());
        self.tx.send_snapshot(items.to_vec())
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    sessions: Vec<Listener<SessionQuery, ChatSession>>,
    messages: Vec<Listener<String, Message>>,
}

impl Listeners {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove(&mut self, id: u64) {
        self.sessions.retain(|l| l.id != id);
        self.messages.retain(|l| l.id != id);
    }

    fn session_listener(&mut self, id: u64) -> Option<&mut Listener<SessionQuery, ChatSession>> {
        self.sessions.iter_mut().find(|l| l.id == id)
    }

    fn message_listener(&mut self, id: u64) -> Option<&mut Listener<String, Message>> {
        self.messages.iter_mut().find(|l| l.id == id)
    }
}

pub struct StorageChatRepository {
    storage: Rc<dyn StoragePort>,
    listeners: Rc<RefCell<Listeners>>,
    cursors: RefCell<HashMap<String, AppendCursor>>,
}

impl StorageChatRepository {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self {
            storage,
            listeners: Rc::new(RefCell::new(Listeners::default())),
            cursors: RefCell::new(HashMap::new()),
        }
    }

    /// Live subscriptions (sessions + messages), for diagnostics.
    pub fn listener_count(&self) -> usize {
        let listeners = self.listeners.borrow();
        listeners.sessions.len() + listeners.messages.len()
    }

    async fn load_session(&self, chat_id: &str) -> Result<Option<ChatSession>> {
        match self.storage.get(&session_key(chat_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn require_session(&self, chat_id: &str) -> Result<ChatSession> {
        self.load_session(chat_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("chat {}", chat_id)))
    }

    async fn save_session(&self, session: &ChatSession) -> Result<()> {
        let bytes = serde_json::to_vec(session)?;
        self.storage.set(&session_key(&session.id), &bytes).await
    }

    async fn all_sessions(&self) -> Result<Vec<ChatSession>> {
        let keys = self.storage.list_keys(SESSION_PREFIX).await?;
        let mut sessions = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = self.storage.get(&key).await? {
                sessions.push(serde_json::from_slice::<ChatSession>(&bytes)?);
            }
        }
        Ok(sessions)
    }

    async fn query_sessions(&self, query: &SessionQuery) -> Result<Vec<ChatSession>> {
        let mut sessions: Vec<_> = self
            .all_sessions()
            .await?
            .into_iter()
            .filter(|s| query.matches(s))
            .collect();
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    /// Reserve the next slot in a chat's log: past both the stored log and
    /// any slot already handed out here, never earlier than the last stored
    /// timestamp.
    async fn next_slot(&self, session: &ChatSession) -> Result<(u64, DateTime<Utc>)> {
        let prefix = message_prefix(&session.id);
        let keys = self.storage.list_keys(&prefix).await?;
        let stored_last = keys.iter().filter_map(|k| parse_seq(k, &prefix)).max();
        let stored_timestamp = match stored_last {
            Some(seq) => match self.storage.get(&message_key(&session.id, seq)).await? {
                Some(bytes) => Some(serde_json::from_slice::<Message>(&bytes)?.timestamp),
                None => None,
            },
            None => None,
        };

        let mut cursors = self.cursors.borrow_mut();
        let cursor = cursors.entry(session.id.clone()).or_insert(AppendCursor {
            next_seq: 0,
            last_timestamp: session.last_message_at,
        });
        let seq = cursor.next_seq.max(stored_last.map_or(0, |s| s + 1));
        let mut timestamp = Utc::now().max(cursor.last_timestamp);
        if let Some(stored) = stored_timestamp {
            timestamp = timestamp.max(stored);
        }
        cursor.next_seq = seq + 1;
        cursor.last_timestamp = timestamp;
        Ok((seq, timestamp))
    }

    /// Claim a slot after `taken`, which another writer already holds.
    fn claim_after(&self, chat_id: &str, taken: u64) -> u64 {
        let mut cursors = self.cursors.borrow_mut();
        match cursors.get_mut(chat_id) {
            Some(cursor) => {
                let seq = cursor.next_seq.max(taken + 1);
                cursor.next_seq = seq + 1;
                seq
            }
            None => taken + 1,
        }
    }

    /// Bump `last_message_at`. Re-reads the session so a concurrent status
    /// or language change is not overwritten.
    async fn touch_session(&self, chat_id: &str, timestamp: DateTime<Utc>) -> Result<ChatSession> {
        let mut session = self.require_session(chat_id).await?;
        if session.last_message_at < timestamp {
            session.last_message_at = timestamp;
            self.save_session(&session).await?;
        }
        Ok(session)
    }

    /// Register a live query and hand it its initial snapshot.
    fn register_session_listener(
        &self,
        query: SessionQuery,
        snapshot: Vec<ChatSession>,
    ) -> Subscription<ChatSession> {
        let id = self.listeners.borrow_mut().allocate();
        let (tx, sub) = Subscription::channel(unregister(&self.listeners, id));
        let mut listener = Listener {
            id,
            key: query,
            tx,
            last: None,
        };
        listener.deliver(&snapshot);
        self.listeners.borrow_mut().sessions.push(listener);
        sub
    }

    fn register_message_listener(&self, chat_id: &str, snapshot: Vec<Message>) -> Subscription<Message> {
        let id = self.listeners.borrow_mut().allocate();
        let (tx, sub) = Subscription::channel(unregister(&self.listeners, id));
        let mut listener = Listener {
            id,
            key: chat_id.to_string(),
            tx,
            last: None,
        };
        listener.deliver(&snapshot);
        self.listeners.borrow_mut().messages.push(listener);
        sub
    }

    /// Push fresh results to the given session listeners, dropping the ones
    /// whose subscriber is gone. Returns how many received a new snapshot.
    async fn push_sessions(&self, targets: Vec<(u64, SessionQuery)>) -> usize {
        if targets.is_empty() {
            return 0;
        }
        let all = self.all_sessions().await;
        let mut pushed = 0;
        for (id, query) in targets {
            let mut listeners = self.listeners.borrow_mut();
            let Some(listener) = listeners.session_listener(id) else {
                continue;
            };
            let alive = match &all {
                Ok(all) => {
                    let mut matching: Vec<_> = all.iter().filter(|s| query.matches(s)).cloned().collect();
                    sort_newest_first(&mut matching);
                    let changed = listener.last.as_deref() != Some(matching.as_slice());
                    let alive = listener.deliver(&matching);
                    if changed && alive {
                        pushed += 1;
                    }
                    alive
                }
                Err(e) => {
                    log::warn!("[chat_store] session listener {} dropped: {}", id, e);
                    listener.tx.send_error(e.clone());
                    false
                }
            };
            if !alive {
                listeners.remove(id);
            }
        }
        pushed
    }

    /// Push fresh results to every session query that matched the session
    /// before or after the write.
    async fn notify_sessions(&self, before: Option<&ChatSession>, after: &ChatSession) {
        let targets: Vec<_> = self
            .listeners
            .borrow()
            .sessions
            .iter()
            .filter(|l| l.key.matches(after) || before.map_or(false, |b| l.key.matches(b)))
            .map(|l| (l.id, l.key.clone()))
            .collect();
        self.push_sessions(targets).await;
    }

    async fn push_messages(&self, chat_id: &str, targets: Vec<u64>) -> usize {
        if targets.is_empty() {
            return 0;
        }
        let messages = self.list_messages(chat_id).await;
        let mut pushed = 0;
        for id in targets {
            let mut listeners = self.listeners.borrow_mut();
            let Some(listener) = listeners.message_listener(id) else {
                continue;
            };
            let alive = match &messages {
                Ok(messages) => {
                    let changed = listener.last.as_deref() != Some(messages.as_slice());
                    let alive = listener.deliver(messages);
                    if changed && alive {
                        pushed += 1;
                    }
                    alive
                }
                Err(e) => {
                    log::warn!("[chat_store] message listener {} dropped: {}", id, e);
                    listener.tx.send_error(e.clone());
                    false
                }
            };
            if !alive {
                listeners.remove(id);
            }
        }
        pushed
    }

    async fn notify_messages(&self, chat_id: &str) {
        let targets: Vec<_> = self
            .listeners
            .borrow()
            .messages
            .iter()
            .filter(|l| l.key == chat_id)
            .map(|l| l.id)
            .collect();
        self.push_messages(chat_id, targets).await;
    }

    async fn update_session(
        &self,
        chat_id: &str,
        change: impl FnOnce(&mut ChatSession) -> Result<bool>,
    ) -> Result<ChatSession> {
        let before = self.require_session(chat_id).await?;
        let mut after = before.clone();
        if !change(&mut after)? {
            return Ok(before);
        }
        self.save_session(&after).await?;
        self.notify_sessions(Some(&before), &after).await;
        Ok(after)
    }
}

fn unregister(listeners: &Rc<RefCell<Listeners>>, id: u64) -> impl FnOnce() + 'static {
    let weak: Weak<RefCell<Listeners>> = Rc::downgrade(listeners);
    move || {
        if let Some(listeners) = weak.upgrade() {
            listeners.borrow_mut().remove(id);
        }
    }
}

#[async_trait(?Send)]
impl ChatRepository for StorageChatRepository {
    async fn create_session(&self, new: NewSession) -> Result<ChatSession> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            customer_id: new.customer_id,
            agent_id: new.agent_id,
            department: new.department,
            customer_language: new.customer_language,
            status: SessionStatus::Open,
            contact: new.contact,
            created_at: now,
            last_message_at: now,
        };
        self.save_session(&session).await?;
        log::debug!("[chat_store] created session {}", session.id);
        self.notify_sessions(None, &session).await;
        Ok(session)
    }

    async fn find_open_session(&self, query: &SessionQuery) -> Result<Option<ChatSession>> {
        let mut query = query.clone();
        query.status = Some(SessionStatus::Open);
        Ok(self.query_sessions(&query).await?.into_iter().next())
    }

    async fn get_session(&self, chat_id: &str) -> Result<Option<ChatSession>> {
        self.load_session(chat_id).await
    }

    async fn append_message(&self, chat_id: &str, message: NewMessage) -> Result<Message> {
        if message.sender_type == SenderType::Bot {
            return Err(ChatError::Other("bot messages are local and never stored".to_string()));
        }
        let before = self.require_session(chat_id).await?;
        if !before.is_open() {
            return Err(ChatError::ChatClosed(chat_id.to_string()));
        }

        let (mut seq, timestamp) = self.next_slot(&before).await?;
        while self.storage.exists(&message_key(chat_id, seq)).await? {
            log::debug!("[chat_store] slot {} of {} taken by another writer", seq, chat_id);
            seq = self.claim_after(chat_id, seq);
        }
        let stored = Message {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: message.sender_id,
            sender_type: message.sender_type,
            original_text: message.original_text,
            original_language: message.original_language,
            translated_text: message.translated_text,
            translated_language: message.translated_language,
            timestamp,
            seq,
        };
        let bytes = serde_json::to_vec(&stored)?;
        self.storage.set(&message_key(chat_id, seq), &bytes).await?;

        // The message is stored: from here on nothing may report failure.
        let after = match self.touch_session(chat_id, timestamp).await {
            Ok(after) => after,
            Err(e) => {
                log::warn!("[chat_store] last_message_at of {} not updated: {}", chat_id, e);
                before.clone()
            }
        };

        self.notify_messages(chat_id).await;
        self.notify_sessions(Some(&before), &after).await;
        Ok(stored)
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let keys = self.storage.list_keys(&message_prefix(chat_id)).await?;
        let mut messages = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = self.storage.get(&key).await? {
                messages.push(serde_json::from_slice::<Message>(&bytes)?);
            }
        }
        sort_append_order(&mut messages);
        Ok(messages)
    }

    async fn update_session_status(&self, chat_id: &str, status: SessionStatus) -> Result<ChatSession> {
        self.update_session(chat_id, |session| {
            if !session.status.can_transition_to(status) {
                return Err(ChatError::InvalidTransition(format!(
                    "chat {} cannot go from {:?} to {:?}",
                    session.id, session.status, status
                )));
            }
            let changed = session.status != status;
            session.status = status;
            Ok(changed)
        })
        .await
    }

    async fn update_session_language(&self, chat_id: &str, language: Language) -> Result<ChatSession> {
        self.update_session(chat_id, |session| {
            let changed = session.customer_language != language;
            session.customer_language = language;
            Ok(changed)
        })
        .await
    }

    async fn subscribe_sessions(&self, query: SessionQuery) -> Result<Subscription<ChatSession>> {
        let snapshot = self.query_sessions(&query).await?;
        Ok(self.register_session_listener(query, snapshot))
    }

    async fn subscribe_messages(&self, chat_id: &str) -> Result<Subscription<Message>> {
        self.require_session(chat_id).await?;
        let snapshot = self.list_messages(chat_id).await?;
        Ok(self.register_message_listener(chat_id, snapshot))
    }

    async fn refresh(&self) -> Result<usize> {
        let (sessions, messages) = {
            let listeners = self.listeners.borrow();
            let sessions: Vec<_> = listeners.sessions.iter().map(|l| (l.id, l.key.clone())).collect();
            let mut messages: HashMap<String, Vec<u64>> = HashMap::new();
            for l in &listeners.messages {
                messages.entry(l.key.clone()).or_default().push(l.id);
            }
            (sessions, messages)
        };
        let mut pushed = self.push_sessions(sessions).await;
        for (chat_id, ids) in messages {
            pushed += self.push_messages(&chat_id, ids).await;
        }
        if pushed > 0 {
            log::debug!("[chat_store] refresh pushed {} snapshot(s)", pushed);
        }
        Ok(pushed)
    }
}
