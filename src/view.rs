//! Conversation view: event-driven state machine over the directory and
//! message clients
//!
//! The view is UI-agnostic. User intents (`init`, `select_peer`,
//! `search_input`, `submit`) spawn request tasks; completions arrive as
//! [`ViewEvent`]s on an internal channel and are folded into view state by
//! [`ConversationView::apply`]. The host loop drains events with
//! [`ConversationView::next_event`] and renders from the accessors. All
//! state is owned by the view instance; no remote failure crashes it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::{Account, Identity};
use crate::directory::{DirectoryClient, UserRecord};
use crate::error::Error;
use crate::messages::{Message, MessageClient};

/// Top-level view lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Identity and directory load in flight
    Initializing,
    /// Interactive
    Ready,
    /// Initial load failed
    Failed(String),
}

/// Sub-state of the currently selected thread
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadState {
    /// No peer selected
    Idle,
    /// Conversation fetch in flight
    Loading,
    /// Conversation rendered
    Ready(Vec<Message>),
    /// Conversation fetch failed
    Failed(String),
}

/// State of the compose control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComposeState {
    Idle,
    Sending,
}

/// Severity of a surfaced notice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeLevel {
    Info,
    Warning,
    /// The backing store still needs setup; render instructions, not a
    /// generic error
    SetupRequired,
}

/// A non-fatal, user-visible notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Payload of a successful initial load
#[derive(Debug)]
pub struct InitLoad {
    identity: Identity,
    contacts: Vec<UserRecord>,
    last_index: Result<HashMap<String, Message>, Error>,
}

/// Completion events folded into the view
#[derive(Debug)]
pub enum ViewEvent {
    Initialized(Result<InitLoad, Error>),
    /// Debounce timer elapsed for a search term
    SearchFired(String),
    SearchLoaded {
        term: String,
        result: Result<Vec<UserRecord>, Error>,
    },
    ThreadLoaded {
        generation: u64,
        peer_id: String,
        result: Result<Vec<Message>, Error>,
    },
    Sent {
        peer_id: String,
        result: Result<Message, Error>,
    },
    MarkedRead {
        peer_id: String,
        result: Result<Vec<Message>, Error>,
    },
}

/// Event-driven conversation view over one authenticated identity
pub struct ConversationView {
    account: Account,
    directory: DirectoryClient,
    messages: MessageClient,

    state: ViewState,
    viewer: Option<Identity>,

    /// Unfiltered directory listing
    contacts: Vec<UserRecord>,
    /// Listing currently displayed (search results or `contacts`)
    roster: Vec<UserRecord>,
    /// Most recent message per peer
    last_index: HashMap<String, Message>,

    selected: Option<String>,
    thread: ThreadState,
    compose: ComposeState,
    draft: String,

    search_text: String,
    search_debounce: Duration,
    search_task: Option<JoinHandle<()>>,

    /// Bumped on every peer selection; stale thread results are discarded
    generation: u64,

    notices: Vec<Notice>,

    tx: UnboundedSender<ViewEvent>,
    rx: UnboundedReceiver<ViewEvent>,
}

impl ConversationView {
    /// Create a new view; call [`init`](Self::init) to start loading
    pub fn new(
        account: Account,
        directory: DirectoryClient,
        messages: MessageClient,
        search_debounce: Duration,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            account,
            directory,
            messages,
            state: ViewState::Initializing,
            viewer: None,
            contacts: Vec::new(),
            roster: Vec::new(),
            last_index: HashMap::new(),
            selected: None,
            thread: ThreadState::Idle,
            compose: ComposeState::Idle,
            draft: String::new(),
            search_text: String::new(),
            search_debounce,
            search_task: None,
            generation: 0,
            notices: Vec::new(),
            tx,
            rx,
        }
    }

    /// Load the viewer identity, the directory, and the last-message index
    pub fn init(&mut self) {
        self.state = ViewState::Initializing;
        let account = self.account.clone();
        let directory = self.directory.clone();
        let messages = self.messages.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result: Result<InitLoad, Error> = async {
                let identity = account.get().await?;
                let contacts = directory.list().await?;
                // A missing messages collection must not take down the
                // whole view, only the recency column
                let last_index = messages.last_per_peer(&identity.id).await;
                Ok(InitLoad {
                    identity,
                    contacts,
                    last_index,
                })
            }
            .await;
            let _ = tx.send(ViewEvent::Initialized(result));
        });
    }

    /// Select a peer and load the conversation with them. The view stays
    /// interactive while the fetch is outstanding; a response for a
    /// previously selected peer is discarded on arrival.
    pub fn select_peer(&mut self, peer_id: &str) {
        let Some(viewer) = self.viewer.clone() else {
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        self.selected = Some(peer_id.to_string());
        self.thread = ThreadState::Loading;

        let messages = self.messages.clone();
        let tx = self.tx.clone();
        let peer = peer_id.to_string();
        tokio::spawn(async move {
            let result = messages.conversation(&viewer.id, &peer).await;
            let _ = tx.send(ViewEvent::ThreadLoaded {
                generation,
                peer_id: peer,
                result,
            });
        });
    }

    /// Feed a keystroke of search input. Each keystroke cancels the
    /// pending debounce timer; empty input resets to the unfiltered
    /// listing without a remote call.
    pub fn search_input(&mut self, text: &str) {
        self.search_text = text.to_string();
        if let Some(task) = self.search_task.take() {
            task.abort();
        }

        if text.trim().is_empty() {
            self.roster = self.contacts.clone();
            return;
        }

        let tx = self.tx.clone();
        let delay = self.search_debounce;
        let term = text.to_string();
        self.search_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ViewEvent::SearchFired(term));
        }));
    }

    /// Replace the compose draft
    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    /// Send the current draft to the selected peer. A blank draft is
    /// never submitted; the message client performs no content checks.
    pub fn submit(&mut self) {
        if self.compose != ComposeState::Idle || self.draft.trim().is_empty() {
            return;
        }
        let (Some(viewer), Some(peer)) = (self.viewer.clone(), self.selected.clone()) else {
            return;
        };

        self.compose = ComposeState::Sending;
        let messages = self.messages.clone();
        let tx = self.tx.clone();
        let content = self.draft.clone();
        tokio::spawn(async move {
            let result = messages.send(&viewer.id, &peer, &content).await;
            let _ = tx.send(ViewEvent::Sent {
                peer_id: peer,
                result,
            });
        });
    }

    /// Receive the next completion event; `None` once the view is gone
    pub async fn next_event(&mut self) -> Option<ViewEvent> {
        self.rx.recv().await
    }

    /// Fold a completion event into view state
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Initialized(Ok(load)) => {
                self.viewer = Some(load.identity);
                self.contacts = load.contacts.clone();
                self.roster = load.contacts;
                match load.last_index {
                    Ok(index) => self.last_index = index,
                    Err(err) => {
                        self.push_remote_notice("could not load recent conversations", &err)
                    }
                }
                self.state = ViewState::Ready;
            }
            ViewEvent::Initialized(Err(err)) => {
                self.state = ViewState::Failed(err.to_string());
            }
            ViewEvent::SearchFired(term) => {
                if term != self.search_text {
                    return;
                }
                let directory = self.directory.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = directory.search(&term).await;
                    let _ = tx.send(ViewEvent::SearchLoaded { term, result });
                });
            }
            ViewEvent::SearchLoaded { term, result } => {
                if term != self.search_text {
                    debug!(%term, "discarding superseded search result");
                    return;
                }
                match result {
                    Ok(records) => self.roster = records,
                    Err(err) => self.push_remote_notice("search failed", &err),
                }
            }
            ViewEvent::ThreadLoaded {
                generation,
                peer_id,
                result,
            } => {
                if generation != self.generation {
                    debug!(%peer_id, "discarding stale thread result");
                    return;
                }
                match result {
                    Ok(msgs) => {
                        self.mark_thread_read(&peer_id, &msgs);
                        self.thread = ThreadState::Ready(msgs);
                    }
                    Err(err) => {
                        self.thread = ThreadState::Failed(err.to_string());
                        self.push_remote_notice("could not load conversation", &err);
                    }
                }
            }
            ViewEvent::Sent { peer_id, result } => {
                self.compose = ComposeState::Idle;
                match result {
                    Ok(message) => {
                        self.draft.clear();
                        if self.selected.as_deref() == Some(peer_id.as_str()) {
                            if let ThreadState::Ready(msgs) = &mut self.thread {
                                msgs.push(message.clone());
                            }
                        }
                        self.last_index.insert(peer_id, message);
                    }
                    Err(err) => self.push_remote_notice("message not sent", &err),
                }
            }
            ViewEvent::MarkedRead { peer_id, result } => match result {
                Ok(updated) => {
                    if self.selected.as_deref() == Some(peer_id.as_str()) {
                        if let ThreadState::Ready(msgs) = &mut self.thread {
                            for msg in msgs.iter_mut() {
                                if updated.iter().any(|u| u.id == msg.id) {
                                    msg.read = true;
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    // Never blocks rendering
                    warn!(%err, %peer_id, "mark-read failed");
                    self.push_remote_notice("could not mark messages as read", &err);
                }
            },
        }
    }

    /// One batched mark-read call for the viewer's unread messages in a
    /// freshly loaded thread
    fn mark_thread_read(&mut self, peer_id: &str, msgs: &[Message]) {
        let Some(viewer) = self.viewer.as_ref() else {
            return;
        };
        let up_to = msgs
            .iter()
            .filter(|m| m.receiver_id == viewer.id && !m.read)
            .map(|m| m.timestamp)
            .max();
        let Some(up_to) = up_to else {
            return;
        };

        let messages = self.messages.clone();
        let tx = self.tx.clone();
        let viewer_id = viewer.id.clone();
        let peer = peer_id.to_string();
        tokio::spawn(async move {
            let result = messages.mark_read_up_to(&viewer_id, &peer, up_to).await;
            let _ = tx.send(ViewEvent::MarkedRead {
                peer_id: peer,
                result,
            });
        });
    }

    fn push_remote_notice(&mut self, context: &str, err: &Error) {
        warn!(%err, "{}", context);
        let level = if err.is_setup_required() {
            NoticeLevel::SetupRequired
        } else {
            NoticeLevel::Warning
        };
        self.notices.push(Notice {
            level,
            text: format!("{}: {}", context, err),
        });
    }

    // --- accessors for the rendering host ---

    /// Current lifecycle state
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// The authenticated viewer, once initialized
    pub fn viewer(&self) -> Option<&Identity> {
        self.viewer.as_ref()
    }

    /// The listing to display (search results or the full directory)
    pub fn roster(&self) -> &[UserRecord] {
        &self.roster
    }

    /// The most recent message exchanged with a peer, if known
    pub fn last_message(&self, peer_id: &str) -> Option<&Message> {
        self.last_index.get(peer_id)
    }

    /// The selected peer id
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// State of the selected thread
    pub fn thread(&self) -> &ThreadState {
        &self.thread
    }

    /// State of the compose control
    pub fn compose(&self) -> &ComposeState {
        &self.compose
    }

    /// The current draft text
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Drain accumulated notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
