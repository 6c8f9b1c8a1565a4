use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::backend::{
    validate_display_name, BackendClient, Friend, Message, Principal, RpcError, Session,
    SessionError, SessionManager, UserProfile, MAX_DISPLAY_NAME_LEN,
};
use crate::cache::{Query, QueryCache};
use crate::call::CallSession;
use crate::ui::manage::filter_friends;

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Authentication gate phase. Views only ever mount under `Authenticated`,
/// and even then only once the profile query has settled to a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    Initializing,
    LoggingIn,
    AccessDenied { error: Option<String> },
    Authenticated,
}

/// Route table: `/`, `/friends`, `/chat/:username`, `/call/:username`.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    FriendsList,
    Manage,
    Chat(String),
    Call(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Filtering,
}

/// What the authenticated shell should show for the current profile state.
/// Derived, never stored, so the setup form cannot race the profile fetch.
#[derive(Debug, PartialEq)]
pub enum ProfileGate<'a> {
    Loading,
    Setup,
    Error(&'a str),
    Ready(&'a UserProfile),
}

pub fn profile_gate(profile: &Query<Option<UserProfile>>) -> ProfileGate<'_> {
    if let Some(msg) = profile.error() {
        return ProfileGate::Error(msg);
    }
    match profile.data() {
        None => ProfileGate::Loading,
        Some(None) => ProfileGate::Setup,
        Some(Some(p)) => ProfileGate::Ready(p),
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub error: bool,
    expires: Instant,
}

/// Outcomes of spawned backend work, drained on the app tick. Cache
/// invalidation for a mutation happens here, strictly after that mutation
/// settled.
pub enum AppEvent {
    SessionRestored(Option<Session>),
    LoginFinished(Result<Session, SessionError>),
    ProfileFetched(Result<Option<UserProfile>, RpcError>),
    FriendsFetched(Result<Vec<Friend>, RpcError>),
    MessagesFetched {
        friend: String,
        result: Result<Vec<Message>, RpcError>,
    },
    ProfileSaved(Result<(), RpcError>),
    FriendAdded {
        username: String,
        result: Result<(), RpcError>,
    },
    FriendRemoved {
        username: String,
        result: Result<(), RpcError>,
    },
    MessageSent {
        friend: String,
        result: Result<(), RpcError>,
    },
}

pub struct App {
    pub should_quit: bool,
    pub gate: Gate,
    pub view: View,
    pub input_mode: InputMode,
    pub input: String,
    pub cursor_position: usize,

    server: String,
    session_mgr: Arc<SessionManager>,
    pub session: Option<Session>,
    client: Option<BackendClient>,

    pub cache: QueryCache,
    pub call: Option<CallSession>,

    // Per-view state
    pub friends_selected: usize,
    pub manage_selected: usize,
    pub manage_filter: String,
    pub confirm_remove: Option<String>,
    /// Lines scrolled up from the newest message; 0 means follow the bottom.
    pub chat_scroll_up: usize,

    // Pending-mutation flags, to block double submits
    pub saving_profile: bool,
    pub adding_friend: bool,
    pub removing_friend: bool,
    pub sending_message: bool,

    pub toast: Option<Toast>,

    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(server: String, session_mgr: SessionManager) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session_mgr = Arc::new(session_mgr);

        // Kick off session restore; the gate stays in Initializing until it
        // settles.
        {
            let mgr = session_mgr.clone();
            let tx = events_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::SessionRestored(mgr.restore().await));
            });
        }

        Self {
            should_quit: false,
            gate: Gate::Initializing,
            view: View::FriendsList,
            input_mode: InputMode::Normal,
            input: String::new(),
            cursor_position: 0,

            server,
            session_mgr,
            session: None,
            client: None,

            cache: QueryCache::new(),
            call: None,

            friends_selected: 0,
            manage_selected: 0,
            manage_filter: String::new(),
            confirm_remove: None,
            chat_scroll_up: 0,

            saving_profile: false,
            adding_friend: false,
            removing_friend: false,
            sending_message: false,

            toast: None,

            events_tx,
            events_rx,
        }
    }

    pub fn caller(&self) -> Option<&Principal> {
        self.session.as_ref().map(|s| &s.principal)
    }

    pub fn handle_input(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            self.handle_key_event(key);
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.gate.clone() {
            Gate::Initializing | Gate::LoggingIn => {
                if key.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            Gate::AccessDenied { .. } => match key.code {
                KeyCode::Char('l') | KeyCode::Enter => self.start_login(),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            Gate::Authenticated => {
                let has_error = self.cache.profile.error().is_some();
                let profile_absent = matches!(self.cache.profile.data(), Some(None));
                if has_error {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('r') => self.cache.profile.invalidate(),
                        KeyCode::Char('o') => self.logout(),
                        _ => {}
                    }
                } else if !self.cache.profile.is_fetched() {
                    if key.code == KeyCode::Char('q') {
                        self.should_quit = true;
                    }
                } else if profile_absent {
                    self.handle_profile_setup_key(key);
                } else {
                    self.handle_view_key(key);
                }
            }
        }
    }

    fn handle_profile_setup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.save_profile(),
            KeyCode::Esc => {
                self.input.clear();
                self.cursor_position = 0;
            }
            code => {
                self.edit_input_bounded(code, MAX_DISPLAY_NAME_LEN);
            }
        }
    }

    fn handle_view_key(&mut self, key: KeyEvent) {
        match self.view.clone() {
            View::FriendsList => self.handle_friends_key(key),
            View::Manage => self.handle_manage_key(key),
            View::Chat(friend) => self.handle_chat_key(key, &friend),
            View::Call(_) => self.handle_call_key(key),
        }
    }

    fn handle_friends_key(&mut self, key: KeyEvent) {
        let count = self.cache.friends.data().map_or(0, Vec::len);
        match key.code {
            KeyCode::Up => {
                self.friends_selected = self.friends_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if count > 0 && self.friends_selected < count - 1 {
                    self.friends_selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if let Some(username) = self.selected_friend() {
                    self.open_chat(&username);
                }
            }
            KeyCode::Char('v') => {
                if let Some(username) = self.selected_friend() {
                    self.start_call(&username);
                }
            }
            KeyCode::Char('m') | KeyCode::Char('f') => {
                self.view = View::Manage;
                self.manage_selected = 0;
                self.input.clear();
                self.cursor_position = 0;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Char('r') => self.cache.friends.invalidate(),
            KeyCode::Char('o') => self.logout(),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_manage_key(&mut self, key: KeyEvent) {
        // A pending remove-confirmation swallows everything else.
        if let Some(username) = self.confirm_remove.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.confirm_remove = None;
                    self.remove_friend(&username);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.confirm_remove = None,
                _ => {}
            }
            return;
        }

        match self.input_mode {
            InputMode::Editing => match key.code {
                KeyCode::Enter => self.add_friend(),
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                }
                code => {
                    self.edit_input_bounded(code, MAX_DISPLAY_NAME_LEN);
                }
            },
            InputMode::Filtering => match key.code {
                KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Char(c) => {
                    self.manage_filter.push(c);
                    self.manage_selected = 0;
                }
                KeyCode::Backspace => {
                    self.manage_filter.pop();
                    self.manage_selected = 0;
                }
                _ => {}
            },
            InputMode::Normal => {
                let visible = self
                    .cache
                    .friends
                    .data()
                    .map_or(0, |f| filter_friends(f, &self.manage_filter).len());
                match key.code {
                    KeyCode::Char('a') | KeyCode::Char('i') => {
                        self.input_mode = InputMode::Editing;
                    }
                    KeyCode::Char('/') => self.input_mode = InputMode::Filtering,
                    KeyCode::Up => {
                        self.manage_selected = self.manage_selected.saturating_sub(1);
                    }
                    KeyCode::Down => {
                        if visible > 0 && self.manage_selected < visible - 1 {
                            self.manage_selected += 1;
                        }
                    }
                    KeyCode::Char('d') | KeyCode::Delete => {
                        if let Some(username) = self.selected_managed_friend() {
                            self.confirm_remove = Some(username);
                        }
                    }
                    KeyCode::Esc | KeyCode::Char('b') => self.back_to_friends(),
                    KeyCode::Char('o') => self.logout(),
                    KeyCode::Char('q') => self.should_quit = true,
                    _ => {}
                }
            }
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent, friend: &str) {
        match self.input_mode {
            InputMode::Editing => match key.code {
                KeyCode::Enter => self.send_message(friend),
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                code => {
                    self.edit_input(code);
                }
            },
            _ => match key.code {
                KeyCode::Char('i') => self.input_mode = InputMode::Editing,
                KeyCode::Up => self.chat_scroll_up += 1,
                KeyCode::Down => self.chat_scroll_up = self.chat_scroll_up.saturating_sub(1),
                KeyCode::PageUp => self.chat_scroll_up += 10,
                KeyCode::PageDown => self.chat_scroll_up = self.chat_scroll_up.saturating_sub(10),
                KeyCode::End => self.chat_scroll_up = 0,
                KeyCode::Char('v') => self.start_call(friend),
                KeyCode::Esc | KeyCode::Char('b') => self.back_to_friends(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn handle_call_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        if let Some(call) = self.call.as_mut() {
            match key.code {
                KeyCode::Char('m') => call.toggle_mute(),
                KeyCode::Char('v') => call.toggle_video(),
                KeyCode::Char('e') | KeyCode::Enter | KeyCode::Esc => call.end(now),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
        }
    }

    /// Name inputs enforce their cap while typing: insertions past the limit
    /// are dropped, editing and movement keys pass through.
    fn edit_input_bounded(&mut self, code: KeyCode, max_chars: usize) {
        if matches!(code, KeyCode::Char(_)) && self.input.chars().count() >= max_chars {
            return;
        }
        self.edit_input(code);
    }

    /// Shared single-line text editing over `self.input`.
    fn edit_input(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => {
                self.input.insert(self.cursor_position, c);
                self.cursor_position += c.len_utf8();
                true
            }
            KeyCode::Backspace => {
                if self.cursor_position > 0 {
                    let prev = previous_char_boundary(&self.input, self.cursor_position);
                    self.input.remove(prev);
                    self.cursor_position = prev;
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor_position < self.input.len() {
                    self.input.remove(self.cursor_position);
                }
                true
            }
            KeyCode::Left => {
                if self.cursor_position > 0 {
                    self.cursor_position =
                        previous_char_boundary(&self.input, self.cursor_position);
                }
                true
            }
            KeyCode::Right => {
                if self.cursor_position < self.input.len() {
                    self.cursor_position = next_char_boundary(&self.input, self.cursor_position);
                }
                true
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                true
            }
            KeyCode::End => {
                self.cursor_position = self.input.len();
                true
            }
            _ => false,
        }
    }

    fn selected_friend(&self) -> Option<String> {
        self.cache
            .friends
            .data()?
            .get(self.friends_selected)
            .map(|f| f.username.clone())
    }

    fn selected_managed_friend(&self) -> Option<String> {
        let friends = self.cache.friends.data()?;
        filter_friends(friends, &self.manage_filter)
            .get(self.manage_selected)
            .map(|f| f.username.clone())
    }

    fn open_chat(&mut self, friend: &str) {
        self.view = View::Chat(friend.to_string());
        self.input.clear();
        self.cursor_position = 0;
        self.chat_scroll_up = 0;
        self.input_mode = InputMode::Editing;
    }

    fn start_call(&mut self, friend: &str) {
        self.call = Some(CallSession::start(friend, Instant::now()));
        self.view = View::Call(friend.to_string());
        self.input_mode = InputMode::Normal;
    }

    fn back_to_friends(&mut self) {
        self.view = View::FriendsList;
        self.input.clear();
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;
    }

    // ── Session lifecycle ───────────────────────────────────────────────

    fn start_login(&mut self) {
        self.gate = Gate::LoggingIn;
        let mgr = self.session_mgr.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::LoginFinished(mgr.login().await));
        });
    }

    fn adopt_session(&mut self, session: Session) {
        info!(principal = %session.principal, "session established");
        self.client = Some(BackendClient::new(&self.server, &session.token));
        self.session = Some(session);
        self.gate = Gate::Authenticated;
    }

    fn logout(&mut self) {
        info!("logging out");
        // Cached query data goes first, so no protected data outlives its
        // session even for a tick.
        self.cache.clear();
        if let Some(session) = self.session.take() {
            let mgr = self.session_mgr.clone();
            tokio::spawn(async move {
                mgr.logout(&session).await;
            });
        }
        self.client = None;
        self.gate = Gate::AccessDenied { error: None };
        self.view = View::FriendsList;
        self.call = None;
        self.input.clear();
        self.cursor_position = 0;
        self.manage_filter.clear();
        self.confirm_remove = None;
        self.input_mode = InputMode::Normal;
        self.toast = None;
    }

    // ── Mutations ───────────────────────────────────────────────────────

    fn save_profile(&mut self) {
        if self.saving_profile {
            return;
        }
        let name = match validate_display_name(&self.input) {
            Ok(name) => name,
            Err(msg) => {
                self.show_toast(msg, true);
                return;
            }
        };
        let Some(client) = self.client.clone() else {
            return;
        };
        self.saving_profile = true;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.save_caller_user_profile(&UserProfile { name }).await;
            let _ = tx.send(AppEvent::ProfileSaved(result));
        });
    }

    fn add_friend(&mut self) {
        if self.adding_friend {
            return;
        }
        let username = self.input.trim().to_string();
        if username.is_empty() {
            return;
        }
        let Some(client) = self.client.clone() else {
            return;
        };
        self.adding_friend = true;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.add_friend(&username).await;
            let _ = tx.send(AppEvent::FriendAdded { username, result });
        });
    }

    fn remove_friend(&mut self, username: &str) {
        if self.removing_friend {
            return;
        }
        let Some(client) = self.client.clone() else {
            return;
        };
        self.removing_friend = true;
        let username = username.to_string();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.remove_friend(&username).await;
            let _ = tx.send(AppEvent::FriendRemoved { username, result });
        });
    }

    fn send_message(&mut self, friend: &str) {
        if self.sending_message {
            return;
        }
        // Whitespace-only input never reaches the backend.
        let Some(content) = prepare_outgoing(&self.input) else {
            return;
        };
        let Some(client) = self.client.clone() else {
            return;
        };
        self.sending_message = true;
        let friend = friend.to_string();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.send_message(&friend, &content).await;
            let _ = tx.send(AppEvent::MessageSent { friend, result });
        });
    }

    // ── Tick ────────────────────────────────────────────────────────────

    pub fn on_tick(&mut self) {
        let now = Instant::now();

        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event, now);
        }

        if self.gate == Gate::Authenticated {
            self.issue_due_fetches(now);
        }

        if let Some(call) = &self.call {
            if call.should_return(now) {
                self.call = None;
                self.view = View::FriendsList;
                self.input_mode = InputMode::Normal;
            }
        }

        if let Some(toast) = &self.toast {
            if now >= toast.expires {
                self.toast = None;
            }
        }
    }

    /// Issue fetches whose key the current screen consumes. Keys nobody is
    /// looking at do not poll, which is also how navigation cancels a
    /// view's refresh timer.
    fn issue_due_fetches(&mut self, now: Instant) {
        let Some(client) = self.client.clone() else {
            return;
        };

        if self.cache.profile.needs_fetch(now) && self.cache.profile.begin_fetch() {
            let tx = self.events_tx.clone();
            let client = client.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppEvent::ProfileFetched(
                    client.get_caller_user_profile().await,
                ));
            });
        }

        // The other keys only matter once a completed profile is on screen.
        if !matches!(profile_gate(&self.cache.profile), ProfileGate::Ready(_)) {
            return;
        }

        match self.view.clone() {
            View::FriendsList | View::Manage => {
                if self.cache.friends.needs_fetch(now) && self.cache.friends.begin_fetch() {
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppEvent::FriendsFetched(client.get_friends_list().await));
                    });
                }
            }
            View::Chat(friend) => {
                let query = self.cache.messages_mut(&friend);
                if query.needs_fetch(now) && query.begin_fetch() {
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = client.get_messages_with_friend(&friend).await;
                        let _ = tx.send(AppEvent::MessagesFetched { friend, result });
                    });
                }
            }
            View::Call(_) => {}
        }
    }

    fn apply_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::SessionRestored(Some(session)) => self.adopt_session(session),
            AppEvent::SessionRestored(None) => {
                self.gate = Gate::AccessDenied { error: None };
            }
            AppEvent::LoginFinished(Ok(session)) => self.adopt_session(session),
            AppEvent::LoginFinished(Err(e)) => {
                warn!("login failed: {}", e);
                self.gate = Gate::AccessDenied {
                    error: Some(e.to_string()),
                };
            }
            AppEvent::ProfileFetched(result) => {
                self.cache
                    .profile
                    .resolve(now, result.map_err(|e| e.to_string()));
            }
            AppEvent::FriendsFetched(result) => {
                self.cache
                    .friends
                    .resolve(now, result.map_err(|e| e.to_string()));
                // The manage marker tracks the filtered list, not the full one.
                if let Some(friends) = self.cache.friends.data() {
                    let total = friends.len();
                    let visible = filter_friends(friends, &self.manage_filter).len();
                    self.friends_selected = self.friends_selected.min(total.saturating_sub(1));
                    self.manage_selected = self.manage_selected.min(visible.saturating_sub(1));
                }
            }
            AppEvent::MessagesFetched { friend, result } => {
                self.cache
                    .messages_mut(&friend)
                    .resolve(now, result.map_err(|e| e.to_string()));
            }
            AppEvent::ProfileSaved(result) => {
                self.saving_profile = false;
                match result {
                    Ok(()) => {
                        self.input.clear();
                        self.cursor_position = 0;
                        self.cache.profile.invalidate();
                        self.show_toast("Profile created! Welcome to Amity.", false);
                    }
                    Err(e) => {
                        warn!("profile save failed: {}", e);
                        self.show_toast("Failed to save profile. Please try again.", true);
                    }
                }
            }
            AppEvent::FriendAdded { username, result } => {
                self.adding_friend = false;
                match result {
                    Ok(()) => {
                        self.input.clear();
                        self.cursor_position = 0;
                        self.cache.friends.invalidate();
                        self.show_toast(&format!("{} added to your friends!", username), false);
                    }
                    Err(e) if e.is_duplicate_friend() => {
                        self.show_toast("This friend is already in your list.", true);
                    }
                    Err(e) if e.is_empty_username() => {
                        self.show_toast("Please enter a username.", true);
                    }
                    Err(e) => self.show_toast(&e.to_string(), true),
                }
            }
            AppEvent::FriendRemoved { username, result } => {
                self.removing_friend = false;
                match result {
                    Ok(()) => {
                        self.cache.friends.invalidate();
                        self.show_toast(&format!("{} removed from friends.", username), false);
                    }
                    Err(e) => self.show_toast(&e.to_string(), true),
                }
            }
            AppEvent::MessageSent { friend, result } => {
                self.sending_message = false;
                match result {
                    Ok(()) => {
                        self.input.clear();
                        self.cursor_position = 0;
                        self.chat_scroll_up = 0;
                        // Only this conversation's key is refreshed.
                        self.cache.messages_mut(&friend).invalidate();
                    }
                    Err(e) => {
                        warn!("send to {} failed: {}", friend, e);
                        self.show_toast("Failed to send message", true);
                    }
                }
            }
        }
    }

    fn show_toast(&mut self, text: &str, error: bool) {
        self.toast = Some(Toast {
            text: text.to_string(),
            error,
            expires: Instant::now() + TOAST_DURATION,
        });
    }
}

/// Trim outgoing chat input; `None` means nothing should be sent.
pub fn prepare_outgoing(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Terminal column for a cursor byte offset. `cursor_position` indexes
/// bytes; the screen counts characters, and they disagree on multibyte
/// input.
pub fn input_column(input: &str, cursor: usize) -> usize {
    input[..cursor].chars().count()
}

fn previous_char_boundary(s: &str, from: usize) -> usize {
    s[..from]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(s: &str, from: usize) -> usize {
    s[from..]
        .chars()
        .next()
        .map(|c| from + c.len_utf8())
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_input_is_never_sent() {
        assert_eq!(prepare_outgoing(""), None);
        assert_eq!(prepare_outgoing("   \t  "), None);
        assert_eq!(prepare_outgoing("\n"), None);
        assert_eq!(
            prepare_outgoing("  hi there  "),
            Some("hi there".to_string())
        );
    }

    #[test]
    fn setup_form_never_shows_while_profile_is_loading() {
        let mut profile: Query<Option<UserProfile>> = Query::new(None);
        assert_eq!(profile_gate(&profile), ProfileGate::Loading);

        profile.begin_fetch();
        assert_eq!(profile_gate(&profile), ProfileGate::Loading);

        // Only a settled null resolves to the setup form.
        profile.resolve(Instant::now(), Ok(None));
        assert_eq!(profile_gate(&profile), ProfileGate::Setup);
    }

    #[test]
    fn settled_profile_reaches_the_views() {
        let mut profile: Query<Option<UserProfile>> = Query::new(None);
        profile.begin_fetch();
        profile.resolve(
            Instant::now(),
            Ok(Some(UserProfile {
                name: "Alex Johnson".to_string(),
            })),
        );
        match profile_gate(&profile) {
            ProfileGate::Ready(p) => assert_eq!(p.name, "Alex Johnson"),
            other => panic!("unexpected gate: {:?}", other),
        }
    }

    #[test]
    fn failed_profile_fetch_is_an_error_state_not_setup() {
        let mut profile: Query<Option<UserProfile>> = Query::new(None);
        profile.begin_fetch();
        profile.resolve(Instant::now(), Err("boom".to_string()));
        assert_eq!(profile_gate(&profile), ProfileGate::Error("boom"));
    }

    #[test]
    fn cursor_column_counts_chars_not_bytes() {
        let s = "héllo";
        assert_eq!(input_column(s, 0), 0);
        // "hé" is three bytes but two columns.
        assert_eq!(input_column(s, 3), 2);
        assert_eq!(input_column(s, s.len()), 5);
    }

    #[tokio::test]
    async fn list_refresh_clamps_selection_to_the_filtered_view() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new("http://localhost:0", dir.path().join("session.toml"));
        let mut app = App::new("http://localhost:0".to_string(), mgr);

        app.manage_filter = "bob".to_string();
        app.manage_selected = 3;
        app.friends_selected = 10;

        let friends: Vec<Friend> = ["alice", "bob", "bobby", "carol", "dave"]
            .iter()
            .map(|name| Friend {
                username: name.to_string(),
                online: false,
            })
            .collect();
        app.apply_event(AppEvent::FriendsFetched(Ok(friends)), Instant::now());

        // Two friends match "bob"; the marker must stay on the visible list.
        assert_eq!(app.manage_selected, 1);
        assert_eq!(app.friends_selected, 4);
    }

    #[test]
    fn char_boundaries_handle_multibyte_input() {
        let s = "héllo";
        let after_h = next_char_boundary(s, 0);
        assert_eq!(after_h, 1);
        let after_e = next_char_boundary(s, after_h);
        assert_eq!(&s[..after_e], "hé");
        assert_eq!(previous_char_boundary(s, after_e), 1);
    }
}
