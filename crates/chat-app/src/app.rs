//! Main egui application: composes the panels and drives the backend.
//!
//! Async work runs on `spawn_local` and reports back through shared slots
//! or the EventBus; `update` never blocks on it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};

use chat_core::bot_flow::BotState;
use chat_core::context::{BackendContext, Backends};
use chat_core::directory::DepartmentDirectory;
use chat_core::event_bus::EventBus;
use chat_core::ports::StoragePort;
use chat_core::resolver::SessionRequest;
use chat_core::translation::TranslationGateway;
use chat_core::translation_cache::TranslationRequest;
use chat_platform::chat_store::StorageChatRepository;
use chat_platform::identity::LocalIdentityProvider;
use chat_platform::profile_store::StorageProfileStore;
use chat_platform::storage::open_storage;
use chat_platform::translate::create_translator;
use chat_types::config::{ChatConfig, StorageBackendType, CONFIG_STORAGE_KEY};
use chat_types::event::ChatEvent;
use chat_types::identity::{Identity, IdentityKind, ViewerRole};
use chat_types::language::Language;
use chat_types::session::{CustomerContact, Department, SessionQuery};
use chat_types::{ChatError, Result};
use chat_ui::panels::chat::{chat_panel, ChatAction};
use chat_ui::panels::login::{login_panel, LoginAction};
use chat_ui::panels::prechat::{prechat_panel, PreChatAction};
use chat_ui::panels::session_list::session_list_panel;
use chat_ui::panels::settings::{settings_panel, SaveFeedback, SettingsAction};
use chat_ui::panels::{blocking_dialog, notices};
use chat_ui::state::{LiveMessageView, LoginForm, PreChatState, Screen, SessionListState, UiState};
use chat_ui::theme;

/// Subscriptions deliver over channels that cannot wake egui, so views are
/// polled at least this often while attached.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How often live queries are re-run against the store, for writes made in
/// another tab.
const REFRESH_INTERVAL_SECS: f64 = 1.0;

type Slot<T> = Rc<RefCell<Option<T>>>;

/// The main application state
pub struct LiveChatApp {
    ui_state: UiState,
    config: ChatConfig,
    events: EventBus,
    backend: Slot<BackendContext>,
    restored_config: Slot<ChatConfig>,
    /// Where the config lives: always the auto-detected store, so a switch
    /// to memory storage can be undone.
    config_storage: Slot<Rc<dyn StoragePort>>,
    prechat: PreChatState,
    login: Rc<RefCell<LoginForm>>,
    chat_view: Slot<LiveMessageView>,
    session_list: Slot<SessionListState>,
    save_feedback: Slot<SaveFeedback>,
    resolving: Rc<Cell<bool>>,
    refreshing: Rc<Cell<bool>>,
    last_refresh: f64,
    first_frame: bool,
    font_loaded: Rc<Cell<bool>>,
}

impl LiveChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ChatConfig::default();
        let events = EventBus::new();
        let app = Self {
            ui_state: UiState::new(config.default_language.clone()),
            config,
            events: events.clone(),
            backend: Rc::new(RefCell::new(None)),
            restored_config: Rc::new(RefCell::new(None)),
            config_storage: Rc::new(RefCell::new(None)),
            prechat: PreChatState::new(),
            login: Rc::new(RefCell::new(LoginForm::default())),
            chat_view: Rc::new(RefCell::new(None)),
            session_list: Rc::new(RefCell::new(None)),
            save_feedback: Rc::new(RefCell::new(None)),
            resolving: Rc::new(Cell::new(false)),
            refreshing: Rc::new(Cell::new(false)),
            last_refresh: 0.0,
            first_frame: true,
            font_loaded: Rc::new(Cell::new(false)),
        };

        Self::boot(
            cc.egui_ctx.clone(),
            events,
            app.backend.clone(),
            app.restored_config.clone(),
            app.config_storage.clone(),
        );
        app
    }

    /// Open storage, restore the saved config, build the backend context
    /// and restore the previous sign-in.
    fn boot(
        ctx: egui::Context,
        events: EventBus,
        backend_slot: Slot<BackendContext>,
        config_slot: Slot<ChatConfig>,
        config_storage: Slot<Rc<dyn StoragePort>>,
    ) {
        wasm_bindgen_futures::spawn_local(async move {
            let storage = match open_storage(&StorageBackendType::Auto).await {
                Ok(s) => s,
                Err(e) => {
                    log::error!("No storage backend available: {}", e);
                    events.emit(ChatEvent::BlockingError {
                        title: "Storage unavailable".to_string(),
                        message: e.to_string(),
                    });
                    ctx.request_repaint();
                    return;
                }
            };

            let config = Self::restore_config(storage.as_ref()).await;
            *config_storage.borrow_mut() = Some(storage.clone());
            let storage = if config.storage.backend == StorageBackendType::Auto {
                storage
            } else {
                match open_storage(&config.storage.backend).await {
                    Ok(s) => s,
                    Err(e) => {
                        log::warn!("Configured storage failed ({}), keeping auto-detected backend", e);
                        storage
                    }
                }
            };
            if let Err(e) = config.validate() {
                log::warn!("Config problem: {}", e);
                events.notice(e.to_string());
            }

            let backends = Backends {
                repository: Rc::new(StorageChatRepository::new(storage.clone())),
                identity: Rc::new(LocalIdentityProvider::new(storage.clone(), config.agents.clone())),
                translator: create_translator(&config.translation),
                profiles: Rc::new(StorageProfileStore::new(storage.clone())),
                storage,
            };
            let backend = BackendContext::new(config.clone(), backends, events.clone());
            *config_slot.borrow_mut() = Some(config);
            *backend_slot.borrow_mut() = Some(backend.clone());

            if let Err(e) = backend.init().await {
                log::warn!("Could not restore sign-in: {}", e);
            }
            ctx.request_repaint();
        });
    }

    /// Restore config from storage, or the defaults
    async fn restore_config(storage: &dyn StoragePort) -> ChatConfig {
        match storage.get(CONFIG_STORAGE_KEY).await {
            Ok(Some(data)) => match serde_json::from_slice::<ChatConfig>(&data) {
                Ok(config) => {
                    log::info!("Config restored from storage");
                    config
                }
                Err(e) => {
                    log::warn!("Stored config unreadable ({}), using defaults", e);
                    ChatConfig::default()
                }
            },
            Ok(None) => ChatConfig::default(),
            Err(e) => {
                log::warn!("Config read failed: {}", e);
                ChatConfig::default()
            }
        }
    }

    /// Save config to storage (async, fire-and-forget)
    fn save_config(&self, ctx: &egui::Context) {
        let Some(storage) = self.config_storage.borrow().clone() else {
            return;
        };
        let feedback = self.save_feedback.clone();
        let json = match serde_json::to_vec(&self.config) {
            Ok(json) => json,
            Err(e) => {
                *feedback.borrow_mut() = Some(SaveFeedback {
                    message: format!("Could not encode settings: {}", e),
                    success: false,
                });
                return;
            }
        };
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = storage.set(CONFIG_STORAGE_KEY, &json).await;
            *feedback.borrow_mut() = Some(match result {
                Ok(()) => {
                    log::info!("Config saved to storage");
                    SaveFeedback {
                        message: "Saved".to_string(),
                        success: true,
                    }
                }
                Err(e) => {
                    log::error!("Config save failed: {}", e);
                    SaveFeedback {
                        message: format!("Save failed: {}", e),
                        success: false,
                    }
                }
            });
            ctx.request_repaint();
        });
    }

    /// Push edited settings into the live backend. Storage changes apply
    /// on the next reload.
    fn apply_config(&mut self) {
        if let Some(backend) = self.backend.borrow_mut().as_mut() {
            backend.translator = TranslationGateway::new(create_translator(&self.config.translation));
            backend.directory = DepartmentDirectory::from_config(&self.config);
            backend.config = self.config.clone();
        }
    }

    fn backend(&self) -> Option<BackendContext> {
        self.backend.borrow().clone()
    }

    /// Fetch a CJK font from the server and install it into egui so
    /// translated Chinese, Japanese and Korean text renders.
    fn load_cjk_font(ctx: egui::Context, loaded_flag: Rc<Cell<bool>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let window = match web_sys::window() {
                Some(w) => w,
                None => return,
            };
            let resp = match wasm_bindgen_futures::JsFuture::from(
                window.fetch_with_str("NotoSansCJK-Regular.otf"),
            )
            .await
            {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Failed to fetch CJK font: {:?}", e);
                    return;
                }
            };
            let resp: web_sys::Response = resp.into();
            let buf = match resp.array_buffer() {
                Ok(p) => match wasm_bindgen_futures::JsFuture::from(p).await {
                    Ok(b) => b,
                    Err(_) => return,
                },
                Err(_) => return,
            };
            let bytes = js_sys::Uint8Array::new(&buf).to_vec();

            let mut fonts = egui::FontDefinitions::default();
            fonts.font_data.insert(
                "noto_sans_cjk".to_owned(),
                egui::FontData::from_owned(bytes).into(),
            );
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .push("noto_sans_cjk".to_owned());

            ctx.set_fonts(fonts);
            loaded_flag.set(true);
            ctx.request_repaint();
            log::info!("CJK font loaded");
        });
    }

    fn spawn_translations(&self, requests: Vec<TranslationRequest>, ctx: &egui::Context) {
        if requests.is_empty() {
            return;
        }
        let Some(backend) = self.backend() else {
            return;
        };
        for request in requests {
            let gateway = backend.translator.clone();
            let ctx = ctx.clone();
            wasm_bindgen_futures::spawn_local(async move {
                request.run(gateway).await;
                ctx.request_repaint();
            });
        }
    }
}

impl eframe::App for LiveChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            Self::load_cjk_font(ctx.clone(), self.font_loaded.clone());
            self.first_frame = false;
        }

        if let Some(config) = self.restored_config.borrow_mut().take() {
            self.ui_state.language = config.default_language.clone();
            self.config = config;
        }

        // Drain events from the backend
        let events = self.events.drain();
        if !events.is_empty() {
            for event in events {
                self.react(&event, ctx);
                self.ui_state.process_events(vec![event]);
            }
            ctx.request_repaint();
        }

        self.refresh_live_queries(ctx);
        self.poll_views(ctx);
        self.advance_prechat(ctx);

        if let Some(text) = self.ui_state.take_retry_text() {
            if let Some(view) = self.chat_view.borrow_mut().as_mut() {
                if view.input_text.is_empty() {
                    view.input_text = text;
                }
            }
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Live Chat")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                let who = match self.ui_state.identity.as_ref().map(|i| &i.kind) {
                    Some(IdentityKind::Agent { email }) => format!("Agent: {}", email),
                    Some(IdentityKind::Anonymous) => "Customer".to_string(),
                    None => "Not signed in".to_string(),
                };
                ui.label(
                    RichText::new(format!(
                        "{} | {} | {}",
                        who,
                        self.ui_state.language.native_name(),
                        self.ui_state.status_text
                    ))
                    .color(theme::TEXT_SECONDARY)
                    .small(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .selectable_label(self.ui_state.show_settings, "Settings")
                        .clicked()
                    {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                    }
                    if self.ui_state.is_agent() && ui.button("Sign out").clicked() {
                        self.sign_out(ctx);
                    }
                });
            });
            notices(ui, &mut self.ui_state);
        });

        // ── Settings side panel ──────────────────────────────
        if self.ui_state.show_settings {
            let feedback = self.save_feedback.borrow().clone();
            let mut action = SettingsAction::None;
            SidePanel::right("settings_panel")
                .min_width(280.0)
                .max_width(350.0)
                .show(ctx, |ui| {
                    action = settings_panel(ui, &mut self.config, &self.ui_state.language, feedback.as_ref());
                });
            match action {
                SettingsAction::None => {}
                SettingsAction::Changed => {
                    *self.save_feedback.borrow_mut() = None;
                }
                SettingsAction::SaveClicked => match self.config.validate() {
                    Ok(()) => {
                        self.apply_config();
                        self.save_config(ctx);
                    }
                    Err(e) => {
                        *self.save_feedback.borrow_mut() = Some(SaveFeedback {
                            message: e.to_string(),
                            success: false,
                        });
                    }
                },
                SettingsAction::LanguageChanged(language) => self.change_language(language, ctx),
            }
        }

        // ── Main content ─────────────────────────────────────
        match self.ui_state.screen {
            Screen::PreChat => {
                CentralPanel::default().show(ctx, |ui| {
                    let action = prechat_panel(ui, &mut self.prechat);
                    self.handle_prechat(action, ctx);
                });
            }
            Screen::AgentLogin => {
                let action = CentralPanel::default()
                    .show(ctx, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(40.0);
                            login_panel(ui, &mut self.login.borrow_mut())
                        })
                        .inner
                    })
                    .inner;
                self.handle_login(action, ctx);
            }
            Screen::CustomerChat => {
                let action = CentralPanel::default()
                    .show(ctx, |ui| match self.chat_view.borrow_mut().as_mut() {
                        Some(view) => chat_panel(ui, view),
                        None => {
                            ui.label(RichText::new("Connecting...").color(theme::TEXT_SECONDARY));
                            ChatAction::None
                        }
                    })
                    .inner;
                self.handle_chat(action, ctx);
            }
            Screen::AgentDashboard => {
                let opened = SidePanel::left("session_list")
                    .min_width(240.0)
                    .show(ctx, |ui| match self.session_list.borrow_mut().as_mut() {
                        Some(list) => session_list_panel(ui, list),
                        None => {
                            ui.label(RichText::new("Loading queue...").color(theme::TEXT_SECONDARY));
                            None
                        }
                    })
                    .inner;
                if let Some(chat_id) = opened {
                    self.open_agent_chat(chat_id, ctx);
                }

                let action = CentralPanel::default()
                    .show(ctx, |ui| match self.chat_view.borrow_mut().as_mut() {
                        Some(view) => chat_panel(ui, view),
                        None => {
                            ui.label(
                                RichText::new("Select a chat from the queue.")
                                    .color(theme::TEXT_SECONDARY)
                                    .italics(),
                            );
                            ChatAction::None
                        }
                    })
                    .inner;
                self.handle_chat(action, ctx);
            }
        }

        blocking_dialog(ctx, &mut self.ui_state);

        if self.chat_view.borrow().is_some() || self.session_list.borrow().is_some() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

impl LiveChatApp {
    /// App-level reactions to backend events, before the UI projection sees them.
    fn react(&mut self, event: &ChatEvent, ctx: &egui::Context) {
        match event {
            ChatEvent::IdentityChanged { identity: Some(identity) } if identity.is_agent() => {
                self.login.borrow_mut().reset();
                self.open_dashboard(identity.clone(), ctx);
            }
            ChatEvent::IdentityChanged { identity: None } => {
                *self.chat_view.borrow_mut() = None;
                *self.session_list.borrow_mut() = None;
                self.prechat = PreChatState::new();
            }
            ChatEvent::BlockingError { .. } if self.prechat.flow().state().is_terminal() => {
                // Resolution failed; start the questionnaire over.
                self.prechat = PreChatState::new();
            }
            _ => {}
        }
    }

    /// Re-run live queries now and then so writes from other tabs show up.
    /// At most one refresh is in flight.
    fn refresh_live_queries(&mut self, ctx: &egui::Context) {
        if self.chat_view.borrow().is_none() && self.session_list.borrow().is_none() {
            return;
        }
        let now = ctx.input(|i| i.time);
        if self.refreshing.get() || now - self.last_refresh < REFRESH_INTERVAL_SECS {
            return;
        }
        let Some(backend) = self.backend() else {
            return;
        };
        self.last_refresh = now;
        self.refreshing.set(true);
        let refreshing = self.refreshing.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match backend.repository.refresh().await {
                Ok(0) => {}
                Ok(_) => ctx.request_repaint(),
                Err(e) => log::warn!("Live query refresh failed: {}", e),
            }
            refreshing.set(false);
        });
    }

    fn poll_views(&mut self, ctx: &egui::Context) {
        let mut requests = Vec::new();
        let mut emitted = Vec::new();

        if let Some(view) = self.chat_view.borrow_mut().as_mut() {
            let poll = view.poll();
            if poll.redraw {
                ctx.request_repaint();
            }
            emitted.extend(poll.events);
            requests.extend(view.pending_translations());
        }

        if let Some(list) = self.session_list.borrow_mut().as_mut() {
            let (changed, event) = list.poll();
            if changed {
                ctx.request_repaint();
            }
            emitted.extend(event);
        }

        if self.prechat.poll() {
            ctx.request_repaint();
        }
        requests.extend(self.prechat.pending_translations());

        for event in emitted {
            self.events.emit(event);
        }
        self.spawn_translations(requests, ctx);
    }

    /// Act on terminal bot states.
    fn advance_prechat(&mut self, ctx: &egui::Context) {
        match self.prechat.flow().state() {
            BotState::AgentHandoff => {
                self.prechat = PreChatState::new();
                self.ui_state.screen = Screen::AgentLogin;
            }
            BotState::Chat { .. } if !self.resolving.get() && self.ui_state.active_chat.is_none() => {
                if let Some(profile) = self.prechat.profile() {
                    self.ui_state.language = profile.language.clone();
                    self.resolve_session(profile.department, profile.language.clone(), profile.contact(), ctx);
                }
            }
            _ => {}
        }
    }

    fn handle_prechat(&mut self, action: PreChatAction, ctx: &egui::Context) {
        let result = match action {
            PreChatAction::None => return,
            PreChatAction::Input(input) => self.prechat.handle(input),
            PreChatAction::SubmitText => self.prechat.submit_text().map(|_| ()),
        };
        if let Err(e) = result {
            log::debug!("Pre-chat input ignored: {}", e);
        }
        ctx.request_repaint();
    }

    fn resolve_session(
        &mut self,
        department: Department,
        language: Language,
        contact: CustomerContact,
        ctx: &egui::Context,
    ) {
        let Some(backend) = self.backend() else {
            return;
        };
        self.resolving.set(true);
        let resolving = self.resolving.clone();
        let view_slot = self.chat_view.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            match open_customer_chat(&backend, department, language, contact).await {
                Ok((view, reused)) => {
                    let chat_id = view.chat_id().to_string();
                    *view_slot.borrow_mut() = Some(view);
                    backend.events.emit(ChatEvent::SessionReady { chat_id, reused });
                }
                Err(e) => {
                    log::error!("Session resolution failed: {}", e);
                    let title = if e.is_blocking() {
                        "Cannot start chat"
                    } else {
                        "Could not connect"
                    };
                    backend.events.emit(ChatEvent::BlockingError {
                        title: title.to_string(),
                        message: e.to_string(),
                    });
                }
            }
            resolving.set(false);
            ctx.request_repaint();
        });
    }

    fn open_agent_chat(&mut self, chat_id: String, ctx: &egui::Context) {
        let (Some(backend), Some(identity)) = (self.backend(), self.ui_state.identity.clone()) else {
            return;
        };
        let language = self.ui_state.language.clone();
        let view_slot = self.chat_view.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match attach_view(&backend, &chat_id, identity, language).await {
                Ok(view) => *view_slot.borrow_mut() = Some(view),
                Err(e) => {
                    log::error!("Could not open chat {}: {}", chat_id, e);
                    backend.events.notice(format!("Could not open chat: {}", e));
                }
            }
            ctx.request_repaint();
        });
    }

    /// Load the agent's preferred language and subscribe to their queue.
    fn open_dashboard(&mut self, identity: Identity, ctx: &egui::Context) {
        let Some(backend) = self.backend() else {
            return;
        };
        let department = backend.directory.department_of(&identity.id).or_else(|| {
            backend
                .config
                .agents
                .iter()
                .find(|a| a.agent_id == identity.id)
                .map(|a| a.department)
        });
        let Some(department) = department else {
            self.events.emit(ChatEvent::BlockingError {
                title: "No department".to_string(),
                message: format!("Agent {} is not assigned to a department.", identity.id),
            });
            return;
        };

        let list_slot = self.session_list.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let language = backend.profiles.preferred_language(&identity.id).await;
            backend.events.emit(ChatEvent::LanguageChanged { language });

            match backend.resolver().subscribe_department_queue(department).await {
                Ok(subscription) => {
                    let mut list = SessionListState::new(identity.id.clone(), department);
                    list.attach(subscription);
                    *list_slot.borrow_mut() = Some(list);
                }
                Err(e) => {
                    log::error!("Queue subscription failed: {}", e);
                    backend.events.emit(ChatEvent::SubscriptionLost {
                        reason: e.to_string(),
                    });
                }
            }
            ctx.request_repaint();
        });
    }

    fn handle_login(&mut self, action: LoginAction, ctx: &egui::Context) {
        match action {
            LoginAction::None => {}
            LoginAction::Back => {
                self.login.borrow_mut().reset();
                self.ui_state.screen = Screen::PreChat;
            }
            LoginAction::Submit { email, password } => {
                let Some(backend) = self.backend() else {
                    self.login.borrow_mut().fail("Still starting up, try again in a moment.");
                    return;
                };
                let form = self.login.clone();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = backend.sign_in_agent(&email, &password).await {
                        log::warn!("Agent sign-in failed for {}: {}", email, e);
                        form.borrow_mut().fail(match e {
                            ChatError::Auth(message) => message,
                            other => other.to_string(),
                        });
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    fn handle_chat(&mut self, action: ChatAction, ctx: &egui::Context) {
        match action {
            ChatAction::None => {}
            ChatAction::Send(text) => self.send_message(text, ctx),
            ChatAction::Close => self.close_chat(ctx),
            ChatAction::ChangeLanguage(language) => self.change_language(language, ctx),
            ChatAction::Leave => {
                *self.chat_view.borrow_mut() = None;
                if let Some(list) = self.session_list.borrow_mut().as_mut() {
                    list.selected = None;
                }
                if self.ui_state.screen == Screen::CustomerChat {
                    self.ui_state.active_chat = None;
                    self.ui_state.screen = Screen::PreChat;
                    self.prechat = PreChatState::new();
                }
            }
        }
    }

    fn send_message(&mut self, text: String, ctx: &egui::Context) {
        let Some(backend) = self.backend() else {
            return;
        };
        let (chat_id, identity, language) = match self.chat_view.borrow().as_ref() {
            Some(view) => (
                view.chat_id().to_string(),
                view.viewer().clone(),
                view.language().clone(),
            ),
            None => return,
        };
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = backend
                .conversation()
                .send(&chat_id, &identity, &text, &language)
                .await;
            match result {
                Ok(message) => log::debug!("Sent {} to {}", message.id, chat_id),
                Err(ChatError::EmptyMessage) => {}
                Err(ChatError::ChatClosed(_)) => {
                    backend.events.notice("This chat is closed. Your message was not sent.");
                }
                Err(e) => {
                    log::error!("Send to {} failed: {}", chat_id, e);
                    backend.events.emit(ChatEvent::MessageSendFailed {
                        chat_id,
                        text,
                        reason: e.to_string(),
                    });
                }
            }
            ctx.request_repaint();
        });
    }

    fn close_chat(&mut self, ctx: &egui::Context) {
        let Some(backend) = self.backend() else {
            return;
        };
        let Some(chat_id) = self.chat_view.borrow().as_ref().map(|v| v.chat_id().to_string()) else {
            return;
        };
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = backend.conversation().close(&chat_id).await {
                log::error!("Close of {} failed: {}", chat_id, e);
                backend.events.notice(format!("Could not close chat: {}", e));
            }
            ctx.request_repaint();
        });
    }

    /// Switch the viewer's language: re-translate the open view, then
    /// persist the choice (the session's customer language for customers,
    /// the agent's profile for agents).
    fn change_language(&mut self, language: Language, ctx: &egui::Context) {
        let role = self
            .ui_state
            .identity
            .as_ref()
            .map_or(ViewerRole::Customer, Identity::role);
        let chat_id = {
            let mut slot = self.chat_view.borrow_mut();
            match slot.as_mut() {
                Some(view) => {
                    view.set_language(language.clone());
                    Some(view.chat_id().to_string())
                }
                None => None,
            }
        };
        self.events.emit(ChatEvent::LanguageChanged {
            language: language.clone(),
        });

        let Some(backend) = self.backend() else {
            return;
        };
        let agent_id = self.ui_state.identity.as_ref().map(|i| i.id.clone());
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match (role, chat_id, agent_id) {
                (ViewerRole::Agent, _, Some(agent_id)) => {
                    match backend.profiles.set_preferred_language(&agent_id, &language).await {
                        Ok(true) => {}
                        Ok(false) => backend
                            .events
                            .notice("Language saved on this device only."),
                        Err(e) => {
                            log::error!("Saving preferred language failed: {}", e);
                            backend.events.notice(format!("Could not save language: {}", e));
                        }
                    }
                }
                (ViewerRole::Customer, Some(chat_id), _) => {
                    if let Err(e) = backend
                        .conversation()
                        .change_customer_language(&chat_id, language)
                        .await
                    {
                        log::error!("Language change for {} failed: {}", chat_id, e);
                        backend.events.notice(format!("Could not update chat language: {}", e));
                    }
                }
                _ => {}
            }
            ctx.request_repaint();
        });
    }

    fn sign_out(&mut self, ctx: &egui::Context) {
        let Some(backend) = self.backend() else {
            return;
        };
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = backend.sign_out().await {
                log::error!("Sign-out failed: {}", e);
                backend.events.notice(format!("Sign-out failed: {}", e));
            }
            ctx.request_repaint();
        });
    }
}

/// Sign in anonymously if needed, create or reuse the customer's chat and
/// open a view on it. Returns the view and whether the chat was reused.
async fn open_customer_chat(
    backend: &BackendContext,
    department: Department,
    language: Language,
    contact: CustomerContact,
) -> Result<(LiveMessageView, bool)> {
    let identity = backend.ensure_customer().await?;
    let request = SessionRequest {
        customer_id: identity.id.clone(),
        department,
        language: language.clone(),
        contact: Some(contact),
    };
    let resolution = backend.resolver().resolve_customer_session(&request).await?;
    let view = attach_view(backend, &resolution.session.id, identity, language).await?;
    Ok((view, resolution.reused))
}

/// Load a chat and open its two live subscriptions into a new view.
async fn attach_view(
    backend: &BackendContext,
    chat_id: &str,
    viewer: Identity,
    language: Language,
) -> Result<LiveMessageView> {
    let session = backend.conversation().load(chat_id).await?;
    let messages = backend.repository.subscribe_messages(chat_id).await?;
    let sessions = backend
        .repository
        .subscribe_sessions(
            SessionQuery::default()
                .customer(session.customer_id.clone())
                .department(session.department),
        )
        .await?;
    let mut view = LiveMessageView::new(chat_id, viewer, language);
    view.attach(session, messages, sessions);
    Ok(view)
}
