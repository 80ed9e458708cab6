//! WASM-target tests for chat-ui view state.

use wasm_bindgen_test::*;

use chat_core::bot_flow::{BotInput, BotState};
use chat_types::event::ChatEvent;
use chat_types::identity::ViewerRole;
use chat_types::language::Language;
use chat_ui::state::{PreChatState, Screen, ScrollTracker, UiState};

#[wasm_bindgen_test]
fn scroll_tracker_threshold() {
    let mut scroll = ScrollTracker::new();
    scroll.observe(380.0, 600.0, 1000.0);
    assert!(scroll.should_follow());
    scroll.observe(300.0, 600.0, 1000.0);
    assert!(!scroll.should_follow());
}

#[wasm_bindgen_test]
fn ui_state_session_ready_switches_screen() {
    let mut state = UiState::new(Language::english());
    state.process_events(vec![ChatEvent::SessionReady {
        chat_id: "c1".into(),
        reused: false,
    }]);
    assert_eq!(state.screen, Screen::CustomerChat);
    assert_eq!(state.status_text, "Connected");
}

#[wasm_bindgen_test]
fn prechat_agent_handoff() {
    let mut state = PreChatState::new();
    state.handle(BotInput::ChooseRole(ViewerRole::Agent)).unwrap();
    assert_eq!(state.flow().state(), BotState::AgentHandoff);
}
