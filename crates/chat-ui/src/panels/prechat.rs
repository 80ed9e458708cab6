//! Pre-chat panel: role choice and the bot questionnaire.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};

use chat_core::bot_flow::{BotInput, BotState};
use chat_types::identity::ViewerRole;
use chat_types::language::Language;
use chat_types::session::Department;

use crate::panels::language_picker;
use crate::state::{PreChatLine, PreChatState};
use crate::theme::*;

/// What the visitor did this frame. Typed answers are left in the state's
/// input buffer and submitted through [`PreChatState::submit_text`].
pub enum PreChatAction {
    None,
    Input(BotInput),
    SubmitText,
}

pub fn prechat_panel(ui: &mut egui::Ui, state: &mut PreChatState) -> PreChatAction {
    let mut action = PreChatAction::None;
    let bot_state = state.flow().state();

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Live Chat").color(TEXT_PRIMARY).strong());
                if bot_state != BotState::RoleChoice {
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("Back").clicked() {
                            action = PreChatAction::Input(BotInput::BackToRoleChoice);
                        }
                    });
                }
            });
            ui.separator();

            let lines = state.lines();
            let available_height = ui.available_height() - 80.0;
            ScrollArea::vertical()
                .max_height(available_height)
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in &lines {
                        render_line(ui, line);
                        ui.add_space(4.0);
                    }
                });

            ui.add_space(8.0);

            match bot_state {
                BotState::RoleChoice => {
                    ui.horizontal(|ui| {
                        if primary_button(ui, "I'm a customer").clicked() {
                            action = PreChatAction::Input(BotInput::ChooseRole(ViewerRole::Customer));
                        }
                        if ui.button("I'm a support agent").clicked() {
                            action = PreChatAction::Input(BotInput::ChooseRole(ViewerRole::Agent));
                        }
                    });
                }
                BotState::Welcome => {
                    if primary_button(ui, "Continue").clicked() {
                        action = PreChatAction::Input(BotInput::Continue);
                    }
                }
                BotState::AskName | BotState::AskPhone => {
                    if text_row(ui, &mut state.input_text, input_hint(bot_state)) {
                        action = PreChatAction::SubmitText;
                    }
                }
                BotState::AskLanguage => {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Language").color(TEXT_SECONDARY).small());
                        let current = state.display_language();
                        if let Some(language) = language_picker(ui, "prechat_language", &current) {
                            action = PreChatAction::Input(BotInput::PickLanguage(language));
                        }
                        if ui.button(format!("Keep {}", Language::english().native_name())).clicked() {
                            action = PreChatAction::Input(BotInput::PickLanguage(Language::english()));
                        }
                    });
                    if text_row(ui, &mut state.input_text, "...or type a language") {
                        action = PreChatAction::SubmitText;
                    }
                }
                BotState::DepartmentSelection => {
                    ui.horizontal(|ui| {
                        for department in Department::all() {
                            if primary_button(ui, department.label()).clicked() {
                                action = PreChatAction::Input(BotInput::PickDepartment(*department));
                            }
                        }
                    });
                }
                BotState::Chat { .. } => {
                    ui.label(RichText::new("Connecting you to an agent...").color(TEXT_SECONDARY).italics());
                }
                BotState::AgentHandoff => {
                    ui.label(RichText::new("Opening agent sign-in...").color(TEXT_SECONDARY).italics());
                }
            }
        });

    action
}

fn input_hint(state: BotState) -> &'static str {
    match state {
        BotState::AskName => "Your name",
        BotState::AskPhone => "Phone number",
        _ => "Type here...",
    }
}

fn primary_button(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).color(TEXT_PRIMARY))
            .fill(ACCENT)
            .corner_radius(PANEL_ROUNDING)
            .min_size(Vec2::new(120.0, 28.0)),
    )
}

/// Single-line input with a send button. True when submitted.
fn text_row(ui: &mut egui::Ui, text: &mut String, hint: &str) -> bool {
    let mut submitted = false;
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(text)
                .hint_text(hint)
                .desired_width(ui.available_width() - 70.0),
        );
        let enabled = !text.trim().is_empty();
        let send = ui.add_enabled(
            enabled,
            egui::Button::new("Send")
                .fill(if enabled { ACCENT } else { BG_SURFACE })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(60.0, 0.0)),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (enter && enabled) || send.clicked() {
            submitted = true;
            response.request_focus();
        }
    });
    submitted
}

fn render_line(ui: &mut egui::Ui, line: &PreChatLine) {
    let (label, color, bg, align) = if line.from_bot {
        ("Assistant", SUCCESS, BUBBLE_BOT, Align::Min)
    } else {
        ("You", ACCENT, BUBBLE_OWN, Align::Max)
    };
    ui.with_layout(Layout::top_down(align), |ui| {
        egui::Frame::default()
            .fill(bg)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(BUBBLE_MAX_WIDTH);
                ui.label(RichText::new(label).color(color).strong().small());
                ui.label(RichText::new(&line.text).color(TEXT_PRIMARY));
            });
    });
}
