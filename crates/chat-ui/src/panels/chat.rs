//! Chat panel: the live conversation for either participant.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};

use chat_types::identity::ViewerRole;
use chat_types::language::Language;
use chat_types::message::SenderType;

use crate::panels::language_picker;
use crate::state::{LiveMessageView, MessageRow};
use crate::theme::*;

/// What the caller should do after rendering the chat panel
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    None,
    Send(String),
    /// Agent closes the chat
    Close,
    ChangeLanguage(Language),
    /// Leave the chat screen
    Leave,
}

pub fn chat_panel(ui: &mut egui::Ui, view: &mut LiveMessageView) -> ChatAction {
    let mut action = ChatAction::None;
    let role = view.role();

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    let title = view
                        .session()
                        .map(|s| s.display_title())
                        .unwrap_or_else(|| "Connecting...".to_string());
                    ui.heading(RichText::new(title).color(TEXT_PRIMARY).strong());

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button(if role == ViewerRole::Agent { "Back" } else { "Leave" }).clicked() {
                            action = ChatAction::Leave;
                        }
                        if role == ViewerRole::Agent
                            && ui
                                .add_enabled(!view.is_closed(), egui::Button::new("Close chat"))
                                .clicked()
                        {
                            action = ChatAction::Close;
                        }
                        if let Some(language) = language_picker(ui, "chat_language", view.language()) {
                            action = ChatAction::ChangeLanguage(language);
                        }
                        let (status, color) = if view.is_closed() {
                            ("Closed", ERROR)
                        } else if view.is_attached() {
                            ("Live", SUCCESS)
                        } else {
                            ("Offline", WARNING)
                        };
                        ui.label(RichText::new(status).color(color).small());
                    });
                });

                ui.separator();

                let rows = view.display_rows();
                let follow = view.scroll.should_follow();
                let jump = view.scroll.take_jump();

                let available_height = ui.available_height() - 60.0;
                let output = ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(follow)
                    .show(ui, |ui| {
                        if rows.is_empty() {
                            ui.label(
                                RichText::new("No messages yet.")
                                    .color(TEXT_SECONDARY)
                                    .italics(),
                            );
                        }
                        for row in &rows {
                            render_message(ui, row);
                            ui.add_space(4.0);
                        }
                        if jump {
                            ui.scroll_to_cursor(Some(Align::BOTTOM));
                        }
                    });
                view.scroll.observe(
                    output.state.offset.y,
                    output.inner_rect.height(),
                    output.content_size.y,
                );

                if view.scroll.show_jump_control()
                    && ui
                        .add(egui::Button::new(RichText::new("Scroll to latest ↓").small()).fill(BG_SURFACE))
                        .clicked()
                {
                    view.scroll.request_jump();
                }

                ui.add_space(8.0);

                // Input area
                let closed = view.is_closed();
                ui.horizontal(|ui| {
                    let hint = view.input_hint();
                    let input = egui::TextEdit::singleline(&mut view.input_text)
                        .hint_text(hint)
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add_enabled(!closed, input);

                    let send_enabled = view.can_send();
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if enter || send_btn.clicked() {
                        if let Some(text) = view.take_input() {
                            action = ChatAction::Send(text);
                            response.request_focus();
                        }
                    }
                });
            });
        });

    action
}

fn render_message(ui: &mut egui::Ui, row: &MessageRow) {
    let (label_color, bg) = match (row.is_own, row.sender_type) {
        (true, _) => (ACCENT, BUBBLE_OWN),
        (false, SenderType::Bot) => (SUCCESS, BUBBLE_BOT),
        (false, _) => (SUCCESS, BUBBLE_OTHER),
    };
    let layout = if row.is_own {
        Layout::top_down(Align::Max)
    } else {
        Layout::top_down(Align::Min)
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::default()
            .fill(bg)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(BUBBLE_MAX_WIDTH);
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&row.sender_label).color(label_color).strong().small());
                    ui.label(RichText::new(row.time_label()).color(TEXT_SECONDARY).small());
                });
                ui.label(RichText::new(&row.text).color(TEXT_PRIMARY));
                if let Some(caption) = source_caption(row.source) {
                    ui.label(RichText::new(caption).color(TEXT_SECONDARY).small().italics());
                }
            });
    });
}
