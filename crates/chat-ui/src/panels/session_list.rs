//! Agent dashboard sidebar: open chats waiting in the agent's department.

use egui::{self, RichText, ScrollArea};

use crate::state::{SessionBadge, SessionListState};
use crate::theme::*;

/// Returns the chat id the agent clicked, if any.
pub fn session_list_panel(ui: &mut egui::Ui, list: &mut SessionListState) -> Option<String> {
    let mut opened = None;

    ui.heading(RichText::new(format!("{} queue", list.department().label())).color(TEXT_PRIMARY));
    if !list.is_attached() {
        ui.label(RichText::new("Not receiving updates").color(WARNING).small());
    }
    ui.separator();

    let rows = list.rows();
    if rows.is_empty() {
        ui.label(RichText::new("No open chats.").color(TEXT_SECONDARY).italics());
        return None;
    }

    ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        for row in rows {
            let fill = if row.selected { BG_SURFACE } else { BG_SECONDARY };
            let response = egui::Frame::default()
                .fill(fill)
                .corner_radius(PANEL_ROUNDING)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(&row.title).color(TEXT_PRIMARY).strong());
                    ui.label(RichText::new(&row.subtitle).color(TEXT_SECONDARY).small());
                    ui.label(RichText::new(row.badge.label()).color(badge_color(row.badge)).small());
                })
                .response
                .interact(egui::Sense::click());
            if response.clicked() {
                opened = Some(row.chat_id.clone());
            }
            ui.add_space(4.0);
        }
    });

    if let Some(chat_id) = &opened {
        list.selected = Some(chat_id.clone());
    }
    opened
}

fn badge_color(badge: SessionBadge) -> egui::Color32 {
    match badge {
        SessionBadge::Yours => SUCCESS,
        SessionBadge::OtherAgent => TEXT_SECONDARY,
        SessionBadge::Unassigned => WARNING,
        SessionBadge::Closed => ERROR,
    }
}
