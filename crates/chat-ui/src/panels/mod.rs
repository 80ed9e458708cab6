pub mod chat;
pub mod login;
pub mod prechat;
pub mod session_list;
pub mod settings;

use egui::RichText;

use chat_types::language::{Language, SUPPORTED_LANGUAGES};

use crate::theme::*;

/// Combo box over the supported languages, labelled with native names.
/// Returns the new language when the user picks a different one.
pub fn language_picker(ui: &mut egui::Ui, id_salt: &str, current: &Language) -> Option<Language> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id_salt)
        .selected_text(current.native_name())
        .height(320.0)
        .show_ui(ui, |ui| {
            for info in SUPPORTED_LANGUAGES {
                let selected = current.code() == info.code;
                let label = format!("{} ({})", info.native_name, info.name);
                if ui.selectable_label(selected, label).clicked() && !selected {
                    picked = Some(Language::new(info.code));
                }
            }
        });
    picked
}

/// Dismissable notice strip.
pub fn notices(ui: &mut egui::Ui, state: &mut crate::state::UiState) {
    let mut dismissed = None;
    for (index, notice) in state.notices.iter().enumerate() {
        let color = if notice.is_error { ERROR } else { SUCCESS };
        ui.horizontal(|ui| {
            ui.label(RichText::new(&notice.message).color(color).small());
            if ui.small_button("x").clicked() {
                dismissed = Some(index);
            }
        });
    }
    if let Some(index) = dismissed {
        state.dismiss_notice(index);
    }
}

/// Modal for blocking errors. Returns true when dismissed.
pub fn blocking_dialog(ctx: &egui::Context, state: &mut crate::state::UiState) -> bool {
    let Some(blocking) = state.blocking.clone() else {
        return false;
    };
    let mut dismissed = false;
    egui::Window::new(RichText::new(&blocking.title).color(ERROR).strong())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(RichText::new(&blocking.message).color(TEXT_PRIMARY));
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    if dismissed {
        state.dismiss_blocking();
    }
    dismissed
}
