//! Settings panel: display language, translation backend, department
//! routing and storage mode, with an explicit Save button.

use egui::{self, RichText, Vec2};

use chat_types::config::{ChatConfig, StorageBackendType, TranslationProvider};
use chat_types::language::Language;

use crate::panels::language_picker;
use crate::theme::*;

/// What the caller should do after rendering the settings panel
pub enum SettingsAction {
    /// Nothing changed
    None,
    /// A config field was edited
    Changed,
    /// The user clicked the explicit Save button
    SaveClicked,
    /// The viewer picked a new display language
    LanguageChanged(Language),
}

/// Save feedback passed in from the app layer
#[derive(Clone)]
pub struct SaveFeedback {
    pub message: String,
    pub success: bool,
}

pub fn settings_panel(
    ui: &mut egui::Ui,
    config: &mut ChatConfig,
    language: &Language,
    save_feedback: Option<&SaveFeedback>,
) -> SettingsAction {
    let mut changed = false;
    let mut save_clicked = false;
    let mut new_language = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
            ui.separator();

            // ── Language ─────────────────────────────────────
            ui.label(RichText::new("Language").color(ACCENT).strong());
            ui.add_space(2.0);
            ui.label(RichText::new("Show messages in").color(TEXT_SECONDARY).small());
            new_language = language_picker(ui, "settings_language", language);

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Translation ──────────────────────────────────
            ui.label(RichText::new("Translation").color(ACCENT).strong());
            ui.add_space(2.0);

            ui.label(RichText::new("Provider").color(TEXT_SECONDARY).small());
            egui::ComboBox::from_id_salt("translation_provider")
                .selected_text(config.translation.provider.label())
                .show_ui(ui, |ui| {
                    for p in TranslationProvider::all() {
                        if ui
                            .selectable_value(&mut config.translation.provider, *p, p.label())
                            .changed()
                        {
                            changed = true;
                        }
                    }
                });

            if config.translation.provider == TranslationProvider::Google {
                ui.add_space(4.0);
                ui.label(RichText::new("API Key").color(TEXT_SECONDARY).small());
                let api_key_edit = egui::TextEdit::singleline(&mut config.translation.api_key)
                    .password(true)
                    .hint_text("AIza...");
                if ui.add(api_key_edit).changed() {
                    changed = true;
                }

                ui.add_space(4.0);
                ui.label(RichText::new("Endpoint (optional)").color(TEXT_SECONDARY).small());
                let mut endpoint = config.translation.endpoint.clone().unwrap_or_default();
                if ui
                    .add(
                        egui::TextEdit::singleline(&mut endpoint)
                            .hint_text(config.translation.provider.default_endpoint()),
                    )
                    .changed()
                {
                    config.translation.endpoint = if endpoint.is_empty() {
                        None
                    } else {
                        Some(endpoint)
                    };
                    changed = true;
                }

                if config.translation.api_key.trim().is_empty() {
                    ui.label(
                        RichText::new("No key set: mock translations will be used.")
                            .color(WARNING)
                            .small()
                            .italics(),
                    );
                }
            }

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Departments ──────────────────────────────────
            ui.label(RichText::new("Department agents").color(ACCENT).strong());
            ui.add_space(2.0);
            for assignment in config.departments.iter_mut() {
                ui.label(RichText::new(assignment.department.label()).color(TEXT_SECONDARY).small());
                if ui.text_edit_singleline(&mut assignment.agent_id).changed() {
                    changed = true;
                }
            }

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Storage ──────────────────────────────────────
            ui.label(RichText::new("Storage").color(ACCENT).strong());
            ui.add_space(2.0);

            ui.label(RichText::new("Backend").color(TEXT_SECONDARY).small());
            egui::ComboBox::from_id_salt("storage_backend")
                .selected_text(storage_label(&config.storage.backend))
                .show_ui(ui, |ui| {
                    for backend in storage_options() {
                        let label = storage_label(&backend);
                        if ui
                            .selectable_value(&mut config.storage.backend, backend, label)
                            .changed()
                        {
                            changed = true;
                        }
                    }
                });

            ui.add_space(4.0);
            ui.label(
                RichText::new(storage_description(&config.storage.backend))
                    .color(TEXT_SECONDARY)
                    .small()
                    .italics(),
            );

            // ── Save Button ──────────────────────────────────
            ui.add_space(16.0);
            ui.separator();
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                let btn = ui.add(
                    egui::Button::new(
                        RichText::new("Save Settings")
                            .color(TEXT_PRIMARY)
                            .strong(),
                    )
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(120.0, 28.0)),
                );
                if btn.clicked() {
                    save_clicked = true;
                }

                if let Some(fb) = save_feedback {
                    let color = if fb.success { SUCCESS } else { ERROR };
                    ui.label(
                        RichText::new(&fb.message)
                            .color(color)
                            .small(),
                    );
                }
            });
        });

    if let Some(language) = new_language {
        SettingsAction::LanguageChanged(language)
    } else if save_clicked {
        SettingsAction::SaveClicked
    } else if changed {
        SettingsAction::Changed
    } else {
        SettingsAction::None
    }
}

fn storage_label(backend: &StorageBackendType) -> &'static str {
    match backend {
        StorageBackendType::Auto => "Auto-detect",
        StorageBackendType::Memory => "Memory",
        StorageBackendType::IndexedDb => "IndexedDB",
    }
}

fn storage_description(backend: &StorageBackendType) -> &'static str {
    match backend {
        StorageBackendType::Auto => "Uses IndexedDB when the browser allows it, otherwise memory. Applies on next reload.",
        StorageBackendType::Memory => "Chats are lost on reload. Useful for demos.",
        StorageBackendType::IndexedDb => "Chats survive page reloads. Applies on next reload.",
    }
}

fn storage_options() -> [StorageBackendType; 3] {
    [
        StorageBackendType::Auto,
        StorageBackendType::Memory,
        StorageBackendType::IndexedDb,
    ]
}
