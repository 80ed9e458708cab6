//! Agent sign-in form.

use egui::{self, RichText, Vec2};

use crate::state::LoginForm;
use crate::theme::*;

pub enum LoginAction {
    None,
    Submit { email: String, password: String },
    Back,
}

pub fn login_panel(ui: &mut egui::Ui, form: &mut LoginForm) -> LoginAction {
    let mut action = LoginAction::None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.set_max_width(360.0);
            ui.heading(RichText::new("Agent sign in").color(TEXT_PRIMARY));
            ui.separator();

            ui.label(RichText::new("Email").color(TEXT_SECONDARY).small());
            ui.add_enabled(
                !form.busy,
                egui::TextEdit::singleline(&mut form.email).hint_text("agent@example.com"),
            );

            ui.add_space(4.0);
            ui.label(RichText::new("Password").color(TEXT_SECONDARY).small());
            let password = ui.add_enabled(
                !form.busy,
                egui::TextEdit::singleline(&mut form.password).password(true),
            );

            if let Some(error) = &form.error {
                ui.add_space(4.0);
                ui.label(RichText::new(error).color(ERROR).small());
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let enabled = form.can_submit();
                let sign_in = ui.add_enabled(
                    enabled,
                    egui::Button::new(RichText::new(if form.busy { "Signing in..." } else { "Sign in" }).strong())
                        .fill(if enabled { ACCENT } else { BG_SURFACE })
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(120.0, 28.0)),
                );
                let enter = password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if sign_in.clicked() || enter {
                    if let Some((email, password)) = form.submit() {
                        action = LoginAction::Submit { email, password };
                    }
                }
                if ui.add_enabled(!form.busy, egui::Button::new("Back")).clicked() {
                    action = LoginAction::Back;
                }
            });
        });

    action
}
