//! Login and registration form

use crate::ui::state::{AppState, AuthMode, BusyAction};
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct AuthView<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> AuthView<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let mode = self.state.auth_form.mode;
        let submitting = self.state.busy_action() == Some(BusyAction::Auth);

        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("DIsol")
                    .size(32.0)
                    .strong()
                    .color(self.theme.primary),
            );
            ui.label(
                RichText::new("AI assistant for code, images and video")
                    .color(self.theme.text_muted),
            );
            ui.add_space(self.theme.spacing_lg);

            egui::Frame::none()
                .fill(self.theme.bg_secondary)
                .rounding(self.theme.card_rounding)
                .inner_margin(self.theme.spacing_lg)
                .show(ui, |ui| {
                    ui.set_width(320.0);

                    ui.horizontal(|ui| {
                        for (tab_mode, label) in
                            [(AuthMode::Login, "Sign in"), (AuthMode::Register, "Sign up")]
                        {
                            let tab = ui.selectable_label(mode == tab_mode, label);
                            if tab.clicked() {
                                self.state.auth_form.mode = tab_mode;
                            }
                        }
                    });

                    ui.add_space(self.theme.spacing);

                    let mut enter_pressed = false;

                    if mode == AuthMode::Register {
                        enter_pressed |= Self::field(ui, &mut self.state.auth_form.name, "Name", false);
                    }
                    enter_pressed |= Self::field(ui, &mut self.state.auth_form.email, "Email", false);
                    enter_pressed |=
                        Self::field(ui, &mut self.state.auth_form.password, "Password", true);

                    ui.add_space(self.theme.spacing);

                    let label = match (mode, submitting) {
                        (_, true) => "Please wait...",
                        (AuthMode::Login, false) => "Sign in",
                        (AuthMode::Register, false) => "Create account",
                    };
                    let button = egui::Button::new(
                        RichText::new(label).color(egui::Color32::WHITE),
                    )
                    .min_size(Vec2::new(ui.available_width(), 40.0))
                    .rounding(self.theme.button_rounding)
                    .fill(self.theme.primary);

                    let response = ui.add_enabled(!submitting, button);
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, !submitting, "Submit")
                    });

                    if (response.clicked() || enter_pressed) && !submitting {
                        self.state.submit_auth();
                    }
                });
        });
    }

    /// One labelled single-line field; returns true when Enter was pressed in it
    fn field(ui: &mut egui::Ui, value: &mut String, label: &str, password: bool) -> bool {
        ui.label(label);
        let response = ui.add(
            egui::TextEdit::singleline(value)
                .password(password)
                .desired_width(f32::INFINITY)
                .id(egui::Id::new(("auth_field", label))),
        );
        let accessibility_text = format!("{} input", label);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, &accessibility_text)
        });
        response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter))
    }
}
