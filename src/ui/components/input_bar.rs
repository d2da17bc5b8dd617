//! Input bar component
//!
//! Chat input with voice capture, send, and the generation badges.

use crate::gateway::ContentKind;
use crate::ui::state::{AppState, BusyAction};
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

/// Input bar for the chat section
pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        self.show_voice_button(ui);
                        ui.add_space(self.theme.spacing_sm);
                        self.show_text_input(ui);
                        ui.add_space(self.theme.spacing_sm);
                        self.show_send_button(ui);
                    });

                    ui.add_space(self.theme.spacing_sm);
                    self.show_generate_badges(ui);
                });
            });
    }

    fn show_voice_button(&mut self, ui: &mut egui::Ui) {
        let listening = self.state.is_listening();

        let (icon, tooltip, color) = if listening {
            ("⏹", "Stop listening", self.theme.listening)
        } else {
            ("🎤", "Dictate a message", self.theme.text_secondary)
        };

        let mut button = egui::Button::new(RichText::new(icon).size(20.0).color(color))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding);
        if listening {
            button = button.fill(self.theme.listening.gamma_multiply(0.2));
        }

        let response = ui.add(button);
        let button_rect = response.rect;

        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Voice input")
        });

        if response.clicked() {
            self.state.toggle_voice_input();
        }
        response.on_hover_text(tooltip);

        if listening {
            let t = ui.ctx().input(|i| i.time);
            let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;
            let radius = button_rect.width() / 2.0 + 2.0 + pulse * 3.0;

            ui.painter().circle_stroke(
                button_rect.center(),
                radius,
                egui::Stroke::new(
                    2.0 * pulse,
                    self.theme.listening.gamma_multiply(1.0 - pulse * 0.5),
                ),
            );

            ui.ctx().request_repaint();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.state.is_busy();
        let available_width = ui.available_width() - 60.0;

        let hint = if self.state.is_listening() {
            "Listening..."
        } else {
            "Ask something or describe what to build..."
        };

        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text(hint)
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("message_input"));

        let response = ui.add_enabled(enabled, text_edit);

        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, enabled, "Message input")
        });

        // singleline edits surrender focus on Enter
        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.send_message();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let sending = self.state.busy_action() == Some(BusyAction::SendMessage);
        let can_send = !self.state.input_text.trim().is_empty() && !self.state.is_busy();

        let icon = if sending { "⏳" } else { "➤" };
        let button_color = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new(icon).size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding)
            .fill(button_color);

        let response = ui.add_enabled(can_send, button);

        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
        });

        if response.clicked() {
            self.state.send_message();
        }

        response.on_hover_text("Send message (Enter)");
    }

    fn show_generate_badges(&mut self, ui: &mut egui::Ui) {
        let has_prompt = !self.state.input_text.trim().is_empty();
        let busy = self.state.busy_action();

        ui.horizontal(|ui| {
            ui.label(
                RichText::new("Generate:")
                    .size(12.0)
                    .color(self.theme.text_muted),
            );

            for kind in ContentKind::ALL {
                let running = busy == Some(BusyAction::Generate(kind));
                let enabled = has_prompt && busy.is_none();

                let text = if running {
                    format!("⏳ {}", kind.label())
                } else {
                    kind.label().to_string()
                };

                let button = egui::Button::new(RichText::new(text).size(12.0))
                    .rounding(self.theme.button_rounding)
                    .fill(if running {
                        self.theme.secondary.gamma_multiply(0.4)
                    } else {
                        self.theme.bg_tertiary
                    });

                let response = ui.add_enabled(enabled, button);
                let accessibility_text = format!("Generate {}", kind.as_str());
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, &accessibility_text)
                });

                if response.clicked() {
                    self.state.generate(kind);
                }
            }
        });
    }
}
