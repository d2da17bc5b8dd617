//! Profile page: account details, logout and past conversations

use crate::ui::components::MessageList;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct ProfileView<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> ProfileView<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let Some(session) = self.state.session().cloned() else {
            return;
        };

        ui.heading("Your profile");
        ui.add_space(self.theme.spacing_sm);

        let mut logout = false;
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(Vec2::splat(48.0), egui::Sense::hover());
                    ui.painter().circle_filled(rect.center(), 24.0, self.theme.primary);
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        session.initial(),
                        egui::FontId::proportional(22.0),
                        egui::Color32::WHITE,
                    );

                    ui.vertical(|ui| {
                        ui.label(RichText::new(&session.name).strong().size(16.0));
                        ui.label(RichText::new(&session.email).color(self.theme.text_muted));
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let button = ui.button("Log out");
                        button.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Log out")
                        });
                        logout = button.clicked();
                    });
                });
            });

        if logout {
            self.state.logout();
            return;
        }

        ui.add_space(self.theme.spacing);
        self.show_history(ui);
    }

    fn show_history(&mut self, ui: &mut egui::Ui) {
        let mut refresh = false;
        let mut open = None;

        ui.horizontal(|ui| {
            ui.label(RichText::new("Conversation history").strong().size(16.0));
            if self.state.history.is_loading() {
                ui.spinner();
            }
            let button = ui.small_button("⟳");
            button.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Refresh history")
            });
            refresh = button.clicked();
        });

        ui.add_space(self.theme.spacing_sm);

        ui.columns(2, |columns| {
            egui::ScrollArea::vertical()
                .id_salt("history_sessions")
                .auto_shrink([false, false])
                .show(&mut columns[0], |ui| {
                    if self.state.history.sessions.is_empty() {
                        ui.label(
                            RichText::new("No conversations loaded").color(self.theme.text_muted),
                        );
                    }
                    for summary in &self.state.history.sessions {
                        let selected = self.state.history.selected == Some(summary.id);
                        let title = if summary.title.trim().is_empty() {
                            format!("Conversation #{}", summary.id)
                        } else {
                            summary.title.clone()
                        };
                        let local = summary.created_at.with_timezone(&chrono::Local);
                        let text = format!("{}\n{}", title, local.format("%d.%m.%Y %H:%M"));

                        let response = ui.selectable_label(selected, text);
                        let accessibility_text = format!("Conversation: {}", title);
                        response.widget_info(|| {
                            egui::WidgetInfo::selected(
                                egui::WidgetType::SelectableLabel,
                                true,
                                selected,
                                &accessibility_text,
                            )
                        });
                        if response.clicked() {
                            open = Some(summary.id);
                        }
                    }
                });

            if self.state.history.selected.is_some() {
                MessageList::new(&self.state.history.preview, self.theme)
                    .id_salt("history_preview")
                    .show(&mut columns[1]);
            } else {
                columns[1].label(
                    RichText::new("Select a conversation to read it").color(self.theme.text_muted),
                );
            }
        });

        if refresh {
            self.state.refresh_history();
        } else if let Some(session_id) = open {
            self.state.open_history_session(session_id);
        }
    }
}
