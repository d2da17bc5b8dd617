//! Transient notification stack, drawn over the bottom-right corner

use crate::ui::state::{AppState, NotificationLevel};
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct Notifications<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> Notifications<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ctx: &egui::Context) {
        if self.state.notifications.is_empty() {
            return;
        }

        let mut dismissed = None;

        egui::Area::new(egui::Id::new("notifications"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.set_max_width(340.0);

                // newest on top
                for notification in self.state.notifications.iter().rev().take(5) {
                    let is_error = notification.level == NotificationLevel::Error;

                    egui::Frame::none()
                        .fill(self.theme.notification_fill(is_error))
                        .rounding(self.theme.card_rounding)
                        .inner_margin(self.theme.spacing_sm * 1.5)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                let label = ui.label(
                                    RichText::new(&notification.text)
                                        .color(self.theme.text_primary),
                                );
                                let accessibility_text = if is_error {
                                    format!("Error: {}", notification.text)
                                } else {
                                    format!("Info: {}", notification.text)
                                };
                                label.widget_info(|| {
                                    egui::WidgetInfo::labeled(
                                        egui::WidgetType::Label,
                                        true,
                                        &accessibility_text,
                                    )
                                });

                                let close = ui.small_button("✕");
                                if close.clicked() {
                                    dismissed = Some(notification.id);
                                }
                                close.on_hover_text("Dismiss");
                            });
                        });
                    ui.add_space(self.theme.spacing_sm / 2.0);
                }
            });

        if let Some(id) = dismissed {
            self.state.dismiss_notification(id);
        }
    }
}
