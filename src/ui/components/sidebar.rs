//! Section navigation

use crate::ui::state::{AppState, Section};
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct Sidebar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let expanded = self.state.sidebar_open;

        ui.vertical(|ui| {
            ui.add_space(self.theme.spacing_sm);

            let toggle = ui.add(
                egui::Button::new(RichText::new("☰").size(18.0))
                    .min_size(Vec2::splat(36.0))
                    .frame(false),
            );
            toggle.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Toggle sidebar")
            });
            if toggle.clicked() {
                self.state.sidebar_open = !expanded;
            }

            ui.add_space(self.theme.spacing);

            for section in Section::ALL {
                let active = self.state.section == section;
                let text = if expanded {
                    format!("{}  {}", section.icon(), section.label())
                } else {
                    section.icon().to_string()
                };

                let color = if active {
                    self.theme.text_primary
                } else {
                    self.theme.text_muted
                };

                let mut button = egui::Button::new(RichText::new(text).size(15.0).color(color))
                    .min_size(Vec2::new(if expanded { 160.0 } else { 36.0 }, 36.0))
                    .rounding(self.theme.button_rounding);
                button = if active {
                    button.fill(self.theme.primary.gamma_multiply(0.35))
                } else {
                    button.frame(false)
                };

                let response = ui.add(button);
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, section.label())
                });
                if response.clicked() {
                    self.state.set_section(section);
                }
            }

            if let Some(session) = self.state.session() {
                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.add_space(self.theme.spacing_sm);
                    let avatar = format!("({})", session.initial());
                    let text = if expanded {
                        format!("{}  {}", avatar, session.name)
                    } else {
                        avatar
                    };
                    ui.label(RichText::new(text).color(self.theme.text_secondary));
                });
            }
        });
    }
}
