//! Project list with type filter and the "New project" form

use crate::gateway::{ContentKind, Project};
use crate::ui::state::{AppState, BusyAction};
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

/// Characters of project content shown on a card
const PREVIEW_CHARS: usize = 400;

pub struct ProjectsView<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> ProjectsView<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Your projects");
            if self.state.projects_loading() {
                ui.spinner();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let button = ui.button("➕ New project");
                button.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "New project")
                });
                if button.clicked() {
                    self.state.open_project_form();
                }
            });
        });

        ui.add_space(self.theme.spacing_sm);
        self.show_filter(ui);
        ui.add_space(self.theme.spacing_sm);

        if self.state.project_form.open {
            self.show_form(ui);
            ui.add_space(self.theme.spacing);
        }

        egui::ScrollArea::vertical()
            .id_salt("projects")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if self.state.projects.is_empty() {
                    ui.add_space(self.theme.spacing_lg);
                    ui.vertical_centered(|ui| {
                        let text = if self.state.projects_loading() {
                            "Loading projects..."
                        } else {
                            "No projects yet. Generate something from the chat."
                        };
                        ui.label(RichText::new(text).color(self.theme.text_muted));
                    });
                    return;
                }

                for project in &self.state.projects {
                    Self::show_card(ui, self.theme, project);
                    ui.add_space(self.theme.spacing_sm);
                }
            });
    }

    fn show_filter(&mut self, ui: &mut egui::Ui) {
        let current = self.state.project_filter;
        let mut selected = current;

        ui.horizontal(|ui| {
            let options = std::iter::once((None, "All"))
                .chain(ContentKind::ALL.iter().map(|kind| (Some(*kind), kind.label())));

            for (filter, label) in options {
                let response = ui.selectable_label(current == filter, label);
                let accessibility_text = format!("Filter: {}", label);
                response.widget_info(|| {
                    egui::WidgetInfo::selected(
                        egui::WidgetType::SelectableLabel,
                        true,
                        current == filter,
                        &accessibility_text,
                    )
                });
                if response.clicked() {
                    selected = filter;
                }
            }
        });

        if selected != current {
            self.state.set_project_filter(selected);
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        let creating = self.state.busy_action() == Some(BusyAction::CreateProject);
        let mut submit = false;
        let mut cancel = false;

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                let form = &mut self.state.project_form;

                ui.label(RichText::new("Create a project").strong());

                ui.label("Title");
                let title = ui.add(
                    egui::TextEdit::singleline(&mut form.title)
                        .desired_width(f32::INFINITY)
                        .id(egui::Id::new("project_title")),
                );
                title.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Project title")
                });

                ui.horizontal(|ui| {
                    ui.label("Type");
                    egui::ComboBox::from_id_salt("project_kind")
                        .selected_text(form.kind.label())
                        .show_ui(ui, |ui| {
                            for kind in ContentKind::ALL {
                                ui.selectable_value(&mut form.kind, kind, kind.label());
                            }
                        });

                    if form.kind == ContentKind::Code {
                        ui.label("Language");
                        let language = ui.add(
                            egui::TextEdit::singleline(&mut form.language)
                                .desired_width(140.0)
                                .hint_text("python"),
                        );
                        language.widget_info(|| {
                            egui::WidgetInfo::labeled(
                                egui::WidgetType::TextEdit,
                                true,
                                "Project language",
                            )
                        });
                    }
                });

                ui.label("Content");
                let content = ui.add(
                    egui::TextEdit::multiline(&mut form.content)
                        .code_editor()
                        .desired_rows(6)
                        .desired_width(f32::INFINITY),
                );
                content.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Project content")
                });

                ui.horizontal(|ui| {
                    let create = ui.add_enabled(
                        !creating,
                        egui::Button::new(if creating { "Creating..." } else { "Create" })
                            .fill(self.theme.primary),
                    );
                    create.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Button,
                            !creating,
                            "Create project",
                        )
                    });
                    submit = create.clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if submit {
            self.state.create_project();
        } else if cancel {
            self.state.close_project_form();
        }
    }

    fn show_card(ui: &mut egui::Ui, theme: &Theme, project: &Project) {
        egui::Frame::none()
            .fill(theme.bg_secondary)
            .rounding(theme.card_rounding)
            .inner_margin(theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                ui.horizontal(|ui| {
                    let title = ui.label(
                        RichText::new(&project.title)
                            .strong()
                            .size(16.0)
                            .color(theme.text_primary),
                    );
                    let accessibility_text = format!("Project: {}", project.title);
                    title.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Label,
                            true,
                            &accessibility_text,
                        )
                    });

                    egui::Frame::none()
                        .fill(theme.primary.gamma_multiply(0.3))
                        .rounding(theme.button_rounding)
                        .inner_margin(egui::Margin::symmetric(6.0, 2.0))
                        .show(ui, |ui| {
                            ui.label(RichText::new(project.kind.label()).size(11.0));
                        });

                    if let Some(language) = &project.language {
                        ui.label(
                            RichText::new(language)
                                .size(11.0)
                                .family(egui::FontFamily::Monospace)
                                .color(theme.text_muted),
                        );
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let local = project.created_at.with_timezone(&chrono::Local);
                        ui.label(
                            RichText::new(local.format("%d.%m.%Y %H:%M").to_string())
                                .size(11.0)
                                .color(theme.text_muted),
                        );
                    });
                });

                if project.content.is_empty() {
                    return;
                }

                ui.add_space(theme.spacing_sm / 2.0);
                match project.kind {
                    ContentKind::Code => {
                        egui::Frame::none()
                            .fill(theme.bg_primary)
                            .rounding(theme.button_rounding)
                            .inner_margin(theme.spacing_sm)
                            .show(ui, |ui| {
                                ui.set_min_size(Vec2::new(ui.available_width(), 0.0));
                                ui.label(
                                    RichText::new(preview(&project.content))
                                        .family(egui::FontFamily::Monospace)
                                        .size(12.0)
                                        .color(theme.text_secondary),
                                );
                            });
                    }
                    ContentKind::Image | ContentKind::Video => {
                        ui.hyperlink(&project.content);
                    }
                }
            });
    }
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((index, _)) => format!("{}…", &content[..index]),
        None => content.to_string(),
    }
}
