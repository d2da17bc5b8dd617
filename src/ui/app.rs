//! Main application struct and eframe integration

use crate::config::AppConfig;
use crate::gateway::{GatewayCommand, GatewayPipeline, Waker};
use crate::session::SessionStore;
use crate::speech::SpeechInput;
use crate::ui::components::{
    AuthView, InputBar, MessageList, Notifications, ProfileView, ProjectsView, Sidebar,
};
use crate::ui::state::{AppState, BusyAction, NotificationLevel, Section};
use crate::ui::theme::Theme;
use crossbeam_channel::Sender;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

/// Main DIsol application
pub struct DisolApp {
    state: AppState,
    theme: Theme,
    gateway: Option<(Sender<GatewayCommand>, JoinHandle<()>)>,
}

impl DisolApp {
    /// Create the application, start the gateway worker and restore the session
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        let repaint_ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || repaint_ctx.request_repaint());

        let pipeline = GatewayPipeline::new(config.gateway.clone()).with_waker(Arc::clone(&waker));
        let command_tx = pipeline.command_sender();
        let event_rx = pipeline.event_receiver();

        let mut state = AppState::new()
            .with_store(SessionStore::new(config.storage_dir()))
            .with_speech(SpeechInput::from_config(&config.speech))
            .with_waker(waker);

        let gateway = match pipeline.start_worker() {
            Ok(handle) => {
                state = state.with_gateway(command_tx.clone(), event_rx);
                Some((command_tx, handle))
            }
            Err(e) => {
                error!("failed to start gateway worker: {}", e);
                state.notify(NotificationLevel::Error, e.user_message());
                None
            }
        };

        state.restore();
        info!("DIsol UI initialized");

        Self {
            state,
            theme,
            gateway,
        }
    }

    /// Wrap an existing state without starting any workers
    pub fn with_state(state: AppState) -> Self {
        Self {
            state,
            theme: Theme::dark(),
            gateway: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Poll backend events and draw one frame
    pub fn show(&mut self, ctx: &egui::Context) {
        self.state.poll_events();

        if self.state.is_authenticated() {
            self.show_header(ctx);
            self.show_sidebar(ctx);
            match self.state.section {
                Section::Chat => self.show_chat(ctx),
                Section::Projects => self.show_projects(ctx),
                Section::Profile => self.show_profile(ctx),
            }
        } else {
            CentralPanel::default()
                .frame(egui::Frame::none().fill(self.theme.bg_primary))
                .show(ctx, |ui| {
                    AuthView::new(&mut self.state, &self.theme).show(ui);
                });
        }

        Notifications::new(&mut self.state, &self.theme).show(ctx);
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("DIsol")
                            .size(20.0)
                            .strong()
                            .color(self.theme.primary),
                    );
                    ui.label(
                        RichText::new(self.state.section.label())
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );

                    if self.state.section == Section::Chat {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if let Some(id) = self.state.chat_session_id {
                                ui.label(
                                    RichText::new(format!("#{}", id))
                                        .size(11.0)
                                        .family(egui::FontFamily::Monospace)
                                        .color(self.theme.text_muted),
                                );
                            }
                        });
                    }
                });
            });
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        let width = if self.state.sidebar_open { 190.0 } else { 56.0 };
        SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(width)
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(8.0))
            .show(ctx, |ui| {
                Sidebar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_chat(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });

        let messages = self.state.transcript.get_all();
        let waiting = self.state.busy_action() == Some(BusyAction::SendMessage);
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing, 0.0)),
            )
            .show(ctx, |ui| {
                MessageList::new(&messages, &self.theme)
                    .waiting(waiting)
                    .show(ui);
            });
    }

    fn show_projects(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                ProjectsView::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_profile(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                ProfileView::new(&mut self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for DisolApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);

        if self.state.is_listening() || self.state.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.speech.stop();

        if let Some((command_tx, handle)) = self.gateway.take() {
            let _ = command_tx.send(GatewayCommand::Shutdown);
            if handle.join().is_err() {
                error!("gateway worker panicked");
            }
        }
        info!("DIsol shutting down");
    }
}
