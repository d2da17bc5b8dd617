//! Desktop user interface built on egui/eframe

mod app;
pub mod components;
mod state;
mod theme;

pub use app::DisolApp;
pub use state::{
    AppState, AuthForm, AuthMode, AuthState, BusyAction, ChatHistory, Notification,
    NotificationLevel, ProjectForm, Section, SpeechEvent, MAX_NOTIFICATIONS,
};
pub use theme::Theme;

use crate::config::AppConfig;

/// Run the DIsol application
pub fn run(config: AppConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("DIsol"),
        ..Default::default()
    };

    eframe::run_native(
        "DIsol",
        options,
        Box::new(move |cc| Ok(Box::new(DisolApp::new(cc, config)))),
    )
}
