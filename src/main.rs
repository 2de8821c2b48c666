//! Browse a folder of images and edit the `.txt` caption next to each one.

mod app;
mod error;
mod session;

use anyhow::Result;
use app::CaptionApp;
use session::CaptionSession;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut session = CaptionSession::new();
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 {
        let dir = PathBuf::from(&args[1]);
        if dir.is_dir() {
            if let Err(e) = session.open_folder(&dir) {
                log::warn!("{e}");
            }
        } else {
            eprintln!("Provided path is not a directory: {}", dir.display());
        }
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    let _ = eframe::run_native(
        "Image Caption Editor",
        native_options,
        Box::new(move |cc| {
            let mut app = CaptionApp::new(session);
            app.reload_current(&cc.egui_ctx);
            Box::new(app)
        }),
    );

    Ok(())
}
