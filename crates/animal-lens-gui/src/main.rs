//! GUI entry point for Animal Lens

mod app;

use animal_lens_app::config::Config;
use animal_lens_app::models::Classifiers;
use app::AnimalLensApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    init_tracing();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });

    // Both models are needed before the screen can do anything
    let classifiers = match Classifiers::load(&config) {
        Ok(classifiers) => classifiers,
        Err(e) => {
            tracing::error!(error = %e, "failed to load classification models");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_min_inner_size([320.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Animal Lens",
        options,
        Box::new(move |cc| Ok(Box::new(AnimalLensApp::new(cc, config, classifiers)))),
    )
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("animal_lens=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
