use emotion_acting::camera::{self, CameraManager};
use emotion_acting::config::ActingConfig;
use emotion_acting::error::{ActingError, Result};
use emotion_acting::image_manager::ImageManager;
use emotion_acting::onnx::OnnxEmotionClassifier;
use emotion_acting::session::start_session;
use emotion_acting::ui::{ActingApp, UiSink};
use emotion_acting::EmotionClassifier;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system (file only, no console output)
fn init_logging(config: &ActingConfig) -> Result<()> {
    let log_file = std::fs::File::create(&config.log_file).map_err(ActingError::Io)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let config = ActingConfig::load(Path::new("."))?;
    init_logging(&config)?;

    match CameraManager::list_devices() {
        Ok(devices) => info!("Cameras: {:?}", devices),
        Err(e) => warn!("Could not list cameras: {}", e),
    }

    let runtime = tokio::runtime::Runtime::new()?;

    let classifier: Arc<dyn EmotionClassifier> =
        Arc::new(OnnxEmotionClassifier::new(&config.model)?);

    let mut image_manager = ImageManager::new(&config.assets_dir);
    if let Err(e) = image_manager.load() {
        error!("Failed to load reference images: {}", e);
    }

    let sink = UiSink::new();
    let (sampler, session) =
        start_session(&config, classifier, Arc::new(sink.clone()), runtime.handle());
    let capture = camera::spawn_capture(config.camera.clone(), sampler);

    let result = eframe::run_native(
        "Emotion Acting",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([720.0, 900.0])
                .with_title("Emotion Acting"),
            ..Default::default()
        },
        Box::new(move |cc| {
            sink.attach(cc.egui_ctx.clone());
            Ok(Box::new(ActingApp::new(sink, image_manager)))
        }),
    );

    if let Err(e) = result {
        error!("Application error: {}", e);
    }

    // Stops the game; the capture thread sees the closed phase channel and exits
    session.cancel();
    match capture.join() {
        Ok(Err(e)) => error!("Camera capture failed: {}", e),
        Err(_) => error!("Camera capture thread panicked"),
        Ok(Ok(())) => {}
    }

    Ok(())
}
