// Camera module: webcam capture feeding the frame sampler

use crate::config::{CameraConfig, CameraPosition};
use crate::error::{ActingError, Result};
use crate::models::Frame;
use crate::sampler::FrameSampler;
use crate::transform::mirror_horizontal;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Owns an open camera stream
pub struct CameraManager {
    camera: Camera,
    mirror: bool,
}

impl CameraManager {
    /// Opens the configured camera
    pub fn new(config: &CameraConfig) -> Result<Self> {
        let (width, height) = config.quality.resolution();
        let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(width, height),
                FrameFormat::YUYV,
                config.frame_rate,
            ),
        ));

        let camera = Camera::new(CameraIndex::Index(config.index), requested_format)
            .map_err(ActingError::from)
            .inspect_err(|e| error!("Failed to open camera {}: {}", config.index, e))?;

        Ok(Self {
            camera,
            mirror: config.position == CameraPosition::Front,
        })
    }

    /// Lists available camera devices
    pub fn list_devices() -> Result<Vec<String>> {
        let devices = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
        Ok(devices
            .iter()
            .map(|info| info.human_name().to_string())
            .collect())
    }

    /// Returns the camera name
    pub fn camera_info(&self) -> String {
        self.camera.info().human_name().to_string()
    }

    /// Opens the stream and checks that frames come through
    pub fn open(&mut self) -> Result<()> {
        self.camera.open_stream()?;

        // Wait a moment for the camera to initialize
        std::thread::sleep(Duration::from_millis(200));

        self.camera.frame().map(|_| ()).map_err(|e| {
            error!("Camera stream not working: {}", e);
            ActingError::CameraInit(format!(
                "Camera stream not working: {e}. Make sure camera permissions are granted."
            ))
        })
    }

    /// Captures and decodes the next frame (blocking)
    pub fn next_frame(&mut self) -> Result<Frame> {
        let frame_data = self.camera.frame()?;

        let buffer = frame_data.decode_image::<RgbFormat>().map_err(|e| {
            ActingError::FrameProcessing(format!("Failed to decode frame: {e}"))
        })?;

        let (width, height) = (buffer.width(), buffer.height());
        let frame = Frame::new(buffer.into_raw(), width, height);
        if self.mirror {
            mirror_horizontal(frame)
        } else {
            Ok(frame)
        }
    }

    /// Opens the camera, retrying with the configured interval
    pub fn connect(config: &CameraConfig) -> Result<Self> {
        let attempts = config.reconnect_attempts.max(1);
        let interval = Duration::from_millis(config.reconnect_interval_ms);

        for attempt in 1..=attempts {
            let opened = Self::new(config).and_then(|mut manager| {
                manager.open()?;
                Ok(manager)
            });
            match opened {
                Ok(manager) => {
                    info!("Camera ready: {}", manager.camera_info());
                    return Ok(manager);
                }
                // Permission problems do not go away by retrying
                Err(ActingError::CameraAccessDenied) => {
                    return Err(ActingError::CameraAccessDenied)
                }
                Err(e) => {
                    warn!("Camera attempt {}/{} failed: {}", attempt, attempts, e);
                    if attempt < attempts {
                        std::thread::sleep(interval);
                    }
                }
            }
        }

        Err(ActingError::CameraInit(format!(
            "Failed to open camera after {attempts} attempts"
        )))
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        }
    }
}

/// Runs the capture loop on its own thread until the game ends.
///
/// The camera is opened on that thread. A camera that cannot be opened, or
/// that keeps failing after reconnects, ends the thread with an error; the
/// game itself is unaffected.
pub fn spawn_capture(config: CameraConfig, mut sampler: FrameSampler) -> JoinHandle<Result<()>> {
    std::thread::spawn(move || {
        let mut camera = CameraManager::connect(&config)?;
        let frame_duration = Duration::from_secs(1) / config.frame_rate.max(1);
        let mut errors = 0u32;

        while !sampler.is_finished() {
            let started = Instant::now();
            match camera.next_frame() {
                Ok(frame) => {
                    errors = 0;
                    sampler.on_frame(frame);
                }
                Err(e) => {
                    errors += 1;
                    warn!("Failed to capture frame: {}", e);
                    if errors >= config.max_frame_errors.max(1) {
                        warn!("Too many capture errors, reconnecting camera");
                        drop(camera);
                        camera = CameraManager::connect(&config)?;
                        errors = 0;
                    }
                }
            }

            // Rate limiting to the target frame rate
            let elapsed = started.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }

        info!("Game finished, stopping capture");
        Ok(())
    })
}
