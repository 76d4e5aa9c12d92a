//! Sandbox demo application
//!
//! Runs the engine headless: a scripted set of input events is fed to the
//! sandbox level and every frame's instance batch goes to a backend that only
//! logs it.
//!
//! Usage: `sandbox [config.toml|config.ron]`

mod behaviors;
mod level;

use level::SandboxLevel;
use scene_engine::assets::ResourceManager;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;

const FRAME_COUNT: u32 = 600;
const FRAME_TIME: f64 = 1.0 / 60.0;

/// Backend that logs batches instead of drawing them
#[derive(Default)]
struct LoggingBackend {
    frames: u64,
    peak_instances: usize,
}

impl RenderBackend for LoggingBackend {
    fn draw_instanced(&mut self, batch: &InstanceBatch) -> Result<(), RenderError> {
        self.frames += 1;
        self.peak_instances = self.peak_instances.max(batch.instance_count());
        log::trace!(
            "Frame {}: {} instances, {} bytes",
            self.frames,
            batch.instance_count(),
            batch.as_bytes().len()
        );
        Ok(())
    }
}

fn load_config() -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(EngineConfig::load_from_file(&path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn scripted_event(frame: u32) -> Option<Event> {
    match frame {
        120 => Some(Event::WindowResize { width: 1280, height: 720 }),
        300 => Some(Event::Key {
            key: keys::F5,
            action: KeyAction::Press,
            modifiers: KeyModifiers::empty(),
        }),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_filter(&config.log_level);
    log::info!("Starting sandbox...");

    // Headless run: size textures up front instead of reading them from disk
    let mut resources = ResourceManager::new(config.atlas.width, config.atlas.height);
    resources.register_texture_size("assets/player.png", 64, 64);
    resources.register_texture_size("assets/particles.png", 16, 16);
    resources.register_texture_size("assets/satellite.png", 128, 32);
    resources.register_texture_size("assets/enemy.png", 48, 48);

    let level = SandboxLevel::new(&config);
    let mut engine = Engine::with_resources(config, Box::new(resources))?;
    engine.start_level(Box::new(level))?;

    let mut backend = LoggingBackend::default();
    for frame in 0..FRAME_COUNT {
        if let Some(event) = scripted_event(frame) {
            log::info!("Frame {}: sending {}", frame, event.name());
            engine.events_mut().send(event);
        }
        engine.frame(FRAME_TIME, &mut backend)?;
    }

    let save_path = std::env::temp_dir().join("sandbox_level.ron");
    engine.save_level(&save_path.to_string_lossy())?;

    log::info!(
        "Ran {} frames, peak {} instances, {} live objects",
        backend.frames,
        backend.peak_instances,
        engine.manager().objects().len()
    );
    engine.shutdown();
    Ok(())
}
