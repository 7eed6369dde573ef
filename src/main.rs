//! Hands-free mouse: head tracking cursor, blink clicks and voice commands.

use anyhow::{Context, Result};
use clap::Parser;
use head_voice_mouse::{
    app::{CameraOptions, HeadMouseApp},
    calibration::ScreenSize,
    cli::Args,
    config::{Config, EXAMPLE_CONFIG},
    cursor_control::CursorController,
    desktop::{LinuxDesktop, Pointer},
    landmarks::{FaceMeshDetector, InputLayout, PresenceGate, ScoreKind},
    pipeline::FramePipeline,
    state::{ShutdownSignal, VoiceActivation},
    voice::{
        router::CommandRouter,
        speech::{CommandRecognizer, CommandSynthesizer, NullRecognizer, SpeechRecognizer},
        Speaker, SpeechQueue, VoiceController, VoiceSettings,
    },
};
use log::{info, warn};
use std::sync::Arc;

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if let Some(path) = &args.write_config {
        std::fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("writing {}", path.display()))?;
        info!("Example configuration written to {}", path.display());
        return Ok(());
    }

    info!("Head + Voice Mouse");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    args.apply_to(&mut config);
    config.validate()?;

    // Shared between the frame loop and the voice thread
    let activation = Arc::new(VoiceActivation::new(false));
    let shutdown = ShutdownSignal::new();
    let queue = SpeechQueue::new();
    let speaker = queue.speaker();

    let (pointer, screen) = if args.no_cursor {
        info!("Cursor control disabled");
        (None, config.fallback_screen())
    } else {
        match CursorController::new() {
            Ok(controller) => {
                let screen = controller.screen_size();
                info!("X11 cursor control initialized ({}x{})", screen.width, screen.height);
                (Some(Box::new(controller) as Box<dyn Pointer>), screen)
            }
            Err(e) => {
                warn!("Failed to initialize cursor control: {}", e);
                (None, config.fallback_screen())
            }
        }
    };

    let voice = &config.voice;
    let shell_command = config
        .app_path(&voice.shell_process)
        .unwrap_or(&voice.shell_process)
        .to_string();
    let desktop = LinuxDesktop::new(shell_command, voice.screenshot_dir.clone(), voice.scroll_clicks);
    let router = CommandRouter::new(
        config.apps.clone(),
        voice.shell_process.clone(),
        voice.search_url.clone(),
        Box::new(desktop),
        speaker.clone(),
    );
    let recognizer: Box<dyn SpeechRecognizer> = if voice.enabled {
        Box::new(CommandRecognizer::new(voice.stt_program.clone(), voice.stt_args.clone()))
    } else {
        info!("Voice recognition disabled");
        Box::new(NullRecognizer)
    };
    let synthesizer = CommandSynthesizer::new(voice.tts_program.clone(), voice.tts_args.clone());

    let voice_handle = VoiceController::new(
        VoiceSettings::from(voice),
        Arc::clone(&activation),
        shutdown.clone(),
        queue,
        Box::new(synthesizer),
        recognizer,
        router,
    )
    .spawn()?;

    let result = run_frame_loop(&config, pointer, screen, activation, shutdown.clone(), speaker);

    shutdown.request();
    voice_handle.join()?;
    info!("Exiting");
    result
}

fn run_frame_loop(
    config: &Config,
    pointer: Option<Box<dyn Pointer>>,
    screen: ScreenSize,
    activation: Arc<VoiceActivation>,
    shutdown: ShutdownSignal,
    speaker: Speaker,
) -> Result<()> {
    let detector = FaceMeshDetector::new(
        &config.landmarks.model,
        config.landmarks.input_size,
        InputLayout::parse(&config.landmarks.input_layout)?,
        PresenceGate {
            kind: ScoreKind::parse(&config.landmarks.score_kind)?,
            threshold: config.landmarks.presence_threshold,
        },
    )
    .context("loading face mesh model")?;

    let pipeline = FramePipeline::from_config(config, screen)?;
    let camera = CameraOptions {
        index: config.camera.index,
        preview_width: config.camera.preview_width,
        preview_height: config.camera.preview_height,
        mirror: config.camera.mirror,
    };

    let mut app = HeadMouseApp::new(
        camera,
        Box::new(detector),
        pipeline,
        pointer,
        screen,
        activation,
        shutdown,
        speaker,
    )?;
    app.run()?;
    Ok(())
}
