//! storyweb Player - terminal composition root binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyweb_domain::{build_navigation_config, Adventure, Node};
use storyweb_player::application::{
    AudioEngine, AudioEngineConfig, PlaybackState, PlayerSession, SessionError,
};
use storyweb_player::cli::{parse_command, render_error, render_node, Command};
#[cfg(feature = "device-audio")]
use storyweb_player::infrastructure::DeviceAudioOutput;
use storyweb_player::infrastructure::{
    BlobStore, DesktopRandomProvider, HeadlessAudioOutput, HttpMediaFetcher, PlayerConfig,
};
use storyweb_player::ports::outbound::AudioOutputPort;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyweb_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PlayerConfig::from_env()?;
    tracing::info!(adventure = %config.adventure_path.display(), "Starting storyweb Player");

    let raw = tokio::fs::read_to_string(&config.adventure_path)
        .await
        .with_context(|| format!("reading {}", config.adventure_path.display()))?;
    let adventure = Adventure::from_json(&raw).context("parsing adventure document")?;

    let blobs = Arc::new(BlobStore::new());
    let audio = AudioEngine::new(
        Arc::new(HttpMediaFetcher::new(config.media_base_url.clone())),
        blobs.clone(),
        audio_output(&blobs),
        AudioEngineConfig::default().with_crossfade_ms(config.crossfade_ms),
    );
    audio.set_playback_state(
        PlaybackState::default()
            .with_autoplay(config.autoplay)
            .with_sound(config.sound_enabled),
    );

    let mut session = PlayerSession::new(adventure, Arc::new(DesktopRandomProvider));
    if let Err(err) = session.start() {
        report(&err)?;
        audio.dispose();
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let mut shown = None;

    loop {
        let Some(node) = session.current_node().cloned() else {
            break;
        };
        if shown != Some(node.node_id) {
            shown = Some(node.node_id);
            audio.set_source(session.audio_source()).await;
            audio.preload(session.upcoming_audio_urls());
        }
        let model = session.navigation_model(config.navigation)?;
        let style = build_navigation_config(&node.merged_props(), config.navigation).style;
        let media = session.node_media().unwrap_or_default();
        let screen = render_node(&node, &media, &model, style, session.progress_percent());
        stdout.write_all(screen.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let outcome = match parse_command(&line) {
            Command::Quit => break,
            Command::Back => {
                if session.go_back().is_none() {
                    println!("Already at the start.");
                }
                Ok(())
            }
            Command::Home => session.go_home().map(|_| ()),
            Command::Continue => match model.primary_link_id {
                Some(link_id) => session.choose_link(link_id).map(|_| ()),
                None => {
                    println!("Nowhere to continue to.");
                    Ok(())
                }
            },
            Command::Choose(number) => choose(&mut session, &model, number, &node),
            Command::Unknown => {
                println!("Enter a number, b, h or q.");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            report(&err)?;
        }
    }

    audio.dispose();
    tracing::info!("Player closed");
    Ok(())
}

/// The sound card when available, else a silent output.
fn audio_output(blobs: &Arc<BlobStore>) -> Arc<dyn AudioOutputPort> {
    #[cfg(feature = "device-audio")]
    {
        match DeviceAudioOutput::open(blobs.clone()) {
            Ok(output) => {
                tracing::info!("Playing audio on the default output device");
                return Arc::new(output);
            }
            Err(err) => tracing::warn!(error = %err, "No audio device, continuing without sound"),
        }
    }
    #[cfg(not(feature = "device-audio"))]
    let _ = blobs;

    tracing::info!("Audio output is headless");
    Arc::new(HeadlessAudioOutput::new())
}

fn choose(
    session: &mut PlayerSession,
    model: &storyweb_domain::NavigationModel,
    number: usize,
    node: &Node,
) -> Result<(), SessionError> {
    let Some(button) = model.buttons.get(number - 1) else {
        println!("No choice {number}.");
        return Ok(());
    };
    if button.is_current {
        println!("You are already at {}.", node.title);
        return Ok(());
    }
    match button.link_id {
        Some(link_id) => session.choose_link(link_id).map(|_| ()),
        None => {
            println!("That choice leads nowhere.");
            Ok(())
        }
    }
}

/// Print navigation errors for the reader; anything else is fatal.
fn report(err: &SessionError) -> Result<()> {
    match err {
        SessionError::Engine(engine_error) => println!("{}", render_error(engine_error)),
        SessionError::RedirectLoop(_) => println!("! {err}"),
        SessionError::NotStarted | SessionError::NoNodes => return Err(err.clone().into()),
    }
    Ok(())
}
