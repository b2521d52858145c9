//! Chat command - run one chat screen on the terminal.
//!
//! Plain lines are sent as text messages. Slash commands drive the
//! attachment menu:
//! - `/library <path>` sends an image as if picked from the library
//! - `/photo <path>` sends an image as if taken with the camera
//! - `/location <lat> <lon>` shares a position
//! - `/quit` closes the screen

use anyhow::{Context, Result};
use gochat_core::connectivity::ConnectivityProbe;
use gochat_core::memory::{
    MemoryIdentityProvider, MemoryMessageStore, ScriptedImagePicker, ScriptedLocationFixer,
    StaticProbe,
};
use gochat_core::{
    AttachmentAction, CaptureOutcome, CapturedImage, ChatContext, ChatScreen, Config,
    FsBlobStore, GeoPoint, MessageDraft, ScreenStatus, TcpProbe, Timeline,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{open_local_store, render};

/// Rows shown when the timeline is redrawn.
const VISIBLE_ROWS: usize = 20;

struct Devices {
    images: Arc<ScriptedImagePicker>,
    location: Arc<ScriptedLocationFixer>,
}

enum Input {
    Text(String),
    Attach(AttachmentAction),
    Quit,
    Skip,
}

pub async fn execute(name: Option<String>, offline: bool) -> Result<()> {
    let config = Config::load_with_env()?;
    let name = name.unwrap_or_else(|| config.display_name_or_default().to_string());

    let (ctx, devices) = build_context(config, offline)?;
    let mut screen = ChatScreen::start(&ctx, &name)
        .await
        .context("failed to start chat screen")?;
    info!("Chat screen started in {} mode", screen.mode().as_str());

    let printer = tokio::spawn(print_updates(
        screen.subscribe_status(),
        screen.timeline().subscribe(),
    ));

    if !screen.input_enabled() {
        println!("Input disabled while offline. Press Ctrl-D to leave.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !screen.input_enabled() {
            continue;
        }

        match parse_input(&line, &devices).await {
            Input::Text(text) => {
                if let Err(e) = screen.send_draft(MessageDraft::text(text)).await {
                    println!("! {}", e);
                }
            }
            Input::Attach(action) => match screen.capture(action).await {
                Ok(Some(_)) => {}
                Ok(None) => println!("! {} produced nothing", action.label()),
                Err(e) => println!("! {}", e),
            },
            Input::Quit => break,
            Input::Skip => {}
        }
    }

    screen.close();
    printer.abort();
    Ok(())
}

fn build_context(config: Config, offline: bool) -> Result<(ChatContext, Devices)> {
    let probe: Arc<dyn ConnectivityProbe> = if offline {
        Arc::new(StaticProbe::offline())
    } else {
        Arc::new(TcpProbe::new(config.probe_addr.clone(), config.probe_timeout()))
    };

    let local_store = open_local_store(&config)?;
    let devices = Devices {
        images: Arc::new(ScriptedImagePicker::new()),
        location: Arc::new(ScriptedLocationFixer::new()),
    };

    let ctx = ChatContext {
        probe,
        identity: Arc::new(MemoryIdentityProvider::new()),
        remote: Arc::new(MemoryMessageStore::new()),
        local_store: Arc::new(local_store),
        blobs: Arc::new(FsBlobStore::new(config.blob_dir.clone())),
        images: devices.images.clone(),
        location: devices.location.clone(),
        config,
    };

    Ok((ctx, devices))
}

/// Turn one stdin line into an action, queueing device results for
/// attachment commands.
async fn parse_input(line: &str, devices: &Devices) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Skip;
    }
    if !line.starts_with('/') {
        return Input::Text(line.to_string());
    }

    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("/quit"), _, _) => Input::Quit,
        (Some(cmd @ ("/library" | "/photo")), Some(path), _) => {
            let outcome = match tokio::fs::read(path).await {
                Ok(bytes) => CaptureOutcome::Captured(CapturedImage {
                    uri: format!("file://{}", path),
                    bytes,
                }),
                Err(e) => {
                    println!("! cannot read {}: {}", path, e);
                    CaptureOutcome::Cancelled
                }
            };
            if cmd == "/photo" {
                devices.images.push_camera(outcome);
                Input::Attach(AttachmentAction::TakePhoto)
            } else {
                devices.images.push_library(outcome);
                Input::Attach(AttachmentAction::PickImage)
            }
        }
        (Some("/location"), Some(lat), Some(lon)) => match parse_point(lat, lon) {
            Some(point) => {
                devices.location.push(CaptureOutcome::Captured(point));
                Input::Attach(AttachmentAction::ShareLocation)
            }
            None => {
                println!("! usage: /location <lat> <lon>");
                Input::Skip
            }
        },
        (Some(cmd), _, _) => {
            println!("! unknown command or missing argument: {}", cmd);
            print_menu();
            Input::Skip
        }
        (None, _, _) => Input::Skip,
    }
}

/// Parse a `<lat> <lon>` pair; `NaN` and infinities are rejected.
fn parse_point(lat: &str, lon: &str) -> Option<GeoPoint> {
    let point = GeoPoint::new(lat.parse().ok()?, lon.parse().ok()?);
    point.is_finite().then_some(point)
}

fn print_menu() {
    println!("Attachments:");
    for (i, action) in AttachmentAction::ALL.iter().enumerate() {
        let usage = match action {
            AttachmentAction::PickImage => "/library <path>",
            AttachmentAction::TakePhoto => "/photo <path>",
            AttachmentAction::ShareLocation => "/location <lat> <lon>",
        };
        println!("  {}. {:<22} {}", i + 1, action.label(), usage);
    }
    println!("  /quit");
}

async fn print_updates(
    mut status: watch::Receiver<ScreenStatus>,
    mut timeline: watch::Receiver<Timeline>,
) {
    println!("* {}", *status.borrow_and_update());
    redraw(&timeline.borrow_and_update());

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("* {}", *status.borrow_and_update());
            }
            changed = timeline.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = timeline.borrow_and_update().clone();
                debug!("Timeline now holds {} messages", snapshot.len());
                redraw(&snapshot);
            }
        }
    }
}

/// Print the newest rows, oldest first.
fn redraw(timeline: &Timeline) {
    println!("----");
    for message in timeline.iter().take(VISIBLE_ROWS).rev() {
        println!("{}", render(message));
    }
}
