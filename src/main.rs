use std::{sync::Arc, time::Duration};

use clap::Parser;
use jukelink::{
    common::{
        logger,
        types::{AnyResult, ChannelId},
    },
    configs::Config,
    monitoring::{ChannelSink, EventSink, FanoutSink, TracingSink},
    output::SimulatedOutput,
    player::SessionServices,
    protocol::{events::SessionEvent, tracks::Requester},
    server::SessionManager,
    sources::SourceManager,
};
use tracing::{error, info, warn};

/// Queue tracks for a channel and play them through the simulated output.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Channel to play into.
    #[arg(long, default_value_t = 1)]
    channel: u64,

    #[arg(long, default_value_t = 0)]
    requester_id: u64,

    #[arg(long, default_value = "console")]
    requester_tag: String,

    /// URLs, file paths or search terms, played in order.
    #[arg(required = true)]
    queries: Vec<String>,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let args = Args::parse();

    let loaded = Config::load(&args.config)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();
    logger::init(&config);

    if !found {
        warn!("{} not found, using default configuration", args.config);
    }

    info!(
        "jukelink v{} ({} built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT"),
        env!("BUILD_TIME")
    );

    let (events_sink, events) = ChannelSink::new();
    let sink: Arc<dyn EventSink> = Arc::new(
        FanoutSink::new()
            .with(Arc::new(TracingSink))
            .with(Arc::new(events_sink)),
    );

    let services = SessionServices {
        resolver: Arc::new(SourceManager::new(&config)),
        output: Arc::new(SimulatedOutput::new(Duration::from_secs(
            config.output.simulated_track_secs,
        ))),
        sink,
    };
    let manager = SessionManager::new(config.player.clone(), services);

    let channel = ChannelId(args.channel);
    let requester = Requester::new(args.requester_id, args.requester_tag);

    let mut queued = 0;
    for query in &args.queries {
        match manager.enqueue_query(channel, query, requester.clone()).await {
            Ok(enqueued) => {
                queued += 1;
                info!(
                    "Queued '{}' [{}] at #{}",
                    enqueued.track.title(),
                    enqueued.track.duration_label(),
                    enqueued.position
                );
            }
            Err(e) => warn!("Skipping '{}': {}", query, e),
        }
    }

    if queued == 0 {
        error!("Nothing to play");
        return Ok(());
    }

    manager.ensure_playing(channel).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c, shutting down");
        }
        _ = wait_for_disconnect(&events, channel) => {
            info!("Channel {} disconnected", channel);
        }
    }

    manager.shutdown().await;
    Ok(())
}

async fn wait_for_disconnect(events: &flume::Receiver<SessionEvent>, channel: ChannelId) {
    while let Ok(event) = events.recv_async().await {
        if matches!(event, SessionEvent::Disconnected { channel_id, .. } if channel_id == channel) {
            return;
        }
    }
}
