//! # Stream Announcements
//!
//! Per-streamer announcement state machine. Each live delivery produces one
//! announcement message; in the single-slot default channel the previous
//! announcement for the same streamer is deleted after the new one lands, so
//! there is never a gap with no announcement visible. Override channels keep
//! their history.

use chrono::Utc;
use chrono_tz::Europe::London;
use tracing::{error, info, warn};

use crate::application::context::BotContext;
use crate::domain::error::HeraldError;
use crate::domain::types::{LiveStream, ProviderUser};

/// Timezone used when rendering the stream start time.
const DISPLAY_TZ: chrono_tz::Tz = London;

/// Decodes and announces the `data` array of a stream notification. A
/// malformed element is logged and skipped; one broken entry must not
/// silence the rest of the delivery.
pub async fn handle_stream_data(
    ctx: &BotContext,
    data: &[serde_json::Value],
) -> Result<(), HeraldError> {
    let mut streams = Vec::with_capacity(data.len());
    for entry in data {
        match serde_json::from_value::<LiveStream>(entry.clone()) {
            Ok(stream) => streams.push(stream),
            Err(err) => warn!("skipping malformed stream entry: {err}"),
        }
    }
    announce_streams(ctx, &streams).await;
    Ok(())
}

/// Announces each stream in turn. A failure for one streamer is logged and
/// does not block the others.
pub async fn announce_streams(ctx: &BotContext, streams: &[LiveStream]) {
    for stream in streams {
        if !stream.kind.is_empty() && stream.kind != "live" {
            info!(
                "skipping {} delivery for user {}",
                stream.kind, stream.user_id
            );
            continue;
        }
        if let Err(err) = announce_stream(ctx, stream).await {
            error!("announcement for user {} failed: {err}", stream.user_id);
        }
    }
}

async fn announce_stream(ctx: &BotContext, stream: &LiveStream) -> Result<(), HeraldError> {
    let user = ctx.provider.get_user(&stream.user_id).await?;
    let game = ctx.provider.game_title(&stream.game_id, &stream.user_id).await;
    let (channel, single_slot) = ctx.config.channels.resolve(&user.login);

    let delay = Utc::now() - stream.started_at;
    info!(
        "announcing {} in {channel}, {}s after stream start",
        user.login,
        delay.num_seconds()
    );

    let text = render(&user, stream, &game);
    let message = ctx.chat.send_message(channel, &text).await?;

    // Replace the state entry before deleting so a delete failure cannot
    // leave the map pointing at a removed message.
    let previous = {
        let mut state = ctx.state.lock().await;
        state.announcements.insert(user.login.clone(), message)
    };
    if single_slot {
        if let Some(previous) = previous {
            if let Err(err) = ctx.chat.delete_message(&previous).await {
                warn!("could not delete previous announcement for {}: {err}", user.login);
            }
        }
    }
    Ok(())
}

fn render(user: &ProviderUser, stream: &LiveStream, game: &str) -> String {
    let started = stream.started_at.with_timezone(&DISPLAY_TZ);
    format!(
        "**{}** is live, playing **{game}**!\n\
         {}\n\
         Started at {} ({})\n\
         https://www.twitch.tv/{}",
        user.display_name,
        stream.title,
        started.format("%H:%M"),
        started.timezone(),
        user.login,
    )
}
