use poise::serenity_prelude::{ActivityData, Context, FullEvent, OnlineStatus};
use tracing::info;

fn activity(prefix: &str) -> String {
    format!("{}list_servers", prefix)
}

/// Gateway events the bot reacts to. Only `Ready` matters: it logs and
/// advertises the list command in the bot's presence.
pub fn handle_event(ctx: &Context, event: &FullEvent, prefix: &str) {
    if let FullEvent::Ready { data_about_bot } = event {
        info!("Bot is ready as {}", data_about_bot.user.name);
        ctx.set_presence(
            Some(ActivityData::playing(activity(prefix))),
            OnlineStatus::Online,
        );
    }
}
