use config::BotConfig;
use modules::{
    servers::{
        images::{HttpProbe, MapImageResolver},
        list_servers,
        query::{A2sQuery, ServerQuery},
        server_info,
    },
    system::{events, help, register},
};
use poise::serenity_prelude::{self as serenity, CreateAllowedMentions};
use std::sync::Arc;
use tracing::{error, info, trace};
use tracing_subscriber::EnvFilter;

mod config;
mod modules;

#[derive(Clone, Debug)]
pub struct Data {
    pub config: Arc<BotConfig>,
    pub query: Arc<dyn ServerQuery>,
    pub images: Arc<MapImageResolver>,
}

impl Data {
    pub fn new(config: Arc<BotConfig>) -> Result<Self, Error> {
        let query = Arc::new(A2sQuery::new(config.query_timeout));
        let probe = Arc::new(HttpProbe::new(config.probe_timeout)?);
        let images = Arc::new(MapImageResolver::new(
            config.image_base_url.clone(),
            probe,
        ));

        Ok(Self {
            config,
            query,
            images,
        })
    }
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

fn location(ctx: Context<'_>) -> String {
    ctx.guild_id()
        .map_or_else(|| "DM".to_string(), |id| id.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("starting serverwatch");

    let config = Arc::new(BotConfig::from_env()?);
    info!(
        "using prefix {:?} and servers file {}",
        config.prefix,
        config.servers_path.display()
    );

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;
    let token = config.token.clone();
    let prefix = config.prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions::<Data, Error> {
            allowed_mentions: Some(CreateAllowedMentions::new().empty_roles().empty_users()),
            commands: vec![server_info(), list_servers(), help(), register()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    trace!(
                        "Command {} used by {} in {}",
                        ctx.command().qualified_name,
                        ctx.author().tag(),
                        location(ctx)
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command {} completed for {} in {}",
                        ctx.command().qualified_name,
                        ctx.author().tag(),
                        location(ctx)
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!(
                                "Command {} failed for {} in {}: {:?}",
                                ctx.command().qualified_name,
                                ctx.author().tag(),
                                location(ctx),
                                error
                            );
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. }
                            if ctx.command().name == "server_info" =>
                        {
                            trace!("Bad server number {:?}: {}", input, error);
                            let hint = format!(
                                "❌ Server number must be a whole number, e.g. `{}server_info 1`",
                                ctx.data().config.prefix
                            );
                            if let Err(e) = ctx.say(hint).await {
                                error!("Failed to send argument hint: {:?}", e);
                            }
                        }
                        err => error!("Other framework error: {:?}", err),
                    }
                })
            },
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    events::handle_event(ctx, event, &data.config.prefix);
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("registering commands");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                Data::new(config)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}
