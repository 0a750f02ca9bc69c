use super::handlers::{self, Reply};
use crate::{Context, Error};
use poise::serenity_prelude::CreateEmbed;
use poise::{command, CreateReply};

impl From<Reply> for CreateReply {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Text(text) => CreateReply::default().content(text),
            Reply::Embed(server_embed) => {
                let mut embed = CreateEmbed::new()
                    .title(server_embed.title)
                    .colour(server_embed.colour);
                if let Some(description) = server_embed.description {
                    embed = embed.description(description);
                }
                for field in server_embed.fields {
                    embed = embed.field(field.name, field.value, false);
                }
                if let Some(image) = server_embed.image {
                    embed = embed.image(image);
                }
                CreateReply::default().embed(embed)
            }
        }
    }
}

/// Shows live information about a CS 1.6 server
#[command(prefix_command, slash_command, category = "Servers")]
pub async fn server_info(
    ctx: Context<'_>,
    #[description = "Server number (1-30)"] server_number: Option<i64>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let data = ctx.data();
    let reply = handlers::server_info(
        &data.config,
        data.query.as_ref(),
        &data.images,
        server_number,
    )
    .await;

    ctx.send(reply.into()).await?;
    Ok(())
}

/// Lists the available servers
#[command(prefix_command, slash_command, category = "Servers")]
pub async fn list_servers(ctx: Context<'_>) -> Result<(), Error> {
    let reply = handlers::list_servers(&ctx.data().config).await;
    ctx.send(reply.into()).await?;
    Ok(())
}
