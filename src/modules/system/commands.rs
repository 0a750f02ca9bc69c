use crate::{Context, Error};
use poise::builtins::HelpConfiguration;
use poise::command;

/// Shows the available commands
#[command(prefix_command, slash_command, track_edits, category = "Utility")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help for"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    let footer = format!(
        "Use {}server_info <number> to query a server.",
        ctx.data().config.prefix
    );
    poise::builtins::help(
        ctx,
        command.as_deref(),
        HelpConfiguration {
            extra_text_at_bottom: &footer,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// Register or unregister slash commands
#[command(prefix_command, slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}
