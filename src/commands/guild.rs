use super::{build_app, CommandError};
use crate::{
    cli::GuildAction,
    config::Config,
    database::models::{guild, job_type::JobType},
    destinations::{configure_guild, register_guild, remove_guild},
};

pub async fn handle_guild_command(config: Config, action: GuildAction) -> Result<(), CommandError> {
    let app = build_app(config).await?;

    match action {
        GuildAction::Register { guild_id } => {
            let guild = register_guild(&app, &guild_id).await?;
            print_guild(&guild);
        }
        GuildAction::Remove { guild_id } => {
            remove_guild(&app, &guild_id).await?;
            println!("✅ Guild {guild_id} removed");
        }
        GuildAction::Configure {
            guild_id,
            intern,
            new_grad,
        } => {
            let guild =
                configure_guild(&app, &guild_id, intern.as_deref(), new_grad.as_deref()).await?;
            print_guild(&guild);
        }
    }

    Ok(())
}

fn print_guild(guild: &guild::Model) {
    println!("🏠 Guild {}", guild.guild_id);
    for job_type in JobType::BROADCAST_ORDER {
        println!(
            "  {job_type}: {}",
            guild.channel_for(job_type).unwrap_or("not configured")
        );
    }
}
