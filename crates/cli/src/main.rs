use anyhow::Context;
use clap::{Parser, Subcommand};
use classifieds_authz::{Principal, Role};
use classifieds_kernel::settings::Settings;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "classifieds-cli", version, about = "Classified ads application")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations, then serve HTTP until interrupted
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print a signed access token for a user
    Token {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        name: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
        /// Override `auth.token_ttl_secs`
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load classifieds settings")?;

    match cli.command {
        Command::Serve => {
            classifieds_telemetry::init(&settings.telemetry)?;
            classifieds_app::serve(&settings).await
        }
        Command::Migrate => {
            classifieds_telemetry::init(&settings.telemetry)?;
            let applied = classifieds_app::migrate(&settings).await?;
            println!("{applied} migration(s) applied");
            Ok(())
        }
        Command::Token {
            user_id,
            name,
            admin,
            ttl_secs,
        } => {
            if let Some(ttl) = ttl_secs {
                settings.auth.token_ttl_secs = ttl;
            }
            let mut roles = vec![Role::User];
            if admin {
                roles.push(Role::Admin);
            }
            let token = classifieds_app::bootstrap::token_codec(&settings)
                .issue(&Principal::new(user_id, name, roles))
                .context("failed to sign token")?;
            println!("{token}");
            Ok(())
        }
    }
}
