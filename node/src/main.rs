//! `felund-node`: operator-facing CLI that starts a node, manages circles
//! and channels, posts messages, and reports status.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use felund_proto::AccessMode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "felund-node")]
#[command(about = "Run and operate a Felund peer-to-peer group-chat node")]
#[command(version)]
struct Cli {
    /// Address to bind the gossip listener to.
    #[arg(long, default_value = "0.0.0.0", global = true)]
    bind: String,

    /// Port to listen on; 0 picks an ephemeral port.
    #[arg(long, default_value_t = 7640, global = true)]
    port: u16,

    /// Display name this node advertises in chat messages.
    #[arg(long, global = true)]
    display_name: Option<String>,

    /// Accept anchor duty for circles that need one.
    #[arg(long, global = true)]
    can_anchor: bool,

    /// Advertise this node as reachable from the public internet.
    #[arg(long, global = true)]
    public_reachable: bool,

    /// Rendezvous server base URL; empty disables peer discovery via it.
    #[arg(long, env = "FELUND_API_BASE", default_value = "", global = true)]
    rendezvous_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node: accept loop, dial loop, and rendezvous refresh.
    Start,

    /// Create a new circle and print its invite code.
    CreateCircle {
        /// Human-readable label for the circle.
        #[arg(long)]
        name: Option<String>,
    },

    /// Join a circle from an invite code.
    Join {
        /// Code produced by `create-circle` or `felund_invite::make_invite_code`.
        invite_code: String,
    },

    /// Post a message into a channel.
    Post {
        circle_id: String,
        channel_id: String,
        text: String,
        /// Encrypt the display name and text fields for this message.
        #[arg(long)]
        encrypt: bool,
    },

    /// Create a channel in a circle.
    CreateChannel {
        circle_id: String,
        channel_id: String,
        /// public, key, or invite.
        #[arg(long, default_value = "public")]
        access: String,
        /// Shared key for `key`-mode channels.
        #[arg(long)]
        key: Option<String>,
    },

    /// Join (or request to join) a channel.
    JoinChannel {
        circle_id: String,
        channel_id: String,
        #[arg(long)]
        key: Option<String>,
    },

    /// Show this node's configuration and per-circle message counts.
    Status,
}

fn parse_access_mode(s: &str) -> Result<AccessMode> {
    match s {
        "public" => Ok(AccessMode::Public),
        "key" => Ok(AccessMode::Key),
        "invite" => Ok(AccessMode::Invite),
        other => bail!("unknown access mode {other:?}, expected public, key, or invite"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let state_dir = felund_persist::state_dir();
    let state = felund_persist::load(&state_dir)?;
    state.configure_node(
        Some(cli.bind.clone()),
        Some(cli.port),
        cli.display_name.clone(),
        Some(cli.can_anchor),
        Some(cli.public_reachable),
        Some(cli.rendezvous_base.clone()),
    );

    match cli.command {
        Commands::Start => commands::start::run(state, state_dir).await?,
        Commands::CreateCircle { name } => {
            let hint = felund_common::public_addr_hint(&cli.bind, cli.port);
            commands::circle::create(&state, name, &hint)?;
            felund_persist::save(&state_dir, &state)?;
        }
        Commands::Join { invite_code } => {
            commands::circle::join(&state, &invite_code)?;
            felund_persist::save(&state_dir, &state)?;
        }
        Commands::Post {
            circle_id,
            channel_id,
            text,
            encrypt,
        } => {
            commands::post::run(&state, &circle_id, &channel_id, &text, encrypt)?;
            felund_persist::save(&state_dir, &state)?;
        }
        Commands::CreateChannel {
            circle_id,
            channel_id,
            access,
            key,
        } => {
            let mode = parse_access_mode(&access)?;
            commands::channel::create(&state, &circle_id, &channel_id, mode, key)?;
            felund_persist::save(&state_dir, &state)?;
        }
        Commands::JoinChannel {
            circle_id,
            channel_id,
            key,
        } => {
            commands::channel::join(&state, &circle_id, &channel_id, key)?;
            felund_persist::save(&state_dir, &state)?;
        }
        Commands::Status => commands::status::run(&state),
    }

    Ok(())
}
