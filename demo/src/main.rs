//! RelayBox demo - drives the SDK from the command line
//!
//! Results go to stdout as JSON; logs go to stderr, filtered by `RUST_LOG`.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use relaybox::security::signature;
use relaybox::{PublishOptions, RelayBox, RelayBoxOptions, RoomTarget, TokenResponseParams};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, TokenCommands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(cli).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn client(cli: &Cli) -> Result<RelayBox> {
    let Some(api_key) = cli.api_key.as_deref() else {
        bail!("an API key is required (--api-key or RELAYBOX_API_KEY)");
    };

    let mut options = RelayBoxOptions::new(api_key);
    if let Some(url) = &cli.core_service_url {
        options = options.with_core_service_url(url);
    }

    Ok(RelayBox::new(options)?)
}

fn parse_json(raw: &str, what: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("{what} is not valid JSON"))
}

async fn run(cli: Cli) -> Result<Value> {
    match &cli.command {
        Commands::Token(TokenCommands::Issue {
            client_id,
            expires_in,
            permissions,
        }) => {
            let mut params = TokenResponseParams::new().with_expires_in(*expires_in);
            if let Some(client_id) = client_id {
                params = params.with_client_id(client_id.as_str());
            }
            if let Some(raw) = permissions {
                params = params.with_permissions(parse_json(raw, "--permissions")?);
            }

            let response = client(&cli)?.generate_token_response(params)?;
            info!(expires_at = response.expires_at, "issued token");
            Ok(serde_json::to_value(response)?)
        }

        Commands::Token(TokenCommands::Room {
            room_id,
            client_id,
            expires_in,
        }) => {
            let token = client(&cli)?
                .rooms()
                .generate_access_token(room_id, client_id, *expires_in)?;
            Ok(serde_json::json!({ "token": token, "expiresIn": expires_in }))
        }

        Commands::Token(TokenCommands::Verify { token }) => {
            let claims = client(&cli)?.verify_auth_token(token)?;
            Ok(serde_json::to_value(claims)?)
        }

        Commands::Sign(args) => {
            let digest = match &args.key {
                Some(key) => signature::sign(&args.message, key)?,
                None => {
                    let api_key = cli
                        .api_key
                        .as_deref()
                        .context("--key or an API key is required")?;
                    let parts = relaybox::ApiKeyParts::parse(api_key)?;
                    signature::sign(&args.message, parts.secret_key())?
                }
            };
            Ok(Value::String(digest))
        }

        Commands::VerifyWebhook(args) => {
            let data = parse_json(&args.data, "webhook data")?;
            let relaybox = client(&cli)?;
            let valid =
                relaybox.verify_webhook_signature(&data, &args.signature, &args.signing_key)?;
            Ok(serde_json::json!({ "valid": valid }))
        }

        Commands::Publish(args) => {
            let data = parse_json(&args.data, "event data")?;
            let options = (args.as_client.is_some() || args.transient).then(|| PublishOptions {
                client_id: args.as_client.clone(),
                transient: args.transient.then_some(true),
            });
            let rooms = match args.rooms.as_slice() {
                [room] => RoomTarget::from(room.clone()),
                rooms => RoomTarget::from(rooms.to_vec()),
            };

            let ack = client(&cli)?
                .publish(rooms, &args.event, data, options)
                .await?;
            Ok(serde_json::to_value(ack)?)
        }
    }
}
