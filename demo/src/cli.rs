//! CLI argument parsing

use clap::{Args, Parser, Subcommand};

/// RelayBox SDK demo
#[derive(Parser, Debug)]
#[command(
    name = "relaybox-demo",
    version,
    about = "Issue tokens, sign payloads and publish events with the RelayBox SDK",
    long_about = "Walks through the RelayBox server SDK from the command line.\n\
                  The API key is read from --api-key or RELAYBOX_API_KEY and never printed.\n\
                  Set RUST_LOG=relaybox=debug to see outgoing requests."
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// API key in the form appPid.keyId:secretKey
    #[arg(long, env = "RELAYBOX_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Core service base URL
    #[arg(long, env = "RELAYBOX_CORE_SERVICE_URL", global = true)]
    pub core_service_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Token operations
    #[command(subcommand)]
    Token(TokenCommands),

    /// Print the HMAC-SHA256 signature of a message
    Sign(SignArgs),

    /// Check a webhook delivery against its signature
    VerifyWebhook(VerifyWebhookArgs),

    /// Publish an event to one or more rooms
    Publish(PublishArgs),
}

/// Token subcommands
#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Issue a client id token
    Issue {
        /// Client the token identifies
        #[arg(long)]
        client_id: Option<String>,

        /// Lifetime in seconds
        #[arg(long, default_value_t = relaybox::DEFAULT_TOKEN_EXPIRY_SECS)]
        expires_in: u64,

        /// Permissions as JSON, e.g. '{"chat":["subscribe"]}' or '["*"]'
        #[arg(long)]
        permissions: Option<String>,
    },

    /// Issue a room access token
    Room {
        /// Room the token is scoped to
        room_id: String,

        /// Client the token identifies
        client_id: String,

        /// Lifetime in seconds
        #[arg(long, default_value_t = relaybox::DEFAULT_TOKEN_EXPIRY_SECS)]
        expires_in: u64,
    },

    /// Verify a token and print its claims
    Verify {
        /// Compact token
        token: String,
    },
}

/// Arguments for `sign`
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Message to sign
    pub message: String,

    /// Signing key; defaults to the API key's secret half
    #[arg(long)]
    pub key: Option<String>,
}

/// Arguments for `verify-webhook`
#[derive(Args, Debug)]
pub struct VerifyWebhookArgs {
    /// Delivery JSON
    pub data: String,

    /// Signature sent with the delivery
    #[arg(long)]
    pub signature: String,

    /// Webhook signing key
    #[arg(long, env = "RELAYBOX_WEBHOOK_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: String,
}

/// Arguments for `publish`
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Target rooms (repeat for fan-out)
    #[arg(long = "room", required = true)]
    pub rooms: Vec<String>,

    /// Event name
    pub event: String,

    /// Event data as JSON
    pub data: String,

    /// Publish on behalf of this client
    #[arg(long)]
    pub as_client: Option<String>,

    /// Skip history persistence
    #[arg(long)]
    pub transient: bool,
}
