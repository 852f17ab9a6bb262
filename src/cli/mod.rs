use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{PasswordHasher, Principal, Role, TokenService};
use crate::config::AppConfig;
use crate::database::{seed, DatabaseManager, PgStore};

#[derive(Parser)]
#[command(name = "estate")]
#[command(about = "Estate CLI - database and credential tooling for the Estate API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Migrate, then insert the sample accounts and records")]
    Seed,

    #[command(about = "Print a bcrypt digest for a password")]
    HashPassword {
        #[arg(help = "Plaintext password")]
        password: String,
    },

    #[command(about = "Issue a token signed with JWT_SECRET")]
    Token {
        #[arg(long, help = "User id (random when omitted)")]
        id: Option<Uuid>,
        #[arg(long, help = "Email claim")]
        email: String,
        #[arg(long, value_parser = parse_role, default_value = "TENANT", help = "ADMIN, PROPERTY_MANAGER, LANDLORD or TENANT")]
        role: Role,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.to_ascii_uppercase()
        .parse()
        .map_err(|_| format!("unknown role '{}'", raw))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            output(output_format, "Migrations applied", json!({ "migrated": true }));
        }
        Commands::Seed => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            let store = PgStore::new(pool);
            let hasher = PasswordHasher::new(config.security.bcrypt_cost);
            let summary = seed::seed(&store, &hasher).await?;
            output(
                output_format,
                &format!("Seeded {}", summary),
                json!({
                    "users": summary.users,
                    "properties": summary.properties,
                    "leases": summary.leases,
                    "maintenanceRequests": summary.maintenance_requests,
                    "payments": summary.payments,
                }),
            );
        }
        Commands::HashPassword { password } => {
            let hasher = PasswordHasher::new(config.security.bcrypt_cost);
            let digest = hasher.hash(&password).await?;
            output(output_format, &digest, json!({ "hash": digest }));
        }
        Commands::Token { id, email, role } => {
            let tokens = TokenService::from_config(&config.security)?;
            let principal = Principal { id: id.unwrap_or_else(Uuid::new_v4), email, role };
            let token = tokens.issue(&principal)?;
            output(
                output_format,
                &token,
                json!({
                    "token": token,
                    "userId": principal.id,
                    "role": principal.role.as_str(),
                    "expiresInHours": tokens.expiry_hours(),
                }),
            );
        }
    }

    Ok(())
}

fn output(format: OutputFormat, text: &str, value: serde_json::Value) {
    match format {
        OutputFormat::Text => println!("{}", text),
        OutputFormat::Json => println!("{}", value),
    }
}
