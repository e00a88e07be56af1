//! # Quill Manage
//!
//! Administrator commands run against the configured database: create
//! accounts and groups ahead of time, list what exists.

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quill_core::DomainError;
use quill_core::forms::SignupForm;
use quill_core::ports::PasswordService;
use quill_core::service::{AccountService, BlogService};
use quill_infra::Argon2PasswordService;
use quill_infra::database::{
    DatabaseConfig, DatabaseConnections, PostgresGroupRepository, PostgresPostRepository,
    PostgresUserRepository,
};

#[derive(Parser)]
#[command(name = "manage")]
#[command(about = "Quill administration commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create a user account")]
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, env = "QUILL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    #[command(about = "Create a group posts can be filed under")]
    CreateGroup {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    #[command(about = "List all groups")]
    ListGroups,
}

struct Services {
    accounts: AccountService,
    blog: BlogService,
}

impl Services {
    async fn connect() -> anyhow::Result<Self> {
        let config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
        let db = DatabaseConnections::init(&config)
            .await
            .context("failed to connect to the database")?;

        let users = Arc::new(PostgresUserRepository::new(db.main.clone()));
        let groups = Arc::new(PostgresGroupRepository::new(db.main.clone()));
        let posts = Arc::new(PostgresPostRepository::new(db.main.clone()));
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        Ok(Self {
            accounts: AccountService::new(users.clone(), passwords),
            blog: BlogService::new(users, groups, posts),
        })
    }
}

/// Turn form errors into a readable CLI failure.
fn explain(err: DomainError) -> anyhow::Error {
    match err {
        DomainError::InvalidForm(errors) => anyhow::anyhow!("invalid input: {errors}"),
        other => other.into(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let services = Services::connect().await?;

    match cli.command {
        Commands::CreateUser { username, password } => {
            let form = SignupForm {
                username,
                password1: password.clone(),
                password2: password,
            };
            let user = services.accounts.register(&form).await.map_err(explain)?;
            println!("Created user {} ({})", user.username, user.id);
        }
        Commands::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = services
                .blog
                .create_group(&title, &slug, &description)
                .await
                .map_err(explain)?;
            println!("Created group {} at /group/{}/", group.title, group.slug);
        }
        Commands::ListGroups => {
            let groups = services.blog.list_groups().await.map_err(explain)?;
            if groups.is_empty() {
                bail!("no groups yet; create one with `manage create-group`");
            }
            for group in groups {
                println!("{:<24} {}", group.slug, group.title);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,manage=info")),
        )
        .init();

    run(Cli::parse()).await
}
