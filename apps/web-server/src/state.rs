//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{
    GroupRepository, PasswordService, PostRepository, TokenService, UserRepository,
};
use quill_core::service::{AccountService, BlogService};
use quill_infra::database::{
    DatabaseConfig, DatabaseConnections, PostgresGroupRepository, PostgresPostRepository,
    PostgresUserRepository,
};
use quill_infra::{Argon2PasswordService, JwtTokenService, MemoryStore};

use crate::config::AppConfig;
use crate::render::Templates;

/// Which entity store backs the running server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

impl Storage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Storage::Postgres => "postgres",
            Storage::Memory => "memory",
        }
    }
}

struct Repositories {
    storage: Storage,
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
}

impl Repositories {
    fn memory(store: &MemoryStore) -> Self {
        Self {
            storage: Storage::Memory,
            users: Arc::new(store.users()),
            groups: Arc::new(store.groups()),
            posts: Arc::new(store.posts()),
        }
    }

    fn postgres(connections: &DatabaseConnections) -> Self {
        Self {
            storage: Storage::Postgres,
            users: Arc::new(PostgresUserRepository::new(connections.main.clone())),
            groups: Arc::new(PostgresGroupRepository::new(connections.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(connections.main.clone())),
        }
    }

    async fn connect(config: Option<&DatabaseConfig>) -> Self {
        let Some(config) = config else {
            tracing::warn!("DATABASE_URL not set. Running on the in-memory store.");
            return Self::memory(&MemoryStore::new());
        };

        match DatabaseConnections::init(config).await {
            Ok(connections) => Self::postgres(&connections),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Self::memory(&MemoryStore::new())
            }
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub accounts: AccountService,
    pub tokens: Arc<dyn TokenService>,
    pub templates: Arc<Templates>,
    pub storage: Storage,
}

impl AppState {
    /// Build the state from configuration, falling back to the in-memory
    /// store when the database is absent or unreachable.
    pub async fn new(config: &AppConfig) -> Result<Self, tera::Error> {
        let repos = Repositories::connect(config.database.as_ref()).await;
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        let state = Self::assemble(repos, tokens)?;
        tracing::info!(storage = state.storage.as_str(), "Application state initialized");
        Ok(state)
    }

    /// State over an existing in-memory store.
    pub fn in_memory(store: &MemoryStore, tokens: Arc<dyn TokenService>) -> Result<Self, tera::Error> {
        Self::assemble(Repositories::memory(store), tokens)
    }

    fn assemble(repos: Repositories, tokens: Arc<dyn TokenService>) -> Result<Self, tera::Error> {
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        Ok(Self {
            blog: BlogService::new(repos.users.clone(), repos.groups, repos.posts),
            accounts: AccountService::new(repos.users, passwords),
            tokens,
            templates: Arc::new(Templates::new()?),
            storage: repos.storage,
        })
    }
}
