//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::ServerConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{
    AddressesService, AuthService, DuesService, FinanceService, HouseholdsService, ImportService,
    InventoryService, LedgerRetention, LettersService, ResidentsService, SchedulerService,
    SettingsService,
};
use sqlx::SqlitePool;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub addresses: AddressesService,
    pub households: HouseholdsService,
    pub residents: ResidentsService,
    pub dues: DuesService,
    pub finance: FinanceService,
    pub inventory: InventoryService,
    pub letters: LettersService,
    pub settings: SettingsService,
    pub auth: AuthService,
    pub import: ImportService,
    pub retention: LedgerRetention,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &ServerConfig) -> Self {
        let repo = Repository::new(pool);
        let settings = SettingsService::new(config.data_dir.clone());

        let addresses = AddressesService::new(repo.clone());
        let residents = ResidentsService::new(repo.clone());

        Self {
            households: HouseholdsService::new(repo.clone()),
            dues: DuesService::new(repo.clone()),
            finance: FinanceService::new(repo.clone()),
            inventory: InventoryService::new(repo.clone()),
            letters: LettersService::new(repo.clone(), settings.clone()),
            auth: AuthService::new(repo.clone(), config.session_ttl_hours),
            import: ImportService::new(addresses.clone(), residents.clone()),
            retention: LedgerRetention::new(repo),
            addresses,
            residents,
            settings,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: &ServerConfig) -> Result<(AppState, SchedulerService)> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;

    let pool = create_pool(&config.database_path()).await?;
    let state = AppState::new(pool, config);

    match (&config.admin_username, &config.admin_password) {
        (Some(username), Some(password)) => {
            state.auth.ensure_admin(username, password).await?;
        }
        _ => tracing::debug!("No administrator credentials configured"),
    }

    // Settings file is created with defaults on first load
    state.settings.load().await?;

    let scheduler = SchedulerService::new(state.retention.clone()).await?;
    scheduler.start().await?;

    tracing::info!("Application initialized successfully");

    Ok((state, scheduler))
}
