//! Services module
//!
//! Business logic services that coordinate between the HTTP handlers and the
//! repository.

pub mod addresses;
pub mod auth;
pub mod dues;
pub mod finance;
pub mod households;
pub mod import;
pub mod inventory;
pub mod letters;
pub mod residents;
pub mod scheduler;
pub mod settings;

pub use addresses::AddressesService;
pub use auth::AuthService;
pub use dues::DuesService;
pub use finance::FinanceService;
pub use households::HouseholdsService;
pub use import::ImportService;
pub use inventory::InventoryService;
pub use letters::LettersService;
pub use residents::ResidentsService;
pub use scheduler::{LedgerRetention, SchedulerService};
pub use settings::SettingsService;
