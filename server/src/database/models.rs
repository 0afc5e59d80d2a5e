//! Database models
//!
//! Rust structs representing database entities and the request bodies
//! that create or update them. All models serialize as camelCase JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ===== Status enums =====

/// Soft-delete marker used by financial records (`A` active, `D` deleted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RecordStatus {
    #[sqlx(rename = "A")]
    #[serde(rename = "A")]
    Active,
    #[sqlx(rename = "D")]
    #[serde(rename = "D")]
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HouseholdStatus {
    Active,
    Inactive,
}

/// House ownership status of a household (status kepemilikan rumah)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OwnershipStatus {
    Owner,
    Rented,
    Borrowing,
    Boarding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResidentStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InactiveReason {
    Moved,
    Deceased,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    Good,
    Damaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

// ===== Registries =====

/// A street address that households live at
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub full_address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub full_address: String,
}

/// A family card (Kartu Keluarga)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub kk_number: String,
    pub address_id: String,
    pub status_kk: HouseholdStatus,
    pub ownership_status: OwnershipStatus,
    /// Household whose house is being borrowed, only for `borrowing`
    pub borrowed_from_kk: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdRequest {
    pub kk_number: String,
    pub address_id: String,
    #[serde(default = "default_household_status")]
    pub status_kk: HouseholdStatus,
    pub ownership_status: OwnershipStatus,
    #[serde(default)]
    pub borrowed_from_kk: Option<String>,
}

fn default_household_status() -> HouseholdStatus {
    HouseholdStatus::Active
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: String,
    pub nik: String,
    pub kk_number: String,
    pub full_name: String,
    pub gender: Gender,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub religion: String,
    pub marital_status: String,
    pub occupation: String,
    pub family_relation: String,
    pub status: ResidentStatus,
    pub inactive_reason: Option<InactiveReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentRequest {
    pub nik: String,
    pub kk_number: String,
    pub full_name: String,
    pub gender: Gender,
    #[serde(default)]
    pub birth_place: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub religion: String,
    #[serde(default)]
    pub marital_status: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub family_relation: String,
}

/// Resident list filters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentFilter {
    pub kk: Option<String>,
    pub status: Option<ResidentStatus>,
    /// Matches name or NIK
    pub q: Option<String>,
}

// ===== Finance =====

/// Monetary inflow. A dues payment carries an `address_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTransaction {
    pub id: String,
    pub resident_id: Option<String>,
    pub address_id: Option<String>,
    pub transaction_amount: i64,
    pub transaction_date: NaiveDate,
    pub remarks: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /finance/income` and `PUT /finance/income/:id`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRequest {
    pub transaction_date: NaiveDate,
    pub transaction_amount: i64,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub resident_id: Option<String>,
    /// Months covered by a dues payment, `MM-YYYY`
    #[serde(default)]
    pub months: Vec<String>,
}

/// Income with the months it paid for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeDetail {
    #[serde(flatten)]
    pub income: IncomeTransaction,
    pub months: Vec<String>,
}

/// One month of dues paid for an address (`donation_history`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub address_id: String,
    /// `YYYY-MM`
    pub month: String,
    pub amount: i64,
    pub date_paid: NaiveDate,
    pub income_id: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTransaction {
    pub id: String,
    pub remarks: String,
    pub transaction_amount: i64,
    pub transaction_date: NaiveDate,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub remarks: String,
    pub transaction_amount: i64,
    pub transaction_date: NaiveDate,
}

/// Date-range filter shared by income and expense listings
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ===== Inventory =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub condition: ItemCondition,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRequest {
    pub name: String,
    pub quantity: i64,
    #[serde(default = "default_condition")]
    pub condition: ItemCondition,
    #[serde(default)]
    pub remarks: String,
}

fn default_condition() -> ItemCondition {
    ItemCondition::Good
}

/// Item with the quantity not currently lent out
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemStock {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub available: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLoan {
    pub id: String,
    pub item_id: String,
    pub borrower_name: String,
    pub resident_id: Option<String>,
    pub quantity: i64,
    pub loan_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub item_id: String,
    pub borrower_name: String,
    #[serde(default)]
    pub resident_id: Option<String>,
    pub quantity: i64,
    pub loan_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub returned_date: NaiveDate,
}

// ===== Letters =====

/// Introductory letter (surat pengantar) issued to a resident
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub id: String,
    pub letter_number: String,
    pub resident_id: String,
    pub purpose: String,
    pub issued_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterRequest {
    pub resident_id: String,
    pub purpose: String,
    pub issued_date: NaiveDate,
}

// ===== Auth =====

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}
