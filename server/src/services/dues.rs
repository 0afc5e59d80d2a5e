//! Dues (iuran) service
//!
//! Reconciles the dues ledger against the calendar and writes ledger rows
//! for dues payments. A month is `paid` when an active ledger row exists
//! for it, `late` once its last day has passed without one, and `pending`
//! otherwise.

use crate::database::{Address, LedgerEntry, Repository};
use crate::error::{is_unique_violation, AppError, Result};
use crate::period::DuesMonth;
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::SqliteConnection;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuesStatus {
    Paid,
    Late,
    Pending,
}

impl FromStr for DuesStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "paid" => Ok(DuesStatus::Paid),
            "late" => Ok(DuesStatus::Late),
            "pending" => Ok(DuesStatus::Pending),
            other => Err(AppError::Validation(format!(
                "Unknown status '{}', expected paid, late or pending",
                other
            ))),
        }
    }
}

/// Query for `GET /finance/iuran/status`
///
/// Forms submit every field, so an empty value means the filter is off.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesStatusQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year: Option<i32>,
    /// 1..=12; all twelve months when absent
    #[serde(default, deserialize_with = "empty_as_none")]
    pub month: Option<u32>,
    /// Single address; every address when absent
    #[serde(default, deserialize_with = "empty_as_none")]
    pub address_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<DuesStatus>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesStatusEntry {
    pub address_id: String,
    pub address: String,
    pub month: DuesMonth,
    pub status: DuesStatus,
}

/// Parse client month strings, dropping duplicates. Result is sorted.
pub fn parse_months(raw: &[String]) -> Result<Vec<DuesMonth>> {
    let months = raw
        .iter()
        .map(|m| m.parse::<DuesMonth>())
        .collect::<Result<BTreeSet<_>>>()?;

    Ok(months.into_iter().collect())
}

/// Split a payment over `count` months. The remainder goes to the first
/// month so the parts always sum to `total`.
pub fn split_amount(total: i64, count: usize) -> Vec<i64> {
    if count == 0 {
        return Vec::new();
    }

    let n = count as i64;
    let mut parts = vec![total / n; count];
    parts[0] += total % n;
    parts
}

/// Set of paid months from raw ledger keys. Keys that do not parse are
/// skipped.
pub fn paid_month_set(raw: &[String]) -> HashSet<DuesMonth> {
    raw.iter()
        .filter_map(|key| match key.trim().parse::<DuesMonth>() {
            Ok(month) => Some(month),
            Err(_) => {
                tracing::warn!("Skipping malformed ledger month '{}'", key);
                None
            }
        })
        .collect()
}

/// Classify a single month against the paid set
pub fn classify_month(paid: &HashSet<DuesMonth>, month: DuesMonth, today: NaiveDate) -> DuesStatus {
    if paid.contains(&month) {
        DuesStatus::Paid
    } else if month.is_elapsed(today) {
        DuesStatus::Late
    } else {
        DuesStatus::Pending
    }
}

/// Insert one ledger row per month for a dues payment.
///
/// Every month is checked against the active rows of the address before
/// anything is written; the first conflict aborts with
/// [`AppError::DuplicatePayment`]. Must run inside the caller's
/// transaction so a rejected batch leaves no rows behind.
pub async fn write_ledger(
    conn: &mut SqliteConnection,
    address: &Address,
    months: &[DuesMonth],
    total_amount: i64,
    date_paid: NaiveDate,
    income_id: &str,
) -> Result<Vec<LedgerEntry>> {
    for &month in months {
        if Repository::find_active_ledger_entry(&mut *conn, &address.id, month)
            .await?
            .is_some()
        {
            tracing::warn!(
                "Rejected duplicate dues payment for {} at {}",
                month,
                address.full_address
            );
            return Err(AppError::DuplicatePayment {
                address: address.full_address.clone(),
                month,
            });
        }
    }

    insert_ledger_rows(conn, address, months, total_amount, date_paid, income_id).await
}

/// Insert one active ledger row per month. A unique-index violation means
/// another writer recorded the month first and becomes
/// [`AppError::DuplicatePayment`].
async fn insert_ledger_rows(
    conn: &mut SqliteConnection,
    address: &Address,
    months: &[DuesMonth],
    total_amount: i64,
    date_paid: NaiveDate,
    income_id: &str,
) -> Result<Vec<LedgerEntry>> {
    let mut entries = Vec::with_capacity(months.len());

    for (&month, amount) in months.iter().zip(split_amount(total_amount, months.len())) {
        let entry = Repository::insert_ledger_entry(&mut *conn, &address.id, month, amount, date_paid, income_id)
            .await
            .map_err(|e| match e {
                AppError::Database(ref db) if is_unique_violation(db) => AppError::DuplicatePayment {
                    address: address.full_address.clone(),
                    month,
                },
                other => other,
            })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Service answering dues status queries
#[derive(Clone)]
pub struct DuesService {
    repo: Repository,
}

impl DuesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Status of every requested (address, month) pair as of `today`
    pub async fn status(&self, query: &DuesStatusQuery, today: NaiveDate) -> Result<Vec<DuesStatusEntry>> {
        let year = query
            .year
            .ok_or_else(|| AppError::validation("year is required"))?;

        let months = match query.month {
            Some(month) => vec![DuesMonth::new(year, month)?],
            None => DuesMonth::months_of_year(year)?,
        };

        let addresses = match query.address_id.as_deref() {
            Some(id) if !id.trim().is_empty() => vec![self.repo.get_address(id.trim()).await?],
            _ => self.repo.list_addresses(None).await?,
        };

        let mut entries = Vec::with_capacity(addresses.len() * months.len());

        for address in addresses {
            let paid = paid_month_set(&self.repo.active_ledger_months(&address.id).await?);

            for &month in &months {
                let status = classify_month(&paid, month, today);

                if query.status.map_or(true, |wanted| wanted == status) {
                    entries.push(DuesStatusEntry {
                        address_id: address.id.clone(),
                        address: address.full_address.clone(),
                        month,
                        status,
                    });
                }
            }
        }

        tracing::debug!("Computed {} dues status entries for {}", entries.len(), year);
        Ok(entries)
    }

    /// Full ledger history of an address, including soft-deleted rows
    pub async fn ledger_for_address(&self, address_id: &str) -> Result<Vec<LedgerEntry>> {
        self.repo.get_address(address_id).await?;
        self.repo.list_ledger_for_address(address_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;
    use crate::database::NewIncome;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> DuesMonth {
        DuesMonth::new(y, m).unwrap()
    }

    async fn pay(repo: &Repository, address: &Address, months: &[DuesMonth]) -> Result<Vec<LedgerEntry>> {
        let mut tx = repo.begin().await?;
        let income = Repository::insert_income(
            &mut tx,
            &NewIncome {
                resident_id: None,
                address_id: Some(address.id.clone()),
                transaction_amount: 50_000 * months.len() as i64,
                transaction_date: date(2025, 3, 1),
                remarks: "Iuran".to_string(),
            },
        )
        .await?;
        let entries = write_ledger(&mut tx, address, months, income.transaction_amount, date(2025, 3, 1), &income.id).await?;
        tx.commit().await?;
        Ok(entries)
    }

    #[test]
    fn test_split_amount_sums_to_total() {
        assert_eq!(split_amount(100_000, 3), vec![33_334, 33_333, 33_333]);
        assert_eq!(split_amount(90_000, 3), vec![30_000, 30_000, 30_000]);
        assert_eq!(split_amount(50_000, 1), vec![50_000]);
        assert!(split_amount(50_000, 0).is_empty());
    }

    #[test]
    fn test_parse_months_dedups_and_sorts() {
        let raw = vec!["04-2025".to_string(), "03-2025".to_string(), "2025-04".to_string()];
        assert_eq!(parse_months(&raw).unwrap(), vec![month(2025, 3), month(2025, 4)]);

        let bad = vec!["03-2025".to_string(), "march".to_string()];
        assert!(parse_months(&bad).is_err());
    }

    #[test]
    fn test_paid_month_set_trims_and_skips_garbage() {
        let raw = vec![" 2025-03 ".to_string(), "garbage".to_string(), "2025-05".to_string()];
        let set = paid_month_set(&raw);

        assert_eq!(set.len(), 2);
        assert!(set.contains(&month(2025, 3)));
    }

    #[test]
    fn test_classify_month() {
        let paid: HashSet<_> = [month(2025, 3)].into_iter().collect();
        let today = date(2025, 6, 15);

        assert_eq!(classify_month(&paid, month(2025, 3), today), DuesStatus::Paid);
        assert_eq!(classify_month(&paid, month(2025, 5), today), DuesStatus::Late);
        assert_eq!(classify_month(&paid, month(2025, 6), today), DuesStatus::Pending);
        assert_eq!(classify_month(&paid, month(2025, 7), today), DuesStatus::Pending);
    }

    #[tokio::test]
    async fn test_year_status_for_single_address() {
        let repo = create_test_repo().await;
        let address = repo.create_address("Jl. Melati 3").await.unwrap();
        pay(&repo, &address, &[month(2025, 3)]).await.unwrap();

        let service = DuesService::new(repo);
        let query = DuesStatusQuery {
            year: Some(2025),
            address_id: Some(address.id.clone()),
            ..Default::default()
        };

        let entries = service.status(&query, date(2025, 6, 15)).await.unwrap();
        let statuses: Vec<DuesStatus> = entries.iter().map(|e| e.status).collect();

        use DuesStatus::*;
        assert_eq!(
            statuses,
            vec![Late, Late, Paid, Late, Late, Pending, Pending, Pending, Pending, Pending, Pending, Pending]
        );

        let months: Vec<String> = entries.iter().map(|e| e.month.to_string()).collect();
        assert_eq!(months.first().map(String::as_str), Some("2025-01"));
        assert_eq!(months.last().map(String::as_str), Some("2025-12"));
    }

    #[tokio::test]
    async fn test_status_filter_and_single_month() {
        let repo = create_test_repo().await;
        let a = repo.create_address("Jl. Melati 3").await.unwrap();
        let b = repo.create_address("Jl. Mawar 9").await.unwrap();
        pay(&repo, &a, &[month(2025, 3)]).await.unwrap();

        let service = DuesService::new(repo);

        let query = DuesStatusQuery {
            year: Some(2025),
            month: Some(3),
            ..Default::default()
        };
        let entries = service.status(&query, date(2025, 6, 15)).await.unwrap();
        assert_eq!(entries.len(), 2);

        let late_only = DuesStatusQuery {
            status: Some(DuesStatus::Late),
            ..query
        };
        let entries = service.status(&late_only, date(2025, 6, 15)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address_id, b.id);
    }

    #[tokio::test]
    async fn test_status_requires_year_and_known_address() {
        let repo = create_test_repo().await;
        let service = DuesService::new(repo);

        let missing_year = DuesStatusQuery {
            address_id: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.status(&missing_year, date(2025, 1, 1)).await,
            Err(AppError::Validation(_))
        ));

        let unknown = DuesStatusQuery {
            year: Some(2025),
            address_id: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.status(&unknown, date(2025, 1, 1)).await,
            Err(AppError::NotFound { .. })
        ));

        let bad_month = DuesStatusQuery {
            year: Some(2025),
            month: Some(13),
            ..Default::default()
        };
        assert!(matches!(
            service.status(&bad_month, date(2025, 1, 1)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_every_month_in_batch_is_checked() {
        let repo = create_test_repo().await;
        let address = repo.create_address("Jl. Melati 3").await.unwrap();
        pay(&repo, &address, &[month(2025, 4)]).await.unwrap();

        // 2025-04 is the second month of the batch
        let result = pay(&repo, &address, &[month(2025, 3), month(2025, 4)]).await;
        match result {
            Err(AppError::DuplicatePayment { address: name, month: m }) => {
                assert_eq!(name, "Jl. Melati 3");
                assert_eq!(m, month(2025, 4));
            }
            other => panic!("expected duplicate payment, got {:?}", other),
        }

        // Rolled back: only the first payment's row exists
        let rows = repo.list_ledger_for_address(&address.id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_month_taken_after_check_is_duplicate() {
        let repo = create_test_repo().await;
        let address = repo.create_address("Jl. Kenanga 7").await.unwrap();
        let mut tx = repo.begin().await.unwrap();

        let income = Repository::insert_income(
            &mut tx,
            &NewIncome {
                resident_id: None,
                address_id: Some(address.id.clone()),
                transaction_amount: 50_000,
                transaction_date: date(2025, 5, 1),
                remarks: "Iuran".to_string(),
            },
        )
        .await
        .unwrap();

        // Passes the pre-check, then another writer records May
        assert!(Repository::find_active_ledger_entry(&mut tx, &address.id, month(2025, 5))
            .await
            .unwrap()
            .is_none());
        Repository::insert_ledger_entry(&mut tx, &address.id, month(2025, 5), 50_000, date(2025, 5, 1), &income.id)
            .await
            .unwrap();

        let result = insert_ledger_rows(&mut tx, &address, &[month(2025, 5)], 50_000, date(2025, 5, 1), &income.id).await;
        match result {
            Err(AppError::DuplicatePayment { address: name, month: m }) => {
                assert_eq!(name, "Jl. Kenanga 7");
                assert_eq!(m, month(2025, 5));
            }
            other => panic!("expected duplicate payment, got {:?}", other),
        }
    }

    #[test]
    fn test_status_query_ignores_empty_fields() {
        let query: DuesStatusQuery =
            serde_json::from_value(serde_json::json!({ "month": "", "year": "2025", "addressId": "", "status": "" })).unwrap();
        assert_eq!(query.year, Some(2025));
        assert_eq!(query.month, None);
        assert_eq!(query.address_id, None);
        assert_eq!(query.status, None);

        let query: DuesStatusQuery =
            serde_json::from_value(serde_json::json!({ "month": "03", "year": "2025", "status": "late" })).unwrap();
        assert_eq!(query.month, Some(3));
        assert_eq!(query.status, Some(DuesStatus::Late));

        assert!(serde_json::from_value::<DuesStatusQuery>(serde_json::json!({ "status": "overdue" })).is_err());
    }
}
