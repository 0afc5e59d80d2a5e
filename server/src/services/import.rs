//! Spreadsheet import
//!
//! Bulk import of addresses and residents from the first sheet of an
//! `.xlsx` workbook. The first row holds column headers. Each data row is
//! validated on its own: valid rows are inserted, invalid rows are reported
//! with their 1-based data row number and the rest of the file still goes
//! through.

use crate::config::MAX_IMPORT_ROWS;
use crate::database::{Gender, ResidentRequest};
use crate::error::{is_unique_violation, AppError, Result};
use crate::services::{AddressesService, ResidentsService};
use calamine::{Data, DataType, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Ids of the records created, in file order
    pub inserted: Vec<String>,
    pub errors: Vec<RowError>,
}

/// Read every row of the first worksheet
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<Data>>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::validation("Workbook has no worksheets"))??;

    Ok(range.rows().map(|row| row.to_vec()).collect())
}

/// Header lookup: lower-case, spaces and dashes folded to `_`
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &[Data]) -> Self {
        let map = header
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                let name = cell_text(cell)?
                    .to_lowercase()
                    .replace([' ', '-'], "_");
                Some((name, i))
            })
            .collect();
        Self(map)
    }

    /// Index of the first header matching any alias
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.0.get(*a).copied())
    }

    fn require(&self, aliases: &[&str]) -> Result<usize> {
        self.find(aliases).ok_or_else(|| {
            AppError::validation(format!("Missing required column '{}'", aliases[0]))
        })
    }
}

/// Text content of a cell; whole numbers are printed without a fraction
/// so numeric NIK / KK cells survive.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{:.0}", f),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) => s.trim().to_string(),
        _ => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn cell_at(row: &[Data], index: Option<usize>) -> Option<&Data> {
    index.and_then(|i| row.get(i))
}

fn text_at(row: &[Data], index: Option<usize>) -> Option<String> {
    cell_at(row, index).and_then(cell_text)
}

/// Excel serial of 9999-12-31
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// Dates come as real date cells, Excel serial numbers, or text in
/// `YYYY-MM-DD`, `DD/MM/YYYY` or `DD-MM-YYYY`.
fn cell_date(cell: &Data) -> std::result::Result<NaiveDate, String> {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .ok_or_else(|| "invalid date cell".to_string()),
        Data::Float(_) | Data::Int(_) => {
            let serial = cell.get_float().or_else(|| cell.get_int().map(|i| i as f64));
            serial
                .filter(|s| (1.0..=MAX_DATE_SERIAL).contains(s))
                .and_then(|s| Duration::try_days(s as i64))
                .and_then(|days| NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(days))
                .ok_or_else(|| "invalid date serial".to_string())
        }
        Data::String(s) => {
            let s = s.trim();
            ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .ok_or_else(|| format!("invalid date '{}'", s))
        }
        _ => Err("date is required".to_string()),
    }
}

fn parse_gender(value: &str) -> std::result::Result<Gender, String> {
    match value.trim().to_lowercase().as_str() {
        "male" | "l" | "laki_laki" | "laki-laki" | "laki laki" => Ok(Gender::Male),
        "female" | "p" | "perempuan" => Ok(Gender::Female),
        other => Err(format!("invalid gender '{}'", other)),
    }
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| cell_text(cell).is_none() && !matches!(cell, Data::DateTime(_)))
}

/// Errors that describe a bad row rather than a broken server
fn is_row_error(err: &AppError) -> bool {
    match err {
        AppError::Validation(_) | AppError::NotFound { .. } => true,
        AppError::Database(db) => is_unique_violation(db),
        _ => false,
    }
}

/// Split header from data rows and enforce the row cap
fn split_header(rows: Vec<Vec<Data>>) -> Result<(Columns, Vec<Vec<Data>>)> {
    let mut iter = rows.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| AppError::validation("Spreadsheet is empty"))?;

    let data: Vec<Vec<Data>> = iter.collect();
    if data.len() > MAX_IMPORT_ROWS {
        return Err(AppError::validation(format!(
            "Too many rows: {} (maximum {})",
            data.len(),
            MAX_IMPORT_ROWS
        )));
    }

    Ok((Columns::from_header(&header), data))
}

/// Service for bulk spreadsheet imports
#[derive(Clone)]
pub struct ImportService {
    addresses: AddressesService,
    residents: ResidentsService,
}

impl ImportService {
    pub fn new(addresses: AddressesService, residents: ResidentsService) -> Self {
        Self {
            addresses,
            residents,
        }
    }

    pub async fn import_addresses(&self, bytes: &[u8]) -> Result<ImportReport> {
        let rows = read_first_sheet(bytes)?;
        self.import_address_rows(rows).await
    }

    pub async fn import_address_rows(&self, rows: Vec<Vec<Data>>) -> Result<ImportReport> {
        let (columns, data) = split_header(rows)?;
        let address_col = columns.require(&["full_address", "address", "alamat"])?;

        let mut report = ImportReport::default();

        for (i, row) in data.iter().enumerate() {
            if is_blank(row) {
                continue;
            }
            let row_number = i + 1;

            let Some(full_address) = text_at(row, Some(address_col)) else {
                report.errors.push(RowError {
                    row: row_number,
                    message: "fullAddress is required".to_string(),
                });
                continue;
            };

            match self.addresses.create_address(&full_address).await {
                Ok(address) => report.inserted.push(address.id),
                Err(e) if is_row_error(&e) => report.errors.push(RowError {
                    row: row_number,
                    message: e.to_string(),
                }),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Address import finished: {} inserted, {} rejected",
            report.inserted.len(),
            report.errors.len()
        );
        Ok(report)
    }

    pub async fn import_residents(&self, bytes: &[u8], today: NaiveDate) -> Result<ImportReport> {
        let rows = read_first_sheet(bytes)?;
        self.import_resident_rows(rows, today).await
    }

    pub async fn import_resident_rows(&self, rows: Vec<Vec<Data>>, today: NaiveDate) -> Result<ImportReport> {
        let (columns, data) = split_header(rows)?;

        let nik = columns.require(&["nik"])?;
        let kk = columns.require(&["kk_number", "no_kk", "kk"])?;
        let name = columns.require(&["full_name", "name", "nama"])?;
        let gender = columns.require(&["gender", "jenis_kelamin"])?;
        let birth_date = columns.require(&["birth_date", "tanggal_lahir"])?;

        let birth_place = columns.find(&["birth_place", "tempat_lahir"]);
        let religion = columns.find(&["religion", "agama"]);
        let marital_status = columns.find(&["marital_status", "status_perkawinan"]);
        let occupation = columns.find(&["occupation", "pekerjaan"]);
        let family_relation = columns.find(&["family_relation", "hubungan_keluarga"]);

        let mut report = ImportReport::default();

        for (i, row) in data.iter().enumerate() {
            if is_blank(row) {
                continue;
            }
            let row_number = i + 1;

            let parsed = (|| -> std::result::Result<ResidentRequest, String> {
                let gender = parse_gender(&text_at(row, Some(gender)).unwrap_or_default())?;
                let birth_date = cell_at(row, Some(birth_date))
                    .ok_or_else(|| "date is required".to_string())
                    .and_then(cell_date)?;

                Ok(ResidentRequest {
                    nik: text_at(row, Some(nik)).unwrap_or_default(),
                    kk_number: text_at(row, Some(kk)).unwrap_or_default(),
                    full_name: text_at(row, Some(name)).unwrap_or_default(),
                    gender,
                    birth_place: text_at(row, birth_place).unwrap_or_default(),
                    birth_date,
                    religion: text_at(row, religion).unwrap_or_default(),
                    marital_status: text_at(row, marital_status).unwrap_or_default(),
                    occupation: text_at(row, occupation).unwrap_or_default(),
                    family_relation: text_at(row, family_relation).unwrap_or_default(),
                })
            })();

            let req = match parsed {
                Ok(req) => req,
                Err(message) => {
                    report.errors.push(RowError {
                        row: row_number,
                        message,
                    });
                    continue;
                }
            };

            match self.residents.create_resident(req, today).await {
                Ok(resident) => report.inserted.push(resident.id),
                Err(e) if is_row_error(&e) => report.errors.push(RowError {
                    row: row_number,
                    message: e.to_string(),
                }),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Resident import finished: {} inserted, {} rejected",
            report.inserted.len(),
            report.errors.len()
        );
        Ok(report)
    }
}
