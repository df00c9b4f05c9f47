// src/common/query.rs

//! Pipeline de listagem compartilhado por tarefas e leads:
//! escopo do papel → filtros → ordenação → paginação.
//!
//! Tudo aqui é função pura de (coleção, consulta). Nada toca o store.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{common::error::AppError, middleware::rbac::Scope};

// =============================================================================
//  CONTRATOS
// =============================================================================

/// Valor comparável de uma coluna.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Timestamp(i64),
    Text(String),
}

/// Um registro que passa pelo pipeline.
pub trait Queryable {
    /// Colunas aceitas em `sortBy`.
    const SORT_KEYS: &'static [&'static str];

    /// Dono para o escopo de papel (`assignedTo` ou `owner`).
    fn scope_owner(&self) -> Option<uuid::Uuid>;

    /// Só é chamado com chaves presentes em `SORT_KEYS`.
    fn sort_value(&self, key: &str) -> SortValue;
}

pub trait RecordFilter<T> {
    fn matches(&self, record: &T) -> bool;
}

// =============================================================================
//  ORDENAÇÃO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|s| s.to_ascii_lowercase()) {
            None => Ok(SortDir::Asc),
            Some(dir) if dir == "asc" => Ok(SortDir::Asc),
            Some(dir) if dir == "desc" => Ok(SortDir::Desc),
            Some(dir) => Err(AppError::validation(format!("Invalid sortDir: {}", dir))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub dir: SortDir,
}

impl SortSpec {
    /// Valida a chave contra as colunas do tipo. `None` quando `sortBy` não veio.
    pub fn parse<T: Queryable>(
        sort_by: Option<&str>,
        sort_dir: Option<&str>,
    ) -> Result<Option<Self>, AppError> {
        let dir = SortDir::parse(sort_dir)?;
        let Some(raw) = sort_by else {
            return Ok(None);
        };
        let key = T::SORT_KEYS
            .iter()
            .find(|k| **k == raw)
            .copied()
            .ok_or_else(|| AppError::validation(format!("Unsupported sort key: {}", raw)))?;
        Ok(Some(SortSpec { key, dir }))
    }
}

// =============================================================================
//  PAGINAÇÃO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    All,
    Page { page: usize, page_size: usize },
}

impl Pagination {
    pub fn from_params(
        page: Option<usize>,
        page_size: Option<usize>,
        default_size: usize,
        max_size: usize,
    ) -> Result<Self, AppError> {
        if page.is_none() && page_size.is_none() {
            return Ok(Pagination::All);
        }
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(default_size);
        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if page_size < 1 || page_size > max_size {
            return Err(AppError::validation(format!(
                "pageSize must be between 1 and {}",
                max_size
            )));
        }
        Ok(Pagination::Page { page, page_size })
    }
}

/// Resposta de toda listagem, paginada ou não.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub items: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct ListQuery<F> {
    pub filter: F,
    pub sort: Option<SortSpec>,
    pub pagination: Pagination,
}

// =============================================================================
//  EXECUÇÃO
// =============================================================================

pub fn run<T, F>(records: &[T], scope: Scope, query: &ListQuery<F>) -> Page<T>
where
    T: Queryable + Clone,
    F: RecordFilter<T>,
{
    let mut rows: Vec<&T> = records
        .iter()
        .filter(|r| scope.admits(r.scope_owner()))
        .filter(|r| query.filter.matches(*r))
        .collect();

    if let Some(sort) = &query.sort {
        rows = sort_rows(rows, sort);
    }

    paginate(rows, query.pagination)
}

// `sort_by` é estável: empates mantêm a ordem de entrada, inclusive em `Desc`.
fn sort_rows<'a, T: Queryable>(rows: Vec<&'a T>, sort: &SortSpec) -> Vec<&'a T> {
    let mut keyed: Vec<(SortValue, &T)> = rows
        .into_iter()
        .map(|r| (r.sort_value(sort.key), r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.cmp(b);
        match sort.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });

    keyed.into_iter().map(|(_, r)| r).collect()
}

fn paginate<T: Clone>(rows: Vec<&T>, pagination: Pagination) -> Page<T> {
    let total = rows.len();
    match pagination {
        Pagination::All => Page {
            page: 1,
            page_size: total,
            total,
            items: rows.into_iter().cloned().collect(),
        },
        Pagination::Page { page, page_size } => {
            let start = (page - 1).saturating_mul(page_size);
            let items = rows
                .into_iter()
                .skip(start)
                .take(page_size)
                .cloned()
                .collect();
            Page {
                page,
                page_size,
                total,
                items,
            }
        }
    }
}

// =============================================================================
//  HELPERS DE FILTRO
// =============================================================================

pub fn eq_ci(value: &str, wanted: &str) -> bool {
    value.to_lowercase() == wanted.to_lowercase()
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn has_tag(tags: &[String], wanted: &str) -> bool {
    tags.iter().any(|t| eq_ci(t, wanted))
}

/// Converte `YYYY-MM-DD`, RFC 3339 ou `YYYY-MM-DDTHH:MM:SS` (UTC) em milissegundos.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Timestamp para ordenação: data ausente ou inválida conta como época 0.
pub fn due_sort_value(raw: Option<&str>) -> SortValue {
    SortValue::Timestamp(raw.and_then(parse_timestamp).unwrap_or(0))
}

/// Intervalo inclusivo sobre `dueDate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl DateRange {
    // Limites que não fazem parse são ignorados.
    pub fn from_params(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: from.and_then(parse_timestamp),
            to: to.and_then(parse_timestamp),
        }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn admits(&self, raw: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(ts) = raw.and_then(parse_timestamp) else {
            return false;
        };
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}
