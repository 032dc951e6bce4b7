//! Listing filters, sorting and pagination.

use super::models::TournamentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page size when none is given
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Highest page number whose offset still fits in an `i64`
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Sortable columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    StartDate,
    Title,
    CreatedAt,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::StartDate => "start_date",
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Tournament listing filter
#[derive(Debug, Clone, Default)]
pub struct TournamentFilter {
    pub status: Option<TournamentStatus>,
    pub category: Option<String>,
    /// Only tournaments starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only tournaments starting at or before this instant
    pub to: Option<DateTime<Utc>>,
    pub registration_open: Option<bool>,
    pub has_available_spots: Option<bool>,
    pub sort: SortField,
    pub order: SortOrder,
    /// 1-based page number
    pub page: i64,
    pub limit: i64,
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }
}

impl TournamentFilter {
    /// Page number clamped to `1..=MAX_PAGE`
    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        if self.limit <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.limit.min(MAX_PAGE_SIZE)
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Append the `WHERE` clause (always present, possibly `WHERE TRUE`)
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(status) = self.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = &self.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(from) = self.from {
            builder.push(" AND start_date >= ").push_bind(from);
        }
        if let Some(to) = self.to {
            builder.push(" AND start_date <= ").push_bind(to);
        }
        if let Some(open) = self.registration_open {
            builder.push(" AND registration_open = ").push_bind(open);
        }
        match self.has_available_spots {
            Some(true) => {
                builder.push(" AND current_participants < max_participants");
            }
            Some(false) => {
                builder.push(" AND current_participants >= max_participants");
            }
            None => {}
        }
    }

    /// Append `ORDER BY … LIMIT … OFFSET …`
    pub fn push_order_and_page(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let direction = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        builder.push(format!(
            " ORDER BY {} {}, id {}",
            self.sort.column(),
            direction,
            direction
        ));
        builder.push(" LIMIT ").push_bind(self.limit());
        builder.push(" OFFSET ").push_bind(self.offset());
    }
}
