use async_trait::async_trait;
use bar_core::{CoreResult, Page, PageQuery, PageSource};
use bar_shared::{Booking, BookingRow, BookingStatus, Masked};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::error::StoreResult;
use crate::filters::{push_filters, push_order, push_page, ColumnMap, EnumFallback};

const FROM: &str = " FROM bookings b LEFT JOIN visitors v ON v.id = b.userid";

const SELECT: &str = "SELECT b.id, b.userid, b.date, b.visitors_count, b.phone, b.status, \
     COALESCE(v.username, '') AS username, COALESCE(v.real_name, '') AS real_name";

pub(crate) const COLUMNS: ColumnMap = ColumnMap::new(
    &[
        ("id", "b.id"),
        ("userid", "b.userid"),
        ("username", "COALESCE(v.username, '')"),
        ("real_name", "COALESCE(v.real_name, '')"),
        ("date", "b.date"),
        ("visitors_count", "b.visitors_count"),
        ("phone", "b.phone"),
        ("status", "b.status"),
    ],
    "b.id",
)
.with_enum_fallback(EnumFallback {
    field: "status",
    value: "pending",
    known: KNOWN_STATUSES,
});

/// Stored codes that decode to something other than `pending`.
const KNOWN_STATUSES: &[&str] = &["active", "completed", "canceled", "confirmed"];

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRecord {
    id: i64,
    userid: i64,
    date: DateTime<Utc>,
    visitors_count: i32,
    phone: Option<String>,
    status: Option<String>,
    username: String,
    real_name: String,
}

impl From<BookingRecord> for BookingRow {
    fn from(r: BookingRecord) -> Self {
        BookingRow {
            booking: Booking {
                id: r.id,
                userid: r.userid,
                date: r.date,
                visitors_count: r.visitors_count,
                phone: r.phone.map(Masked::from),
                status: BookingStatus::from_code(r.status.as_deref().unwrap_or_default()),
            },
            username: r.username,
            real_name: r.real_name,
        }
    }
}

fn count_query(query: &PageQuery) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*){FROM}"));
    push_filters(&mut builder, &COLUMNS, &query.filters)?;
    Ok(builder)
}

fn rows_query(query: &PageQuery) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("{SELECT}{FROM}"));
    push_filters(&mut builder, &COLUMNS, &query.filters)?;
    push_order(&mut builder, &COLUMNS, &query.sort)?;
    push_page(&mut builder, query);
    Ok(builder)
}

impl StoreBookingRepository {
    async fn load(&self, query: &PageQuery) -> StoreResult<Page<BookingRow>> {
        let total: i64 = count_query(query)?
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let records = rows_query(query)?
            .build_query_as::<BookingRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(page = query.page, total, fetched = records.len(), "Loaded bookings page");

        Ok(Page {
            rows: records.into_iter().map(BookingRow::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PageSource for StoreBookingRepository {
    type Row = BookingRow;

    async fn fetch_page(&self, query: &PageQuery) -> CoreResult<Page<BookingRow>> {
        Ok(self.load(query).await?)
    }
}
