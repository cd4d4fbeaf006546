use async_trait::async_trait;
use bar_core::{CoreError, CoreResult, Page, PageQuery, PageSource, VisitorCommentStore};
use bar_shared::Visitor;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::error::StoreResult;
use crate::filters::{push_filters, push_order, push_page, ColumnMap};

const SELECT: &str =
    "SELECT id, username, name, creation_date, last_visit_date, real_name, comment FROM visitors";

const COLUMNS: ColumnMap = ColumnMap::new(
    &[
        ("id", "id"),
        ("username", "username"),
        ("name", "name"),
        ("creation_date", "creation_date"),
        ("last_visit_date", "last_visit_date"),
        ("real_name", "real_name"),
        ("comment", "comment"),
    ],
    "id",
);

pub struct StoreVisitorRepository {
    pool: PgPool,
}

impl StoreVisitorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct VisitorRecord {
    id: i64,
    username: Option<String>,
    name: Option<String>,
    creation_date: DateTime<Utc>,
    last_visit_date: DateTime<Utc>,
    real_name: Option<String>,
    comment: Option<String>,
}

impl From<VisitorRecord> for Visitor {
    fn from(r: VisitorRecord) -> Self {
        Visitor {
            id: r.id,
            username: r.username,
            name: r.name,
            creation_date: r.creation_date,
            last_visit_date: r.last_visit_date,
            real_name: r.real_name,
            comment: r.comment,
        }
    }
}

fn count_query(query: &PageQuery) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM visitors");
    push_filters(&mut builder, &COLUMNS, &query.filters)?;
    Ok(builder)
}

fn rows_query(query: &PageQuery) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(SELECT);
    push_filters(&mut builder, &COLUMNS, &query.filters)?;
    push_order(&mut builder, &COLUMNS, &query.sort)?;
    push_page(&mut builder, query);
    Ok(builder)
}

impl StoreVisitorRepository {
    async fn load(&self, query: &PageQuery) -> StoreResult<Page<Visitor>> {
        let total: i64 = count_query(query)?
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let records = rows_query(query)?
            .build_query_as::<VisitorRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(page = query.page, total, fetched = records.len(), "Loaded visitors page");

        Ok(Page {
            rows: records.into_iter().map(Visitor::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn write_comment(&self, id: i64, comment: Option<&str>) -> StoreResult<Option<Visitor>> {
        let record = sqlx::query_as::<_, VisitorRecord>(
            "UPDATE visitors SET comment = $1 WHERE id = $2 \
             RETURNING id, username, name, creation_date, last_visit_date, real_name, comment",
        )
        .bind(comment)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Visitor::from))
    }
}

#[async_trait]
impl PageSource for StoreVisitorRepository {
    type Row = Visitor;

    async fn fetch_page(&self, query: &PageQuery) -> CoreResult<Page<Visitor>> {
        Ok(self.load(query).await?)
    }
}

#[async_trait]
impl VisitorCommentStore for StoreVisitorRepository {
    async fn update_comment(&self, id: i64, comment: Option<&str>) -> CoreResult<Visitor> {
        self.write_comment(id, comment)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("visitor {id}")))
    }
}
