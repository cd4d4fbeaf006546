use bar_core::{ColumnFilter, PageQuery, SortModel};
use sqlx::{Postgres, QueryBuilder};

use crate::error::{StoreError, StoreResult};

/// Maps grid field names to the SQL expressions they read from.
///
/// Only fields listed here ever reach a query string; everything else is bound.
pub struct ColumnMap {
    columns: &'static [(&'static str, &'static str)],
    tiebreak: &'static str,
    fallback: Option<EnumFallback>,
}

/// An enum column whose stored codes are loose: `value` stands for every
/// code outside `known`, including `NULL`, blanks and unrecognised text.
#[derive(Debug, Clone, Copy)]
pub struct EnumFallback {
    pub field: &'static str,
    pub value: &'static str,
    pub known: &'static [&'static str],
}

impl ColumnMap {
    pub const fn new(columns: &'static [(&'static str, &'static str)], tiebreak: &'static str) -> Self {
        Self { columns, tiebreak, fallback: None }
    }

    pub const fn with_enum_fallback(mut self, fallback: EnumFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn enum_fallback(&self, field: &str) -> Option<&EnumFallback> {
        self.fallback.as_ref().filter(|f| f.field == field)
    }

    pub fn resolve(&self, field: &str) -> StoreResult<&'static str> {
        self.columns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, expr)| *expr)
            .ok_or_else(|| StoreError::UnknownColumn(field.to_string()))
    }
}

/// Escapes `%`, `_` and the escape character itself for use inside ILIKE.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends ` WHERE ...` for the given filters. Pushes nothing when there are none.
pub fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    columns: &ColumnMap,
    filters: &[ColumnFilter],
) -> StoreResult<()> {
    let mut keyword = " WHERE ";
    for filter in filters {
        let column = columns.resolve(filter.field())?;
        match filter {
            ColumnFilter::TextContains { value, .. } => {
                builder.push(keyword).push(column).push(" ILIKE ");
                builder.push_bind(format!("%{}%", escape_like(value)));
            }
            ColumnFilter::EnumEquals { field, value } => match columns.enum_fallback(field) {
                Some(fallback) if value.trim() == fallback.value => {
                    builder
                        .push(keyword)
                        .push("(")
                        .push(column)
                        .push(" IS NULL OR BTRIM(")
                        .push(column)
                        .push(") NOT IN (");
                    let mut codes = builder.separated(", ");
                    for code in fallback.known {
                        codes.push_bind(*code);
                    }
                    codes.push_unseparated("))");
                }
                Some(_) => {
                    builder.push(keyword).push("BTRIM(").push(column).push(") = ");
                    builder.push_bind(value.trim().to_string());
                }
                None => {
                    builder.push(keyword).push(column).push(" = ");
                    builder.push_bind(value.clone());
                }
            },
            ColumnFilter::NumberEquals { value, .. } => {
                builder.push(keyword).push(column).push(" = ");
                builder.push_bind(*value);
            }
            ColumnFilter::DateRange { from, to, .. } => {
                // Both bounds open means no constraint at all
                if from.is_none() && to.is_none() {
                    continue;
                }
                builder.push(keyword).push("(TRUE");
                if let Some(from) = from {
                    builder.push(" AND ").push(column).push(" >= ");
                    builder.push_bind(*from);
                }
                if let Some(to) = to {
                    builder.push(" AND ").push(column).push(" <= ");
                    builder.push_bind(*to);
                }
                builder.push(")");
            }
        }
        keyword = " AND ";
    }
    Ok(())
}

pub fn push_order(
    builder: &mut QueryBuilder<'_, Postgres>,
    columns: &ColumnMap,
    sort: &SortModel,
) -> StoreResult<()> {
    let column = columns.resolve(&sort.field)?;
    builder
        .push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(sort.direction.as_sql());
    if column != columns.tiebreak {
        builder.push(", ").push(columns.tiebreak).push(" DESC");
    }
    Ok(())
}

pub fn push_page(builder: &mut QueryBuilder<'_, Postgres>, query: &PageQuery) {
    builder.push(" LIMIT ");
    builder.push_bind(query.limit());
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_core::SortDirection;

    const COLUMNS: ColumnMap = ColumnMap::new(
        &[("id", "t.id"), ("name", "t.name"), ("created", "t.created")],
        "t.id",
    );

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("VIP"), "VIP");
    }

    #[test]
    fn test_no_filters_no_where() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        push_filters(&mut builder, &COLUMNS, &[]).unwrap();
        assert_eq!(builder.sql(), "SELECT * FROM t");
    }

    #[test]
    fn test_filters_are_bound() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let filters = vec![
            ColumnFilter::TextContains { field: "name".into(), value: "'; DROP".into() },
            ColumnFilter::NumberEquals { field: "id".into(), value: 7 },
            ColumnFilter::DateRange {
                field: "created".into(),
                from: Some("2024-01-01T00:00:00Z".parse().unwrap()),
                to: None,
            },
        ];
        push_filters(&mut builder, &COLUMNS, &filters).unwrap();

        assert_eq!(
            builder.sql(),
            "SELECT * FROM t WHERE t.name ILIKE $1 AND t.id = $2 AND (TRUE AND t.created >= $3)"
        );
    }

    const STATUSES: ColumnMap = ColumnMap::new(&[("id", "t.id"), ("status", "t.status")], "t.id")
        .with_enum_fallback(EnumFallback {
            field: "status",
            value: "pending",
            known: &["active", "done"],
        });

    #[test]
    fn test_fallback_value_matches_everything_unknown() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let filters = vec![
            ColumnFilter::EnumEquals { field: "status".into(), value: "pending".into() },
            ColumnFilter::NumberEquals { field: "id".into(), value: 3 },
        ];
        push_filters(&mut builder, &STATUSES, &filters).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT * FROM t WHERE (t.status IS NULL OR BTRIM(t.status) NOT IN ($1, $2)) AND t.id = $3"
        );
    }

    #[test]
    fn test_known_enum_value_ignores_padding() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let filters = vec![ColumnFilter::EnumEquals { field: "status".into(), value: "active".into() }];
        push_filters(&mut builder, &STATUSES, &filters).unwrap();
        assert_eq!(builder.sql(), "SELECT * FROM t WHERE BTRIM(t.status) = $1");
    }

    #[test]
    fn test_open_date_range_is_skipped() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let filters = vec![ColumnFilter::DateRange { field: "created".into(), from: None, to: None }];
        push_filters(&mut builder, &COLUMNS, &filters).unwrap();
        assert_eq!(builder.sql(), "SELECT * FROM t");
    }

    #[test]
    fn test_unknown_column_rejected() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let filters = vec![ColumnFilter::NumberEquals { field: "password".into(), value: 1 }];
        assert!(matches!(
            push_filters(&mut builder, &COLUMNS, &filters),
            Err(StoreError::UnknownColumn(f)) if f == "password"
        ));
    }

    #[test]
    fn test_order_adds_tiebreak() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let sort = SortModel { field: "created".into(), direction: SortDirection::Asc };
        push_order(&mut builder, &COLUMNS, &sort).unwrap();
        assert_eq!(builder.sql(), "SELECT * FROM t ORDER BY t.created ASC, t.id DESC");

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        push_order(&mut builder, &COLUMNS, &SortModel::desc("id")).unwrap();
        assert_eq!(builder.sql(), "SELECT * FROM t ORDER BY t.id DESC");
    }

    #[test]
    fn test_page_binds_limit_offset() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        let query = PageQuery {
            page: 2,
            page_size: 10,
            filters: vec![],
            sort: SortModel::desc("id"),
        };
        push_page(&mut builder, &query);
        assert_eq!(builder.sql(), "SELECT * FROM t LIMIT $1 OFFSET $2");
    }
}
