use std::sync::Arc;

use bar_shared::{BookingRow, Collection};
use chrono::{Offset, Utc};

use super::{PageController, PageSettings};
use crate::format::{format_timestamp, phone_cell, status_label, Cell};
use crate::query::{FilterKind, SortModel};
use crate::repository::PageSource;
use crate::view::{ColumnDef, ViewDef};

const STATUS_CODES: &[&str] = &["active", "completed", "canceled", "confirmed", "pending"];

pub fn view() -> ViewDef<BookingRow> {
    ViewDef {
        title: "Бронирования",
        default_sort: SortModel::desc("id"),
        columns: vec![
            ColumnDef {
                field: "id",
                header: "ID",
                width: 90,
                filter: Some(FilterKind::Number),
                options: &[],
                sortable: true,
                editable: false,
                render: |row, _| Cell::text(row.booking.id.to_string()),
            },
            ColumnDef {
                field: "userid",
                header: "ID в телеграме",
                width: 120,
                filter: Some(FilterKind::Number),
                options: &[],
                sortable: true,
                editable: false,
                render: |row, _| Cell::text(row.booking.userid.to_string()),
            },
            ColumnDef {
                field: "username",
                header: "Username",
                width: 160,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: true,
                editable: false,
                render: |row, _| Cell::text(row.username.as_str()),
            },
            ColumnDef {
                field: "real_name",
                header: "Имя",
                width: 160,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: true,
                editable: false,
                render: |row, _| Cell::text(row.real_name.as_str()),
            },
            ColumnDef {
                field: "date",
                header: "Дата",
                width: 180,
                filter: Some(FilterKind::Date),
                options: &[],
                sortable: true,
                editable: false,
                // Booking times are entered as venue-local wall clock and stored as UTC.
                render: |row, _| Cell::text(format_timestamp(Some(&row.booking.date), &Utc.fix())),
            },
            ColumnDef {
                field: "visitors_count",
                header: "Кол-во гостей",
                width: 120,
                filter: Some(FilterKind::Number),
                options: &[],
                sortable: true,
                editable: false,
                render: |row, _| Cell::text(row.booking.visitors_count.to_string()),
            },
            ColumnDef {
                field: "phone",
                header: "Телефон",
                width: 160,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: false,
                editable: false,
                render: |row, _| {
                    phone_cell(row.booking.phone.as_ref().map(|p| p.expose().as_str()))
                },
            },
            ColumnDef {
                field: "status",
                header: "Статус",
                width: 160,
                filter: Some(FilterKind::Enum),
                options: STATUS_CODES,
                sortable: true,
                editable: false,
                render: |row, _| Cell::text(status_label(row.booking.status)),
            },
        ],
    }
}

pub fn page(source: Arc<dyn PageSource<Row = BookingRow>>, settings: PageSettings) -> PageController<BookingRow> {
    PageController::new(Collection::Bookings, view(), source, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ColumnFilter, Page, PageQuery};
    use crate::CoreResult;
    use async_trait::async_trait;
    use bar_shared::{Booking, BookingStatus, Masked};

    struct FixedBookings(Vec<BookingRow>);

    #[async_trait]
    impl PageSource for FixedBookings {
        type Row = BookingRow;

        async fn fetch_page(&self, _query: &PageQuery) -> CoreResult<Page<BookingRow>> {
            Ok(Page { rows: self.0.clone(), total: self.0.len() as u64 })
        }
    }

    fn orphan_booking() -> BookingRow {
        BookingRow {
            booking: Booking {
                id: 31,
                userid: 777,
                date: "2024-12-25T19:30:00Z".parse().unwrap(),
                visitors_count: 3,
                phone: Some(Masked("+7 (912) 000-11-22".to_string())),
                status: BookingStatus::from_code("no_show"),
            },
            username: String::new(),
            real_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_render_booking_without_visitor() {
        let page = page(Arc::new(FixedBookings(vec![orphan_booking()])), PageSettings::default());
        page.refresh().await;

        let doc = page.render().await;
        let cells: Vec<&str> = doc.rows[0].iter().map(Cell::display_text).collect();

        assert_eq!(doc.title, "Бронирования");
        assert_eq!(
            cells,
            vec!["31", "777", "", "", "25.12.2024, 19:30", "3", "+7 (912) 000-11-22", "В ожидании"]
        );
        assert_eq!(doc.row_ids, vec![31]);
        assert!(matches!(&doc.rows[0][6], Cell::Link { href, .. } if href == "tel:+79120001122"));
    }

    #[tokio::test]
    async fn test_invalid_filters_rejected() {
        let page = page(Arc::new(FixedBookings(vec![])), PageSettings::default());

        let bad_status = vec![ColumnFilter::EnumEquals {
            field: "status".to_string(),
            value: "lost".to_string(),
        }];
        assert!(page.apply_filters(bad_status).await.is_err());

        let wrong_kind = vec![ColumnFilter::TextContains {
            field: "date".to_string(),
            value: "2024".to_string(),
        }];
        assert!(page.apply_filters(wrong_kind).await.is_err());

        let unknown = vec![ColumnFilter::NumberEquals {
            field: "table_no".to_string(),
            value: 3,
        }];
        assert!(page.apply_filters(unknown).await.is_err());

        let ok = vec![ColumnFilter::EnumEquals {
            field: "status".to_string(),
            value: "active".to_string(),
        }];
        assert!(page.apply_filters(ok).await.is_ok());
    }

    #[tokio::test]
    async fn test_phone_not_sortable() {
        let page = page(Arc::new(FixedBookings(vec![])), PageSettings::default());
        assert!(page.apply_sort(SortModel::desc("phone")).await.is_err());
        assert!(page.apply_sort(SortModel::desc("date")).await.is_ok());
    }

    #[test]
    fn test_status_whitelist_matches_enum() {
        let codes: Vec<&str> = BookingStatus::ALL.iter().map(|s| s.as_code()).collect();
        assert_eq!(codes, STATUS_CODES.to_vec());
    }
}
