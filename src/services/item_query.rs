//! Item query composer.
//!
//! Turns an [`ItemsQuery`] into a [`QueryPlan`] and runs it. Stages apply in a fixed
//! order: explicit id list (short-circuits everything else), full-text search,
//! price range, category containment, sort, then pagination.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Value, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::items::{ItemList, ItemsQuery, SortDirection},
    entity::{Items, items::Column},
    error::AppResult,
    models::Item,
    validation::{Validate, ValidationErrors},
};

pub const MAX_PER_PAGE: i64 = 100;

const SEARCH_CONFIG: &str = "english";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Price,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(SortField::Id),
            "name" => Some(SortField::Name),
            "price" => Some(SortField::Price),
            _ => None,
        }
    }

    fn column(self) -> Column {
        match self {
            SortField::Id => Column::Id,
            SortField::Name => Column::Name,
            SortField::Price => Column::Price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// Exactly these ids, one page.
    Explicit(Vec<Uuid>),
    Filtered(FilteredQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilteredQuery {
    pub search: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub category: Vec<String>,
    pub sort: Option<(SortField, SortDirection)>,
    pub page: u64,
    pub per_page: u64,
}

impl Validate for ItemsQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if SortField::parse(&self.sort_by).is_none() {
            errors.add(
                "sort_by",
                format!("unsupported sort field '{}', expected one of id, name, price", self.sort_by),
            );
        }
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            errors.add("per_page", format!("must be between 1 and {MAX_PER_PAGE}"));
        }
        if self.page < 0 {
            errors.add("page", "must not be negative");
        }

        let filter = &self.filter;
        if let Some(min) = filter.price_min {
            errors.check_price("filter.price_min", min);
        }
        if let Some(max) = filter.price_max {
            errors.check_price("filter.price_max", max);
        }
        if let (Some(min), Some(max)) = (filter.price_min, filter.price_max) {
            if min > max {
                errors.add("filter.price_max", "must not be lower than price_min");
            }
        }
        if let Some(search) = &filter.search_query {
            if search.trim().is_empty() {
                errors.add("filter.search_query", "must not be blank");
            }
        }
        if let Some(category) = &filter.category {
            errors.check_segments("filter.category", category);
        }

        errors.into_result()
    }
}

impl ItemsQuery {
    pub fn plan(&self) -> Result<QueryPlan, ValidationErrors> {
        self.validate()?;

        if let Some(ids) = &self.items {
            return Ok(QueryPlan::Explicit(ids.clone()));
        }

        let sort = SortField::parse(&self.sort_by)
            .filter(|_| self.sort != SortDirection::Unset)
            .map(|field| (field, self.sort));

        Ok(QueryPlan::Filtered(FilteredQuery {
            search: self
                .filter
                .search_query
                .as_ref()
                .map(|q| q.trim().to_string()),
            price_min: self.filter.price_min,
            price_max: self.filter.price_max,
            category: self
                .filter
                .category
                .iter()
                .flatten()
                .map(|segment| segment.trim().to_string())
                .collect(),
            sort,
            page: self.page as u64,
            per_page: self.per_page as u64,
        }))
    }
}

impl QueryPlan {
    /// The statement for the page this plan asks for.
    pub fn select(&self) -> Select<Items> {
        match self {
            QueryPlan::Explicit(ids) => insertion_order(
                Items::find().filter(Column::Id.is_in(ids.iter().copied())),
            ),
            QueryPlan::Filtered(query) => query.page_select(),
        }
    }
}

impl FilteredQuery {
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.per_page)
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(search) = &self.search {
            condition = condition.add(Expr::cust_with_values(
                format!("search @@ plainto_tsquery('{SEARCH_CONFIG}', $1)"),
                [search.clone()],
            ));
        }
        if let Some(min) = self.price_min {
            condition = condition.add(Column::Price.gte(min));
        }
        if let Some(max) = self.price_max {
            condition = condition.add(Column::Price.lte(max));
        }
        if !self.category.is_empty() {
            condition = condition.add(Expr::cust_with_values(
                "category @> $1",
                [Value::from(self.category.clone())],
            ));
        }

        condition
    }

    /// Filtered and ordered, before pagination.
    pub fn matching(&self) -> Select<Items> {
        let finder = Items::find().filter(self.condition());

        match (self.sort, &self.search) {
            (Some((field, direction)), _) => {
                let order = match direction {
                    SortDirection::Desc => Order::Desc,
                    _ => Order::Asc,
                };
                let finder = finder.order_by(field.column(), order);
                if field == SortField::Id {
                    finder
                } else {
                    finder.order_by_asc(Column::Id)
                }
            }
            (None, Some(search)) => insertion_order(finder.order_by(
                Expr::cust_with_values(
                    format!("ts_rank(search, plainto_tsquery('{SEARCH_CONFIG}', $1))"),
                    [search.clone()],
                ),
                Order::Desc,
            )),
            (None, None) => insertion_order(finder),
        }
    }

    pub fn page_select(&self) -> Select<Items> {
        self.matching().offset(self.offset()).limit(self.per_page)
    }
}

fn insertion_order(finder: Select<Items>) -> Select<Items> {
    finder
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
}

pub fn page_count(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page.max(1))
}

pub async fn query_items(orm: &OrmConn, query: &ItemsQuery) -> AppResult<ItemList> {
    let plan = query.plan()?;
    run_plan(orm, &plan).await
}

pub async fn run_plan(orm: &OrmConn, plan: &QueryPlan) -> AppResult<ItemList> {
    match plan {
        QueryPlan::Explicit(ids) => {
            let items = if ids.is_empty() {
                Vec::new()
            } else {
                plan.select()
                    .all(orm)
                    .await?
                    .into_iter()
                    .map(Item::from)
                    .collect()
            };
            Ok(ItemList { items, pages: 1 })
        }
        QueryPlan::Filtered(query) => {
            let total = query.matching().count(orm).await?;
            let pages = page_count(total, query.per_page);

            let items = if query.offset() >= total {
                Vec::new()
            } else {
                query
                    .page_select()
                    .all(orm)
                    .await?
                    .into_iter()
                    .map(Item::from)
                    .collect()
            };

            tracing::debug!(total, pages, page = query.page, "items queried");
            Ok(ItemList { items, pages })
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;
    use crate::dto::items::ItemFilter;

    fn sql(plan: &QueryPlan) -> String {
        plan.select().build(DbBackend::Postgres).to_string()
    }

    fn filtered(plan: QueryPlan) -> FilteredQuery {
        match plan {
            QueryPlan::Filtered(query) => query,
            other => panic!("expected filtered plan, got {other:?}"),
        }
    }

    #[test]
    fn explicit_ids_skip_every_other_stage() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let query = ItemsQuery {
            items: Some(vec![a, b]),
            sort_by: "price".into(),
            sort: SortDirection::Desc,
            filter: ItemFilter {
                price_min: Some(Decimal::new(5, 0)),
                category: Some(vec!["X".into()]),
                ..Default::default()
            },
            per_page: 1,
            page: 7,
        };

        let plan = query.plan().unwrap();
        assert_eq!(plan, QueryPlan::Explicit(vec![a, b]));

        let rendered = sql(&plan);
        assert!(rendered.contains(&a.to_string()));
        assert!(rendered.contains(&b.to_string()));
        assert!(!rendered.contains("LIMIT"));
        assert!(!rendered.contains(">="));
        assert!(!rendered.contains(r#"ORDER BY "items"."price""#));
        assert!(!rendered.contains("@>"));
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let query = ItemsQuery {
            sort_by: "password_hash".into(),
            sort: SortDirection::Asc,
            ..Default::default()
        };
        let err = query.plan().unwrap_err();
        assert!(err.has_field("sort_by"));
        assert!(err.to_string().contains("password_hash"));
    }

    #[test]
    fn unknown_sort_field_is_rejected_even_with_id_list() {
        let query = ItemsQuery {
            sort_by: "created_at".into(),
            items: Some(vec![Uuid::new_v4()]),
            ..Default::default()
        };
        assert!(query.plan().is_err());
    }

    #[test]
    fn pagination_bounds_are_enforced() {
        let query = ItemsQuery {
            per_page: 0,
            page: -1,
            ..Default::default()
        };
        let err = query.plan().unwrap_err();
        assert!(err.has_field("per_page"));
        assert!(err.has_field("page"));

        let too_many = ItemsQuery {
            per_page: MAX_PER_PAGE + 1,
            ..Default::default()
        };
        assert!(too_many.plan().unwrap_err().has_field("per_page"));
    }

    #[test]
    fn price_bounds_are_checked() {
        let query = ItemsQuery {
            filter: ItemFilter {
                price_min: Some(Decimal::new(50, 0)),
                price_max: Some(Decimal::new(10, 0)),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(query.plan().unwrap_err().has_field("filter.price_max"));

        let zero = ItemsQuery {
            filter: ItemFilter {
                price_min: Some(Decimal::ZERO),
                search_query: Some("   ".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = zero.plan().unwrap_err();
        assert!(err.has_field("filter.price_min"));
        assert!(err.has_field("filter.search_query"));

        let huge = ItemsQuery {
            filter: ItemFilter {
                price_max: Some(Decimal::new(100_000_000_000, 0)),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = huge.plan().unwrap_err();
        assert!(err.has_field("filter.price_max"));
        assert!(!err.has_field("filter.price_min"));
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(30, 10), 3);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(0, 10), 0);
    }

    #[test]
    fn page_window_is_zero_indexed() {
        let query = ItemsQuery {
            per_page: 10,
            page: 2,
            ..Default::default()
        };
        let plan = query.plan().unwrap();
        assert_eq!(filtered(plan.clone()).offset(), 20);
        assert!(sql(&plan).ends_with("LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn range_and_category_filters_compose() {
        let query = ItemsQuery {
            filter: ItemFilter {
                price_min: Some(Decimal::new(10, 0)),
                price_max: Some(Decimal::new(9950, 2)),
                category: Some(vec!["X".into(), " Y ".into()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let plan = query.plan().unwrap();
        assert_eq!(filtered(plan.clone()).category, vec!["X", "Y"]);

        let rendered = sql(&plan);
        assert!(rendered.contains(r#""items"."price" >= 10"#));
        assert!(rendered.contains(r#""items"."price" <= 99.50"#));
        assert!(rendered.contains("category @>"));
        assert!(rendered.contains("'X'"));
        assert!(rendered.contains("'Y'"));
    }

    #[test]
    fn only_present_price_bound_is_applied() {
        let query = ItemsQuery {
            filter: ItemFilter {
                price_max: Some(Decimal::new(20, 0)),
                ..Default::default()
            },
            ..Default::default()
        };
        let rendered = sql(&query.plan().unwrap());
        assert!(rendered.contains(r#""items"."price" <= 20"#));
        assert!(!rendered.contains(">="));
    }

    #[test]
    fn explicit_sort_replaces_relevance() {
        let query = ItemsQuery {
            sort_by: "price".into(),
            sort: SortDirection::Desc,
            filter: ItemFilter {
                search_query: Some("red phone".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let rendered = sql(&query.plan().unwrap());
        assert!(rendered.contains("plainto_tsquery('english', 'red phone')"));
        assert!(rendered.contains(r#"ORDER BY "items"."price" DESC, "items"."id" ASC"#));
        assert!(!rendered.contains("ts_rank"));
    }

    #[test]
    fn search_without_sort_orders_by_relevance() {
        let query = ItemsQuery {
            filter: ItemFilter {
                search_query: Some(" red phone ".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let plan = query.plan().unwrap();
        assert_eq!(filtered(plan.clone()).search.as_deref(), Some("red phone"));

        let rendered = sql(&plan);
        assert!(rendered.contains("ORDER BY ts_rank(search, plainto_tsquery('english', 'red phone')) DESC"));
    }

    #[test]
    fn sort_by_id_needs_no_tie_break() {
        let query = ItemsQuery {
            sort: SortDirection::Asc,
            ..Default::default()
        };
        let rendered = sql(&query.plan().unwrap());
        assert!(rendered.contains(r#"ORDER BY "items"."id" ASC LIMIT"#));
    }

    #[test]
    fn unset_sort_keeps_insertion_order() {
        let query = ItemsQuery {
            sort_by: "name".into(),
            ..Default::default()
        };
        let plan = query.plan().unwrap();
        assert_eq!(filtered(plan.clone()).sort, None);
        assert!(sql(&plan).contains(r#"ORDER BY "items"."created_at" ASC, "items"."id" ASC"#));
    }
}
