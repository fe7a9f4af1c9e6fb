use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Maximum length accepted by the server for category and expense names.
pub const NAME_MAX_LEN: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort specification, rendered as `"<field>,<asc|desc>"` on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::asc("name")
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortError(String);

impl fmt::Display for ParseSortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort \"{}\"", self.0)
    }
}

impl std::error::Error for ParseSortError {}

impl FromStr for Sort {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once(',')
            .ok_or_else(|| ParseSortError(s.to_string()))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(ParseSortError(s.to_string()));
        }
        let direction = match direction.trim() {
            "asc" => Direction::Asc,
            "desc" => Direction::Desc,
            _ => return Err(ParseSortError(s.to_string())),
        };
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Calendar month used to scope expense reads.
///
/// Serialized as `YYYYMM`, the format the expenses endpoint expects for its
/// `yearMonth` filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Shifts by whole months, crossing year boundaries in both directions.
    pub fn add_months(self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let invalid = || serde::de::Error::custom(format!("invalid year-month \"{raw}\""));
        if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = raw[..4].parse().map_err(|_| invalid())?;
        let month = raw[4..].parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Category {
        /// Server assigned; absent on drafts.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<Uuid>,
        pub name: String,
    }

    /// Request body for `PUT /categories`. With an `id` the server updates,
    /// otherwise it creates.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryUpsert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<Uuid>,
        pub name: String,
    }
}

pub mod expense {
    use super::*;
    use crate::category::Category;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Expense {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<Uuid>,
        pub name: String,
        pub amount: f64,
        /// Calendar date, `YYYY-MM-DD`.
        pub date: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category_id: Option<Uuid>,
        /// Snapshot embedded by reads; never sent back.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<Category>,
    }

    impl Expense {
        /// Referenced category id, from the explicit field or the embedded
        /// snapshot.
        pub fn category_ref(&self) -> Option<Uuid> {
            self.category_id
                .or_else(|| self.category.as_ref().and_then(|c| c.id))
        }
    }

    /// Request body for `PUT /expenses`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpsert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<Uuid>,
        pub name: String,
        pub amount: f64,
        pub date: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category_id: Option<Uuid>,
    }
}

pub mod page {
    use super::*;

    /// Paginated response envelope.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Page<T> {
        pub content: Vec<T>,
        /// `true` when no further page exists for the current ordering.
        pub last: bool,
    }
}

pub mod criteria {
    use super::*;

    pub const DEFAULT_PAGE_SIZE: u32 = 25;

    /// Filter, sort and paging parameters for one list request.
    #[derive(Clone, Debug, PartialEq)]
    pub struct Criteria {
        pub page: u32,
        pub size: u32,
        pub sort: Sort,
        pub name: Option<String>,
        pub category_ids: Vec<Uuid>,
        /// Only honoured by the expenses collection.
        pub year_month: Option<YearMonth>,
    }

    impl Default for Criteria {
        fn default() -> Self {
            Self {
                page: 0,
                size: DEFAULT_PAGE_SIZE,
                sort: Sort::default(),
                name: None,
                category_ids: Vec::new(),
                year_month: None,
            }
        }
    }

    impl Criteria {
        pub fn with_size(size: u32) -> Self {
            Self {
                size,
                ..Self::default()
            }
        }

        /// Query pairs for a paginated read. Blank filters are left out.
        pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
            let mut pairs = vec![
                ("page", self.page.to_string()),
                ("size", self.size.to_string()),
            ];
            pairs.extend(self.filter_pairs());
            pairs
        }

        /// Query pairs without paging, used by the unpaginated `v2` reads.
        pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
            let mut pairs = vec![("sort", self.sort.to_string())];
            if let Some(name) = self.name.as_deref().map(str::trim)
                && !name.is_empty()
            {
                pairs.push(("name", name.to_string()));
            }
            for id in &self.category_ids {
                pairs.push(("categoryIds", id.to_string()));
            }
            if let Some(year_month) = self.year_month {
                pairs.push(("yearMonth", year_month.to_string()));
            }
            pairs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{category::*, criteria::*, expense::*, page::*, *};

    #[test]
    fn sort_round_trips_wire_format() {
        let sort: Sort = "createdAt,desc".parse().unwrap();
        assert_eq!(sort, Sort::desc("createdAt"));
        assert_eq!(sort.to_string(), "createdAt,desc");
    }

    #[test]
    fn sort_rejects_unknown_direction() {
        assert!("name,up".parse::<Sort>().is_err());
        assert!("name".parse::<Sort>().is_err());
        assert!(",asc".parse::<Sort>().is_err());
    }

    #[test]
    fn year_month_shifts_across_year_boundaries() {
        let jan = YearMonth::new(2024, 1).unwrap();
        assert_eq!(jan.add_months(-1), YearMonth::new(2023, 12).unwrap());
        assert_eq!(jan.add_months(12), YearMonth::new(2025, 1).unwrap());
        assert_eq!(jan.add_months(-13), YearMonth::new(2022, 12).unwrap());
        assert_eq!(jan.to_string(), "202401");
    }

    #[test]
    fn year_month_rejects_invalid_month() {
        assert!(YearMonth::new(2024, 0).is_none());
        assert!(YearMonth::new(2024, 13).is_none());
        assert!(serde_json::from_str::<YearMonth>("\"202413\"").is_err());
        assert_eq!(
            serde_json::from_str::<YearMonth>("\"202402\"").unwrap(),
            YearMonth::new(2024, 2).unwrap()
        );
    }

    #[test]
    fn blank_filters_are_omitted() {
        let criteria = Criteria {
            name: Some("   ".to_string()),
            ..Criteria::default()
        };
        assert_eq!(
            criteria.query_pairs(),
            vec![
                ("page", "0".to_string()),
                ("size", "25".to_string()),
                ("sort", "name,asc".to_string()),
            ]
        );
    }

    #[test]
    fn category_ids_are_repeated() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let criteria = Criteria {
            name: Some("rent".to_string()),
            category_ids: vec![a, b],
            year_month: YearMonth::new(2024, 3),
            ..Criteria::default()
        };
        assert_eq!(
            criteria.filter_pairs(),
            vec![
                ("sort", "name,asc".to_string()),
                ("name", "rent".to_string()),
                ("categoryIds", a.to_string()),
                ("categoryIds", b.to_string()),
                ("yearMonth", "202403".to_string()),
            ]
        );
    }

    #[test]
    fn expense_page_decodes_camel_case() {
        let raw = r#"{
            "content": [{
                "id": "00000000-0000-0000-0000-000000000007",
                "name": "Lunch",
                "amount": 12.5,
                "date": "2024-01-02",
                "category": { "id": "00000000-0000-0000-0000-000000000001", "name": "Food" }
            }],
            "last": true
        }"#;
        let page: Page<Expense> = serde_json::from_str(raw).unwrap();
        assert!(page.last);
        let expense = &page.content[0];
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(expense.category_id, None);
        assert_eq!(expense.category_ref(), Some(Uuid::from_u128(1)));
    }

    #[test]
    fn upsert_without_id_omits_it() {
        let body = serde_json::to_value(CategoryUpsert {
            id: None,
            name: "Food".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "name": "Food" }));

        let body = serde_json::to_value(ExpenseUpsert {
            id: Some(Uuid::from_u128(3)),
            name: "Rent".to_string(),
            amount: 900.0,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            category_id: None,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "id": "00000000-0000-0000-0000-000000000003",
                "name": "Rent",
                "amount": 900.0,
                "date": "2024-05-01",
            })
        );
    }
}
