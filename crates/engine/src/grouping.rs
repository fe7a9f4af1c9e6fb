//! Date grouping of the expense list.
//!
//! Groups keep the order in which their date first appeared in the session;
//! the expenses inside a group are ordered by name.

use std::cmp::Ordering;

use api_types::{expense::Expense, page::Page};
use chrono::NaiveDate;

use crate::PageSink;

#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseGroup {
    pub date: NaiveDate,
    pub expenses: Vec<Expense>,
}

/// Date groups of the current expense session.
#[derive(Debug, Default)]
pub struct ExpenseGroups {
    groups: Option<Vec<ExpenseGroup>>,
    last_page_reached: bool,
}

impl ExpenseGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[ExpenseGroup] {
        self.groups.as_deref().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.groups.is_some()
    }

    /// Number of expenses over all groups.
    pub fn len(&self) -> usize {
        self.groups().iter().map(|g| g.expenses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expenses in display order (group by group).
    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.groups().iter().flat_map(|g| g.expenses.iter())
    }

    /// Merges one batch of expenses into the groups.
    pub fn merge(&mut self, expenses: Vec<Expense>, first_page: bool) {
        if first_page {
            self.groups = None;
        }
        let groups = self.groups.get_or_insert_with(Vec::new);

        for batch in partition_by_date(expenses) {
            match groups.iter_mut().find(|g| g.date == batch.date) {
                Some(existing) => {
                    existing.expenses.extend(batch.expenses);
                    sort_by_name(&mut existing.expenses);
                }
                None => groups.push(batch),
            }
        }
    }
}

impl PageSink<Expense> for ExpenseGroups {
    fn on_page_loaded(&mut self, page: Page<Expense>, first_page: bool) {
        self.merge(page.content, first_page);
        self.last_page_reached = page.last;
    }

    fn last_page_reached(&self) -> bool {
        self.last_page_reached
    }
}

/// Splits a batch into per-date groups, in order of first appearance.
fn partition_by_date(expenses: Vec<Expense>) -> Vec<ExpenseGroup> {
    let mut groups: Vec<ExpenseGroup> = Vec::new();
    for expense in expenses {
        match groups.iter_mut().find(|g| g.date == expense.date) {
            Some(group) => group.expenses.push(expense),
            None => groups.push(ExpenseGroup {
                date: expense.date,
                expenses: vec![expense],
            }),
        }
    }
    for group in &mut groups {
        sort_by_name(&mut group.expenses);
    }
    groups
}

fn sort_by_name(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| compare_names(&a.name, &b.name));
}

// Case-insensitive first so "apple" sits next to "Apple".
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(name: &str, date: &str) -> Expense {
        Expense {
            id: None,
            name: name.to_string(),
            amount: 1.0,
            date: date.parse().unwrap(),
            category_id: None,
            category: None,
        }
    }

    fn names(group: &ExpenseGroup) -> Vec<&str> {
        group.expenses.iter().map(|e| e.name.as_str()).collect()
    }

    fn first_page() -> ExpenseGroups {
        let mut groups = ExpenseGroups::new();
        groups.on_page_loaded(
            Page {
                content: vec![
                    expense("B", "2024-01-01"),
                    expense("A", "2024-01-01"),
                    expense("C", "2024-01-02"),
                ],
                last: false,
            },
            true,
        );
        groups
    }

    #[test]
    fn groups_by_date_sorted_by_name() {
        let groups = first_page();
        let groups = groups.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date.to_string(), "2024-01-01");
        assert_eq!(names(&groups[0]), ["A", "B"]);
        assert_eq!(names(&groups[1]), ["C"]);
    }

    #[test]
    fn next_page_merges_into_existing_date() {
        let mut groups = first_page();
        groups.on_page_loaded(
            Page {
                content: vec![expense("Z", "2024-01-01"), expense("0", "2024-01-01")],
                last: true,
            },
            false,
        );

        let groups_ref = groups.groups();
        assert_eq!(groups_ref.len(), 2);
        assert_eq!(names(&groups_ref[0]), ["0", "A", "B", "Z"]);
        assert!(groups.last_page_reached());
        assert_eq!(groups.len(), 5);
    }

    #[test]
    fn group_order_follows_first_appearance() {
        let mut groups = ExpenseGroups::new();
        groups.merge(
            vec![expense("x", "2024-03-05"), expense("y", "2024-03-01")],
            true,
        );
        groups.merge(vec![expense("z", "2024-03-03")], false);

        let dates: Vec<String> = groups
            .groups()
            .iter()
            .map(|g| g.date.to_string())
            .collect();
        assert_eq!(dates, ["2024-03-05", "2024-03-01", "2024-03-03"]);
    }

    #[test]
    fn first_page_discards_previous_groups() {
        let mut groups = first_page();
        groups.merge(vec![expense("Q", "2024-02-10")], true);
        assert_eq!(groups.groups().len(), 1);
        assert_eq!(names(&groups.groups()[0]), ["Q"]);
    }

    #[test]
    fn name_order_ignores_case() {
        let mut groups = ExpenseGroups::new();
        groups.merge(
            vec![
                expense("banana", "2024-01-01"),
                expense("Apple", "2024-01-01"),
                expense("apple", "2024-01-01"),
            ],
            true,
        );
        assert_eq!(names(&groups.groups()[0]), ["Apple", "apple", "banana"]);
    }

    #[test]
    fn empty_first_page_clears_groups() {
        let mut groups = first_page();
        groups.merge(Vec::new(), true);
        assert!(groups.is_loaded());
        assert!(groups.is_empty());
    }
}
