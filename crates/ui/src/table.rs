//! Sortable, filterable, paginated row selection.
//!
//! The table owns its view state (sort, filter, page) and its selection.
//! Every user selection action produces one [`SelectionChange`] carrying the
//! complete current selection; the parent pushes selection back only through
//! [`SelectionTable::apply_reset`], which never emits a change.
//!
//! Selected ids the table holds no row for are kept and reported as
//! [`SelectionChange::unlisted`], so a parent selection is never narrowed by
//! rows that have not loaded.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use exam_core::model::{Topic, TopicId};

/// A row the table can show and select.
pub trait SelectableRow: Clone {
    type Id: Copy + Eq + Hash + fmt::Debug;
    type Column: Copy + Eq + fmt::Debug;

    fn row_id(&self) -> Self::Id;

    /// Text matched by the filter box.
    fn filter_text(&self) -> &str;

    fn compare(&self, other: &Self, column: Self::Column) -> Ordering;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: C,
    pub direction: SortDirection,
}

/// State of the select-all checkbox for the visible page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderState {
    Checked,
    Indeterminate,
    Unchecked,
}

/// Monotonic marker of a parent-initiated selection replacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResetToken(u64);

impl ResetToken {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Full selection after a user action, in the table's sort order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionChange<R: SelectableRow> {
    pub rows: Vec<R>,
    /// Selected ids without a row in the table.
    pub unlisted: Vec<R::Id>,
}

#[derive(Clone, Debug)]
pub struct SelectionTable<R: SelectableRow> {
    rows: Vec<R>,
    sort: Option<SortState<R::Column>>,
    filter: String,
    page_index: usize,
    page_size: usize,
    selected: HashSet<R::Id>,
    last_reset: Option<ResetToken>,
}

impl<R: SelectableRow> SelectionTable<R> {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    #[must_use]
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            sort: None,
            filter: String::new(),
            page_index: 0,
            page_size: Self::DEFAULT_PAGE_SIZE,
            selected: HashSet::new(),
            last_reset: None,
        }
    }

    /// Start with an initial selection.
    #[must_use]
    pub fn with_selection(mut self, ids: impl IntoIterator<Item = R::Id>) -> Self {
        self.replace_selection(ids);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn sort(&self) -> Option<SortState<R::Column>> {
        self.sort
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn is_selected(&self, id: R::Id) -> bool {
        self.selected.contains(&id)
    }

    //
    // ─── VIEW ──────────────────────────────────────────────────────────────────
    //

    /// Column header click: ascending first, then flips between directions.
    pub fn toggle_sort(&mut self, column: R::Column) {
        let direction = match self.sort {
            Some(SortState {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortState { column, direction });
    }

    /// Case-insensitive substring filter. Returns to the first page.
    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.page_index = 0;
    }

    fn sorted(&self) -> Vec<&R> {
        let mut rows: Vec<&R> = self.rows.iter().collect();
        if let Some(sort) = self.sort {
            rows.sort_by(|a, b| {
                let ordering = a.compare(b, sort.column);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }

    fn matches(&self, row: &R, needle: &str) -> bool {
        needle.is_empty() || row.filter_text().to_lowercase().contains(needle)
    }

    /// Rows passing the filter, in sort order.
    #[must_use]
    pub fn filtered_rows(&self) -> Vec<&R> {
        let needle = self.filter.trim().to_lowercase();
        self.sorted()
            .into_iter()
            .filter(|row| self.matches(row, &needle))
            .collect()
    }

    /// At least one page, even with nothing to show.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.filtered_rows().len().div_ceil(self.page_size).max(1)
    }

    /// Rows of the current page.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<&R> {
        self.filtered_rows()
            .into_iter()
            .skip(self.page_index.saturating_mul(self.page_size))
            .take(self.page_size)
            .collect()
    }

    #[must_use]
    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    #[must_use]
    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn set_page(&mut self, index: usize) {
        self.page_index = index.min(self.page_count() - 1);
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    /// Rows to show the empty state for: no rows at all, or none matching.
    #[must_use]
    pub fn shows_empty_state(&self) -> bool {
        self.visible_rows().is_empty()
    }

    //
    // ─── SELECTION ─────────────────────────────────────────────────────────────
    //

    /// Selected rows in the current sort order, including rows hidden by
    /// the filter or on other pages.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<R> {
        self.sorted()
            .into_iter()
            .filter(|row| self.selected.contains(&row.row_id()))
            .cloned()
            .collect()
    }

    fn change(&self) -> SelectionChange<R> {
        SelectionChange {
            rows: self.selected_rows(),
            unlisted: self.unlisted_ids(),
        }
    }

    fn unlisted_ids(&self) -> Vec<R::Id> {
        self.selected
            .iter()
            .copied()
            .filter(|id| !self.rows.iter().any(|row| row.row_id() == *id))
            .collect()
    }

    /// Flip one row. `None` for ids the table does not hold.
    pub fn toggle_row(&mut self, id: R::Id) -> Option<SelectionChange<R>> {
        if !self.rows.iter().any(|row| row.row_id() == id) {
            return None;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        Some(self.change())
    }

    /// Header checkbox: (de)select every row of the visible page.
    ///
    /// `None` when the page is empty.
    pub fn set_visible_selected(&mut self, selected: bool) -> Option<SelectionChange<R>> {
        let ids: Vec<R::Id> = self.visible_rows().iter().map(|row| row.row_id()).collect();
        if ids.is_empty() {
            return None;
        }
        for id in ids {
            if selected {
                self.selected.insert(id);
            } else {
                self.selected.remove(&id);
            }
        }
        Some(self.change())
    }

    /// Header click: select the page unless it is already fully selected.
    pub fn toggle_visible(&mut self) -> Option<SelectionChange<R>> {
        let select = self.header_state() != HeaderState::Checked;
        self.set_visible_selected(select)
    }

    #[must_use]
    pub fn header_state(&self) -> HeaderState {
        let visible = self.visible_rows();
        let selected = visible
            .iter()
            .filter(|row| self.selected.contains(&row.row_id()))
            .count();
        if selected == 0 {
            HeaderState::Unchecked
        } else if selected == visible.len() {
            HeaderState::Checked
        } else {
            HeaderState::Indeterminate
        }
    }

    /// `(selected, total)` over the rows passing the filter.
    #[must_use]
    pub fn selection_counter(&self) -> (usize, usize) {
        let filtered = self.filtered_rows();
        let selected = filtered
            .iter()
            .filter(|row| self.selected.contains(&row.row_id()))
            .count();
        (selected, filtered.len())
    }

    /// Replace the selection from the parent.
    ///
    /// Applied only when `token` differs from the last applied one; sort,
    /// filter and page are left alone. Returns whether it was applied.
    pub fn apply_reset(
        &mut self,
        token: ResetToken,
        ids: impl IntoIterator<Item = R::Id>,
    ) -> bool {
        if self.last_reset == Some(token) {
            return false;
        }
        self.last_reset = Some(token);
        self.replace_selection(ids);
        true
    }

    fn replace_selection(&mut self, ids: impl IntoIterator<Item = R::Id>) {
        self.selected = ids.into_iter().collect();
    }

    /// Swap in freshly loaded rows.
    ///
    /// Sort, filter and selection stay; the page is kept when it still
    /// exists and moves to the last page otherwise. Emits no change.
    pub fn replace_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.page_index = self.page_index.min(self.page_count() - 1);
    }
}

/// Sortable columns of the topic table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopicColumn {
    Name,
    AvailableQuestions,
}

impl SelectableRow for Topic {
    type Id = TopicId;
    type Column = TopicColumn;

    fn row_id(&self) -> TopicId {
        self.id()
    }

    fn filter_text(&self) -> &str {
        self.name()
    }

    fn compare(&self, other: &Self, column: TopicColumn) -> Ordering {
        match column {
            TopicColumn::Name => self
                .name()
                .to_lowercase()
                .cmp(&other.name().to_lowercase()),
            TopicColumn::AvailableQuestions => self.max_questions().cmp(&other.max_questions()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: u64, name: &str, max: u32) -> Topic {
        Topic::new(TopicId::new(id), name, max).unwrap()
    }

    fn table() -> SelectionTable<Topic> {
        SelectionTable::new(vec![
            topic(1, "Redes", 8),
            topic(2, "Arquiteturas", 10),
            topic(3, "BD", 5),
            topic(4, "Algoritmos", 12),
            topic(5, "Sistemas Operativos", 7),
        ])
    }

    fn names(rows: &[Topic]) -> Vec<&str> {
        rows.iter().map(Topic::name).collect()
    }

    #[test]
    fn sort_cycles_ascending_descending() {
        let mut table = table();
        assert_eq!(table.sort(), None);

        table.toggle_sort(TopicColumn::Name);
        assert_eq!(table.filtered_rows()[0].name(), "Algoritmos");

        table.toggle_sort(TopicColumn::Name);
        assert_eq!(
            table.sort().map(|s| s.direction),
            Some(SortDirection::Descending)
        );
        assert_eq!(table.filtered_rows()[0].name(), "Sistemas Operativos");

        table.toggle_sort(TopicColumn::Name);
        assert_eq!(
            table.sort().map(|s| s.direction),
            Some(SortDirection::Ascending)
        );
    }

    #[test]
    fn switching_column_starts_ascending() {
        let mut table = table();
        table.toggle_sort(TopicColumn::Name);
        table.toggle_sort(TopicColumn::Name);
        table.toggle_sort(TopicColumn::AvailableQuestions);
        assert_eq!(
            table.sort(),
            Some(SortState {
                column: TopicColumn::AvailableQuestions,
                direction: SortDirection::Ascending
            })
        );
        assert_eq!(table.filtered_rows()[0].name(), "BD");
    }

    #[test]
    fn filter_is_case_insensitive_and_resets_page() {
        let mut table = table().with_page_size(2);
        table.next_page();
        assert_eq!(table.page_index(), 1);

        table.set_filter("REDES");
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.visible_rows().len(), 1);
    }

    #[test]
    fn pagination_bounds() {
        let mut table = table().with_page_size(2);
        assert_eq!(table.page_count(), 3);
        assert!(!table.can_previous_page());
        table.set_page(10);
        assert_eq!(table.page_index(), 2);
        assert!(!table.can_next_page());
        assert_eq!(table.visible_rows().len(), 1);
    }

    #[test]
    fn empty_table_has_one_disabled_page() {
        let table: SelectionTable<Topic> = SelectionTable::new(Vec::new());
        assert!(table.is_empty());
        assert!(table.shows_empty_state());
        assert_eq!(table.page_count(), 1);
        assert!(!table.can_next_page());
        assert!(!table.can_previous_page());
        assert_eq!(table.header_state(), HeaderState::Unchecked);
    }

    #[test]
    fn unmatched_filter_shows_empty_page() {
        let mut table = table();
        table.set_filter("zzz");
        assert!(table.shows_empty_state());
        assert_eq!(table.page_count(), 1);
    }

    #[test]
    fn toggle_emits_full_selection_in_sort_order() {
        let mut table = table();
        table.toggle_sort(TopicColumn::Name);
        table.toggle_row(TopicId::new(1));
        let change = table.toggle_row(TopicId::new(3)).unwrap();
        assert_eq!(names(&change.rows), vec!["BD", "Redes"]);

        let change = table.toggle_row(TopicId::new(1)).unwrap();
        assert_eq!(names(&change.rows), vec!["BD"]);
        assert!(table.toggle_row(TopicId::new(99)).is_none());
    }

    #[test]
    fn select_visible_then_clear_filter_keeps_earlier_selection() {
        let mut table = table().with_page_size(2);
        table.toggle_row(TopicId::new(5));

        table.set_filter("a");
        table.toggle_sort(TopicColumn::Name);
        let change = table.set_visible_selected(true).unwrap();
        assert_eq!(table.header_state(), HeaderState::Checked);
        // Algoritmos and Arquiteturas are on the first filtered page.
        assert_eq!(
            names(&change.rows),
            vec!["Algoritmos", "Arquiteturas", "Sistemas Operativos"]
        );

        table.set_filter("");
        assert!(table.is_selected(TopicId::new(5)));
        assert_eq!(table.selected_rows().len(), 3);
        assert_eq!(table.selection_counter(), (3, 5));
    }

    #[test]
    fn header_reports_partial_page_selection() {
        let mut table = table().with_page_size(2);
        table.toggle_row(TopicId::new(1));
        assert_eq!(table.header_state(), HeaderState::Indeterminate);

        let change = table.toggle_visible().unwrap();
        assert_eq!(change.rows.len(), 2);
        let change = table.toggle_visible().unwrap();
        assert!(change.rows.is_empty());
    }

    #[test]
    fn reset_applies_once_per_token_and_keeps_view() {
        let mut table = table().with_page_size(2);
        table.set_filter("a");
        table.toggle_row(TopicId::new(2));
        let token = ResetToken::default().next();

        assert!(table.apply_reset(token, [TopicId::new(3), TopicId::new(42)]));
        assert_eq!(names(&table.selected_rows()), vec!["BD"]);
        assert_eq!(table.filter(), "a");

        table.toggle_row(TopicId::new(1));
        assert!(!table.apply_reset(token, Vec::new()));
        assert_eq!(table.selected_rows().len(), 2);

        assert!(table.apply_reset(token.next(), Vec::new()));
        assert!(table.selected_rows().is_empty());
    }

    #[test]
    fn reset_keeps_ids_without_rows() {
        let mut table = table();
        assert!(table.apply_reset(ResetToken::default(), [TopicId::new(3), TopicId::new(42)]));
        assert!(table.is_selected(TopicId::new(42)));
        assert_eq!(table.selection_counter(), (1, 5));

        let change = table.toggle_row(TopicId::new(1)).unwrap();
        assert_eq!(names(&change.rows), vec!["Redes", "BD"]);
        assert_eq!(change.unlisted, vec![TopicId::new(42)]);
    }

    #[test]
    fn replace_rows_keeps_view_state_and_selection() {
        let mut table = table().with_page_size(2);
        table.toggle_sort(TopicColumn::Name);
        table.set_filter("a");
        table.toggle_row(TopicId::new(5));
        table.next_page();
        assert_eq!(table.page_index(), 1);

        table.replace_rows(vec![
            topic(1, "Redes", 8),
            topic(2, "Arquiteturas", 4),
            topic(3, "BD", 5),
            topic(4, "Algoritmos", 12),
            topic(5, "Sistemas Operativos", 3),
        ]);
        assert_eq!(table.page_index(), 1);
        assert_eq!(table.filter(), "a");
        assert_eq!(table.sort().map(|s| s.column), Some(TopicColumn::Name));
        assert!(table.is_selected(TopicId::new(5)));
        assert_eq!(table.visible_rows()[0].max_questions(), 3);
    }

    #[test]
    fn replace_rows_clamps_a_vanished_page() {
        let mut table = table().with_page_size(2);
        table.set_page(2);
        table.replace_rows(vec![topic(1, "Redes", 8), topic(3, "BD", 5)]);
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.visible_rows().len(), 2);
    }
}
