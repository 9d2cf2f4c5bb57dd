use exam_core::model::{Topic, TopicId};

use crate::table::{HeaderState, SelectionTable};

/// Row of the topic selection table as rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicRowVm {
    pub id: TopicId,
    pub name: String,
    pub available_label: String,
    pub selected: bool,
}

/// Rendered state of the topic table for the current page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicTableVm {
    pub rows: Vec<TopicRowVm>,
    pub header: HeaderState,
    pub counter_label: String,
    pub page_label: String,
    pub can_previous: bool,
    pub can_next: bool,
    pub empty_message: Option<&'static str>,
}

#[must_use]
pub fn map_topic_table(table: &SelectionTable<Topic>) -> TopicTableVm {
    let rows = table
        .visible_rows()
        .into_iter()
        .map(|topic| TopicRowVm {
            id: topic.id(),
            name: topic.name().to_owned(),
            available_label: topic.max_questions().to_string(),
            selected: table.is_selected(topic.id()),
        })
        .collect::<Vec<_>>();

    let empty_message = if table.is_empty() {
        Some("No topics available.")
    } else if rows.is_empty() {
        Some("No results.")
    } else {
        None
    };

    let (selected, total) = table.selection_counter();
    TopicTableVm {
        rows,
        header: table.header_state(),
        counter_label: format!("{selected} of {total} row(s) selected."),
        page_label: format!("Page {} of {}", table.page_index() + 1, table.page_count()),
        can_previous: table.can_previous_page(),
        can_next: table.can_next_page(),
        empty_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_message_and_disabled_paging() {
        let vm = map_topic_table(&SelectionTable::new(Vec::new()));
        assert_eq!(vm.empty_message, Some("No topics available."));
        assert_eq!(vm.page_label, "Page 1 of 1");
        assert!(!vm.can_next && !vm.can_previous);
    }

    #[test]
    fn counter_reflects_filtered_selection() {
        let topics = vec![
            Topic::new(TopicId::new(1), "BD", 5).unwrap(),
            Topic::new(TopicId::new(2), "Redes", 8).unwrap(),
        ];
        let mut table = SelectionTable::new(topics).with_selection([TopicId::new(1)]);
        assert_eq!(map_topic_table(&table).counter_label, "1 of 2 row(s) selected.");

        table.set_filter("redes");
        let vm = map_topic_table(&table);
        assert_eq!(vm.counter_label, "0 of 1 row(s) selected.");
        assert_eq!(vm.rows[0].available_label, "8");
    }

    #[test]
    fn unmatched_filter_message() {
        let topics = vec![Topic::new(TopicId::new(1), "BD", 5).unwrap()];
        let mut table = SelectionTable::new(topics);
        table.set_filter("xyz");
        assert_eq!(map_topic_table(&table).empty_message, Some("No results."));
    }
}
