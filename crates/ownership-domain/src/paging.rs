use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortField {
    /// Lexicographic order of the remote issue id string.
    #[default]
    RemoteIssueId,
    /// Numeric order of the local issue id.
    IssueId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingAndSorting {
    pub first_item_index: usize,
    pub page_size: usize,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub display_all: bool,
}

impl Default for PagingAndSorting {
    fn default() -> Self {
        Self {
            first_item_index: 0,
            page_size: 50,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            display_all: false,
        }
    }
}

impl PagingAndSorting {
    pub fn page(first_item_index: usize, page_size: usize) -> Self {
        Self {
            first_item_index,
            page_size,
            ..Self::default()
        }
    }

    pub fn unpaged() -> Self {
        Self {
            display_all: true,
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, sort_field: SortField, sort_order: SortOrder) -> Self {
        self.sort_field = sort_field;
        self.sort_order = sort_order;
        self
    }

    /// Keeps the window of `items` this request asks for.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.display_all {
            return items;
        }
        items
            .into_iter()
            .skip(self.first_item_index)
            .take(self.page_size)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub paging: PagingAndSorting,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: usize, paging: PagingAndSorting) -> Self {
        Self {
            items,
            total_count,
            paging,
        }
    }

    pub fn empty(total_count: usize, paging: PagingAndSorting) -> Self {
        Self::new(Vec::new(), total_count, paging)
    }
}

#[cfg(test)]
mod tests {
    use super::PagingAndSorting;

    #[test]
    fn slice_keeps_requested_window() {
        let paging = PagingAndSorting::page(2, 2);
        assert_eq!(paging.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
    }

    #[test]
    fn slice_past_the_end_is_empty() {
        let paging = PagingAndSorting::page(10, 5);
        assert!(paging.slice(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn unpaged_returns_everything() {
        let paging = PagingAndSorting {
            first_item_index: 3,
            ..PagingAndSorting::unpaged()
        };
        assert_eq!(paging.slice(vec![1, 2, 3, 4, 5]), vec![1, 2, 3, 4, 5]);
    }
}
