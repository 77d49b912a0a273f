//! Category/search filtering and ordering of the tool grid.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One card in the grid, as read from its `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolItem {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub index: i64,
}

impl ToolItem {
    pub fn new(category: &str, title: &str, desc: &str, index: i64) -> Self {
        Self {
            category: category.to_string(),
            title: title.to_string(),
            desc: desc.to_string(),
            index,
        }
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.title, self.desc).to_lowercase()
    }
}

/// Lenient `data-index` parse: leading integer, otherwise 0.
pub fn parse_index(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|(pos, ch)| !(ch.is_ascii_digit() || (*pos == 0 && (*ch == '-' || *ch == '+'))))
        .map(|(pos, _)| pos)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Self::All,
            Some(category) => Self::Only(category.to_string()),
        }
    }

    pub fn attr_value(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(category) => category,
        }
    }

    pub fn admits(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Insertion,
    TitleAscending,
    TitleDescending,
    NewestFirst,
}

impl SortMode {
    /// `data-sort` value; `clear` and unknown values reset to insertion.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("az") => Self::TitleAscending,
            Some("za") => Self::TitleDescending,
            Some("new") => Self::NewestFirst,
            _ => Self::Insertion,
        }
    }

    /// Value of the chip that represents this mode, if any.
    pub fn attr_value(self) -> Option<&'static str> {
        match self {
            Self::Insertion => None,
            Self::TitleAscending => Some("az"),
            Self::TitleDescending => Some("za"),
            Self::NewestFirst => Some("new"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridState {
    pub category: CategoryFilter,
    pub sort: SortMode,
    query: String,
}

impl GridState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, raw: &str) {
        self.query = raw.trim().to_lowercase();
    }

    pub fn matches(&self, item: &ToolItem) -> bool {
        if !self.category.admits(&item.category) {
            return false;
        }
        self.query.is_empty() || item.search_text().contains(&self.query)
    }

    pub fn visibility(&self, items: &[ToolItem]) -> Vec<bool> {
        items.iter().map(|item| self.matches(item)).collect()
    }

    /// Stable permutation of `items` positions for the active sort.
    pub fn order(&self, items: &[ToolItem]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        let sort = self.sort;
        order.sort_by(|&a, &b| compare(sort, &items[a], &items[b]));
        order
    }
}

fn compare(sort: SortMode, a: &ToolItem, b: &ToolItem) -> Ordering {
    match sort {
        SortMode::TitleAscending => title_key(a).cmp(&title_key(b)),
        SortMode::TitleDescending => title_key(b).cmp(&title_key(a)),
        SortMode::NewestFirst => b.index.cmp(&a.index),
        SortMode::Insertion => a.index.cmp(&b.index),
    }
}

/// Base-letter key: accents and case are ignored.
fn title_key(item: &ToolItem) -> String {
    deunicode::deunicode(&item.title).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ToolItem> {
        vec![
            ToolItem::new("pdf", "merge pdf", "combine several files", 0),
            ToolItem::new("pdf", "split pdf", "extract pages", 1),
            ToolItem::new("convert", "word to pdf", "merge docx into a pdf", 2),
            ToolItem::new("image", "compress", "shrink scans", 3),
        ]
    }

    fn titles(items: &[ToolItem], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| items[i].title.clone()).collect()
    }

    #[test]
    fn default_state_shows_everything() {
        let items = catalog();
        let state = GridState::new();
        assert!(state.visibility(&items).iter().all(|visible| *visible));
    }

    #[test]
    fn category_and_query_intersect() {
        let items = catalog();
        let mut state = GridState::new();
        state.category = CategoryFilter::parse(Some("pdf"));
        state.set_query("  MERGE ");

        assert_eq!(state.visibility(&items), vec![true, false, false, false]);
    }

    #[test]
    fn query_matches_description_too() {
        let items = catalog();
        let mut state = GridState::new();
        state.set_query("merge");
        assert_eq!(state.visibility(&items), vec![true, false, true, false]);
    }

    #[test]
    fn all_filter_and_blank_filter_are_the_same() {
        assert_eq!(CategoryFilter::parse(Some("all")), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(Some("pdf")).attr_value(), "pdf");
    }

    #[test]
    fn ascending_then_descending_reverses() {
        let items = catalog();
        let mut state = GridState::new();

        state.sort = SortMode::TitleAscending;
        let ascending = titles(&items, &state.order(&items));
        state.sort = SortMode::TitleDescending;
        let mut descending = titles(&items, &state.order(&items));

        assert_eq!(
            ascending,
            vec!["compress", "merge pdf", "split pdf", "word to pdf"]
        );
        descending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn title_sort_ignores_case_and_is_stable() {
        let items = vec![
            ToolItem::new("a", "Beta", "", 0),
            ToolItem::new("a", "alpha", "", 1),
            ToolItem::new("a", "beta", "", 2),
        ];
        let mut state = GridState::new();
        state.sort = SortMode::TitleAscending;
        assert_eq!(state.order(&items), vec![1, 0, 2]);
    }

    #[test]
    fn title_sort_ignores_accents() {
        let items = vec![
            ToolItem::new("a", "zip", "", 0),
            ToolItem::new("a", "Édition", "", 1),
            ToolItem::new("a", "edition", "", 2),
            ToolItem::new("a", "fusion", "", 3),
        ];
        let mut state = GridState::new();
        state.sort = SortMode::TitleAscending;

        assert_eq!(state.order(&items), vec![1, 2, 3, 0]);
    }

    #[test]
    fn newest_first_and_insertion_use_index() {
        let items = vec![
            ToolItem::new("a", "x", "", 5),
            ToolItem::new("a", "y", "", 1),
            ToolItem::new("a", "z", "", 9),
        ];
        let mut state = GridState::new();
        assert_eq!(state.order(&items), vec![1, 0, 2]);

        state.sort = SortMode::NewestFirst;
        assert_eq!(state.order(&items), vec![2, 0, 1]);
    }

    #[test]
    fn sort_chip_values() {
        assert_eq!(SortMode::parse(Some("az")), SortMode::TitleAscending);
        assert_eq!(SortMode::parse(Some("clear")), SortMode::Insertion);
        assert_eq!(SortMode::parse(Some("bogus")), SortMode::Insertion);
        assert_eq!(SortMode::NewestFirst.attr_value(), Some("new"));
    }

    #[test]
    fn index_parsing_is_lenient() {
        assert_eq!(parse_index(Some("12")), 12);
        assert_eq!(parse_index(Some(" 7px")), 7);
        assert_eq!(parse_index(Some("-3")), -3);
        assert_eq!(parse_index(Some("abc")), 0);
        assert_eq!(parse_index(None), 0);
    }
}
