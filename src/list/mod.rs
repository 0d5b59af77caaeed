//! Paginated browse lists for directory components
//!
//! A [`ListBuilder`] owns an ordered list of entries together with a `_meta`
//! record describing the current page. `_meta` is recomputed from scratch
//! after every mutation so it always reflects `items`.

pub mod items;

use serde::{Deserialize, Serialize};

pub use items::{
    ListButton, ListButtonRow, ListEntry, ListHeader, ListInfoItem, ListItem, ListTile,
    ListTileRow, UiAction, MAX_BUTTONS_PER_ROW, MAX_TILES_PER_ROW,
};

use crate::{Error, Result};

/// Largest page a list may declare
pub const MAX_LIST_LIMIT: usize = 64;

/// Browse request parameters sent by the brain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Construction parameters of a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub title: String,
    pub total_matching_items: Option<usize>,
    pub offset: usize,
    pub limit: usize,
    pub browse_identifier: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            title: String::new(),
            total_matching_items: None,
            offset: 0,
            limit: MAX_LIST_LIMIT,
            browse_identifier: None,
        }
    }
}

impl ListParams {
    /// Parameters mirroring an inbound browse request
    #[must_use]
    pub fn from_browse(title: impl Into<String>, params: &BrowseParams) -> Self {
        Self {
            title: title.into(),
            total_matching_items: None,
            offset: params.offset.unwrap_or(0),
            limit: params.limit.unwrap_or(MAX_LIST_LIMIT),
            browse_identifier: params.browse_identifier.clone(),
        }
    }

    #[must_use]
    pub const fn total_matching_items(mut self, total: usize) -> Self {
        self.total_matching_items = Some(total);
        self
    }
}

/// One page reference inside `_meta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub offset: usize,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_identifier: Option<String>,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub total_items: usize,
    pub total_matching_items: usize,
    pub current: ListPage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<ListPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ListPage>,
}

/// A browse result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBuilder {
    pub title: String,
    pub total_matching_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_identifier: Option<String>,
    items: Vec<ListEntry>,
    #[serde(rename = "_meta")]
    meta: ListMeta,
    #[serde(skip)]
    declared_total: Option<usize>,
    #[serde(skip)]
    offset: usize,
    #[serde(skip)]
    limit: usize,
}

impl ListBuilder {
    /// Create an empty list
    ///
    /// # Errors
    ///
    /// Returns `INVALID_LIST_LIMIT` unless `1 <= limit <= 64`
    pub fn new(params: ListParams) -> Result<Self> {
        if params.limit == 0 || params.limit > MAX_LIST_LIMIT {
            return Err(Error::InvalidListLimit(params.limit));
        }

        let mut list = Self {
            title: params.title,
            total_matching_items: 0,
            browse_identifier: params.browse_identifier,
            items: Vec::new(),
            meta: ListMeta {
                total_items: 0,
                total_matching_items: 0,
                current: ListPage {
                    offset: params.offset,
                    limit: params.limit,
                    browse_identifier: None,
                },
                next: None,
                previous: None,
            },
            declared_total: params.total_matching_items,
            offset: params.offset,
            limit: params.limit,
        };
        list.update_meta();
        Ok(list)
    }

    /// Entries in display order
    #[must_use]
    pub fn items(&self) -> &[ListEntry] {
        &self.items
    }

    /// Current pagination metadata
    #[must_use]
    pub const fn meta(&self) -> &ListMeta {
        &self.meta
    }

    #[must_use]
    pub fn add_list_item(mut self, item: ListItem) -> Self {
        self.items.push(ListEntry::Item(item));
        self.update_meta();
        self
    }

    /// Append as many of `items` as the page has room for
    ///
    /// The slice starts at `offset - 1` (or `0` at offset zero). When the
    /// page is already full nothing is added.
    #[must_use]
    pub fn add_list_items(mut self, items: Vec<ListItem>) -> Self {
        let start = self.offset.saturating_sub(1);
        let free = self.limit.saturating_sub(self.items.len());
        if free < 1 {
            tracing::warn!(
                limit = self.limit,
                items = self.items.len(),
                "list is full, no items added"
            );
            return self;
        }

        self.items.extend(
            items
                .into_iter()
                .skip(start)
                .take(free)
                .map(ListEntry::Item),
        );
        self.update_meta();
        self
    }

    #[must_use]
    pub fn add_list_header(mut self, title: impl Into<String>) -> Self {
        self.items.push(ListEntry::Header(ListHeader {
            title: title.into(),
            is_header: true,
        }));
        self.update_meta();
        self
    }

    /// Add a tile row; tiles past the second are dropped
    #[must_use]
    pub fn add_list_tiles(mut self, mut tiles: Vec<ListTile>) -> Self {
        if tiles.len() > MAX_TILES_PER_ROW {
            tracing::warn!(tiles = tiles.len(), "tile row truncated");
            tiles.truncate(MAX_TILES_PER_ROW);
        }
        self.items.push(ListEntry::Tiles(ListTileRow {
            tiles,
            is_tile_row: true,
        }));
        self.update_meta();
        self
    }

    /// Add a button row; buttons past the third are dropped
    #[must_use]
    pub fn add_list_buttons(mut self, mut buttons: Vec<ListButton>) -> Self {
        if buttons.len() > MAX_BUTTONS_PER_ROW {
            tracing::warn!(buttons = buttons.len(), "button row truncated");
            buttons.truncate(MAX_BUTTONS_PER_ROW);
        }
        self.items.push(ListEntry::Buttons(ListButtonRow {
            buttons,
            is_button_row: true,
        }));
        self.update_meta();
        self
    }

    #[must_use]
    pub fn add_list_info_item(mut self, item: ListInfoItem) -> Self {
        self.items.push(ListEntry::Info(item));
        self.update_meta();
        self
    }

    /// Override the number of items matching the browse request
    #[must_use]
    pub fn set_total_matching_items(mut self, total: usize) -> Self {
        self.declared_total = Some(total);
        self.update_meta();
        self
    }

    fn update_meta(&mut self) {
        let counted = self.items.iter().filter(|e| !e.is_decorative()).count();
        let total_matching = self.declared_total.unwrap_or(counted);
        self.total_matching_items = total_matching;

        let page = |offset, limit| ListPage {
            offset,
            limit,
            browse_identifier: self.browse_identifier.clone(),
        };

        let next = self
            .offset
            .checked_add(counted)
            .filter(|next_offset| total_matching > *next_offset)
            .map(|next_offset| page(next_offset, self.limit));
        self.meta = ListMeta {
            total_items: self.items.len(),
            total_matching_items: total_matching,
            current: page(self.offset, self.limit),
            next,
            previous: (self.offset > 0).then(|| {
                page(
                    self.offset.saturating_sub(self.limit),
                    self.limit.min(self.offset),
                )
            }),
        };
    }
}
