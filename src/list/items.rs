//! List item kinds
//!
//! Only [`ListItem`] rows count towards pagination; headers, tile rows,
//! button rows and info items are decorative.

use serde::{Deserialize, Serialize};

/// Maximum number of tiles in one tile row
pub const MAX_TILES_PER_ROW: usize = 2;

/// Maximum number of buttons in one button row
pub const MAX_BUTTONS_PER_ROW: usize = 3;

/// Client-side action triggered when an entry is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiAction {
    Close,
    GoBack,
    GoToRoot,
    Reload,
}

/// A plain, selectable list row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_identifier: Option<String>,
    #[serde(default)]
    pub is_queueable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_action: Option<UiAction>,
}

impl ListItem {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn thumbnail_uri(mut self, uri: impl Into<String>) -> Self {
        self.thumbnail_uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn action_identifier(mut self, id: impl Into<String>) -> Self {
        self.action_identifier = Some(id.into());
        self
    }

    #[must_use]
    pub fn browse_identifier(mut self, id: impl Into<String>) -> Self {
        self.browse_identifier = Some(id.into());
        self
    }

    #[must_use]
    pub const fn queueable(mut self, queueable: bool) -> Self {
        self.is_queueable = queueable;
        self
    }

    #[must_use]
    pub const fn ui_action(mut self, action: UiAction) -> Self {
        self.ui_action = Some(action);
        self
    }
}

/// Section header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHeader {
    pub title: String,
    pub is_header: bool,
}

/// One tile of a tile row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTile {
    pub thumbnail_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_identifier: Option<String>,
    #[serde(default)]
    pub is_queueable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_action: Option<UiAction>,
}

impl ListTile {
    #[must_use]
    pub fn new(thumbnail_uri: impl Into<String>) -> Self {
        Self {
            thumbnail_uri: thumbnail_uri.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn action_identifier(mut self, id: impl Into<String>) -> Self {
        self.action_identifier = Some(id.into());
        self
    }

    #[must_use]
    pub fn browse_identifier(mut self, id: impl Into<String>) -> Self {
        self.browse_identifier = Some(id.into());
        self
    }
}

/// Row of up to two tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTileRow {
    pub tiles: Vec<ListTile>,
    pub is_tile_row: bool,
}

/// One button of a button row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListButton {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(default)]
    pub inverse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_action: Option<UiAction>,
}

impl ListButton {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn icon_name(mut self, icon: impl Into<String>) -> Self {
        self.icon_name = Some(icon.into());
        self
    }

    #[must_use]
    pub const fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    #[must_use]
    pub fn action_identifier(mut self, id: impl Into<String>) -> Self {
        self.action_identifier = Some(id.into());
        self
    }

    #[must_use]
    pub const fn ui_action(mut self, action: UiAction) -> Self {
        self.ui_action = Some(action);
        self
    }
}

/// Row of up to three buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListButtonRow {
    pub buttons: Vec<ListButton>,
    pub is_button_row: bool,
}

/// Informational row that opens a dialog when selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInfoItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affirmative_button_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_button_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_identifier: Option<String>,
    pub is_info_item: bool,
}

impl ListInfoItem {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_info_item: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn affirmative_button_text(mut self, text: impl Into<String>) -> Self {
        self.affirmative_button_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn negative_button_text(mut self, text: impl Into<String>) -> Self {
        self.negative_button_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn action_identifier(mut self, id: impl Into<String>) -> Self {
        self.action_identifier = Some(id.into());
        self
    }
}

/// Any entry of a list's `items` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListEntry {
    Item(ListItem),
    Header(ListHeader),
    Tiles(ListTileRow),
    Buttons(ListButtonRow),
    Info(ListInfoItem),
}

impl ListEntry {
    /// Decorative entries are excluded from pagination counts
    #[must_use]
    pub const fn is_decorative(&self) -> bool {
        !matches!(self, Self::Item(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plain_items_count() {
        assert!(!ListEntry::Item(ListItem::new("a")).is_decorative());
        assert!(ListEntry::Info(ListInfoItem::new("i")).is_decorative());
        assert!(
            ListEntry::Header(ListHeader {
                title: "h".into(),
                is_header: true
            })
            .is_decorative()
        );
    }

    #[test]
    fn entries_serialize_with_marker_flags() {
        let row = ListEntry::Buttons(ListButtonRow {
            buttons: vec![ListButton::new("Play").ui_action(UiAction::Reload)],
            is_button_row: true,
        });
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["isButtonRow"], true);
        assert_eq!(value["buttons"][0]["uiAction"], "reload");

        let item = serde_json::to_value(ListEntry::Item(ListItem::new("Song"))).unwrap();
        assert_eq!(item, serde_json::json!({ "title": "Song", "isQueueable": false }));
    }
}
