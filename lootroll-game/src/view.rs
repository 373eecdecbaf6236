//! Inventory labels and tab filtering consumed by the presentation layer.
use serde::{Deserialize, Serialize};

use crate::inventory::InventoryRecord;

/// Upper-case the first character, leave the rest untouched.
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Capitalised tags joined with `", "`.
#[must_use]
pub fn tag_text(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| capitalize(tag))
        .collect::<Vec<_>>()
        .join(", ")
}

impl InventoryRecord {
    /// Category text, optionally followed by type text when it adds
    /// something the category does not already say.
    #[must_use]
    pub fn details(&self) -> String {
        let shown_category = self
            .display_category
            .clone()
            .unwrap_or_else(|| tag_text(&self.category));
        let shown_type = self
            .display_type
            .clone()
            .unwrap_or_else(|| tag_text(&self.kind));
        if shown_type
            .to_lowercase()
            .contains(&shown_category.to_lowercase())
        {
            shown_category
        } else {
            format!("{shown_category}, {shown_type}")
        }
    }

    /// `"Name (details)"`, as listed in the inventory.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.details())
    }
}

/// Top-level inventory tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTab {
    #[default]
    All,
    Warframe,
    Primary,
    Secondary,
    Melee,
}

impl CategoryTab {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Warframe,
        Self::Primary,
        Self::Secondary,
        Self::Melee,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Warframe => "warframe",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Melee => "melee",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Sub-tabs offered under this tab.
    #[must_use]
    pub const fn subtabs(self) -> &'static [&'static str] {
        match self {
            Self::All => &["warframe", "weapons", "mods"],
            Self::Warframe => &["warframe", "mods"],
            Self::Primary | Self::Secondary | Self::Melee => &["weapons", "mods"],
        }
    }
}

/// Active tab plus optional sub-tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub tab: CategoryTab,
    pub subtab: Option<String>,
}

impl InventoryFilter {
    #[must_use]
    pub fn new(tab: CategoryTab) -> Self {
        Self { tab, subtab: None }
    }

    #[must_use]
    pub fn with_subtab(mut self, subtab: impl Into<String>) -> Self {
        self.subtab = Some(subtab.into());
        self
    }

    #[must_use]
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        let in_tab = self.tab == CategoryTab::All
            || record.category.iter().any(|category| {
                let category = category.to_lowercase();
                category == self.tab.key() || category == "all"
            });
        let in_subtab = self.subtab.as_ref().is_none_or(|subtab| {
            record
                .kind
                .iter()
                .any(|kind| kind.to_lowercase() == *subtab)
        });
        in_tab && in_subtab
    }

    /// Records visible under this filter, in inventory order.
    pub fn apply<'r>(
        &self,
        records: &'r [InventoryRecord],
    ) -> impl Iterator<Item = &'r InventoryRecord> + use<'r> {
        let filter = self.clone();
        records.iter().filter(move |record| filter.matches(record))
    }
}
