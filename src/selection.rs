//! Region category filter.
//!
//! The selectable options are derived from the loaded feature collection:
//! the "all" sentinel followed by each distinct colour key in first-seen
//! order. Share links address options by position in that list (`0` is
//! "all"); local storage keeps the colour keys themselves so a saved filter
//! survives a reordered feature set.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::geo::RegionFeature;

/// Key of the sentinel option that selects every region.
pub const ALL_KEY: &str = "all";

/// Active region filter. Never an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionSelection {
    #[default]
    All,
    Keys(BTreeSet<String>),
}

impl RegionSelection {
    /// Build a selection from a set of keys, normalizing empty to `All`.
    #[must_use]
    pub fn from_keys(keys: BTreeSet<String>) -> Self {
        if keys.is_empty() || keys.contains(ALL_KEY) { Self::All } else { Self::Keys(keys) }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// One entry of the filter list shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOption {
    /// Position in the option list; `0` is the "all" sentinel.
    pub index: usize,
    /// Colour key, or `None` for the sentinel.
    pub color_key: Option<String>,
    pub label: String,
    pub checked: bool,
}

/// Filter state for the active region category.
#[derive(Debug, Clone, Default)]
pub struct RegionSelectionState {
    /// Distinct colour keys in first-seen order.
    keys: Vec<String>,
    /// Display name per colour key (last feature name wins).
    labels: HashMap<String, String>,
    selection: RegionSelection,
}

impl RegionSelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the option list from `features` and reset the selection to `All`.
    pub fn rebuild(&mut self, features: &[RegionFeature]) {
        self.keys.clear();
        self.labels.clear();
        for feature in features {
            let Some(key) = feature.color_key.as_deref() else {
                continue;
            };
            if !self.labels.contains_key(key) {
                self.keys.push(key.to_owned());
            }
            self.labels.insert(key.to_owned(), feature.name.clone());
        }
        self.selection = RegionSelection::All;
    }

    /// Toggle one option by colour key.
    ///
    /// `"all"` always yields `All`; a concrete key while `All` is active
    /// becomes the only selected key; removing the last key reverts to `All`.
    pub fn toggle(&mut self, key: &str) {
        if key == ALL_KEY {
            self.selection = RegionSelection::All;
            return;
        }
        let mut keys = match std::mem::take(&mut self.selection) {
            RegionSelection::All => BTreeSet::new(),
            RegionSelection::Keys(keys) => keys,
        };
        if !keys.remove(key) {
            keys.insert(key.to_owned());
        }
        self.selection = RegionSelection::from_keys(keys);
    }

    /// Whether `feature` passes the filter.
    #[must_use]
    pub fn is_visible(&self, feature: &RegionFeature) -> bool {
        match (&self.selection, feature.color_key.as_deref()) {
            (RegionSelection::All, _) | (_, None) => true,
            (RegionSelection::Keys(keys), Some(key)) => keys.contains(key),
        }
    }

    /// Visibility flag for each feature, in order.
    #[must_use]
    pub fn visibility(&self, features: &[RegionFeature]) -> Vec<bool> {
        features.iter().map(|f| self.is_visible(f)).collect()
    }

    #[must_use]
    pub fn selection(&self) -> &RegionSelection {
        &self.selection
    }

    /// Colour keys of the current option list, without the sentinel.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Reapply a positional selection from a share link.
    ///
    /// Index `0` (or no indices) selects `All`; index `i` selects key `i - 1`.
    /// Indices past the end are ignored.
    pub fn apply_indices(&mut self, indices: &[usize]) {
        if indices.is_empty() || indices.contains(&0) {
            self.selection = RegionSelection::All;
            return;
        }
        let keys = indices.iter().filter_map(|i| self.keys.get(i - 1)).cloned().collect();
        self.selection = RegionSelection::from_keys(keys);
    }

    /// Reapply a saved key selection, dropping keys absent from the options.
    pub fn apply_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let keys = keys
            .into_iter()
            .filter(|k| self.labels.contains_key(*k))
            .map(str::to_owned)
            .collect();
        self.selection = RegionSelection::from_keys(keys);
    }

    /// Positional encoding of the selection for share links.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        match &self.selection {
            RegionSelection::All => vec![0],
            RegionSelection::Keys(selected) => self
                .keys
                .iter()
                .enumerate()
                .filter(|(_, k)| selected.contains(*k))
                .map(|(i, _)| i + 1)
                .collect(),
        }
    }

    /// Selected colour keys for local storage; empty means `All`.
    #[must_use]
    pub fn saved_keys(&self) -> Vec<String> {
        match &self.selection {
            RegionSelection::All => Vec::new(),
            RegionSelection::Keys(keys) => keys.iter().cloned().collect(),
        }
    }

    /// The full option list with checked state, sentinel first.
    #[must_use]
    pub fn options(&self) -> Vec<RegionOption> {
        let all = RegionOption {
            index: 0,
            color_key: None,
            label: "All".to_owned(),
            checked: self.selection.is_all(),
        };
        let rest = self.keys.iter().enumerate().map(|(i, key)| RegionOption {
            index: i + 1,
            color_key: Some(key.clone()),
            label: self.labels.get(key).cloned().unwrap_or_default(),
            checked: match &self.selection {
                RegionSelection::All => false,
                RegionSelection::Keys(keys) => keys.contains(key),
            },
        });
        std::iter::once(all).chain(rest).collect()
    }
}
