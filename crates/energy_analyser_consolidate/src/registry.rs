//! Insertion-ordered dataset registry keyed by sheet identifier.

use energy_analyser_io_xlsx::sanitize_sheet_name;

/// Ordered `sheet_id -> dataset` map.
///
/// Re-inserting an existing key replaces the value in place, so the key
/// keeps its first position.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryDataset<T> {
    l_entries: Vec<(String, T)>,
}

impl<T> Default for RegistryDataset<T> {
    fn default() -> Self {
        Self {
            l_entries: Vec::new(),
        }
    }
}

impl<T> RegistryDataset<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the replaced value.
    pub fn insert(&mut self, sheet_id: impl Into<String>, dataset: T) -> Option<T> {
        let sheet_id = sheet_id.into();
        match self.l_entries.iter_mut().find(|(key, _)| *key == sheet_id) {
            Some((_, slot)) => Some(std::mem::replace(slot, dataset)),
            None => {
                self.l_entries.push((sheet_id, dataset));
                None
            }
        }
    }

    pub fn get(&self, sheet_id: &str) -> Option<&T> {
        self.l_entries
            .iter()
            .find(|(key, _)| key == sheet_id)
            .map(|(_, dataset)| dataset)
    }

    pub fn len(&self) -> usize {
        self.l_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.l_entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.l_entries
            .iter()
            .map(|(key, dataset)| (key.as_str(), dataset))
    }

    /// Derive a new registry with the same keys and order.
    pub fn map_values<U>(&self, mut f: impl FnMut(&T) -> U) -> RegistryDataset<U> {
        RegistryDataset {
            l_entries: self
                .l_entries
                .iter()
                .map(|(key, dataset)| (key.clone(), f(dataset)))
                .collect(),
        }
    }
}

/// Derive a worksheet identifier from a source file name.
///
/// Directory components and the last extension are dropped, `.` becomes
/// `_`, characters Excel forbids become `_`, and the result is trimmed and
/// cut to 31 characters.
pub fn derive_sheet_id(name_file: &str) -> String {
    let c_base = name_file
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name_file);
    let c_stem = match c_base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => c_base,
    };
    sanitize_sheet_name(&c_stem.replace('.', "_"), "_")
}
