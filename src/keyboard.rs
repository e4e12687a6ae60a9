//! Paper keyboard layout: the 88-key table and which slice of it each printed
//! sheet covers.
//!
//! Sheets are identified by ArUco marker ids. Each sheet carries two markers
//! (an even id and the odd id above it); both resolve to the even id.

use crate::note::NOTE_NAMES;

pub const KEY_COUNT: usize = 88;

/// Key ranges `[start, end)` into [`full_88_keys`] for each sheet marker.
/// Neighbouring sheets overlap by a key where the printed pages do.
pub const SHEET_RANGES: [(u32, usize, usize); 6] = [
    (0, 0, 15),
    (2, 15, 31),
    (4, 30, 43),
    (6, 45, 62),
    (8, 61, 77),
    (10, 76, 88),
];

/// A0, A#0, B0, C1..B7, C8.
pub fn full_88_keys() -> Vec<String> {
    let mut keys = Vec::with_capacity(KEY_COUNT);
    keys.extend(["A0", "A#0", "B0"].iter().map(|s| s.to_string()));
    for octave in 1..=7 {
        keys.extend(octave_keys(octave));
    }
    keys.push("C8".to_string());
    keys
}

/// The twelve names C..B of one octave.
pub fn octave_keys(octave: u32) -> Vec<String> {
    NOTE_NAMES.iter().map(|n| format!("{}{}", n, octave)).collect()
}

/// Odd marker ids belong to the same sheet as the even id below.
pub fn normalize_marker(id: u32) -> u32 {
    id - id % 2
}

/// Index and name of the key under a horizontal position `u` in `[0, 1)`
/// across the sheet.
pub fn key_at_percent(keys: &[String], u: f64) -> Option<(usize, &str)> {
    if !(0.0..1.0).contains(&u) || keys.is_empty() {
        return None;
    }
    let idx = (u * keys.len() as f64) as usize;
    keys.get(idx).map(|k| (idx, k.as_str()))
}

/// Lookup from marker id to the keys printed on that sheet.
#[derive(Debug, Clone)]
pub struct SheetMap {
    keys: Vec<String>,
}

impl SheetMap {
    pub fn new() -> Self {
        Self {
            keys: full_88_keys(),
        }
    }

    /// Keys on the sheet for `marker_id` (odd ids normalized), empty if unknown.
    pub fn sheet_keys(&self, marker_id: u32) -> &[String] {
        let id = normalize_marker(marker_id);
        SHEET_RANGES
            .iter()
            .find(|(sheet, _, _)| *sheet == id)
            .map(|&(_, start, end)| &self.keys[start..end])
            .unwrap_or(&[])
    }
}

impl Default for SheetMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_keyboard() {
        let keys = full_88_keys();
        assert_eq!(keys.len(), 88);
        assert_eq!(keys[0], "A0");
        assert_eq!(keys[3], "C1");
        assert_eq!(keys[87], "C8");
        // Middle C is the 40th key
        assert_eq!(keys[39], "C4");
    }

    #[test]
    fn test_sheet_ranges() {
        let map = SheetMap::new();
        assert_eq!(map.sheet_keys(0).len(), 15);
        assert_eq!(map.sheet_keys(0)[0], "A0");
        assert_eq!(map.sheet_keys(2)[0], full_88_keys()[15]);
        assert_eq!(map.sheet_keys(10).last().map(String::as_str), Some("C8"));
        assert!(map.sheet_keys(12).is_empty());
        assert!(map.sheet_keys(40).is_empty());
    }

    #[test]
    fn test_odd_markers_normalize() {
        let map = SheetMap::new();
        assert_eq!(normalize_marker(5), 4);
        assert_eq!(normalize_marker(4), 4);
        assert_eq!(map.sheet_keys(3), map.sheet_keys(2));
    }

    #[test]
    fn test_key_at_percent() {
        let keys = octave_keys(1);
        assert_eq!(key_at_percent(&keys, 0.0), Some((0, "C1")));
        assert_eq!(key_at_percent(&keys, 0.04), Some((0, "C1")));
        assert_eq!(key_at_percent(&keys, 0.10), Some((1, "C#1")));
        assert_eq!(key_at_percent(&keys, 0.5), Some((6, "F#1")));
        assert_eq!(key_at_percent(&keys, 1.0), None);
        assert_eq!(key_at_percent(&keys, -0.01), None);
        assert_eq!(key_at_percent(&[], 0.5), None);
    }
}
