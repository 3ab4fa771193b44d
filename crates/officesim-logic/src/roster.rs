//! Employees and calendar colours.
//!
//! Every hired employee gets a calendar colour. A colour already stored on
//! the employee record wins; everyone else draws from a seeded shuffle of
//! the palette so colours stay stable between sessions and distinct while
//! the palette lasts.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants::colors;
use crate::rng::{hash_seed, shuffle, SeedRng};

/// Employee as delivered by the roster feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    /// Colour stored on the employee record, if any. Not yet validated.
    #[serde(default)]
    pub stored_color: Option<String>,
}

/// Employee as shown on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// Normalised `#rrggbb`.
    pub color: String,
}

/// Normalise a hex colour to lowercase `#rrggbb`.
///
/// Accepts `rgb`, `#rgb`, `rrggbb` and `#rrggbb` with surrounding
/// whitespace. Returns `None` for anything else.
pub fn normalize_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !(hex.len() == 3 || hex.len() == 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    Some(format!("#{}", expanded.to_ascii_lowercase()))
}

/// Deterministic colour for an id, independent of roster order.
pub fn fallback_color(id: &str, palette: &[String]) -> String {
    if palette.is_empty() {
        return colors::FALLBACK.to_string();
    }
    let h = hash_seed(id) as usize;
    palette[h % palette.len()].clone()
}

/// Assign a colour to every roster entry.
///
/// Stored colours are kept first. Remaining entries, in roster order, take
/// the unused colours of a seeded palette shuffle, then cycle through the
/// whole shuffled palette once it runs out.
pub fn assign_colors(roster: &[RosterEntry], seed: &str, palette: &[String]) -> HashMap<String, String> {
    let mut normalized: Vec<String> = palette.iter().filter_map(|c| normalize_color(c)).collect();
    if normalized.is_empty() {
        normalized.push(colors::FALLBACK.to_string());
    }
    let seed = if seed.is_empty() { colors::DEFAULT_SEED } else { seed };
    let mut shuffled = normalized.clone();
    shuffle(&mut shuffled, &mut SeedRng::from_seed(seed));

    let mut assigned = HashMap::new();
    let mut used = HashSet::new();
    for entry in roster {
        if let Some(stored) = entry.stored_color.as_deref().and_then(normalize_color) {
            used.insert(stored.clone());
            assigned.insert(entry.id.clone(), stored);
        }
    }

    let mut available = shuffled.iter().filter(|c| !used.contains(*c)).cloned();
    let mut cycle = 0usize;
    for entry in roster {
        if assigned.contains_key(&entry.id) {
            continue;
        }
        let pick = available.next().unwrap_or_else(|| {
            let c = shuffled[cycle % shuffled.len()].clone();
            cycle += 1;
            c
        });
        assigned.insert(entry.id.clone(), pick);
    }
    assigned
}

/// Build calendar employees from a roster feed.
///
/// Blank names become "Teammate". The result is sorted by name ignoring
/// case, then by exact name, then id. The schedule generator draws
/// participants in this order.
pub fn build_employees(roster: &[RosterEntry], seed: &str, palette: &[String]) -> Vec<Employee> {
    let assigned = assign_colors(roster, seed, palette);
    let mut employees: Vec<Employee> = roster
        .iter()
        .map(|entry| {
            let name = entry.name.trim();
            Employee {
                id: entry.id.clone(),
                name: if name.is_empty() { "Teammate".to_string() } else { name.to_string() },
                color: assigned
                    .get(&entry.id)
                    .cloned()
                    .unwrap_or_else(|| fallback_color(&entry.id, palette)),
            }
        })
        .collect();
    employees.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    employees
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<String> {
        colors::PALETTE.iter().map(|c| c.to_string()).collect()
    }

    fn entry(id: &str, name: &str, stored: Option<&str>) -> RosterEntry {
        RosterEntry {
            id: id.into(),
            name: name.into(),
            stored_color: stored.map(String::from),
        }
    }

    #[test]
    fn test_normalize_color_forms() {
        assert_eq!(normalize_color("#ABC").as_deref(), Some("#aabbcc"));
        assert_eq!(normalize_color(" 5c7aff ").as_deref(), Some("#5c7aff"));
        assert_eq!(normalize_color("#5C7AFF").as_deref(), Some("#5c7aff"));
        assert_eq!(normalize_color("#abcd"), None);
        assert_eq!(normalize_color("#ggg"), None);
        assert_eq!(normalize_color(""), None);
    }

    #[test]
    fn test_fallback_color_is_stable() {
        let p = palette();
        assert_eq!(fallback_color("emp-1", &p), fallback_color("emp-1", &p));
        assert!(p.contains(&fallback_color("emp-1", &p)));
        assert_eq!(fallback_color("x", &[]), colors::FALLBACK);
    }

    #[test]
    fn test_stored_colors_are_kept() {
        let roster = vec![entry("a", "Ann", Some("#F9C74F")), entry("b", "Bob", None)];
        let assigned = assign_colors(&roster, "acme", &palette());
        assert_eq!(assigned["a"], "#f9c74f");
        assert_ne!(assigned["b"], "#f9c74f");
    }

    #[test]
    fn test_colors_distinct_while_palette_lasts() {
        let roster: Vec<_> = (0..8).map(|i| entry(&format!("e{i}"), "x", None)).collect();
        let assigned = assign_colors(&roster, "acme", &palette());
        let unique: HashSet<_> = assigned.values().collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_colors_cycle_past_palette() {
        let roster: Vec<_> = (0..12).map(|i| entry(&format!("e{i}"), "x", None)).collect();
        let assigned = assign_colors(&roster, "acme", &palette());
        assert_eq!(assigned.len(), 12);
        assert!(assigned.values().all(|c| palette().contains(c)));
    }

    #[test]
    fn test_invalid_palette_falls_back() {
        let roster = vec![entry("a", "Ann", None)];
        let assigned = assign_colors(&roster, "acme", &["nope".to_string()]);
        assert_eq!(assigned["a"], colors::FALLBACK);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let roster: Vec<_> = (0..5).map(|i| entry(&format!("e{i}"), "x", None)).collect();
        assert_eq!(
            assign_colors(&roster, "acme", &palette()),
            assign_colors(&roster, "acme", &palette())
        );
    }

    #[test]
    fn test_build_employees_sort_ignores_case() {
        let roster = vec![
            entry("1", "Zed", None),
            entry("2", "bob", None),
            entry("3", "Bob", None),
            entry("4", "amy", None),
        ];
        let names: Vec<_> = build_employees(&roster, "seed", &palette())
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["amy", "Bob", "bob", "Zed"]);
    }

    #[test]
    fn test_build_employees_sorted_and_named() {
        let roster = vec![entry("2", "Zed", None), entry("1", "  ", None), entry("3", "Amy", None)];
        let employees = build_employees(&roster, "acme", &palette());
        let names: Vec<_> = employees.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Teammate", "Zed"]);
    }
}
