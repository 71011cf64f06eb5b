//! Display metadata for command categories.

use serde::Serialize;

/// How a category is presented in help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub title: String,
    pub order: u32,
}

/// Order assigned to categories without a standard entry.
pub const DEFAULT_ORDER: u32 = 99;

const STANDARD: &[(&str, &str, u32)] = &[
    ("core", "Essential Operations", 1),
    ("build", "Build & Compilation", 2),
    ("test", "Testing & Quality", 3),
    ("quality", "Code Quality & Linting", 4),
    ("deps", "Dependency Management", 5),
    ("tools", "Development Tools", 6),
    ("docs", "Documentation", 8),
    ("git", "Git Operations", 9),
    ("release", "Release Management", 10),
    ("user", "Project Commands", 20),
];

impl CategoryInfo {
    /// Standard info for known categories, a title-cased fallback otherwise.
    pub fn for_category(category: &str) -> Self {
        let key = category.to_lowercase();
        if let Some((_, title, order)) = STANDARD.iter().find(|(name, _, _)| *name == key) {
            return Self {
                title: (*title).to_string(),
                order: *order,
            };
        }
        Self {
            title: title_case(category),
            order: DEFAULT_ORDER,
        }
    }
}

fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_category() {
        let info = CategoryInfo::for_category("build");
        assert_eq!(info.title, "Build & Compilation");
        assert_eq!(info.order, 2);
    }

    #[test]
    fn test_unknown_category_is_title_cased() {
        let info = CategoryInfo::for_category("cloud_deploy");
        assert_eq!(info.title, "Cloud Deploy");
        assert_eq!(info.order, DEFAULT_ORDER);
    }
}
