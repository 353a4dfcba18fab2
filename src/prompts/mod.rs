//! Prompt selection: (category, sub-category, language) → (system, user).
//!
//! The table lives in `prompts.yaml` and is compiled into the binary. Lookup
//! never fails: an unknown sub-category resolves to its category's default
//! entry, and an unknown category resolves to the generic medical-image
//! prompt pair.

use crate::report::Language;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

const PROMPT_TABLE_YAML: &str = include_str!("prompts.yaml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Deserialize)]
struct Localized<T> {
    en: T,
    ar: T,
}

impl<T> Localized<T> {
    fn get(&self, language: Language) -> &T {
        match language {
            Language::En => &self.en,
            Language::Ar => &self.ar,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SharedText {
    language_instruction: String,
    response_format: String,
}

#[derive(Debug, Deserialize)]
struct PromptEntry {
    role: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct PromptFamily {
    #[serde(default)]
    preamble: Option<Localized<String>>,
    default: Localized<PromptEntry>,
    #[serde(default)]
    sub_categories: HashMap<String, Localized<PromptEntry>>,
}

#[derive(Debug, Deserialize)]
struct PromptTable {
    shared: Localized<SharedText>,
    generic: Localized<PromptEntry>,
    categories: HashMap<String, PromptFamily>,
}

fn table() -> &'static PromptTable {
    static TABLE: OnceLock<PromptTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        // The table is compiled in; a parse failure is a build defect caught by tests.
        serde_yaml::from_str(PROMPT_TABLE_YAML).expect("embedded prompts.yaml is valid")
    })
}

/// Pick the prompt pair for a category.
///
/// `category` is taken as a raw string so that callers outside the HTTP
/// layer can ask for families that have no [`crate::report::Category`]
/// variant yet; those get the generic pair.
pub fn select(category: &str, sub_category: Option<&str>, language: Language) -> PromptPair {
    let table = table();
    let shared = table.shared.get(language);

    let (preamble, entry) = match table.categories.get(category) {
        Some(family) => {
            let entry = sub_category
                .and_then(|sub| family.sub_categories.get(sub))
                .unwrap_or(&family.default);
            (
                family.preamble.as_ref().map(|p| p.get(language).as_str()),
                entry.get(language),
            )
        }
        None => (None, table.generic.get(language)),
    };

    let mut system = String::new();
    for part in [
        Some(shared.language_instruction.as_str()),
        preamble,
        Some(entry.role.as_str()),
        Some(shared.response_format.as_str()),
    ]
    .into_iter()
    .flatten()
    {
        if !system.is_empty() {
            system.push_str("\n\n");
        }
        system.push_str(part);
    }

    PromptPair {
        system,
        user: entry.user.clone(),
    }
}

/// Sub-categories known for a category, sorted. Empty for flat families.
pub fn sub_categories(category: &str) -> Vec<&'static str> {
    let mut subs: Vec<&'static str> = table()
        .categories
        .get(category)
        .map(|family| family.sub_categories.keys().map(String::as_str).collect())
        .unwrap_or_default();
    subs.sort_unstable();
    subs
}
