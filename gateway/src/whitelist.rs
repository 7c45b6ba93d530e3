//! Database/table whitelist.
//!
//! Built once at startup and shared read-only. Lookups are case-insensitive;
//! the canonical spelling stored here is what gets interpolated into SQL.

use std::collections::BTreeMap;

use common::errors::{AppError, AppResult};
use common::utils::is_safe_identifier;

/// Databases and tables served by default.
const BUILTIN: &[(&str, &[&str])] = &[
    (
        "university",
        &[
            "Academic_Department",
            "Instructor",
            "Student",
            "Course",
            "Enrolled_In",
        ],
    ),
    (
        "research",
        &["Lab", "Researcher", "Journal", "Publication", "Authored_By"],
    ),
];

/// Immutable selector -> tables allow-list.
#[derive(Debug, Clone)]
pub struct Whitelist {
    /// Lowercase selector -> (lowercase table -> canonical table).
    databases: BTreeMap<String, BTreeMap<String, String>>,
}

impl Whitelist {
    /// Builds a whitelist, rejecting any selector or table that is not a safe
    /// identifier.
    pub fn new<I, T, S>(entries: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (S, T)>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut databases = BTreeMap::new();
        for (selector, tables) in entries {
            let selector = selector.as_ref();
            if !is_safe_identifier(selector) {
                return Err(format!("invalid database selector `{}`", selector));
            }
            let mut allowed = BTreeMap::new();
            for table in tables {
                let table = table.as_ref();
                if !is_safe_identifier(table) {
                    return Err(format!("invalid table `{}` for `{}`", table, selector));
                }
                allowed.insert(table.to_lowercase(), table.to_string());
            }
            databases.insert(selector.to_lowercase(), allowed);
        }
        Ok(Self { databases })
    }

    /// The built-in `university` and `research` whitelist.
    pub fn builtin() -> Result<Self, String> {
        Self::new(
            BUILTIN
                .iter()
                .map(|(selector, tables)| (*selector, tables.iter().copied())),
        )
    }

    /// Resolves a selector to its canonical (lowercase) form.
    pub fn database<'a>(&'a self, selector: &str) -> AppResult<&'a str> {
        self.databases
            .get_key_value(&selector.to_lowercase())
            .map(|(key, _)| key.as_str())
            .ok_or(AppError::InvalidDatabase)
    }

    /// Resolves `(selector, table)` to the canonical selector and table name.
    pub fn table<'a>(&'a self, selector: &str, table: &str) -> AppResult<(&'a str, &'a str)> {
        let (database, tables) = self
            .databases
            .get_key_value(&selector.to_lowercase())
            .ok_or(AppError::InvalidDatabase)?;
        let table = tables
            .get(&table.to_lowercase())
            .ok_or(AppError::InvalidTable)?;
        Ok((database.as_str(), table.as_str()))
    }

    /// Whether `table` is allowed for an already-resolved selector.
    pub fn allows(&self, database: &str, table: &str) -> bool {
        self.databases
            .get(database)
            .is_some_and(|tables| tables.contains_key(&table.to_lowercase()))
    }

    /// Canonical selectors, sorted.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }
}
