//! # Column Mapping
//!
//! The upstream schema is not fixed; only fragments of column names are known
//! ("hour", "date", ...). The mapping is resolved once per table and then passed
//! to the cleaning, deduplication and reporting steps so every step agrees on
//! which column plays which role.
//!
//! ## Resolution order (per role)
//! 1. An explicit override, if that column exists in the table.
//! 2. A preferred exact name, compared case-insensitively. Location has none:
//!    it always goes by table order.
//! 3. The first column, in table order, whose lowercase name contains one of the
//!    role's substrings.
//!
//! A volunteer column found only through a generic fragment such as "name" is
//! accepted with a warning, since it may be a project or first name.
//!
//! Roles resolve in the order date, hours, assignment, location, volunteer and a
//! column claimed by an earlier role is never reused, so `volunteerDate` cannot
//! also become the volunteer identity column.

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// The part a column plays in cleaning and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Date,
    Hours,
    Assignment,
    Location,
    Volunteer,
}

impl ColumnRole {
    /// Resolution order; earlier roles claim their column first.
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Date,
        ColumnRole::Hours,
        ColumnRole::Assignment,
        ColumnRole::Location,
        ColumnRole::Volunteer,
    ];

    fn preferred_names(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => &["volunteerDate"],
            ColumnRole::Hours => &["hours"],
            ColumnRole::Assignment => &["assignment"],
            ColumnRole::Location => &[],
            ColumnRole::Volunteer => &["volunteerId", "volunteerName", "volunteer"],
        }
    }

    fn substrings(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => &["date"],
            ColumnRole::Hours => &["hour"],
            ColumnRole::Assignment => &["assignment", "activity"],
            ColumnRole::Location => &["location", "branch"],
            ColumnRole::Volunteer => &["volunteer", "person", "email", "name"],
        }
    }

    /// Fragments too common to trust without a warning.
    fn weak_substrings(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Volunteer => &["name"],
            _ => &[],
        }
    }

    fn strong_match(self, lower: &str) -> bool {
        self.substrings()
            .iter()
            .filter(|s| !self.weak_substrings().contains(*s))
            .any(|s| lower.contains(s))
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Date => "date",
            ColumnRole::Hours => "hours",
            ColumnRole::Assignment => "assignment",
            ColumnRole::Location => "location",
            ColumnRole::Volunteer => "volunteer",
        };
        f.write_str(name)
    }
}

/// Column names pinned by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOverrides(HashMap<ColumnRole, String>);

impl ColumnOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: ColumnRole, column: impl Into<String>) -> Self {
        self.0.insert(role, column.into());
        self
    }

    /// Sets `role` when `column` is `Some`.
    pub fn set(&mut self, role: ColumnRole, column: Option<String>) {
        if let Some(c) = column {
            self.0.insert(role, c);
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.0.get(&role).map(String::as_str)
    }
}

/// # Column Mapping
///
/// The resolved column name for each role, or `None` when the table has no
/// suitable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    resolved: HashMap<ColumnRole, String>,
}

impl ColumnMapping {
    /// Resolves every role using only the built-in names and substrings.
    pub fn resolve(columns: &[String]) -> Self {
        Self::resolve_with(columns, &ColumnOverrides::default())
    }

    /// Resolves every role, honouring `overrides` where the column exists.
    pub fn resolve_with(columns: &[String], overrides: &ColumnOverrides) -> Self {
        let mut resolved: HashMap<ColumnRole, String> = HashMap::new();

        for role in ColumnRole::ALL {
            let claimed: Vec<&String> = resolved.values().collect();
            let free = |c: &&String| !claimed.contains(c);

            let from_override = overrides.get(role).and_then(|wanted| {
                let hit = columns.iter().find(|c| c.as_str() == wanted);
                if hit.is_none() {
                    warn!("Configured {role} column '{wanted}' is not present; falling back to detection");
                }
                hit
            });

            let from_preferred = || {
                role.preferred_names().iter().find_map(|name| {
                    columns.iter().filter(free).find(|c| c.eq_ignore_ascii_case(name))
                })
            };

            let from_substring = || {
                columns
                    .iter()
                    .filter(free)
                    .find(|c| role.strong_match(&c.to_lowercase()))
            };

            let from_weak_substring = || {
                let hit = columns.iter().filter(free).find(|c| {
                    let lower = c.to_lowercase();
                    role.weak_substrings().iter().any(|s| lower.contains(s))
                });
                if let Some(column) = hit {
                    warn!("Using '{column}' as the {role} column by a loose name match; set an override if this is wrong");
                }
                hit
            };

            let chosen = from_override
                .or_else(from_preferred)
                .or_else(from_substring)
                .or_else(from_weak_substring)
                .cloned();

            if let Some(column) = chosen {
                debug!("Resolved {role} column: '{column}'");
                resolved.insert(role, column);
            }
        }

        Self { resolved }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.resolved.get(&role).map(String::as_str)
    }

    pub fn hours(&self) -> Option<&str> {
        self.get(ColumnRole::Hours)
    }

    pub fn date(&self) -> Option<&str> {
        self.get(ColumnRole::Date)
    }

    pub fn assignment(&self) -> Option<&str> {
        self.get(ColumnRole::Assignment)
    }

    pub fn location(&self) -> Option<&str> {
        self.get(ColumnRole::Location)
    }

    pub fn volunteer(&self) -> Option<&str> {
        self.get(ColumnRole::Volunteer)
    }
}
