//! Pure view derivations over the loaded list: filtering, search,
//! suggestions and dashboard numbers.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use todo_core::Todo;

const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    fn admits(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown filter `{other}`; expected all|active|completed"
            )),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        })
    }
}

/// Todos passing `filter` whose text contains `search` (case-insensitive),
/// in list order. An empty search matches everything.
pub fn visible_todos<'a>(todos: &'a [Todo], filter: Filter, search: &str) -> Vec<&'a Todo> {
    let needle = search.to_lowercase();
    todos
        .iter()
        .filter(|todo| filter.admits(todo))
        .filter(|todo| needle.is_empty() || todo.text.to_lowercase().contains(&needle))
        .collect()
}

/// Splits into `(active, completed)` sections, keeping order.
pub fn partition<'a>(todos: &[&'a Todo]) -> (Vec<&'a Todo>, Vec<&'a Todo>) {
    todos.iter().copied().partition(|todo| !todo.completed)
}

/// Up to ten distinct texts (compared case-insensitively) matching `search`.
pub fn suggestions(todos: &[Todo], search: &str) -> Vec<String> {
    let needle = search.to_lowercase();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for todo in todos {
        let text = todo.text.trim();
        let lower = text.to_lowercase();
        if (needle.is_empty() || lower.contains(&needle)) && seen.insert(lower) {
            out.push(text.to_string());
            if out.len() >= MAX_SUGGESTIONS {
                break;
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Completed share rounded to the nearest whole percent; 0 when empty.
    pub percent: u8,
}

impl DashboardStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let total = todos.len();
        let completed = todos.iter().filter(|todo| todo.completed).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed * 200 + total) / (total * 2)) as u8
        };

        Self {
            total,
            completed,
            active: total - completed,
            percent,
        }
    }

    pub fn progress_label(&self) -> String {
        format!(
            "Completed {} of {} ({}%)",
            self.completed, self.total, self.percent
        )
    }

    /// `"{active}/{total} item(s)"`.
    pub fn count_label(&self) -> String {
        let noun = if self.total == 1 { "item" } else { "items" };
        format!("{}/{} {}", self.active, self.total, noun)
    }
}
