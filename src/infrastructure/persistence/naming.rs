//! Table naming conventions derived from Rust type names.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Whether derived table names use the singular or plural form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TableNaming {
    /// `UserProfile` → `user_profile`
    Singular,
    /// `UserProfile` → `user_profiles`
    Plural,
}

impl FromStr for TableNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singular" => Ok(Self::Singular),
            "plural" => Ok(Self::Plural),
            _ => Err(format!("invalid table naming '{s}', use singular or plural")),
        }
    }
}

impl TryFrom<String> for TableNaming {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TableNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Singular => "singular",
            Self::Plural => "plural",
        })
    }
}

/// Maps type names to table names: `prefix` + snake_case + optional plural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingStrategy {
    prefix: String,
    naming: TableNaming,
}

impl NamingStrategy {
    pub fn new(prefix: impl Into<String>, naming: TableNaming) -> Self {
        Self {
            prefix: prefix.into(),
            naming,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn naming(&self) -> TableNaming {
        self.naming
    }

    /// Table name for a type name such as `UserProfile` or `crate::models::UserProfile`.
    ///
    /// Module paths and generic arguments are ignored.
    pub fn table_name(&self, type_name: &str) -> String {
        let base = type_name.split('<').next().unwrap_or(type_name);
        let base = base.rsplit("::").next().unwrap_or(base);

        let snake = to_snake_case(base);
        let name = match self.naming {
            TableNaming::Singular => snake,
            TableNaming::Plural => pluralize(&snake),
        };

        format!("{}{}", self.prefix, name)
    }

    /// Table name for `T`.
    pub fn table_name_of<T: ?Sized>(&self) -> String {
        self.table_name(std::any::type_name::<T>())
    }
}

/// `UserProfile` → `user_profile`, `HTTPRequest` → `http_request`, `UserID` → `user_id`.
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("datum", "data"),
    ("medium", "media"),
    ("criterion", "criteria"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("analysis", "analyses"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("shelf", "shelves"),
    ("quiz", "quizzes"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "metadata",
    "equipment",
    "information",
    "money",
    "news",
    "series",
    "species",
    "sheep",
    "fish",
];

/// Pluralizes the last word of a snake_case name.
///
/// A small English rule set: the irregular and uncountable words listed
/// above, then `-es` after sibilants, `-ies` after a consonant plus `y`, and
/// `-s` otherwise. Words outside these rules (`cactus`, `phenomenon`) get the
/// plain suffix; use [`TableNaming::Singular`] and name tables explicitly
/// where that matters.
fn pluralize(snake: &str) -> String {
    let (head, word) = match snake.rfind('_') {
        Some(pos) => snake.split_at(pos + 1),
        None => ("", snake),
    };

    if UNCOUNTABLE.contains(&word) {
        return snake.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return format!("{head}{plural}");
    }

    let plural = if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        format!("{word}es")
    } else if let Some(stem) = word.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
        && !stem.is_empty()
    {
        format!("{stem}ies")
    } else {
        format!("{word}s")
    };

    format!("{head}{plural}")
}
