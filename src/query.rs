//! Structured filter and ordering expressions for the backend query
//! interface.
//!
//! Filters are built as values and rendered to the wire form in one place, so
//! row values are always quoted and escaped centrally. Nothing in the client
//! interpolates user data into a filter string by hand.

use std::fmt;

/// A row filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, String),
    /// `column != value`
    Neq(String, String),
    /// Any of the sub-filters matches.
    Or(Vec<Filter>),
    /// All of the sub-filters match.
    And(Vec<Filter>),
    /// `column` is one of the listed values.
    In(String, Vec<String>),
    /// `column` is in the result of a single-column subquery over another
    /// table. Used for "channels the current actor is a member of".
    InSubquery {
        column: String,
        table: String,
        select: String,
        filter: Box<Filter>,
    },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn neq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Neq(column.into(), value.into())
    }

    pub fn any_of(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    pub fn all_of(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn in_list(column: impl Into<String>, values: Vec<String>) -> Self {
        Filter::In(column.into(), values)
    }

    pub fn in_subquery(
        column: impl Into<String>,
        table: impl Into<String>,
        select: impl Into<String>,
        filter: Filter,
    ) -> Self {
        Filter::InSubquery {
            column: column.into(),
            table: table.into(),
            select: select.into(),
            filter: Box::new(filter),
        }
    }

    /// Render to the wire form understood by the backend's row API.
    pub fn render(&self) -> String {
        match self {
            Filter::Eq(col, val) => format!("{}.eq.{}", col, quote_value(val)),
            Filter::Neq(col, val) => format!("{}.neq.{}", col, quote_value(val)),
            Filter::Or(parts) => format!("or({})", render_list(parts)),
            Filter::And(parts) => format!("and({})", render_list(parts)),
            Filter::In(col, values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                format!("{}.in.({})", col, quoted.join(","))
            }
            Filter::InSubquery {
                column,
                table,
                select,
                filter,
            } => format!(
                "{}.in.(select.{}.{}.where.{})",
                column,
                table,
                select,
                filter.render()
            ),
        }
    }
}

fn render_list(parts: &[Filter]) -> String {
    parts
        .iter()
        .map(Filter::render)
        .collect::<Vec<_>>()
        .join(",")
}

/// Quote a row value for the wire form. All values are double-quoted with
/// backslash escaping so caller data can never change the filter shape.
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Ordering direction for `list` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// An ordering clause: column plus direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        write!(f, "{}.{}", self.column, dir)
    }
}
