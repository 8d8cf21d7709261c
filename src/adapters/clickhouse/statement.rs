//! Parameterized statements

use std::collections::BTreeMap;
use std::fmt;

/// SQL text plus named bound parameters
///
/// Parameter values never appear in the SQL text; the text references them as
/// `{name:Type}` placeholders.
///
/// ```
/// use batch_export::adapters::clickhouse::Statement;
///
/// let statement = Statement::new("SELECT count(*) FROM events WHERE team_id = {team_id:Int64}")
///     .bind("team_id", 2);
///
/// assert_eq!(statement.param("team_id"), Some("2"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: BTreeMap<String, String>,
}

impl Statement {
    /// Creates a statement without parameters
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: BTreeMap::new(),
        }
    }

    /// Binds a named parameter, replacing any previous value
    pub fn bind(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Value bound to `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All bound parameters in name order
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// Parameter values may hold credentials, so only their names are printed.
impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_replaces_value() {
        let statement = Statement::new("SELECT {a:String}")
            .bind("a", "first")
            .bind("a", "second");
        assert_eq!(statement.param("a"), Some("second"));
        assert_eq!(statement.params().count(), 1);
    }

    #[test]
    fn test_debug_hides_values() {
        let statement = Statement::new("SELECT 1").bind("aws_secret_access_key", "hidden");
        let debug = format!("{statement:?}");
        assert!(debug.contains("aws_secret_access_key"));
        assert!(!debug.contains("hidden"));
    }
}
