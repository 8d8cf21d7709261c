//! Extraction query construction
//!
//! Builds the two statements an export issues against the analytical store: a
//! row count over the window, and the bulk `INSERT INTO FUNCTION s3(...)` that
//! writes the same rows to object storage. Window bounds, team id, destination
//! and credentials are always bound parameters. Table names and partition
//! expressions only ever come from [`SUPPORTED_TABLES`].

use crate::adapters::clickhouse::Statement;
use crate::config::schema::{BatchExportConfig, Environment};
use crate::domain::ids::TeamId;
use crate::domain::interval::DataInterval;
use crate::domain::spec::{Credentials, ExportSpec};
use crate::domain::{ExportError, Result};
use secrecy::ExposeSecret;

/// An exportable table and the partition granularities it supports
#[derive(Debug, PartialEq, Eq)]
pub struct TableDefinition {
    /// Table name in the analytical store
    pub name: &'static str,

    /// Partition key name paired with its store-native truncation expression
    pub partition_keys: &'static [(&'static str, &'static str)],
}

impl TableDefinition {
    /// Expression registered for `key`
    pub fn partition_expression(&self, key: &str) -> Option<&'static str> {
        self.partition_keys
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, expression)| *expression)
    }
}

/// Tables that may be exported
pub const SUPPORTED_TABLES: &[TableDefinition] = &[TableDefinition {
    name: "events",
    partition_keys: &[
        ("hour", "toStartOfHour(timestamp)"),
        ("day", "toStartOfDay(timestamp)"),
        ("week", "toStartOfWeek(timestamp)"),
        ("month", "toStartOfMonth(timestamp)"),
    ],
}];

/// Looks up a table in [`SUPPORTED_TABLES`]
pub fn table_definition(name: &str) -> Option<&'static TableDefinition> {
    SUPPORTED_TABLES.iter().find(|table| table.name == name)
}

/// Where the analytical store writes exported objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStorageEndpoint {
    /// Fixed endpoint used outside production
    Local(String),
    /// `https://s3.<region>.amazonaws.com`
    Regional,
}

impl ObjectStorageEndpoint {
    /// Endpoint for the configured environment
    pub fn from_config(config: &BatchExportConfig) -> Self {
        Self::for_environment(config.environment, &config.object_storage.local_endpoint)
    }

    /// Local endpoint in development and test, regional endpoint in production
    pub fn for_environment(environment: Environment, local_endpoint: &str) -> Self {
        if environment.uses_local_object_storage() {
            Self::Local(local_endpoint.trim_end_matches('/').to_string())
        } else {
            Self::Regional
        }
    }

    /// Base URL for a bucket in `region`
    pub fn base_url(&self, region: &str) -> String {
        match self {
            Self::Local(endpoint) => endpoint.clone(),
            Self::Regional => format!("https://s3.{region}.amazonaws.com"),
        }
    }
}

/// Substitutes key template placeholders
///
/// `{partition_id}` becomes the store-side `{_partition_id}` token, `{table_name}`
/// and `{file_format}` take their values. Everything else is kept verbatim and
/// nothing is percent-encoded.
///
/// ```
/// use batch_export::core::query::render_key;
///
/// assert_eq!(
///     render_key("exports/{table_name}/{partition_id}.{file_format}", "events", "CSV"),
///     "exports/events/{_partition_id}.CSV"
/// );
/// ```
pub fn render_key(key_template: &str, table_name: &str, file_format: &str) -> String {
    key_template
        .replace("{partition_id}", "{_partition_id}")
        .replace("{table_name}", table_name)
        .replace("{file_format}", file_format)
}

/// Destination URL `<base>/<bucket>/<rendered key>`
pub fn build_destination_url(
    endpoint: &ObjectStorageEndpoint,
    spec: &ExportSpec,
) -> String {
    format!(
        "{}/{}/{}",
        endpoint.base_url(&spec.region),
        spec.bucket_name,
        render_key(&spec.key_template, &spec.table_name, &spec.file_format)
    )
}

/// Statements and destination for exporting one window
///
/// Derived from the immutable inputs on every attempt and never persisted.
#[derive(Debug, Clone)]
pub struct ExtractionQuery {
    table: &'static TableDefinition,
    interval: DataInterval,
    team_id: TeamId,
    partition_expression: Option<&'static str>,
    destination_url: String,
    file_format: String,
    credentials: Option<Credentials>,
}

impl ExtractionQuery {
    /// Validates the table and partition key and assembles the query
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnsupportedTable`] or
    /// [`ExportError::UnsupportedPartitionKey`]; no destination is produced in
    /// either case.
    pub fn build(
        interval: &DataInterval,
        spec: &ExportSpec,
        endpoint: &ObjectStorageEndpoint,
    ) -> Result<Self> {
        let table = table_definition(&spec.table_name)
            .ok_or_else(|| ExportError::UnsupportedTable(spec.table_name.clone()))?;

        let partition_expression = match spec.partition_key.as_deref() {
            Some(key) => Some(table.partition_expression(key).ok_or_else(|| {
                ExportError::UnsupportedPartitionKey {
                    table_name: table.name.to_string(),
                    partition_key: key.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            table,
            interval: *interval,
            team_id: spec.team_id,
            partition_expression,
            destination_url: build_destination_url(endpoint, spec),
            file_format: spec.file_format.clone(),
            credentials: spec.credentials(),
        })
    }

    /// Source table
    pub fn table_name(&self) -> &'static str {
        self.table.name
    }

    /// Window being exported
    pub fn interval(&self) -> &DataInterval {
        &self.interval
    }

    /// Object storage URL the export writes to
    pub fn destination_url(&self) -> &str {
        &self.destination_url
    }

    /// `PARTITION BY ...` clause, if a partition key was requested
    pub fn partition_clause(&self) -> Option<String> {
        self.partition_expression
            .map(|expression| format!("PARTITION BY {expression}"))
    }

    /// Whether destination credentials are passed to the store
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn select_sql(&self, fields: &str) -> String {
        format!(
            "SELECT {fields} FROM {table} \
             WHERE timestamp >= toDateTime({{data_interval_start:String}}, 'UTC') \
             AND timestamp < toDateTime({{data_interval_end:String}}, 'UTC') \
             AND team_id = {{team_id:Int64}}",
            table = self.table.name
        )
    }

    fn bind_window(&self, statement: Statement) -> Statement {
        statement
            .bind("data_interval_start", self.interval.start_param())
            .bind("data_interval_end", self.interval.end_param())
            .bind("team_id", self.team_id.value())
    }

    /// `SELECT count(*)` over the window
    pub fn count_statement(&self) -> Statement {
        self.bind_window(Statement::new(self.select_sql("count(*)")))
    }

    /// Bulk export of every row in the window to the destination
    pub fn export_statement(&self) -> Statement {
        let auth = if self.credentials.is_some() {
            "{aws_access_key_id:String}, {aws_secret_access_key:String}, "
        } else {
            ""
        };

        let partition = self
            .partition_clause()
            .map(|clause| format!(" {clause}"))
            .unwrap_or_default();

        let sql = format!(
            "INSERT INTO FUNCTION s3({{path:String}}, {auth}{{file_format:String}}){partition} {select}",
            select = self.select_sql("*")
        );

        let mut statement = self
            .bind_window(Statement::new(sql))
            .bind("path", &self.destination_url)
            .bind("file_format", &self.file_format);

        if let Some(ref credentials) = self.credentials {
            statement = statement
                .bind("aws_access_key_id", &credentials.access_key_id)
                .bind(
                    "aws_secret_access_key",
                    credentials.secret_access_key.expose_secret(),
                );
        }

        statement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interval::parse_instant;
    use crate::domain::ErrorKind;
    use test_case::test_case;

    fn spec_json(extra: &str) -> String {
        format!(
            r#"{{
                "bucket_name": "my-bucket",
                "region": "eu-central-1",
                "key_template": "exports/{{table_name}}/{{partition_id}}.{{file_format}}",
                "batch_window_size": 3600,
                "team_id": 42,
                "destination_id": "dest"{extra}
            }}"#
        )
    }

    fn spec(extra: &str) -> ExportSpec {
        ExportSpec::parse_inputs(&spec_json(extra)).unwrap()
    }

    fn interval() -> DataInterval {
        DataInterval::ending_at(parse_instant("2024-01-01T01:00:00Z").unwrap(), 3600).unwrap()
    }

    fn local() -> ObjectStorageEndpoint {
        ObjectStorageEndpoint::for_environment(Environment::Test, "http://object-storage:19000")
    }

    #[test_case("hour", "toStartOfHour(timestamp)")]
    #[test_case("day", "toStartOfDay(timestamp)")]
    #[test_case("week", "toStartOfWeek(timestamp)")]
    #[test_case("month", "toStartOfMonth(timestamp)")]
    fn test_registered_partition_keys(key: &str, expression: &str) {
        let spec = spec(&format!(r#", "partition_key": "{key}""#));
        let query = ExtractionQuery::build(&interval(), &spec, &local()).unwrap();

        let clause = query.partition_clause().unwrap();
        assert_eq!(clause, format!("PARTITION BY {expression}"));
        assert!(query.export_statement().sql().contains(&clause));
        assert!(!query.count_statement().sql().contains("PARTITION BY"));
    }

    #[test]
    fn test_unregistered_partition_key_is_rejected() {
        let spec = spec(r#", "partition_key": "minute""#);
        let err = ExtractionQuery::build(&interval(), &spec, &local()).unwrap_err();

        assert!(matches!(err, ExportError::UnsupportedPartitionKey { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unsupported_table_is_rejected() {
        let spec = spec(r#", "table_name": "unknown_table""#);
        let err = ExtractionQuery::build(&interval(), &spec, &local()).unwrap_err();

        assert!(matches!(err, ExportError::UnsupportedTable(ref t) if t == "unknown_table"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_no_partition_clause_without_key() {
        let query = ExtractionQuery::build(&interval(), &spec(""), &local()).unwrap();
        assert!(query.partition_clause().is_none());
        assert!(!query.export_statement().sql().contains("PARTITION BY"));
    }

    #[test]
    fn test_destination_url_local_and_regional() {
        let spec = spec("");
        assert_eq!(
            build_destination_url(&local(), &spec),
            "http://object-storage:19000/my-bucket/exports/events/{_partition_id}.CSVWithNames"
        );

        let production =
            ObjectStorageEndpoint::for_environment(Environment::Production, "http://ignored");
        assert_eq!(
            build_destination_url(&production, &spec),
            "https://s3.eu-central-1.amazonaws.com/my-bucket/exports/events/{_partition_id}.CSVWithNames"
        );
    }

    #[test]
    fn test_render_key_is_not_percent_encoded() {
        assert_eq!(
            render_key("a b/{unknown}/ü%20/{partition_id}", "events", "CSV"),
            "a b/{unknown}/ü%20/{_partition_id}"
        );
    }

    #[test]
    fn test_destination_is_deterministic() {
        let spec = spec(r#", "partition_key": "day""#);
        let first = ExtractionQuery::build(&interval(), &spec, &local()).unwrap();
        let second = ExtractionQuery::build(&interval(), &spec, &local()).unwrap();

        assert_eq!(first.destination_url(), second.destination_url());
        assert_eq!(first.export_statement(), second.export_statement());
    }

    #[test]
    fn test_window_and_team_are_bound_not_interpolated() {
        let query = ExtractionQuery::build(&interval(), &spec(""), &local()).unwrap();

        for statement in [query.count_statement(), query.export_statement()] {
            assert!(!statement.sql().contains("2024-01-01"));
            assert!(!statement.sql().contains("42"));
            assert_eq!(statement.param("data_interval_start"), Some("2024-01-01 00:00:00"));
            assert_eq!(statement.param("data_interval_end"), Some("2024-01-01 01:00:00"));
            assert_eq!(statement.param("team_id"), Some("42"));
        }
    }

    #[test]
    fn test_count_and_export_share_predicate() {
        let query = ExtractionQuery::build(&interval(), &spec(""), &local()).unwrap();
        let count_sql = query.count_statement().sql().to_string();
        let export_sql = query.export_statement().sql().to_string();

        assert!(count_sql.starts_with("SELECT count(*) FROM events WHERE"));
        let predicate = count_sql.split_once("WHERE").unwrap().1;
        assert!(export_sql.ends_with(predicate));
        assert!(export_sql.contains("SELECT * FROM events WHERE"));
    }

    #[test]
    fn test_credentials_are_bound_parameters() {
        let spec = spec(r#", "aws_access_key_id": "AKIA", "aws_secret_access_key": "s3cr3t""#);
        let query = ExtractionQuery::build(&interval(), &spec, &local()).unwrap();
        let statement = query.export_statement();

        assert!(query.has_credentials());
        assert!(statement.sql().starts_with(
            "INSERT INTO FUNCTION s3({path:String}, {aws_access_key_id:String}, {aws_secret_access_key:String}, {file_format:String})"
        ));
        assert!(!statement.sql().contains("s3cr3t"));
        assert_eq!(statement.param("aws_secret_access_key"), Some("s3cr3t"));
        assert_eq!(statement.param("aws_access_key_id"), Some("AKIA"));
    }

    #[test]
    fn test_no_auth_fragment_without_credentials() {
        let query = ExtractionQuery::build(&interval(), &spec(""), &local()).unwrap();
        let statement = query.export_statement();

        assert!(statement
            .sql()
            .starts_with("INSERT INTO FUNCTION s3({path:String}, {file_format:String}) SELECT"));
        assert!(statement.param("aws_access_key_id").is_none());
        assert_eq!(
            statement.param("path"),
            Some("http://object-storage:19000/my-bucket/exports/events/{_partition_id}.CSVWithNames")
        );
    }
}
