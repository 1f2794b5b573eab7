//! SQL text construction
//!
//! Everything here is pure: statements are built as text plus positional
//! parameters and handed to the driver by the repository.

use crate::database::traits::DatabaseError;
use crate::database::value::{CellValue, Row};
use crate::schema::{Column, MetadataKind, PageRequest, TableMetadata};

/// Name the driver reports for `t.RDB$DB_KEY` in a result set
pub const ROW_KEY_COLUMN: &str = "DB_KEY";

pub const LIST_TABLES: &str = r#"
    SELECT RDB$RELATION_NAME
    FROM RDB$RELATIONS
    WHERE RDB$VIEW_BLR IS NULL
      AND (RDB$SYSTEM_FLAG IS NULL OR RDB$SYSTEM_FLAG = 0)
    ORDER BY RDB$RELATION_NAME
"#;

pub const LIST_VIEWS: &str = r#"
    SELECT RDB$RELATION_NAME
    FROM RDB$RELATIONS
    WHERE RDB$VIEW_BLR IS NOT NULL
      AND (RDB$SYSTEM_FLAG IS NULL OR RDB$SYSTEM_FLAG = 0)
    ORDER BY RDB$RELATION_NAME
"#;

pub const LIST_PROCEDURES: &str = r#"
    SELECT RDB$PROCEDURE_NAME
    FROM RDB$PROCEDURES
    WHERE (RDB$SYSTEM_FLAG IS NULL OR RDB$SYSTEM_FLAG = 0)
    ORDER BY RDB$PROCEDURE_NAME
"#;

pub const PROCEDURE_SOURCE: &str = r#"
    SELECT RDB$PROCEDURE_SOURCE
    FROM RDB$PROCEDURES
    WHERE RDB$PROCEDURE_NAME = ?
"#;

/// Columns of one relation in position order, with the raw type descriptors
pub const RELATION_COLUMNS: &str = r#"
    SELECT TRIM(rf.RDB$FIELD_NAME),
           f.RDB$FIELD_TYPE,
           f.RDB$FIELD_SUB_TYPE,
           f.RDB$FIELD_LENGTH,
           f.RDB$CHARACTER_LENGTH,
           f.RDB$FIELD_SCALE,
           CASE WHEN f.RDB$COMPUTED_BLR IS NULL THEN 0 ELSE 1 END
    FROM RDB$RELATION_FIELDS rf
    JOIN RDB$FIELDS f ON f.RDB$FIELD_NAME = rf.RDB$FIELD_SOURCE
    WHERE rf.RDB$RELATION_NAME = ?
    ORDER BY rf.RDB$FIELD_POSITION
"#;

/// Parameters of one procedure; the second placeholder selects input (0) or output (1)
pub const PROCEDURE_PARAMETERS: &str = r#"
    SELECT TRIM(pp.RDB$PARAMETER_NAME),
           f.RDB$FIELD_TYPE,
           f.RDB$FIELD_SUB_TYPE,
           f.RDB$FIELD_LENGTH,
           f.RDB$CHARACTER_LENGTH,
           f.RDB$FIELD_SCALE
    FROM RDB$PROCEDURE_PARAMETERS pp
    JOIN RDB$FIELDS f ON f.RDB$FIELD_NAME = pp.RDB$FIELD_SOURCE
    WHERE pp.RDB$PROCEDURE_NAME = ?
      AND pp.RDB$PARAMETER_TYPE = ?
    ORDER BY pp.RDB$PARAMETER_NUMBER
"#;

pub const INPUT_PARAMETER: i64 = 0;
pub const OUTPUT_PARAMETER: i64 = 1;

/// Every user relation with its column names, views flagged with 1
pub const RELATION_METADATA: &str = r#"
    SELECT TRIM(r.RDB$RELATION_NAME),
           CASE WHEN r.RDB$VIEW_BLR IS NULL THEN 0 ELSE 1 END,
           TRIM(rf.RDB$FIELD_NAME)
    FROM RDB$RELATIONS r
    LEFT JOIN RDB$RELATION_FIELDS rf ON rf.RDB$RELATION_NAME = r.RDB$RELATION_NAME
    WHERE (r.RDB$SYSTEM_FLAG IS NULL OR r.RDB$SYSTEM_FLAG = 0)
    ORDER BY r.RDB$RELATION_NAME, rf.RDB$FIELD_POSITION
"#;

/// Every user procedure with its input parameter names
pub const PROCEDURE_METADATA: &str = r#"
    SELECT TRIM(p.RDB$PROCEDURE_NAME),
           TRIM(pp.RDB$PARAMETER_NAME)
    FROM RDB$PROCEDURES p
    LEFT JOIN RDB$PROCEDURE_PARAMETERS pp
      ON pp.RDB$PROCEDURE_NAME = p.RDB$PROCEDURE_NAME
     AND pp.RDB$PARAMETER_TYPE = 0
    WHERE (p.RDB$SYSTEM_FLAG IS NULL OR p.RDB$SYSTEM_FLAG = 0)
    ORDER BY p.RDB$PROCEDURE_NAME, pp.RDB$PARAMETER_NUMBER
"#;

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<CellValue>,
}

/// Quote an identifier, doubling any embedded double quotes
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quote a sort field, stripping embedded double quotes
///
/// The field is not checked against the table's columns.
pub fn quote_sort_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', ""))
}

/// Whether a column name refers to the synthetic row-key
pub fn is_row_key_column(name: &str) -> bool {
    name.eq_ignore_ascii_case(ROW_KEY_COLUMN) || name.eq_ignore_ascii_case("RDB$DB_KEY")
}

/// Hex-encode raw row-key bytes for the client
pub fn encode_row_key(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a client-supplied row-key back into raw bytes
pub fn decode_row_key(encoded: &str) -> Result<Vec<u8>, DatabaseError> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(DatabaseError::InvalidRowKey(encoded.to_string()));
    }
    hex::decode(trimmed).map_err(|_| DatabaseError::InvalidRowKey(encoded.to_string()))
}

/// Inline literal for a row-key, e.g. `x'0000008000000001'`
///
/// The driver sends binary parameters as BLOBs, which `RDB$DB_KEY` does not
/// compare against; a validated hex literal is typed `CHAR OCTETS` instead.
pub fn row_key_literal(row_key: &str) -> Result<String, DatabaseError> {
    let bytes = decode_row_key(row_key)?;
    Ok(format!("x'{}'", encode_row_key(&bytes)))
}

/// Column list for a data page: the read-only row-key, then the catalog columns
pub fn data_columns(catalog_columns: Vec<Column>) -> Vec<Column> {
    let mut columns = Vec::with_capacity(catalog_columns.len() + 1);
    columns.push(Column {
        name: ROW_KEY_COLUMN.to_string(),
        data_type: ROW_KEY_COLUMN.to_string(),
        read_only: true,
    });
    columns.extend(
        catalog_columns
            .into_iter()
            .filter(|column| !is_row_key_column(&column.name)),
    );
    columns
}

/// Paged select including the row-key
pub fn build_page_query(table: &str, page: &PageRequest) -> String {
    let mut sql = format!(
        "SELECT FIRST {} SKIP {} t.RDB$DB_KEY, t.* FROM {} t",
        page.limit,
        page.offset,
        quote_identifier(table)
    );

    if let Some(field) = &page.sort_field {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            quote_sort_field(field),
            page.sort_order.as_sql()
        ));
    }

    sql
}

pub fn build_count_query(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_identifier(table))
}

/// Build an update addressed by row-key
///
/// Returns `None` when the data holds nothing but the key column.
pub fn build_update(
    table: &str,
    row_key: &str,
    data: &Row,
) -> Result<Option<Statement>, DatabaseError> {
    let key = row_key_literal(row_key)?;

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (name, value) in data.iter() {
        if is_row_key_column(name) {
            continue;
        }
        assignments.push(format!("{} = ?", quote_identifier(name)));
        params.push(value.clone());
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    Ok(Some(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE RDB$DB_KEY = {}",
            quote_identifier(table),
            assignments.join(", "),
            key
        ),
        params,
    }))
}

pub fn build_insert(table: &str, data: &Row) -> Statement {
    let mut columns = Vec::new();
    let mut params = Vec::new();
    for (name, value) in data.iter() {
        if is_row_key_column(name) {
            continue;
        }
        columns.push(quote_identifier(name));
        params.push(value.clone());
    }

    if columns.is_empty() {
        return Statement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table)),
            params,
        };
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns.join(", "),
            placeholders
        ),
        params,
    }
}

pub fn build_delete(table: &str, row_key: &str) -> Result<Statement, DatabaseError> {
    let key = row_key_literal(row_key)?;
    Ok(Statement {
        sql: format!(
            "DELETE FROM {} WHERE RDB$DB_KEY = {}",
            quote_identifier(table),
            key
        ),
        params: Vec::new(),
    })
}

/// How a stored procedure must be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    /// Produces a result set; called with `SELECT * FROM proc(...)`
    Selectable,
    /// Side effects only; called with `EXECUTE PROCEDURE proc(...)`
    Executable,
}

impl ProcedureKind {
    /// Classify a procedure from its PSQL source
    ///
    /// A procedure is selectable when its source contains the `SUSPEND`
    /// keyword as a whole word, in any case. Comments, string literals and
    /// quoted identifiers are skipped. The scan does not parse PSQL, so a
    /// `SUSPEND` in unreachable code still counts.
    pub fn classify(source: &str) -> Self {
        if sql_words(source).iter().any(|word| word == "SUSPEND") {
            ProcedureKind::Selectable
        } else {
            ProcedureKind::Executable
        }
    }
}

/// Build the call statement for a procedure
///
/// Caller arguments are bound in declaration order; parameters the caller
/// did not supply are bound as NULL.
pub fn build_procedure_call(
    procedure: &str,
    kind: ProcedureKind,
    parameter_names: &[String],
    arguments: &Row,
) -> Statement {
    let params: Vec<CellValue> = parameter_names
        .iter()
        .map(|name| {
            arguments
                .get_ignore_case(name)
                .cloned()
                .unwrap_or(CellValue::Null)
        })
        .collect();

    let mut target = quote_identifier(procedure);
    if !params.is_empty() {
        target.push_str(&format!("({})", vec!["?"; params.len()].join(", ")));
    }

    let sql = match kind {
        ProcedureKind::Selectable => format!("SELECT * FROM {}", target),
        ProcedureKind::Executable => format!("EXECUTE PROCEDURE {}", target),
    };

    Statement { sql, params }
}

/// Catalog names to try for a procedure, most specific first
///
/// The name is tried exactly as given (quoted mixed-case procedures), then
/// upper-cased (unquoted names are stored upper-case).
pub fn procedure_name_candidates(name: &str) -> Vec<String> {
    let exact = name.trim().to_string();
    let upper = exact.to_uppercase();
    if upper == exact {
        vec![exact]
    } else {
        vec![exact, upper]
    }
}

/// Driver call needed to run a statement and collect what it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Opens a cursor; rows are fetched with `query`
    Cursor,
    /// No cursor but at most one output row, fetched with `execute_returnable`
    Returnable,
    /// Side effects only
    Execute,
}

impl Invocation {
    /// Choose the call for an ad-hoc statement
    ///
    /// `SELECT`, `WITH` and `EXECUTE BLOCK ... RETURNS` open a cursor.
    /// `EXECUTE PROCEDURE` and DML with `RETURNING` hand back a single row.
    /// Leading comments and parentheses are skipped.
    pub fn for_statement(sql: &str) -> Self {
        let words = sql_words(sql);
        let first = words.first().map(String::as_str).unwrap_or("");
        let second = words.get(1).map(String::as_str).unwrap_or("");

        match (first, second) {
            ("SELECT", _) | ("WITH", _) => Invocation::Cursor,
            ("EXECUTE", "BLOCK") if words.iter().any(|word| word == "RETURNS") => {
                Invocation::Cursor
            }
            ("EXECUTE", "PROCEDURE") => Invocation::Returnable,
            ("INSERT", _) | ("UPDATE", _) | ("DELETE", _) | ("MERGE", _)
                if words.iter().any(|word| word == "RETURNING") =>
            {
                Invocation::Returnable
            }
            _ => Invocation::Execute,
        }
    }

    /// Choose the call for a stored procedure
    pub fn for_procedure(kind: ProcedureKind, has_outputs: bool) -> Self {
        match kind {
            ProcedureKind::Selectable => Invocation::Cursor,
            ProcedureKind::Executable if has_outputs => Invocation::Returnable,
            ProcedureKind::Executable => Invocation::Execute,
        }
    }
}

/// Upper-cased words of SQL or PSQL text
///
/// Comments (`--`, `/* */`), string literals and quoted identifiers produce
/// no words.
fn sql_words(sql: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut characters = sql.chars().peekable();

    while let Some(character) = characters.next() {
        if character.is_ascii_alphanumeric() || character == '_' || character == '$' {
            current.push(character.to_ascii_uppercase());
            continue;
        }
        if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        match character {
            '-' if characters.peek() == Some(&'-') => {
                for skipped in characters.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            '/' if characters.peek() == Some(&'*') => {
                characters.next();
                let mut previous = '\0';
                for skipped in characters.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
            }
            // Doubled delimiters inside a literal end and reopen it, which skips the same text
            '\'' | '"' => {
                for skipped in characters.by_ref() {
                    if skipped == character {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Render a readable SQL type from `RDB$FIELDS` descriptors
pub fn field_type_name(
    field_type: i64,
    sub_type: Option<i64>,
    length: Option<i64>,
    character_length: Option<i64>,
    scale: Option<i64>,
) -> String {
    let scale = scale.unwrap_or(0);
    let sub_type = sub_type.unwrap_or(0);

    // Exact numerics share integer storage and are told apart by sub type and scale
    if matches!(field_type, 7 | 8 | 16 | 26) && (sub_type == 1 || sub_type == 2 || scale < 0) {
        let keyword = if sub_type == 2 { "DECIMAL" } else { "NUMERIC" };
        let precision = match field_type {
            7 => 4,
            8 => 9,
            16 => 18,
            _ => 38,
        };
        return format!("{}({},{})", keyword, precision, -scale);
    }

    let text_length = character_length.or(length).unwrap_or(0);
    match field_type {
        7 => "SMALLINT".to_string(),
        8 => "INTEGER".to_string(),
        10 => "FLOAT".to_string(),
        12 => "DATE".to_string(),
        13 => "TIME".to_string(),
        14 => format!("CHAR({})", text_length),
        16 => "BIGINT".to_string(),
        23 => "BOOLEAN".to_string(),
        24 => "DECFLOAT(16)".to_string(),
        25 => "DECFLOAT(34)".to_string(),
        26 => "INT128".to_string(),
        27 => "DOUBLE PRECISION".to_string(),
        28 => "TIME WITH TIME ZONE".to_string(),
        29 => "TIMESTAMP WITH TIME ZONE".to_string(),
        35 => "TIMESTAMP".to_string(),
        37 => format!("VARCHAR({})", text_length),
        261 if sub_type == 1 => "BLOB SUB_TYPE TEXT".to_string(),
        261 => "BLOB".to_string(),
        other => format!("UNKNOWN({})", other),
    }
}

/// Fold `(object, column)` rows ordered by object into metadata entries
///
/// A `None` column keeps the object with an empty column list.
pub fn group_metadata<I>(rows: I) -> Vec<TableMetadata>
where
    I: IntoIterator<Item = (String, MetadataKind, Option<String>)>,
{
    let mut grouped: Vec<TableMetadata> = Vec::new();
    for (name, kind, column) in rows {
        let start_new = match grouped.last() {
            Some(current) => current.name != name || current.kind != kind,
            None => true,
        };
        if start_new {
            grouped.push(TableMetadata {
                name: name.clone(),
                kind,
                columns: Vec::new(),
            });
        }
        if let (Some(current), Some(column)) = (grouped.last_mut(), column) {
            current.columns.push(column);
        }
    }
    grouped
}
