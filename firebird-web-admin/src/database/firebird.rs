//! Firebird repository implementation
//!
//! The `rsfbclient` driver is blocking, so every operation runs on tokio's
//! blocking pool. Each call opens its own connection and drops it before
//! returning, on success and on error alike.

use async_trait::async_trait;
use rsfbclient::prelude::*;
use rsfbclient::SqlType;
use tracing::debug;

use crate::database::connection::{connect, FirebirdConnection};
use crate::database::query::{
    build_count_query, build_delete, build_insert, build_page_query, build_procedure_call,
    build_update, data_columns, field_type_name, group_metadata, procedure_name_candidates,
    Invocation, ProcedureKind, Statement, INPUT_PARAMETER, LIST_PROCEDURES, LIST_TABLES,
    LIST_VIEWS, OUTPUT_PARAMETER, PROCEDURE_METADATA, PROCEDURE_PARAMETERS, PROCEDURE_SOURCE,
    RELATION_COLUMNS, RELATION_METADATA,
};
use crate::database::traits::{AdminRepository, DatabaseError};
use crate::database::value::Row;
use crate::schema::{
    Column, ConnectionParams, MetadataKind, PageRequest, ProcedureParameter, QueryOutcome, Table,
    TableMetadata,
};

/// Name, type, sub type, length, character length, scale, computed flag
type RelationFieldRow = (
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    i64,
);

/// Name, type, sub type, length, character length, scale
type ParameterFieldRow = (
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
);

/// Repository backed by a live Firebird server
#[derive(Debug, Clone, Default)]
pub struct FirebirdRepository;

impl FirebirdRepository {
    pub fn new() -> Self {
        Self
    }

    /// Run `operation` on a fresh connection inside the blocking pool
    async fn run<T, F>(params: &ConnectionParams, operation: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut FirebirdConnection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let params = params.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = connect(&params)?;
            operation(&mut connection)
        })
        .await?
    }

    fn list_names(
        connection: &mut FirebirdConnection,
        sql: &str,
    ) -> Result<Vec<Table>, DatabaseError> {
        let rows: Vec<(String,)> = connection.query(sql, ())?;
        Ok(rows
            .into_iter()
            .map(|(name,)| Table {
                name: name.trim_end().to_string(),
            })
            .collect())
    }

    fn relation_columns(
        connection: &mut FirebirdConnection,
        table: &str,
    ) -> Result<Vec<Column>, DatabaseError> {
        let rows: Vec<RelationFieldRow> =
            connection.query(RELATION_COLUMNS, (table.to_string(),))?;

        Ok(rows
            .into_iter()
            .map(
                |(name, field_type, sub_type, length, character_length, scale, computed)| Column {
                    name: name.trim_end().to_string(),
                    data_type: field_type_name(
                        field_type,
                        sub_type,
                        length,
                        character_length,
                        scale,
                    ),
                    read_only: computed != 0,
                },
            )
            .collect())
    }

    fn procedure_parameters(
        connection: &mut FirebirdConnection,
        procedure: &str,
        direction: i64,
    ) -> Result<Vec<ProcedureParameter>, DatabaseError> {
        let rows: Vec<ParameterFieldRow> =
            connection.query(PROCEDURE_PARAMETERS, (procedure.to_string(), direction))?;

        Ok(rows
            .into_iter()
            .map(
                |(name, field_type, sub_type, length, character_length, scale)| {
                    ProcedureParameter {
                        name: name.trim_end().to_string(),
                        data_type: field_type_name(
                            field_type,
                            sub_type,
                            length,
                            character_length,
                            scale,
                        ),
                    }
                },
            )
            .collect())
    }

    /// Find a procedure by its exact name, then upper-cased
    ///
    /// Returns the catalog name that matched together with the source.
    fn resolve_procedure(
        connection: &mut FirebirdConnection,
        procedure: &str,
    ) -> Result<(String, String), DatabaseError> {
        for candidate in procedure_name_candidates(procedure) {
            let row: Option<(Option<String>,)> =
                connection.query_first(PROCEDURE_SOURCE, (candidate.clone(),))?;
            if let Some((source,)) = row {
                return Ok((candidate, source.unwrap_or_default()));
            }
        }
        Err(DatabaseError::NotFound(procedure.trim().to_string()))
    }

    fn execute_statement(
        connection: &mut FirebirdConnection,
        statement: Statement,
    ) -> Result<(), DatabaseError> {
        debug!(sql = %statement.sql, parameters = statement.params.len(), "executing statement");
        connection.execute(&statement.sql, driver_params(statement.params))?;
        Ok(())
    }

    fn query_rows(
        connection: &mut FirebirdConnection,
        statement: Statement,
    ) -> Result<Vec<Row>, DatabaseError> {
        debug!(sql = %statement.sql, parameters = statement.params.len(), "running query");
        let rows: Vec<rsfbclient::Row> =
            connection.query(&statement.sql, driver_params(statement.params))?;
        Ok(rows.into_iter().map(Row::from_sql_row).collect())
    }

    /// Run a statement without a cursor that hands back at most one row
    fn returned_row(
        connection: &mut FirebirdConnection,
        statement: Statement,
    ) -> Result<Vec<Row>, DatabaseError> {
        debug!(sql = %statement.sql, parameters = statement.params.len(), "executing returnable statement");
        let row: rsfbclient::Row =
            connection.execute_returnable(&statement.sql, driver_params(statement.params))?;
        let row = Row::from_sql_row(row);
        Ok(if row.is_empty() { Vec::new() } else { vec![row] })
    }

    /// Run a statement the way `invocation` requires and collect its rows
    fn invoke(
        connection: &mut FirebirdConnection,
        invocation: Invocation,
        statement: Statement,
    ) -> Result<Vec<Row>, DatabaseError> {
        match invocation {
            Invocation::Cursor => Self::query_rows(connection, statement),
            Invocation::Returnable => Self::returned_row(connection, statement),
            Invocation::Execute => {
                Self::execute_statement(connection, statement)?;
                Ok(Vec::new())
            }
        }
    }
}

fn driver_params(params: Vec<crate::database::value::CellValue>) -> Vec<SqlType> {
    params.into_iter().map(|value| value.into_sql()).collect()
}

#[async_trait]
impl AdminRepository for FirebirdRepository {
    async fn test_connection(&self, params: &ConnectionParams) -> Result<(), DatabaseError> {
        Self::run(params, |_connection| Ok(())).await
    }

    async fn list_tables(&self, params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError> {
        Self::run(params, |connection| Self::list_names(connection, LIST_TABLES)).await
    }

    async fn list_views(&self, params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError> {
        Self::run(params, |connection| Self::list_names(connection, LIST_VIEWS)).await
    }

    async fn list_procedures(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<Table>, DatabaseError> {
        Self::run(params, |connection| Self::list_names(connection, LIST_PROCEDURES)).await
    }

    async fn get_data(
        &self,
        params: &ConnectionParams,
        table: &str,
        page: &PageRequest,
    ) -> Result<(Vec<Row>, Vec<Column>), DatabaseError> {
        let table = table.to_string();
        let sql = build_page_query(&table, page);

        Self::run(params, move |connection| {
            let data = Self::query_rows(
                connection,
                Statement {
                    sql,
                    params: Vec::new(),
                },
            )?;

            let columns = data_columns(Self::relation_columns(connection, &table)?);
            Ok((data, columns))
        })
        .await
    }

    async fn get_total_count(
        &self,
        params: &ConnectionParams,
        table: &str,
    ) -> Result<u64, DatabaseError> {
        let sql = build_count_query(table);

        Self::run(params, move |connection| {
            debug!(%sql, "counting rows");
            let row: Option<(i64,)> = connection.query_first(&sql, ())?;
            let count = row.map(|(count,)| count).unwrap_or(0);
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn update_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        row_key: &str,
        data: &Row,
    ) -> Result<(), DatabaseError> {
        let Some(statement) = build_update(table, row_key, data)? else {
            debug!(table, "update carries no writable columns, skipping");
            return Ok(());
        };

        Self::run(params, move |connection| {
            Self::execute_statement(connection, statement)
        })
        .await
    }

    async fn insert_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        data: &Row,
    ) -> Result<(), DatabaseError> {
        let statement = build_insert(table, data);

        Self::run(params, move |connection| {
            Self::execute_statement(connection, statement)
        })
        .await
    }

    async fn delete_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        row_key: &str,
    ) -> Result<(), DatabaseError> {
        let statement = build_delete(table, row_key)?;

        Self::run(params, move |connection| {
            Self::execute_statement(connection, statement)
        })
        .await
    }

    async fn get_procedure_source(
        &self,
        params: &ConnectionParams,
        procedure: &str,
    ) -> Result<String, DatabaseError> {
        let procedure = procedure.to_string();
        Self::run(params, move |connection| {
            let (_, source) = Self::resolve_procedure(connection, &procedure)?;
            Ok(source)
        })
        .await
    }

    async fn get_procedure_parameters(
        &self,
        params: &ConnectionParams,
        procedure: &str,
    ) -> Result<Vec<ProcedureParameter>, DatabaseError> {
        let procedure = procedure.to_string();
        Self::run(params, move |connection| {
            let (name, _) = Self::resolve_procedure(connection, &procedure)?;
            Self::procedure_parameters(connection, &name, INPUT_PARAMETER)
        })
        .await
    }

    async fn execute_procedure(
        &self,
        params: &ConnectionParams,
        procedure: &str,
        arguments: &Row,
    ) -> Result<QueryOutcome, DatabaseError> {
        let procedure = procedure.to_string();
        let arguments = arguments.clone();

        Self::run(params, move |connection| {
            let (name, source) = Self::resolve_procedure(connection, &procedure)?;
            let kind = ProcedureKind::classify(&source);

            let inputs = Self::procedure_parameters(connection, &name, INPUT_PARAMETER)?;
            let outputs = Self::procedure_parameters(connection, &name, OUTPUT_PARAMETER)?;
            let input_names: Vec<String> = inputs.into_iter().map(|input| input.name).collect();

            let invocation = Invocation::for_procedure(kind, !outputs.is_empty());
            debug!(procedure = %name, ?kind, ?invocation, inputs = input_names.len(), "calling procedure");
            let statement = build_procedure_call(&name, kind, &input_names, &arguments);
            let data = Self::invoke(connection, invocation, statement)?;

            let columns = if outputs.is_empty() {
                data.first().map(Row::infer_columns).unwrap_or_default()
            } else {
                outputs
                    .into_iter()
                    .map(|output| Column {
                        name: output.name,
                        data_type: output.data_type,
                        read_only: true,
                    })
                    .collect()
            };

            Ok(QueryOutcome::new(data, columns))
        })
        .await
    }

    async fn execute_query(
        &self,
        params: &ConnectionParams,
        sql: &str,
    ) -> Result<QueryOutcome, DatabaseError> {
        let statement = Statement {
            sql: sql.to_string(),
            params: Vec::new(),
        };

        let invocation = Invocation::for_statement(sql);

        Self::run(params, move |connection| {
            let data = Self::invoke(connection, invocation, statement)?;
            // Inferred from the first row: an empty result has no columns
            let columns = data.first().map(Row::infer_columns).unwrap_or_default();
            Ok(QueryOutcome::new(data, columns))
        })
        .await
    }

    async fn get_all_metadata(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<TableMetadata>, DatabaseError> {
        Self::run(params, |connection| {
            let relations: Vec<(String, i64, Option<String>)> =
                connection.query(RELATION_METADATA, ())?;
            let procedures: Vec<(String, Option<String>)> =
                connection.query(PROCEDURE_METADATA, ())?;

            let mut metadata = group_metadata(relations.into_iter().map(
                |(name, is_view, column)| {
                    let kind = if is_view == 0 {
                        MetadataKind::Table
                    } else {
                        MetadataKind::View
                    };
                    (name, kind, column)
                },
            ));
            metadata.extend(group_metadata(
                procedures
                    .into_iter()
                    .map(|(name, parameter)| (name, MetadataKind::Procedure, parameter)),
            ));

            Ok(metadata)
        })
        .await
    }
}
