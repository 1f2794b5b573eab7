//! In-memory repository used by unit tests

use async_trait::async_trait;
use std::sync::Mutex;

use crate::database::connection::DatabaseLocator;
use crate::database::traits::{AdminRepository, DatabaseError};
use crate::database::value::{CellValue, Row};
use crate::schema::{
    Column, ConnectionParams, MetadataKind, PageRequest, ProcedureParameter, QueryOutcome, Table,
    TableMetadata,
};

pub fn sample_params() -> ConnectionParams {
    ConnectionParams {
        database: "firebird5:employee".to_string(),
        user: "SYSDBA".to_string(),
        password: "masterkey".to_string(),
    }
}

/// Serves a single table of `ID` rows numbered from 1 and records every call
pub struct MockRepository {
    row_count: u64,
    failure: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockRepository {
    pub fn with_rows(row_count: u64) -> Self {
        Self {
            row_count,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            row_count: 0,
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), DatabaseError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(DatabaseError::Query(message.clone())),
            None => Ok(()),
        }
    }

    fn row(&self, id: u64) -> Row {
        let mut row = Row::new();
        row.insert("DB_KEY", CellValue::Text(format!("{:016x}", id)));
        row.insert("ID", CellValue::Integer(id as i64));
        row
    }
}

#[async_trait]
impl AdminRepository for MockRepository {
    async fn test_connection(&self, params: &ConnectionParams) -> Result<(), DatabaseError> {
        self.record(format!("test_connection {}", params.database))?;
        DatabaseLocator::parse(&params.database)?;
        if params.password == "wrong" {
            return Err(DatabaseError::Connection(
                "Your user name and password are not defined".to_string(),
            ));
        }
        Ok(())
    }

    async fn list_tables(&self, _params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError> {
        self.record("list_tables".to_string())?;
        Ok(vec![Table {
            name: "EMPLOYEE".to_string(),
        }])
    }

    async fn list_views(&self, _params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError> {
        self.record("list_views".to_string())?;
        Ok(vec![Table {
            name: "PHONE_LIST".to_string(),
        }])
    }

    async fn list_procedures(
        &self,
        _params: &ConnectionParams,
    ) -> Result<Vec<Table>, DatabaseError> {
        self.record("list_procedures".to_string())?;
        Ok(vec![Table {
            name: "GET_EMP_PROJ".to_string(),
        }])
    }

    async fn get_data(
        &self,
        _params: &ConnectionParams,
        table: &str,
        page: &PageRequest,
    ) -> Result<(Vec<Row>, Vec<Column>), DatabaseError> {
        self.record(format!("get_data {} {}/{}", table, page.limit, page.offset))?;

        let first = page.offset as u64 + 1;
        let last = (page.offset as u64 + page.limit as u64).min(self.row_count);
        let data = (first..=last).map(|id| self.row(id)).collect();
        let columns = vec![
            Column {
                name: "DB_KEY".to_string(),
                data_type: "DB_KEY".to_string(),
                read_only: true,
            },
            Column {
                name: "ID".to_string(),
                data_type: "INTEGER".to_string(),
                read_only: false,
            },
        ];
        Ok((data, columns))
    }

    async fn get_total_count(
        &self,
        _params: &ConnectionParams,
        table: &str,
    ) -> Result<u64, DatabaseError> {
        self.record(format!("get_total_count {}", table))?;
        Ok(self.row_count)
    }

    async fn update_row(
        &self,
        _params: &ConnectionParams,
        table: &str,
        row_key: &str,
        data: &Row,
    ) -> Result<(), DatabaseError> {
        self.record(format!("update_row {} {} {}", table, row_key, data.len()))
    }

    async fn insert_row(
        &self,
        _params: &ConnectionParams,
        table: &str,
        data: &Row,
    ) -> Result<(), DatabaseError> {
        self.record(format!("insert_row {} {}", table, data.len()))
    }

    async fn delete_row(
        &self,
        _params: &ConnectionParams,
        table: &str,
        row_key: &str,
    ) -> Result<(), DatabaseError> {
        self.record(format!("delete_row {} {}", table, row_key))
    }

    async fn get_procedure_source(
        &self,
        _params: &ConnectionParams,
        procedure: &str,
    ) -> Result<String, DatabaseError> {
        self.record(format!("get_procedure_source {}", procedure))?;
        Ok("BEGIN SUSPEND; END".to_string())
    }

    async fn get_procedure_parameters(
        &self,
        _params: &ConnectionParams,
        procedure: &str,
    ) -> Result<Vec<ProcedureParameter>, DatabaseError> {
        self.record(format!("get_procedure_parameters {}", procedure))?;
        Ok(vec![ProcedureParameter {
            name: "EMP_NO".to_string(),
            data_type: "SMALLINT".to_string(),
        }])
    }

    async fn execute_procedure(
        &self,
        _params: &ConnectionParams,
        procedure: &str,
        arguments: &Row,
    ) -> Result<QueryOutcome, DatabaseError> {
        self.record(format!("execute_procedure {} {}", procedure, arguments.len()))?;
        let mut row = Row::new();
        row.insert("PROJ_ID", CellValue::Text("VBASE".to_string()));
        let columns = row.infer_columns();
        Ok(QueryOutcome::new(vec![row], columns))
    }

    async fn execute_query(
        &self,
        _params: &ConnectionParams,
        sql: &str,
    ) -> Result<QueryOutcome, DatabaseError> {
        self.record(format!("execute_query {}", sql))?;
        let data: Vec<Row> = (1..=self.row_count.min(3)).map(|id| self.row(id)).collect();
        let columns = data.first().map(Row::infer_columns).unwrap_or_default();
        Ok(QueryOutcome::new(data, columns))
    }

    async fn get_all_metadata(
        &self,
        _params: &ConnectionParams,
    ) -> Result<Vec<TableMetadata>, DatabaseError> {
        self.record("get_all_metadata".to_string())?;
        Ok(vec![TableMetadata {
            name: "EMPLOYEE".to_string(),
            kind: MetadataKind::Table,
            columns: vec!["EMP_NO".to_string(), "FIRST_NAME".to_string()],
        }])
    }
}
