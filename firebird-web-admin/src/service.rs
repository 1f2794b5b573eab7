//! Orchestration between the HTTP handlers and the repository

use std::sync::Arc;

use crate::database::traits::{AdminRepository, DatabaseError};
use crate::database::value::Row;
use crate::schema::{
    ConnectionParams, DataPage, DataQuery, ProcedureParameter, QueryOutcome, Table, TableMetadata,
};

/// Thin service over an [`AdminRepository`]
///
/// Most calls pass straight through; `get_data` combines a page of rows with
/// the table's total row count.
pub struct AdminService<R: AdminRepository> {
    repository: Arc<R>,
}

impl<R: AdminRepository> AdminService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn connect(&self, params: &ConnectionParams) -> Result<(), DatabaseError> {
        self.repository.test_connection(params).await
    }

    pub async fn list_tables(&self, params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError> {
        self.repository.list_tables(params).await
    }

    pub async fn list_views(&self, params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError> {
        self.repository.list_views(params).await
    }

    pub async fn list_procedures(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<Table>, DatabaseError> {
        self.repository.list_procedures(params).await
    }

    /// Fetch a page and the unfiltered total in two independent calls
    pub async fn get_data(
        &self,
        params: &ConnectionParams,
        table: &str,
        query: &DataQuery,
    ) -> Result<DataPage, DatabaseError> {
        let page = query.to_page_request();
        let (data, columns) = self.repository.get_data(params, table, &page).await?;
        let total = self.repository.get_total_count(params, table).await?;

        Ok(DataPage {
            data,
            columns,
            total,
            limit: page.limit,
            offset: page.offset,
            sort_field: query.sort_field.clone().unwrap_or_default(),
            sort_order: query.sort_order.clone().unwrap_or_default(),
        })
    }

    pub async fn update_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        row_key: &str,
        data: &Row,
    ) -> Result<(), DatabaseError> {
        self.repository.update_row(params, table, row_key, data).await
    }

    pub async fn insert_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        data: &Row,
    ) -> Result<(), DatabaseError> {
        self.repository.insert_row(params, table, data).await
    }

    pub async fn delete_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        row_key: &str,
    ) -> Result<(), DatabaseError> {
        self.repository.delete_row(params, table, row_key).await
    }

    pub async fn get_procedure_source(
        &self,
        params: &ConnectionParams,
        procedure: &str,
    ) -> Result<String, DatabaseError> {
        self.repository.get_procedure_source(params, procedure).await
    }

    pub async fn get_procedure_parameters(
        &self,
        params: &ConnectionParams,
        procedure: &str,
    ) -> Result<Vec<ProcedureParameter>, DatabaseError> {
        self.repository
            .get_procedure_parameters(params, procedure)
            .await
    }

    pub async fn execute_procedure(
        &self,
        params: &ConnectionParams,
        procedure: &str,
        arguments: &Row,
    ) -> Result<QueryOutcome, DatabaseError> {
        self.repository
            .execute_procedure(params, procedure, arguments)
            .await
    }

    pub async fn execute_query(
        &self,
        params: &ConnectionParams,
        sql: &str,
    ) -> Result<QueryOutcome, DatabaseError> {
        self.repository.execute_query(params, sql).await
    }

    pub async fn get_all_metadata(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<TableMetadata>, DatabaseError> {
        self.repository.get_all_metadata(params).await
    }
}
