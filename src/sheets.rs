use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use google_sheets4::api::{AppendValuesResponse, ValueRange};
use google_sheets4::hyper::client::connect::Connection;
use google_sheets4::hyper::service::Service;
use google_sheets4::hyper::Uri;
use google_sheets4::{hyper, hyper_rustls, Sheets};
use serde_json::Value;
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

pub type SheetsHub = Sheets<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueInputOption {
    /// Store values verbatim as strings
    Raw,
    /// Parse values as if typed into the UI (numbers, dates, formulas)
    #[default]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertDataOption {
    /// Write into empty cells after the table
    Overwrite,
    /// Insert new rows for the appended data
    InsertRows,
}

impl InsertDataOption {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            InsertDataOption::Overwrite => "OVERWRITE",
            InsertDataOption::InsertRows => "INSERT_ROWS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRequest {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<String>,
    pub value_input_option: ValueInputOption,
    pub insert_data_option: Option<InsertDataOption>,
}

impl AppendRequest {
    /// The request body: one row, values in order.
    pub fn value_range(&self) -> ValueRange {
        let row = self
            .values
            .iter()
            .map(|v| Value::String(v.clone()))
            .collect();

        ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(self.range.clone()),
            values: Some(vec![row]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendSummary {
    pub spreadsheet_id: Option<String>,
    pub table_range: Option<String>,
    pub updated_range: Option<String>,
    pub updated_rows: i32,
    pub updated_columns: i32,
    pub updated_cells: i32,
}

impl From<AppendValuesResponse> for AppendSummary {
    fn from(response: AppendValuesResponse) -> Self {
        let updates = response.updates.unwrap_or_default();
        Self {
            spreadsheet_id: updates.spreadsheet_id.or(response.spreadsheet_id),
            table_range: response.table_range,
            updated_range: updates.updated_range,
            updated_rows: updates.updated_rows.unwrap_or(0),
            updated_columns: updates.updated_columns.unwrap_or(0),
            updated_cells: updates.updated_cells.unwrap_or(0),
        }
    }
}

impl fmt::Display for AppendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} row(s), {} column(s), {} cell(s) in {}",
            self.updated_rows,
            self.updated_columns,
            self.updated_cells,
            self.updated_range.as_deref().unwrap_or("<unknown range>"),
        )?;
        if let Some(spreadsheet_id) = &self.spreadsheet_id {
            write!(f, " of spreadsheet {}", spreadsheet_id)?;
        }
        if let Some(table_range) = &self.table_range {
            write!(f, " (table {})", table_range)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait RowAppender {
    async fn append_row(&self, request: &AppendRequest) -> Result<AppendSummary>;
}

pub struct SheetsAppender<S> {
    hub: Sheets<S>,
}

impl<S> SheetsAppender<S> {
    pub fn new(hub: Sheets<S>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl<S> RowAppender for SheetsAppender<S>
where
    S: Service<Uri> + Clone + Send + Sync + 'static,
    S::Response: Connection + AsyncRead + AsyncWrite + Send + Unpin + 'static,
    S::Future: Send + Unpin + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    async fn append_row(&self, request: &AppendRequest) -> Result<AppendSummary> {
        info!(
            "Appending {} value(s) to sheet {} range {}",
            request.values.len(),
            request.spreadsheet_id,
            request.range
        );

        let mut call = self
            .hub
            .spreadsheets()
            .values_append(request.value_range(), &request.spreadsheet_id, &request.range)
            .value_input_option(request.value_input_option.as_api_str());
        if let Some(insert) = request.insert_data_option {
            call = call.insert_data_option(insert.as_api_str());
        }

        match call.doit().await {
            Ok((_, response)) => {
                let summary = AppendSummary::from(response);
                debug!("Append response: {:?}", summary);
                Ok(summary)
            }
            Err(e) => {
                anyhow::bail!("Failed to append row: {}", e);
            }
        }
    }
}
