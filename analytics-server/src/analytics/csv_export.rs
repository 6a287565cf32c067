//! CSV export
//!
//! Spreadsheet-friendly serialization of an [`AnalyticsResponse`]:
//! UTF-8 BOM, `;` delimiter, every field quoted, `\n` terminators.
//!
//! [`CsvExport`] is an iterator of byte chunks (BOM, header, then one chunk
//! per data row) so the HTTP layer can stream it with backpressure. A
//! failure after the first chunk cannot become an HTTP error anymore, so the
//! remaining output is replaced by [`FALLBACK_LINE`].

use std::collections::BTreeSet;

use shared::analytics::{AnalyticsResponse, CancelledSeriesPoint, ProductAggregate, SeriesPoint};
use shared::error::ErrorCode;
use thiserror::Error;

use crate::utils::AppError;

pub const BOM: &str = "\u{FEFF}";

/// Single data row emitted when there is nothing to export
pub const NO_DATA_MESSAGE: &str = "No data available for the selected range";

/// Replaces the rest of the stream after a serialization failure
pub const FALLBACK_LINE: &str = "\"Export failed while generating rows, the file is incomplete\"\n";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Non-finite value in column {0}")]
    NonFinite(&'static str),
}

/// Exportable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Period,
    OrderCount,
    Revenue,
    CancelledCount,
    LostRevenue,
    ProductKey,
    ProductName,
    QuantitySold,
    ProductRevenue,
    AvgPrepTime,
}

impl Column {
    pub const ALL: &'static [Column] = &[
        Column::Period,
        Column::OrderCount,
        Column::Revenue,
        Column::CancelledCount,
        Column::LostRevenue,
        Column::ProductKey,
        Column::ProductName,
        Column::QuantitySold,
        Column::ProductRevenue,
        Column::AvgPrepTime,
    ];

    /// Column set used when the caller does not pick one
    pub const DEFAULT: &'static [Column] = Self::ALL;

    pub fn name(&self) -> &'static str {
        match self {
            Column::Period => "period",
            Column::OrderCount => "orderCount",
            Column::Revenue => "revenue",
            Column::CancelledCount => "cancelledCount",
            Column::LostRevenue => "lostRevenue",
            Column::ProductKey => "productKey",
            Column::ProductName => "productName",
            Column::QuantitySold => "quantitySold",
            Column::ProductRevenue => "productRevenue",
            Column::AvgPrepTime => "avgPrepTime",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn is_product(&self) -> bool {
        matches!(
            self,
            Column::ProductKey | Column::ProductName | Column::QuantitySold | Column::ProductRevenue
        )
    }
}

/// Resolve caller-supplied column names, in order
///
/// Blank names are skipped; an empty selection means [`Column::DEFAULT`].
pub fn resolve_columns<I, S>(names: I) -> Result<Vec<Column>, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut columns = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        let column = Column::from_name(name).ok_or_else(|| {
            AppError::with_message(ErrorCode::UnknownColumn, format!("Unknown column: {}", name))
                .with_detail("column", name)
                .with_detail(
                    "allowed",
                    Column::ALL.iter().map(|c| c.name()).collect::<Vec<_>>(),
                )
        })?;
        columns.push(column);
    }
    if columns.is_empty() {
        columns = Column::DEFAULT.to_vec();
    }
    Ok(columns)
}

/// Values feeding one data row
struct RowContext<'a> {
    period: &'a str,
    series: Option<&'a SeriesPoint>,
    cancelled: Option<&'a CancelledSeriesPoint>,
    product: Option<&'a ProductAggregate>,
    avg_prep_time: Option<f64>,
}

fn money_field(column: Column, value: f64) -> Result<String, ExportError> {
    if !value.is_finite() {
        return Err(ExportError::NonFinite(column.name()));
    }
    Ok(format!("{:.2}", value))
}

impl RowContext<'_> {
    fn field(&self, column: Column) -> Result<String, ExportError> {
        let value = match column {
            Column::Period => self.period.to_string(),
            Column::OrderCount => self.series.map(|p| p.order_count).unwrap_or(0).to_string(),
            Column::Revenue => money_field(column, self.series.map(|p| p.revenue).unwrap_or(0.0))?,
            Column::CancelledCount => self
                .cancelled
                .map(|p| p.cancelled_count)
                .unwrap_or(0)
                .to_string(),
            Column::LostRevenue => money_field(
                column,
                self.cancelled.map(|p| p.lost_revenue).unwrap_or(0.0),
            )?,
            Column::ProductKey => self
                .product
                .map(|p| p.product_key.clone())
                .unwrap_or_default(),
            Column::ProductName => self.product.map(|p| p.name.clone()).unwrap_or_default(),
            Column::QuantitySold => self
                .product
                .map(|p| p.quantity_sold.to_string())
                .unwrap_or_default(),
            Column::ProductRevenue => match self.product {
                Some(p) => money_field(column, p.revenue)?,
                None => String::new(),
            },
            // null 输出为空字段
            Column::AvgPrepTime => match self.avg_prep_time {
                Some(v) => money_field(column, v)?,
                None => String::new(),
            },
        };
        Ok(value)
    }
}

/// Serialize one record into its own chunk
///
/// `csv::Writer` only hands its buffer back through `into_inner`, so every
/// chunk gets a fresh writer with the export dialect.
fn encode_record<I, S>(fields: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|err| {
        let kind = err.error().kind();
        ExportError::Io(std::io::Error::new(kind, err.to_string()))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Bom,
    Header,
    Rows,
    Done,
}

/// Streaming CSV producer
///
/// Yields the BOM, the header, then data rows. With product columns selected
/// the rows are the cross product `periods × products`; otherwise one row
/// per period.
///
/// Periods are the union of revenue and cancelled periods, so a period with
/// only cancellations still gets its rows (revenue fields empty). The row
/// count is therefore `|series ∪ cancelled_series| × max(products, 1)`, which
/// exceeds `series × products` whenever cancellations fall outside the
/// revenue periods.
pub struct CsvExport {
    state: State,
    columns: Vec<Column>,
    response: Option<AnalyticsResponse>,
    /// Sorted union of revenue and cancelled periods
    periods: Vec<String>,
    /// Rows emitted per period
    fan_out: usize,
    next_row: usize,
}

impl CsvExport {
    /// `None` means no data: header plus one placeholder row
    pub fn new(response: Option<AnalyticsResponse>, columns: Vec<Column>) -> Self {
        let columns = if columns.is_empty() {
            Column::DEFAULT.to_vec()
        } else {
            columns
        };
        let periods: Vec<String> = response
            .as_ref()
            .map(|r| {
                let keys: BTreeSet<&str> = r
                    .series
                    .iter()
                    .map(|p| p.period.as_str())
                    .chain(r.cancelled_series.iter().map(|p| p.period.as_str()))
                    .collect();
                keys.into_iter().map(str::to_string).collect()
            })
            .unwrap_or_default();
        let wants_products = columns.iter().any(Column::is_product);
        let fan_out = match &response {
            Some(r) if wants_products => r.products_sold.len().max(1),
            _ => 1,
        };

        Self {
            state: State::Bom,
            columns,
            response,
            periods,
            fan_out,
            next_row: 0,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of data rows this export will emit
    pub fn row_count(&self) -> usize {
        match &self.response {
            Some(_) if !self.periods.is_empty() => self.periods.len() * self.fan_out,
            _ => 1,
        }
    }

    /// Collect the whole export in memory
    pub fn into_bytes(self) -> Vec<u8> {
        self.flatten().collect()
    }

    fn header(&self) -> Result<Vec<u8>, ExportError> {
        encode_record(self.columns.iter().map(|c| c.name()))
    }

    fn placeholder(&self) -> Result<Vec<u8>, ExportError> {
        encode_record((0..self.columns.len()).map(|i| if i == 0 { NO_DATA_MESSAGE } else { "" }))
    }

    fn row_fields(&self, index: usize) -> Result<Option<Vec<String>>, ExportError> {
        let Some(response) = self.response.as_ref() else {
            return Ok(None);
        };
        let period = &self.periods[index / self.fan_out];
        let ctx = RowContext {
            period,
            series: response.series.iter().find(|p| &p.period == period),
            cancelled: response
                .cancelled_series
                .iter()
                .find(|p| &p.period == period),
            product: response.products_sold.get(index % self.fan_out),
            avg_prep_time: response.summary.avg_prep_time,
        };
        let fields = self
            .columns
            .iter()
            .map(|c| ctx.field(*c))
            .collect::<Result<Vec<String>, _>>()?;
        Ok(Some(fields))
    }

    fn data_row(&self, index: usize) -> Result<Vec<u8>, ExportError> {
        match self.row_fields(index)? {
            Some(fields) => encode_record(fields),
            None => self.placeholder(),
        }
    }

    fn step(&mut self) -> Option<Result<Vec<u8>, ExportError>> {
        match self.state {
            State::Bom => {
                self.state = State::Header;
                Some(Ok(BOM.as_bytes().to_vec()))
            }
            State::Header => {
                self.state = State::Rows;
                Some(self.header())
            }
            State::Rows => {
                if self.next_row >= self.row_count() {
                    self.state = State::Done;
                    return None;
                }
                let index = self.next_row;
                self.next_row += 1;
                if self.periods.is_empty() {
                    Some(self.placeholder())
                } else {
                    Some(self.data_row(index))
                }
            }
            State::Done => None,
        }
    }
}

impl Iterator for CsvExport {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step()? {
            Ok(chunk) => Some(chunk),
            Err(err) => {
                tracing::error!(error = %err, row = self.next_row, "CSV export failed mid-stream");
                self.state = State::Done;
                Some(FALLBACK_LINE.as_bytes().to_vec())
            }
        }
    }
}
