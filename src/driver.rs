//! Whole-sheet run: header → column map → every data row in order

use crate::config::FRESHNESS_WINDOW_HOURS;
use crate::error::{Error, Result, ResultExt};
use crate::row::{ColumnMap, RowOutcome, RowProcessor, SkipReason};
use crate::scryfall::PriceSource;
use crate::sheets::CellStore;
use chrono::{DateTime, Duration, Utc};

/// Counts for one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows after the header
    pub data_rows: usize,
    pub updated: usize,
    /// Skipped as updated within the last day
    pub fresh: usize,
    /// Skipped for lack of a card name
    pub unnamed: usize,
    /// Unknown to Scryfall
    pub not_found: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Updated { .. } => self.updated += 1,
            RowOutcome::Skipped(SkipReason::Fresh) => self.fresh += 1,
            RowOutcome::Skipped(SkipReason::NoCardName) => self.unnamed += 1,
            RowOutcome::NotFound => self.not_found += 1,
        }
    }
}

/// Update every row of the sheet, one at a time.
///
/// The header row must name all recognized columns; this is checked before any data row
/// is touched. The first failing row aborts the run, leaving earlier rows updated.
pub async fn run(
    store: &dyn CellStore,
    prices: &dyn PriceSource,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    let rows = store.read_rows().await.context("reading spreadsheet data")?;
    let Some((header, data)) = rows.split_first() else {
        return Err(Error::Config("zero rows in spreadsheet".to_string()));
    };

    let columns = ColumnMap::from_header(header)?;
    log::debug!("Columns: {:?}", columns);

    let fresh_after = now - Duration::hours(FRESHNESS_WINDOW_HOURS);
    let processor = RowProcessor::new(columns, prices, store, fresh_after);

    let mut summary = RunSummary {
        data_rows: data.len(),
        ..RunSummary::default()
    };
    for (offset, row) in data.iter().enumerate() {
        let outcome = processor.process(offset + 1, row).await?;
        summary.record(&outcome);
    }

    log::info!(
        "Processed {} rows: {} updated, {} fresh, {} without card name, {} not found",
        summary.data_rows,
        summary.updated,
        summary.fresh,
        summary.unnamed,
        summary.not_found
    );
    Ok(summary)
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
