//! CSV report writer.

use crate::domain::comparison::ComparisonTable;
use crate::domain::error::DcaError;
use crate::domain::simulation::PerformanceRecord;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn report_err(output_path: &str, e: impl std::fmt::Display) -> DcaError {
    DcaError::Report {
        reason: format!("{}: {}", output_path, e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_records(
        &self,
        records: &[PerformanceRecord],
        output_path: &str,
    ) -> Result<(), DcaError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| report_err(output_path, e))?;
        for record in records {
            wtr.serialize(record)
                .map_err(|e| report_err(output_path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// One row per date; unset cells are written empty.
    fn write_comparison(
        &self,
        table: &ComparisonTable,
        output_path: &str,
    ) -> Result<(), DcaError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| report_err(output_path, e))?;

        let mut header = vec!["date".to_string()];
        header.extend(table.cadences.iter().map(|c| c.to_string()));
        wtr.write_record(&header)
            .map_err(|e| report_err(output_path, e))?;

        for row in &table.rows {
            let mut fields = vec![row.date.to_string()];
            fields.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|d| d.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&fields)
                .map_err(|e| report_err(output_path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
