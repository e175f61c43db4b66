//! Report output port trait.

use crate::domain::comparison::ComparisonTable;
use crate::domain::error::DcaError;
use crate::domain::simulation::PerformanceRecord;

/// Port for writing simulation output.
pub trait ReportPort {
    fn write_records(
        &self,
        records: &[PerformanceRecord],
        output_path: &str,
    ) -> Result<(), DcaError>;

    fn write_comparison(
        &self,
        table: &ComparisonTable,
        output_path: &str,
    ) -> Result<(), DcaError>;
}
