pub mod anomaly;
pub mod money;
pub mod row;
pub mod stats;
pub mod table;

pub use anomaly::{AnomalyItem, ItemStatus, Severity};
pub use money::{parse_currency, Money, ParseMoneyError};
pub use row::{CellValue, DataType, RowRecord, RowStatus};
pub use stats::{aggregate, resolution_rate, AggregateStats, StatsSource};
pub use table::{ColumnFilter, SortDirection, SortSpec, TablePage, TableQuery};
