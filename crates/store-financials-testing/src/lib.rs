mod dataset_builder;
mod test_fixture;

pub use dataset_builder::{
    dataset, dataset_without, sample_dataset, write_dataset_csv, FinancialRow, DEFAULT_AMOUNT,
};
pub use test_fixture::TestFixture;

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Fixed run start used by tests that compare audit timestamps
pub fn first_run() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 6, 0, 0).unwrap()
}

/// A later run start, one day after [`first_run`]
pub fn second_run() -> DateTime<Utc> {
    first_run() + Duration::days(1)
}
