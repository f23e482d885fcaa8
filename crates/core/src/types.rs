/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Check-in/check-out dates are calendar days with no time component.
pub type StayDate = chrono::NaiveDate;
