use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Display date stamped onto new activity records, dd/mm/yyyy.
pub fn applied_date_label(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

