use chrono::{DateTime, Utc};

/// Single clock seam so services stamp timestamps consistently.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
