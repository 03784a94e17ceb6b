use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole minutes between two instants, rounded to the nearest minute.
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    (millis as f64 / 60_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn rounds_to_nearest_minute() {
        assert_eq!(elapsed_minutes(at_ms(0), at_ms(125_000)), 2);
        assert_eq!(elapsed_minutes(at_ms(0), at_ms(150_000)), 3);
        assert_eq!(elapsed_minutes(at_ms(0), at_ms(29_999)), 0);
        assert_eq!(elapsed_minutes(at_ms(1_000), at_ms(1_000)), 0);
    }
}
