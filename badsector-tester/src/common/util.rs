use chrono::{DateTime, Utc};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Compact UTC stamp for report headers.
pub fn report_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn split_csv_trims_and_skips_empties() {
        assert_eq!(
            split_csv(" smoke, ,combat-focus,,"),
            vec!["smoke".to_string(), "combat-focus".to_string()]
        );
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn report_stamp_is_second_precision() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(report_stamp(at), "2024-03-09T07:05:01Z");
    }
}
