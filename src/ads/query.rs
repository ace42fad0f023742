use chrono::{NaiveDate, Weekday};

/// Report fields shared by the today and baseline queries.
pub const REPORT_FIELDS: [&str; 6] = [
    "segments.hour",
    "segments.day_of_week",
    "metrics.clicks",
    "metrics.impressions",
    "metrics.conversions",
    "metrics.cost_micros",
];

/// Account metadata for the customer being processed.
pub const ACCOUNT_INFO_QUERY: &str =
    "SELECT customer.descriptive_name, customer.currency_code, customer.time_zone FROM customer";

/// Enumerates enabled non-manager client accounts under the manager
/// account the credentials are scoped to.
pub const CLIENT_ACCOUNTS_QUERY: &str = "SELECT customer_client.id, \
     customer_client.descriptive_name FROM customer_client \
     WHERE customer_client.manager = FALSE \
     AND customer_client.status = 'ENABLED'";

/// Hour-segmented stats for a single day.
pub fn today_query(date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    format!(
        "SELECT {} FROM customer WHERE segments.date BETWEEN \"{date}\" AND \"{date}\"",
        REPORT_FIELDS.join(",")
    )
}

/// Hour-segmented stats for one weekday across the lookback window.
pub fn baseline_query(weekday: Weekday, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "SELECT {} FROM customer WHERE segments.day_of_week=\"{}\" \
         AND segments.date BETWEEN \"{}\" AND \"{}\"",
        REPORT_FIELDS.join(","),
        gaql_day_of_week(weekday),
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
    )
}

pub fn gaql_day_of_week(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Customer ids are often written as `123-456-7890`; the REST endpoints
/// want digits only.
pub fn normalize_customer_id(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_digit()).collect()
}
