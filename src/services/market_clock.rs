use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// Session close configuration for the US equity market
pub struct MarketHours {
    pub close_hour: u32,        // 16 for 4pm
    pub close_minute: u32,      // 30: half an hour of settle time after the bell
    pub timezone: &'static str, // "US/Eastern"
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            close_hour: 16,
            close_minute: 30,
            timezone: "US/Eastern",
        }
    }
}

impl MarketHours {
    fn tz(&self) -> Tz {
        match self.timezone.parse() {
            Ok(tz) => tz,
            Err(e) => {
                tracing::warn!("Failed to parse timezone '{}': {}", self.timezone, e);
                Tz::UTC
            }
        }
    }

    fn close_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.close_hour, self.close_minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

/// Saturday or Sunday in UTC: the provider has nothing new, cached data is reused
pub fn is_stale_window(now: DateTime<Utc>) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether the current trading week has closed (Friday after the close, or the weekend)
pub fn is_after_weekly_close(now: DateTime<Utc>) -> bool {
    let config = MarketHours::default();
    let local = now.with_timezone(&config.tz());

    match local.weekday() {
        Weekday::Sat | Weekday::Sun => true,
        Weekday::Fri => local.time() > config.close_time(),
        _ => false,
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Whether a weekly bar dated `bar_date` represents a closed week at `now`
///
/// Bars from earlier weeks are final; the bar of the current week is final
/// only once the weekly close has passed.
pub fn weekly_bar_is_final(bar_date: NaiveDate, now: DateTime<Utc>) -> bool {
    let config = MarketHours::default();
    let today = now.with_timezone(&config.tz()).date_naive();

    let bar_week = week_start(bar_date);
    let current_week = week_start(today);

    if bar_week < current_week {
        true
    } else if bar_week == current_week {
        is_after_weekly_close(now)
    } else {
        false
    }
}
