use chrono::Duration;

use crate::common::types::CandleInterval;

/// Named lookback window for history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryPeriod {
    OneHour,
    OneDay,
    ThreeDays,
    OneWeek,
    OneMonth,
}

impl HistoryPeriod {
    /// Parse a period code; unknown codes fall back to one day
    pub fn parse_or_default(code: &str) -> Self {
        match code {
            "1h" => HistoryPeriod::OneHour,
            "1d" => HistoryPeriod::OneDay,
            "3d" => HistoryPeriod::ThreeDays,
            "1w" => HistoryPeriod::OneWeek,
            "1m" => HistoryPeriod::OneMonth,
            _ => HistoryPeriod::OneDay,
        }
    }

    pub fn window(&self) -> Duration {
        match self {
            HistoryPeriod::OneHour => Duration::hours(1),
            HistoryPeriod::OneDay => Duration::days(1),
            HistoryPeriod::ThreeDays => Duration::days(3),
            HistoryPeriod::OneWeek => Duration::weeks(1),
            HistoryPeriod::OneMonth => Duration::days(30),
        }
    }

    /// Candle size used when falling back to the exchange
    pub fn granularity(&self) -> CandleInterval {
        match self {
            HistoryPeriod::OneHour => CandleInterval::OneMinute,
            HistoryPeriod::OneDay => CandleInterval::FiveMinutes,
            HistoryPeriod::ThreeDays => CandleInterval::FifteenMinutes,
            HistoryPeriod::OneWeek => CandleInterval::OneHour,
            HistoryPeriod::OneMonth => CandleInterval::FourHours,
        }
    }

    /// Window start for a query issued at `now_ms`
    pub fn start_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.window().num_milliseconds()
    }

    pub fn code(&self) -> &'static str {
        match self {
            HistoryPeriod::OneHour => "1h",
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::ThreeDays => "3d",
            HistoryPeriod::OneWeek => "1w",
            HistoryPeriod::OneMonth => "1m",
        }
    }
}

impl std::fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_table() {
        let cases = [
            ("1h", 3_600_000, CandleInterval::OneMinute),
            ("1d", 86_400_000, CandleInterval::FiveMinutes),
            ("3d", 259_200_000, CandleInterval::FifteenMinutes),
            ("1w", 604_800_000, CandleInterval::OneHour),
            ("1m", 2_592_000_000, CandleInterval::FourHours),
        ];

        for (code, window_ms, interval) in cases {
            let period = HistoryPeriod::parse_or_default(code);
            assert_eq!(period.window().num_milliseconds(), window_ms, "{}", code);
            assert_eq!(period.granularity(), interval, "{}", code);
            assert_eq!(period.code(), code);
        }
    }

    #[test]
    fn test_unknown_period_defaults_to_one_day() {
        assert_eq!(HistoryPeriod::parse_or_default("5y"), HistoryPeriod::OneDay);
        assert_eq!(HistoryPeriod::parse_or_default(""), HistoryPeriod::OneDay);
    }

    #[test]
    fn test_start_ms() {
        let period = HistoryPeriod::OneHour;
        assert_eq!(period.start_ms(10_000_000), 10_000_000 - 3_600_000);
    }
}
