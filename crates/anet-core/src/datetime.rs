use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

/// Last representable millisecond of a day; period ends land here.
pub const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_milli_opt(23, 59, 59, 999) {
    Some(time) => time,
    None => panic!("invalid end-of-day time"),
};

#[must_use]
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

#[must_use]
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(END_OF_DAY)
}

/// Wall-clock time of `dt` in `tz`.
#[must_use]
pub fn to_local(dt: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    dt.with_timezone(tz).naive_local()
}

#[must_use]
pub fn now_in(tz: &Tz) -> NaiveDateTime {
    to_local(Utc::now(), tz)
}

pub fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(source, "timezone source was empty");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => {
            tracing::debug!(source, timezone = %trimmed, "parsed timezone");
            Some(tz)
        }
        Err(err) => {
            tracing::error!(
                source,
                timezone = %trimmed,
                error = %err,
                "failed to parse timezone id"
            );
            None
        }
    }
}

/// Parses a reference instant given on the command line.
///
/// Offsets in RFC3339 input are converted to the wall clock of `tz`; every
/// other form is already local.
#[tracing::instrument(skip(now, tz), fields(input = input))]
pub fn parse_instant(input: &str, now: DateTime<Utc>, tz: &Tz) -> anyhow::Result<NaiveDateTime> {
    let token = input.trim();
    let local_now = to_local(now, tz);

    match token.to_ascii_lowercase().as_str() {
        "now" => return Ok(local_now),
        "today" => return Ok(start_of_day(local_now.date())),
        "yesterday" => {
            let date = local_now
                .date()
                .pred_opt()
                .ok_or_else(|| anyhow!("no day before {}", local_now.date()))?;
            return Ok(start_of_day(date));
        }
        "tomorrow" => {
            let date = local_now
                .date()
                .succ_opt()
                .ok_or_else(|| anyhow!("no day after {}", local_now.date()))?;
            return Ok(start_of_day(date));
        }
        _ => {}
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Ok(dt.with_timezone(tz).naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(token, fmt) {
            return Ok(ndt);
        }
    }

    Err(anyhow!("unrecognized date expression: {input}")).with_context(|| {
        "supported formats: now/today/tomorrow/yesterday, RFC3339, \
         YYYY-MM-DD, YYYY-MM-DDTHH:MM[:SS], YYYY-MM-DD HH:MM[:SS]"
    })
}

/// Serializes period boundaries as `YYYY-MM-DDTHH:MM:SS.mmm`.
pub mod boundary_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{end_of_day, parse_instant, parse_timezone};

    #[test]
    fn parses_date_as_local_midnight() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 17, 12, 0, 0)
            .single()
            .expect("valid now");
        let parsed = parse_instant("2020-07-01", now, &chrono_tz::UTC).expect("parse date");
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2020-07-01 00:00");
    }

    #[test]
    fn today_follows_configured_timezone() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 17, 3, 0, 0)
            .single()
            .expect("valid now");
        let tz = parse_timezone("America/Mexico_City", "test").expect("timezone");
        let parsed = parse_instant("today", now, &tz).expect("parse today");
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2026-02-16");
    }

    #[test]
    fn rfc3339_is_converted_to_local_wall_clock() {
        let now = Utc::now();
        let tz = parse_timezone("Europe/Amsterdam", "test").expect("timezone");
        let parsed = parse_instant("2020-01-01T12:00:00Z", now, &tz).expect("parse rfc3339");
        assert_eq!(parsed.format("%H:%M").to_string(), "13:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_instant("next tuesday-ish", Utc::now(), &chrono_tz::UTC).is_err());
        assert!(parse_timezone("Mars/Olympus_Mons", "test").is_none());
    }

    #[test]
    fn end_of_day_is_last_millisecond() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).expect("valid date");
        assert_eq!(
            end_of_day(date).format("%H:%M:%S%.3f").to_string(),
            "23:59:59.999"
        );
    }
}
