//! Calendar and time codecs. Everything is counted from 1970-01-01T00:00:00Z. The `Tz` variants append the utc offset
//! in minutes, so a decoded timestamp carries the offset that was in effect when it was written but not the name of
//! the time zone.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::value::Value;

const NANOS_PER_SECOND: u32 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Number of decimal digits below the second that a `DateTime64` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision(u8);

impl Precision {
    pub const SECONDS: Precision = Precision(0);
    pub const MILLIS: Precision = Precision(3);
    pub const MICROS: Precision = Precision(6);
    pub const NANOS: Precision = Precision(9);

    pub fn new(digits: u8) -> Result<Self, SchemaError> {
        if digits > 9 {
            Err(SchemaError::Precision(digits))
        } else {
            Ok(Precision(digits))
        }
    }

    pub fn digits(self) -> u8 {
        self.0
    }

    /// Ticks per second
    fn scale(self) -> u64 {
        10u64.pow(u32::from(self.0))
    }

    /// Nanoseconds per tick
    fn tick(self) -> u32 {
        10u32.pow(9 - u32::from(self.0))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision::MILLIS
    }
}

fn epoch() -> NaiveDate {
    // 1970-01-01
    NaiveDate::default()
}

/// Seconds and nanoseconds since the epoch. Dates count from midnight utc.
fn instant(value: &Value) -> Result<(i64, u32), EncodeError> {
    match value {
        Value::DateTime(dt) => Ok((dt.timestamp(), dt.timestamp_subsec_nanos().min(NANOS_PER_SECOND - 1))),
        Value::DateTimeTz(dt) => Ok((dt.timestamp(), dt.timestamp_subsec_nanos().min(NANOS_PER_SECOND - 1))),
        Value::Date(d) => Ok((d.signed_duration_since(epoch()).num_days() * SECONDS_PER_DAY, 0)),
        other => Err(EncodeError::Type { expected: "datetime", found: other.typename() }),
    }
}

pub(crate) fn write_date(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    let date = match value {
        Value::Date(d) => *d,
        Value::DateTime(dt) => dt.date_naive(),
        Value::DateTimeTz(dt) => dt.date_naive(),
        other => return Err(EncodeError::Type { expected: "date", found: other.typename() }),
    };
    let days = date.signed_duration_since(epoch()).num_days();
    let days = u16::try_from(days).map_err(|_| EncodeError::Range { codec: "Date", value: date.to_string() })?;
    w.put(days);
    Ok(())
}

pub(crate) fn read_date(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    let days = r.get::<u16>()?;
    epoch()
        .checked_add_days(Days::new(u64::from(days)))
        .map(Value::Date)
        .ok_or(DecodeError::Timestamp(u64::from(days)))
}

/// Sub-second parts are dropped.
pub(crate) fn write_datetime32(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    let (secs, _) = instant(value)?;
    let secs = u32::try_from(secs).map_err(|_| EncodeError::Range { codec: "DateTime32", value: secs.to_string() })?;
    w.put(secs);
    Ok(())
}

pub(crate) fn read_datetime32(r: &mut ReadCursor) -> Result<DateTime<Utc>, DecodeError> {
    let secs = r.get::<u32>()?;
    DateTime::<Utc>::from_timestamp(i64::from(secs), 0).ok_or(DecodeError::Timestamp(u64::from(secs)))
}

/// Rounds half up to the nearest tick.
pub(crate) fn write_datetime64(w: &mut WriteCursor, value: &Value, precision: Precision) -> Result<(), EncodeError> {
    let (secs, nanos) = instant(value)?;
    let range = || EncodeError::Range { codec: "DateTime64", value: format!("{}.{:09}", secs, nanos) };
    let secs = u64::try_from(secs).map_err(|_| range())?;
    let tick = precision.tick();
    let frac = u64::from((nanos + tick / 2) / tick);
    let ticks = secs
        .checked_mul(precision.scale())
        .and_then(|t| t.checked_add(frac))
        .ok_or_else(range)?;
    w.put(ticks);
    Ok(())
}

pub(crate) fn read_datetime64(r: &mut ReadCursor, precision: Precision) -> Result<DateTime<Utc>, DecodeError> {
    let ticks = r.get::<u64>()?;
    let scale = precision.scale();
    let secs = i64::try_from(ticks / scale).map_err(|_| DecodeError::Timestamp(ticks))?;
    // below 10^9 since ticks % scale < scale
    let nanos = (ticks % scale) as u32 * precision.tick();
    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or(DecodeError::Timestamp(ticks))
}

/// Values without an offset are written with offset zero.
pub(crate) fn write_offset(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    let seconds = match value {
        Value::DateTimeTz(dt) => dt.offset().local_minus_utc(),
        _ => 0,
    };
    if seconds % 60 != 0 {
        return Err(EncodeError::Offset(seconds));
    }
    // fixed offsets stay below one day, so the minutes always fit
    w.put((seconds / 60) as i16);
    Ok(())
}

pub(crate) fn read_offset(r: &mut ReadCursor, utc: DateTime<Utc>) -> Result<Value, DecodeError> {
    let minutes = r.get::<i16>()?;
    let offset = FixedOffset::east_opt(i32::from(minutes) * 60).ok_or(DecodeError::Offset(minutes))?;
    Ok(Value::DateTimeTz(utc.with_timezone(&offset)))
}

#[cfg(test)]
mod tests {
    use super::Precision;
    use crate::codec::Codec;
    use crate::cursor::{ReadCursor, WriteCursor};
    use crate::error::{DecodeError, EncodeError};
    use crate::value::Value;
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

    #[test]
    fn date() {
        let bytes = assert_roundtrip(&Codec::Date, Value::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()));
        assert_eq!(&[0x01, 0x00], &bytes[..]);
        assert_roundtrip(&Codec::Date, Value::Date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()));
        let last = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Days::new(65_535);
        assert_roundtrip(&Codec::Date, Value::Date(last));
        assert_range(&Codec::Date, Value::Date(last + chrono::Days::new(1)));
        assert_range(&Codec::Date, Value::Date(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()));
    }

    #[test]
    fn datetime32() {
        let dt = Utc.with_ymd_and_hms(2023, 1, 1, 12, 30, 0).unwrap();
        let bytes = assert_roundtrip(&Codec::DateTime32, Value::DateTime(dt));
        assert_eq!(&1_672_576_200u32.to_le_bytes(), &bytes[..]);
        assert_range(&Codec::DateTime32, Value::DateTime(Utc.with_ymd_and_hms(2106, 2, 8, 0, 0, 0).unwrap()));
        assert_range(&Codec::DateTime32, Value::DateTime(Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn datetime32_drops_fraction() {
        let dt = DateTime::<Utc>::from_timestamp(1_000, 750_000_000).unwrap();
        let bytes = write(&Codec::DateTime32, &Value::DateTime(dt));
        let back = Codec::DateTime32.read(&mut ReadCursor::new(&bytes)).unwrap();
        assert_eq!(Value::DateTime(DateTime::<Utc>::from_timestamp(1_000, 0).unwrap()), back);
    }

    #[test]
    fn datetime64_precision() {
        let dt = DateTime::<Utc>::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let millis = Codec::DateTime64(Precision::default());
        let bytes = write(&millis, &Value::DateTime(dt));
        assert_eq!(&1_700_000_000_123u64.to_le_bytes(), &bytes[..]);
        assert_eq!(
            Value::DateTime(DateTime::<Utc>::from_timestamp(1_700_000_000, 123_000_000).unwrap()),
            millis.read(&mut ReadCursor::new(&bytes)).unwrap()
        );
        assert_roundtrip(&Codec::datetime64(9).unwrap(), Value::DateTime(dt));
        assert_roundtrip(&Codec::datetime64(6).unwrap(), Value::DateTime(DateTime::<Utc>::from_timestamp(5, 1_000).unwrap()));
    }

    #[test]
    fn datetime64_rounds_half_up() {
        let codec = Codec::datetime64(3).unwrap();
        let dt = DateTime::<Utc>::from_timestamp(10, 999_500_000).unwrap();
        assert_eq!(&11_000u64.to_le_bytes(), &write(&codec, &Value::DateTime(dt))[..]);
        let dt = DateTime::<Utc>::from_timestamp(10, 1_499_999).unwrap();
        assert_eq!(&10_001u64.to_le_bytes(), &write(&codec, &Value::DateTime(dt))[..]);
        let codec = Codec::datetime64(0).unwrap();
        let dt = DateTime::<Utc>::from_timestamp(10, 500_000_000).unwrap();
        assert_eq!(&11u64.to_le_bytes(), &write(&codec, &Value::DateTime(dt))[..]);
    }

    #[test]
    fn datetime64_unrepresentable_ticks() {
        let bytes = u64::MAX.to_le_bytes();
        let err = Codec::datetime64(0).unwrap().read(&mut ReadCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err.inner(), DecodeError::Timestamp(u64::MAX)));
    }

    #[test]
    fn with_offset() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 3, 10, 8, 15, 0).unwrap();
        let bytes = assert_roundtrip(&Codec::DateTime32Tz, Value::DateTimeTz(dt));
        assert_eq!(6, bytes.len());
        assert_eq!(&(-300i16).to_le_bytes(), &bytes[4..]);
        let dt = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap().timestamp_millis_opt(1_700_000_000_123).unwrap();
        let bytes = assert_roundtrip(&Codec::datetime64_tz(3).unwrap(), Value::DateTimeTz(dt));
        assert_eq!(10, bytes.len());
    }

    #[test]
    fn utc_value_into_offset_codec() {
        let dt = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let bytes = write(&Codec::DateTime32Tz, &Value::DateTime(dt));
        assert_eq!(&[0, 0], &bytes[4..]);
        let back = Codec::DateTime32Tz.read(&mut ReadCursor::new(&bytes)).unwrap();
        assert_eq!(Value::DateTimeTz(dt.with_timezone(&FixedOffset::east_opt(0).unwrap())), back);
    }

    #[test]
    fn offset_must_be_whole_minutes() {
        let dt = FixedOffset::east_opt(561).unwrap().with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let err = Codec::DateTime32Tz.write(&mut WriteCursor::new(), &Value::DateTimeTz(dt)).unwrap_err();
        assert!(matches!(err.inner(), EncodeError::Offset(561)));
    }

    #[test]
    fn offset_out_of_range() {
        let mut bytes = 0u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1440i16.to_le_bytes());
        let err = Codec::DateTime32Tz.read(&mut ReadCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err.inner(), DecodeError::Offset(1440)));
    }

    fn write(codec: &Codec, value: &Value) -> Vec<u8> {
        let mut w = WriteCursor::new();
        codec.write(&mut w, value).unwrap();
        w.into_inner()
    }

    fn assert_roundtrip(codec: &Codec, value: Value) -> Vec<u8> {
        let bytes = write(codec, &value);
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(value, codec.read(&mut r).unwrap());
        assert!(!r.has_more());
        bytes
    }

    fn assert_range(codec: &Codec, value: Value) {
        let err = codec.write(&mut WriteCursor::new(), &value).unwrap_err();
        assert!(matches!(err.inner(), EncodeError::Range { .. }), "{}", err);
    }
}
