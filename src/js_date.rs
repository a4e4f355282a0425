//! `Date`: time values are milliseconds since the epoch (UTC) stored in
//! `ObjectKind::Date`. Calendar arithmetic follows the ECMAScript day/time
//! model; `chrono` supplies the clock, the local offset and fallback parsing.

use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, NativeFn, ObjectKind, PreferredType, Realm, Value, Vm, arg, new_js_object_with_kind,
};
use crate::error::JSError;
use crate::{raise_range_error, raise_type_error};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const MAX_TIME: f64 = 8.64e15;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

// Field indices shared by getters and setters.
const YEAR: usize = 0;
const MONTH: usize = 1;
const DATE: usize = 2;
const HOURS: usize = 3;
const MINUTES: usize = 4;
const SECONDS: usize = 5;
const MILLISECONDS: usize = 6;
const WEEKDAY: usize = 7;

pub fn initialize_date<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.date_prototype;
    let ctor = realm.native_constructor(mc, "Date", date_constructor, 7, proto);
    realm.define_method(mc, &ctor, "now", date_now, 0);
    realm.define_method(mc, &ctor, "parse", date_parse, 1);
    realm.define_method(mc, &ctor, "UTC", date_utc, 7);

    let methods: &[(&str, NativeFn, u32)] = &[
        ("getTime", date_get_time, 0),
        ("valueOf", date_get_time, 0),
        ("getTimezoneOffset", date_get_timezone_offset, 0),
        ("getFullYear", get_full_year, 0),
        ("getMonth", get_month, 0),
        ("getDate", get_date, 0),
        ("getDay", get_day, 0),
        ("getHours", get_hours, 0),
        ("getMinutes", get_minutes, 0),
        ("getSeconds", get_seconds, 0),
        ("getMilliseconds", get_milliseconds, 0),
        ("getUTCFullYear", get_utc_full_year, 0),
        ("getUTCMonth", get_utc_month, 0),
        ("getUTCDate", get_utc_date, 0),
        ("getUTCDay", get_utc_day, 0),
        ("getUTCHours", get_utc_hours, 0),
        ("getUTCMinutes", get_utc_minutes, 0),
        ("getUTCSeconds", get_utc_seconds, 0),
        ("getUTCMilliseconds", get_utc_milliseconds, 0),
        ("setTime", date_set_time, 1),
        ("setFullYear", set_full_year, 3),
        ("setMonth", set_month, 2),
        ("setDate", set_date, 1),
        ("setHours", set_hours, 4),
        ("setMinutes", set_minutes, 3),
        ("setSeconds", set_seconds, 2),
        ("setMilliseconds", set_milliseconds, 1),
        ("setUTCFullYear", set_utc_full_year, 3),
        ("setUTCMonth", set_utc_month, 2),
        ("setUTCDate", set_utc_date, 1),
        ("setUTCHours", set_utc_hours, 4),
        ("setUTCMinutes", set_utc_minutes, 3),
        ("setUTCSeconds", set_utc_seconds, 2),
        ("setUTCMilliseconds", set_utc_milliseconds, 1),
        ("toISOString", date_to_iso_string, 0),
        ("toJSON", date_to_json, 1),
        ("toString", date_to_string, 0),
        ("toDateString", date_to_date_string, 0),
        ("toTimeString", date_to_time_string, 0),
        ("toUTCString", date_to_utc_string, 0),
        ("toLocaleString", date_to_string, 0),
        ("toLocaleDateString", date_to_date_string, 0),
        ("toLocaleTimeString", date_to_time_string, 0),
    ];
    for (name, func, length) in methods {
        realm.define_method(mc, &proto, name, *func, *length);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Time value arithmetic
// ---------------------------------------------------------------------------

fn day(t: f64) -> f64 {
    (t / MS_PER_DAY).floor()
}

/// Days since 1970-01-01 for a proleptic Gregorian date (`month` 1-12).
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of `days_from_civil`: `(year, month 1-12, day 1-31)`.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

fn make_time(hour: f64, min: f64, sec: f64, ms: f64) -> f64 {
    if !(hour.is_finite() && min.is_finite() && sec.is_finite() && ms.is_finite()) {
        return f64::NAN;
    }
    hour.trunc() * MS_PER_HOUR + min.trunc() * MS_PER_MINUTE + sec.trunc() * MS_PER_SECOND + ms.trunc()
}

fn make_day(year: f64, month: f64, date: f64) -> f64 {
    if !(year.is_finite() && month.is_finite() && date.is_finite()) {
        return f64::NAN;
    }
    let (year, month, date) = (year.trunc(), month.trunc(), date.trunc());
    let ym = year + (month / 12.0).floor();
    if ym.abs() > 400_000.0 {
        return f64::NAN;
    }
    let mn = month.rem_euclid(12.0);
    days_from_civil(ym as i64, mn as i64 + 1, 1) as f64 + date - 1.0
}

fn make_date(day: f64, time: f64) -> f64 {
    if !(day.is_finite() && time.is_finite()) {
        return f64::NAN;
    }
    day * MS_PER_DAY + time
}

fn time_clip(t: f64) -> f64 {
    if !t.is_finite() || t.abs() > MAX_TIME {
        return f64::NAN;
    }
    t.trunc() + 0.0
}

/// `[year, month(0-11), date, hours, minutes, seconds, ms, weekday]` of a finite time value.
fn components(t: f64) -> [f64; 8] {
    let d = day(t);
    let (y, m, dd) = civil_from_days(d as i64);
    let within = t.rem_euclid(MS_PER_DAY);
    [
        y as f64,
        (m - 1) as f64,
        dd as f64,
        (within / MS_PER_HOUR).floor(),
        ((within / MS_PER_MINUTE).floor()).rem_euclid(60.0),
        ((within / MS_PER_SECOND).floor()).rem_euclid(60.0),
        within.rem_euclid(MS_PER_SECOND),
        (d + 4.0).rem_euclid(7.0),
    ]
}

/// Local time zone offset from UTC in milliseconds at UTC instant `t`.
fn local_offset(t: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    match DateTime::<Utc>::from_timestamp_millis(t as i64) {
        Some(dt) => Local.offset_from_utc_datetime(&dt.naive_utc()).fix().local_minus_utc() as f64 * MS_PER_SECOND,
        None => 0.0,
    }
}

fn local_time(t: f64) -> f64 {
    t + local_offset(t)
}

/// Local wall-clock time value to UTC.
fn utc_from_local(t: f64) -> f64 {
    if !t.is_finite() {
        return f64::NAN;
    }
    let guess = t - local_offset(t);
    t - local_offset(guess)
}

fn now() -> f64 {
    Utc::now().timestamp_millis() as f64
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn digits(&mut self, n: usize) -> Option<i64> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end)?;
        if !slice.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos = end;
        std::str::from_utf8(slice).ok()?.parse().ok()
    }
}

/// The ISO 8601 subset of the Date Time String Format.
fn parse_iso(s: &str) -> Option<f64> {
    let mut c = Cursor { bytes: s.as_bytes(), pos: 0 };
    let year = match c.peek()? {
        b'+' | b'-' => {
            let negative = c.peek() == Some(b'-');
            c.pos += 1;
            let y = c.digits(6)?;
            if negative && y == 0 {
                return None;
            }
            if negative { -y } else { y }
        }
        _ => c.digits(4)?,
    };
    let mut month = 1;
    let mut date = 1;
    if c.eat(b'-') {
        month = c.digits(2)?;
        if c.eat(b'-') {
            date = c.digits(2)?;
        }
    }
    if !(1..=12).contains(&month) || !(1..=31).contains(&date) {
        return None;
    }
    let (mut h, mut mi, mut sec, mut ms) = (0, 0, 0, 0);
    let mut has_time = false;
    if c.eat(b'T') || c.eat(b't') || c.eat(b' ') {
        has_time = true;
        h = c.digits(2)?;
        if !c.eat(b':') {
            return None;
        }
        mi = c.digits(2)?;
        if c.eat(b':') {
            sec = c.digits(2)?;
            if c.eat(b'.') || c.eat(b',') {
                let start = c.pos;
                while c.peek().is_some_and(|b| b.is_ascii_digit()) {
                    c.pos += 1;
                }
                let frac = std::str::from_utf8(&c.bytes[start..c.pos]).ok()?;
                if frac.is_empty() {
                    return None;
                }
                let padded = format!("{frac:0<3}");
                ms = padded[..3].parse().ok()?;
            }
        }
        if h > 24 || mi > 59 || sec > 59 || (h == 24 && (mi > 0 || sec > 0 || ms > 0)) {
            return None;
        }
    }
    let offset = match c.peek() {
        None => None,
        Some(b'Z') | Some(b'z') => {
            c.pos += 1;
            Some(0)
        }
        Some(sign @ (b'+' | b'-')) => {
            c.pos += 1;
            let oh = c.digits(2)?;
            c.eat(b':');
            let om = c.digits(2)?;
            let minutes = oh * 60 + om;
            Some(if sign == b'-' { -minutes } else { minutes })
        }
        Some(_) => return None,
    };
    if c.pos != c.bytes.len() {
        return None;
    }
    let day = make_day(year as f64, (month - 1) as f64, date as f64);
    let t = make_date(day, make_time(h as f64, mi as f64, sec as f64, ms as f64));
    let utc = match offset {
        Some(minutes) => t - minutes as f64 * MS_PER_MINUTE,
        // Date-only forms are UTC, date-time forms without an offset are local.
        None if has_time => utc_from_local(t),
        None => t,
    };
    Some(time_clip(utc))
}

/// Fallback formats: our own `toString`/`toUTCString` output and a few common shapes.
fn parse_fallback(s: &str) -> Option<f64> {
    let s = match s.find(" (") {
        Some(i) => &s[..i],
        None => s,
    };
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(dt.timestamp_millis() as f64);
    }
    for fmt in ["%b %d %Y %H:%M:%S", "%B %d, %Y %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(utc_from_local(naive.and_utc().timestamp_millis() as f64));
        }
    }
    for fmt in ["%a %b %d %Y", "%b %d %Y", "%B %d, %Y", "%b %d, %Y", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(utc_from_local(naive.and_utc().timestamp_millis() as f64));
        }
    }
    None
}

fn parse_date_string(s: &str) -> f64 {
    let s = s.trim();
    let t = parse_iso(s).or_else(|| parse_fallback(s)).unwrap_or(f64::NAN);
    log::trace!("Date.parse({s:?}) = {t}");
    time_clip(t)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn offset_string(offset_ms: f64) -> String {
    let minutes = (offset_ms / MS_PER_MINUTE) as i64;
    let sign = if minutes < 0 { '-' } else { '+' };
    format!("GMT{sign}{:02}{:02}", minutes.abs() / 60, minutes.abs() % 60)
}

fn year_string(year: f64) -> String {
    if year < 0.0 {
        format!("-{:06}", -year as i64)
    } else {
        format!("{:04}", year as i64)
    }
}

fn date_part(c: &[f64; 8]) -> String {
    format!(
        "{} {} {:02} {}",
        WEEKDAYS[c[WEEKDAY] as usize],
        MONTHS[c[MONTH] as usize],
        c[DATE] as i64,
        year_string(c[YEAR])
    )
}

fn time_part(c: &[f64; 8], offset_ms: f64) -> String {
    format!(
        "{:02}:{:02}:{:02} {}",
        c[HOURS] as i64,
        c[MINUTES] as i64,
        c[SECONDS] as i64,
        offset_string(offset_ms)
    )
}

/// `Date.prototype.toString` form of a time value.
pub fn date_display_string(t: f64) -> String {
    if t.is_nan() {
        return "Invalid Date".to_string();
    }
    let offset = local_offset(t);
    let c = components(t + offset);
    format!("{} {}", date_part(&c), time_part(&c, offset))
}

fn iso_string(t: f64) -> String {
    let c = components(t);
    let year = if (0.0..=9999.0).contains(&c[YEAR]) {
        format!("{:04}", c[YEAR] as i64)
    } else if c[YEAR] < 0.0 {
        format!("-{:06}", -c[YEAR] as i64)
    } else {
        format!("+{:06}", c[YEAR] as i64)
    };
    format!(
        "{year}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        c[MONTH] as i64 + 1,
        c[DATE] as i64,
        c[HOURS] as i64,
        c[MINUTES] as i64,
        c[SECONDS] as i64,
        c[MILLISECONDS] as i64
    )
}

// ---------------------------------------------------------------------------
// Constructor and statics
// ---------------------------------------------------------------------------

fn this_time_value<'gc>(this: &Value<'gc>, method: &str) -> Result<f64, EvalError<'gc>> {
    if let Value::Object(o) = this
        && let ObjectKind::Date(t) = o.borrow().kind
    {
        return Ok(t);
    }
    Err(raise_type_error!(format!("Date.prototype.{method} called on incompatible receiver")).into())
}

fn set_this_time_value<'gc>(vm: &mut Vm<'gc>, this: &Value<'gc>, t: f64) {
    if let Value::Object(o) = this {
        o.borrow_mut(vm.mc).kind = ObjectKind::Date(t);
    }
}

/// Reads `(year, month, date, hours, minutes, seconds, ms)` arguments with defaults.
fn date_from_fields<'gc>(vm: &mut Vm<'gc>, args: &[Value<'gc>]) -> Result<f64, EvalError<'gc>> {
    let defaults = [f64::NAN, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let mut f = defaults;
    for (i, slot) in f.iter_mut().enumerate() {
        if let Some(v) = args.get(i) {
            *slot = vm.to_number(v)?;
        }
    }
    if f[YEAR].is_finite() {
        let y = f[YEAR].trunc();
        if (0.0..=99.0).contains(&y) {
            f[YEAR] = 1900.0 + y;
        }
    }
    Ok(make_date(make_day(f[YEAR], f[MONTH], f[DATE]), make_time(f[HOURS], f[MINUTES], f[SECONDS], f[MILLISECONDS])))
}

fn date_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let Some(nt) = nt else {
        return Ok(Value::from(date_display_string(now())));
    };
    let t = match args {
        [] => now(),
        [value] => {
            let existing = match value {
                Value::Object(o) => match o.borrow().kind {
                    ObjectKind::Date(t) => Some(t),
                    _ => None,
                },
                _ => None,
            };
            match existing {
                Some(t) => t,
                None => match vm.to_primitive(value, PreferredType::Default)? {
                    Value::String(s) => parse_date_string(&String::from_utf16_lossy(&s)),
                    v => time_clip(vm.to_number(&v)?),
                },
            }
        }
        _ => time_clip(utc_from_local(date_from_fields(vm, args)?)),
    };
    let proto = vm.prototype_from_constructor(Some(nt), vm.realm.date_prototype)?;
    Ok(Value::Object(new_js_object_with_kind(vm.mc, Some(proto), ObjectKind::Date(t))))
}

fn date_now<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Number(now()))
}

fn date_parse<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_rust_string(&arg(args, 0))?;
    Ok(Value::Number(parse_date_string(&s)))
}

fn date_utc<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Number(time_clip(date_from_fields(vm, args)?)))
}

// ---------------------------------------------------------------------------
// Getters
// ---------------------------------------------------------------------------

fn date_get_time<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Number(this_time_value(&this, "getTime")?))
}

fn date_get_timezone_offset<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let t = this_time_value(&this, "getTimezoneOffset")?;
    if t.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(-local_offset(t) / MS_PER_MINUTE))
}

fn get_field<'gc>(this: &Value<'gc>, field: usize, utc: bool, method: &str) -> NativeResult<'gc> {
    let t = this_time_value(this, method)?;
    if t.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    let t = if utc { t } else { local_time(t) };
    Ok(Value::Number(components(t)[field]))
}

macro_rules! date_getters {
    ($($name:ident => ($field:expr, $utc:expr, $method:literal);)*) => {
        $(
            fn $name<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
                get_field(&this, $field, $utc, $method)
            }
        )*
    };
}

date_getters! {
    get_full_year => (YEAR, false, "getFullYear");
    get_month => (MONTH, false, "getMonth");
    get_date => (DATE, false, "getDate");
    get_day => (WEEKDAY, false, "getDay");
    get_hours => (HOURS, false, "getHours");
    get_minutes => (MINUTES, false, "getMinutes");
    get_seconds => (SECONDS, false, "getSeconds");
    get_milliseconds => (MILLISECONDS, false, "getMilliseconds");
    get_utc_full_year => (YEAR, true, "getUTCFullYear");
    get_utc_month => (MONTH, true, "getUTCMonth");
    get_utc_date => (DATE, true, "getUTCDate");
    get_utc_day => (WEEKDAY, true, "getUTCDay");
    get_utc_hours => (HOURS, true, "getUTCHours");
    get_utc_minutes => (MINUTES, true, "getUTCMinutes");
    get_utc_seconds => (SECONDS, true, "getUTCSeconds");
    get_utc_milliseconds => (MILLISECONDS, true, "getUTCMilliseconds");
}

// ---------------------------------------------------------------------------
// Setters
// ---------------------------------------------------------------------------

fn date_set_time<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    this_time_value(&this, "setTime")?;
    let t = time_clip(vm.to_number(&arg(args, 0))?);
    set_this_time_value(vm, &this, t);
    Ok(Value::Number(t))
}

/// Replaces fields `first..=last` from `args`, recomputes the time value and stores it.
fn set_fields<'gc>(vm: &mut Vm<'gc>, this: &Value<'gc>, args: &[Value<'gc>], first: usize, last: usize, utc: bool, method: &str) -> NativeResult<'gc> {
    let t = this_time_value(this, method)?;
    let mut values = Vec::with_capacity(last - first + 1);
    for i in 0..=(last - first) {
        match args.get(i) {
            Some(v) => values.push(Some(vm.to_number(v)?)),
            None if i == 0 => values.push(Some(f64::NAN)),
            None => values.push(None),
        }
    }
    let base = match (t.is_nan(), first) {
        (true, YEAR) => 0.0,
        (true, _) => return Ok(Value::Number(f64::NAN)),
        (false, _) if utc => t,
        (false, _) => local_time(t),
    };
    let mut c = components(base);
    for (offset, v) in values.into_iter().enumerate() {
        if let Some(v) = v {
            c[first + offset] = v;
        }
    }
    let local = make_date(make_day(c[YEAR], c[MONTH], c[DATE]), make_time(c[HOURS], c[MINUTES], c[SECONDS], c[MILLISECONDS]));
    let new_time = time_clip(if utc { local } else { utc_from_local(local) });
    set_this_time_value(vm, this, new_time);
    Ok(Value::Number(new_time))
}

macro_rules! date_setters {
    ($($name:ident => ($first:expr, $last:expr, $utc:expr, $method:literal);)*) => {
        $(
            fn $name<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
                set_fields(vm, &this, args, $first, $last, $utc, $method)
            }
        )*
    };
}

date_setters! {
    set_full_year => (YEAR, DATE, false, "setFullYear");
    set_month => (MONTH, DATE, false, "setMonth");
    set_date => (DATE, DATE, false, "setDate");
    set_hours => (HOURS, MILLISECONDS, false, "setHours");
    set_minutes => (MINUTES, MILLISECONDS, false, "setMinutes");
    set_seconds => (SECONDS, MILLISECONDS, false, "setSeconds");
    set_milliseconds => (MILLISECONDS, MILLISECONDS, false, "setMilliseconds");
    set_utc_full_year => (YEAR, DATE, true, "setUTCFullYear");
    set_utc_month => (MONTH, DATE, true, "setUTCMonth");
    set_utc_date => (DATE, DATE, true, "setUTCDate");
    set_utc_hours => (HOURS, MILLISECONDS, true, "setUTCHours");
    set_utc_minutes => (MINUTES, MILLISECONDS, true, "setUTCMinutes");
    set_utc_seconds => (SECONDS, MILLISECONDS, true, "setUTCSeconds");
    set_utc_milliseconds => (MILLISECONDS, MILLISECONDS, true, "setUTCMilliseconds");
}

// ---------------------------------------------------------------------------
// String conversions
// ---------------------------------------------------------------------------

fn date_to_iso_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let t = this_time_value(&this, "toISOString")?;
    if t.is_nan() {
        return Err(raise_range_error!("Invalid time value").into());
    }
    Ok(Value::from(iso_string(t)))
}

fn date_to_json<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let primitive = vm.to_primitive(&Value::Object(obj), PreferredType::Number)?;
    if let Value::Number(n) = primitive
        && !n.is_finite()
    {
        return Ok(Value::Null);
    }
    vm.invoke(&Value::Object(obj), "toISOString", &[])
}

fn date_to_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let t = this_time_value(&this, "toString")?;
    Ok(Value::from(date_display_string(t)))
}

fn date_to_date_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let t = this_time_value(&this, "toDateString")?;
    if t.is_nan() {
        return Ok(Value::from("Invalid Date"));
    }
    Ok(Value::from(date_part(&components(local_time(t)))))
}

fn date_to_time_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let t = this_time_value(&this, "toTimeString")?;
    if t.is_nan() {
        return Ok(Value::from("Invalid Date"));
    }
    let offset = local_offset(t);
    Ok(Value::from(time_part(&components(t + offset), offset)))
}

fn date_to_utc_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let t = this_time_value(&this, "toUTCString")?;
    if t.is_nan() {
        return Ok(Value::from("Invalid Date"));
    }
    let c = components(t);
    Ok(Value::from(format!(
        "{}, {:02} {} {} {:02}:{:02}:{:02} GMT",
        WEEKDAYS[c[WEEKDAY] as usize],
        c[DATE] as i64,
        MONTHS[c[MONTH] as usize],
        year_string(c[YEAR]),
        c[HOURS] as i64,
        c[MINUTES] as i64,
        c[SECONDS] as i64
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_conversion_round_trips() {
        for days in [-719_468, -1, 0, 1, 10_957, 2_932_896] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(days_from_civil(2000, 3, 1), 11_017);
    }

    #[test]
    fn iso_parsing() {
        assert_eq!(parse_iso("1970-01-01T00:00:00.000Z"), Some(0.0));
        assert_eq!(parse_iso("2000-01-01"), Some(946_684_800_000.0));
        assert_eq!(parse_iso("2000-01-01T00:00:00+01:00"), Some(946_681_200_000.0));
        assert_eq!(parse_iso("+275760-09-13T00:00:00.000Z"), Some(MAX_TIME));
        assert_eq!(parse_iso("2000-13-01"), None);
        assert_eq!(parse_iso("-000000-01-01"), None);
    }

    #[test]
    fn iso_formatting() {
        assert_eq!(iso_string(0.0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_string(-1.0), "1969-12-31T23:59:59.999Z");
        assert_eq!(iso_string(MAX_TIME), "+275760-09-13T00:00:00.000Z");
    }

    #[test]
    fn time_clip_bounds() {
        assert!(time_clip(MAX_TIME + 1.0).is_nan());
        assert!(time_clip(-0.0).is_sign_positive());
    }

    #[test]
    fn script_level_date_api() {
        let eval = |s| crate::evaluate_script(s, None::<&str>).unwrap();
        assert_eq!(eval("new Date(Date.UTC(2020, 1, 29, 12)).toISOString()"), "2020-02-29T12:00:00.000Z");
        assert_eq!(eval("var d = new Date(0); d.setUTCMonth(13); d.getUTCFullYear() + '-' + d.getUTCMonth()"), "1971-1");
        assert_eq!(eval("new Date(NaN).getTime()"), "NaN");
        assert_eq!(eval("JSON.stringify({d: new Date(0)})"), "{\"d\":\"1970-01-01T00:00:00.000Z\"}");
        assert_eq!(eval("new Date(0).toUTCString()"), "Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(eval("Date.parse(new Date(86400000).toString())"), "86400000");
    }
}
