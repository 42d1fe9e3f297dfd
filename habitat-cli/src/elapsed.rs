//! Human-readable elapsed times for progress logs.

use std::time::Duration;

const MILLIS_PER_MINUTE: u128 = 60_000;
const MILLIS_PER_HOUR: u128 = 3_600_000;

/// Render `elapsed` as whole seconds below two minutes, tenths of a minute
/// below an hour, and hours rounded to two places beyond. A trailing zero
/// in the hundredths is dropped (`1.5 hr.`, not `1.50 hr.`).
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 2 * MILLIS_PER_MINUTE {
        return format!("{} sec.", elapsed.as_secs());
    }
    if millis < MILLIS_PER_HOUR {
        let tenths = rounded_div(millis, MILLIS_PER_MINUTE / 10);
        return format!("{}.{} min.", tenths / 10, tenths % 10);
    }
    let hundredths = rounded_div(millis, MILLIS_PER_HOUR / 100);
    if hundredths % 10 == 0 {
        let tenths = hundredths / 10;
        format!("{}.{} hr.", tenths / 10, tenths % 10)
    } else {
        format!("{}.{:02} hr.", hundredths / 100, hundredths % 100)
    }
}

const fn rounded_div(value: u128, unit: u128) -> u128 {
    (value + unit / 2) / unit
}
