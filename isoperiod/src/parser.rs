// Pattern-based parser for `[Rn/]P[nY][nM][nD][T[nH][nM][nS]]`.
//
// The match is unanchored and every group is optional except the `P`, so the
// first `P` in the input is enough for a (possibly all-zero) period.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{PeriodError, Span};
use crate::period::{Field, Period};

/// Compiled once, shared by every parse.
///
/// Digits are `[0-9]` rather than `\d` so that non-ASCII digits never reach
/// integer conversion.
static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?<r>R)?(?<repetitions>[0-9]+)?/?",
        r"P(?:(?<years>[0-9]+)Y)?(?:(?<months>[0-9]+)M)?(?:(?<days>[0-9]+)D)?",
        r"(?<t>T)?(?:(?<hours>[0-9]+)H)?(?:(?<minutes>[0-9]+)M)?(?:(?<seconds>[0-9]+)S)?",
    ))
    .unwrap()
});

/// Parse interval text into a [`Period`].
///
/// A missing `R` group means [`Repetitions::Never`](crate::Repetitions::Never),
/// a bare `R` means [`Repetitions::Unbounded`](crate::Repetitions::Unbounded),
/// and `Rn` means exactly `n` repetitions.
/// Digits without a leading `R` are matched but ignored.
pub fn parse(input: &str) -> Result<Period, PeriodError> {
    let caps = PATTERN
        .captures(input)
        .ok_or_else(|| PeriodError::invalid_format(input))?;

    // Signed count: 0 never, n bounded, -1 unbounded.
    let repetitions = if caps.name("r").is_some() {
        number::<i64>(&caps, input, Field::Repetitions)?.unwrap_or(-1)
    } else {
        0
    };

    let component = |field| number::<u32>(&caps, input, field).map(Option::unwrap_or_default);

    Ok(Period::new(
        repetitions,
        component(Field::Years)?,
        component(Field::Months)?,
        component(Field::Days)?,
        component(Field::Hours)?,
        component(Field::Minutes)?,
        component(Field::Seconds)?,
    ))
}

/// Convert the numeral captured for `field`, if any.
fn number<T: FromStr<Err = std::num::ParseIntError>>(
    caps: &Captures<'_>,
    input: &str,
    field: Field,
) -> Result<Option<T>, PeriodError> {
    let Some(m) = caps.name(field.as_str()) else {
        return Ok(None);
    };
    m.as_str().parse::<T>().map(Some).map_err(|e| {
        PeriodError::invalid_number(field, m.as_str(), Span::new(m.start(), m.end()), input, e)
    })
}
