use std::fmt;

use crate::period::{Period, Repetitions};

/// Canonical interval text.
///
/// Zero components are dropped, and a period with no non-zero component is
/// written as `PT0S`. The repetition prefix is `R/` for [`Repetitions::Never`],
/// `Rn/` for a bounded budget, and nothing at all for [`Repetitions::Unbounded`].
/// Re-parsing the output therefore swaps never and unbounded.
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repetitions() {
            Repetitions::Never => write!(f, "R/")?,
            Repetitions::Times(n) => write!(f, "R{n}/")?,
            Repetitions::Unbounded => {}
        }

        write!(f, "P")?;
        write_components(
            f,
            &[
                (self.years(), 'Y'),
                (self.months(), 'M'),
                (self.days(), 'D'),
            ],
        )?;

        if self.has_clock_part() {
            write!(f, "T")?;
            write_components(
                f,
                &[
                    (self.hours(), 'H'),
                    (self.minutes(), 'M'),
                    (self.seconds(), 'S'),
                ],
            )?;
        }

        if self.is_zero_length() {
            write!(f, "T0S")?;
        }

        Ok(())
    }
}

fn write_components(f: &mut fmt::Formatter<'_>, parts: &[(u32, char)]) -> fmt::Result {
    for &(value, designator) in parts {
        if value > 0 {
            write!(f, "{value}{designator}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Repetitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repetitions::Never => write!(f, "never"),
            Repetitions::Times(n) if n.get() == 1 => write!(f, "once"),
            Repetitions::Times(n) => write!(f, "{n} times"),
            Repetitions::Unbounded => write!(f, "forever"),
        }
    }
}
