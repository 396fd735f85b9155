//! Basic isoperiod API walkthrough: parse, display, next occurrence.

use isoperiod::Period;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse an interval
    let period: Period = "R5/P1DT12H".parse()?;
    println!("Parsed: {period}, fires {}", period.repetitions());

    // Compute the next occurrence
    let now: jiff::Zoned = "2025-06-15T08:00:00+00:00[UTC]".parse()?;
    if let Some(next) = period.next_from(&now)? {
        println!("Next occurrence after {now}: {next}");
    }

    // Walk every occurrence the budget allows
    println!("\nAll occurrences:");
    for dt in period.occurrences(&now) {
        println!("  {}", dt?);
    }

    // Without an R prefix a period never elapses
    let bare: Period = "P1D".parse()?;
    println!("\n{bare} next: {:?}", bare.next_from(&now)?);

    // Errors point at the offending input
    if let Err(e) = Period::parse("P99999999999Y") {
        println!("\n{}", e.display_rich());
    }

    Ok(())
}
