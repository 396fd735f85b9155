//! Run a ticker for a bounded period and stop an unbounded one by hand.

use std::time::Duration;

use isoperiod::{Period, Ticker, TickerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TickerConfig::default().interval(Duration::from_millis(200));

    // Ends on its own after three ticks
    let bounded: Period = "R3/PT1S".parse()?;
    let mut ticker = Ticker::with_config(bounded, config);
    let mut ticks = ticker.start()?;
    while let Some(at) = ticks.recv().await {
        println!("bounded tick at {at}");
    }
    println!("bounded ticker ended: {:?}", ticker.join().await?);

    // Runs until stopped
    let forever: Period = "R/PT1S".parse()?;
    let mut ticker = Ticker::with_config(forever, config);
    let mut ticks = ticker.start()?;
    for _ in 0..2 {
        if let Some(at) = ticks.recv().await {
            println!("unbounded tick at {at}");
        }
    }
    ticker.stop();
    println!("unbounded ticker ended: {:?}", ticker.shutdown().await?);

    Ok(())
}
