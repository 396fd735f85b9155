#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(period) = isoperiod::Period::parse(s) {
            let displayed = period.to_string();
            let reparsed = isoperiod::Period::parse(&displayed)
                .expect("display output must be parseable");
            assert_eq!(
                (period.years(), period.months(), period.days()),
                (reparsed.years(), reparsed.months(), reparsed.days()),
                "calendar part changed through '{displayed}'"
            );
            assert_eq!(
                period.clock_duration(),
                reparsed.clock_duration(),
                "clock part changed through '{displayed}'"
            );
        }
    }
});
