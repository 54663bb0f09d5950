#![no_main]

use libfuzzer_sys::fuzz_target;
use simseries::config::ExtractConfig;
use simseries::{Accumulator, LineClassifier};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither single lines nor whole dumps may panic
        if let Ok(classifier) = LineClassifier::new(&ExtractConfig::default()) {
            for line in input.lines() {
                let _ = classifier.classify(line);
            }
        }
        if let Ok(accumulator) = Accumulator::new(&ExtractConfig::default()) {
            let _ = accumulator.accumulate_str(input);
        }
    }
});
