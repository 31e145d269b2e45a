#![no_main]

use libfuzzer_sys::fuzz_target;
use tramd::source::{MarkerLine, MarkerScanner, RAMD_STOP_MARKER};

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let scanner = MarkerScanner::ramd().unwrap();
        // Classification must never panic; steps only come from marker lines
        if let MarkerLine::Steps(_) = scanner.parse_line(line) {
            assert!(line.starts_with(RAMD_STOP_MARKER));
        }
    }
});
