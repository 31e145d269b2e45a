#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;
use tramd::colvar::ColvarTable;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(table) = ColvarTable::parse(text, Path::new("fuzz")) {
            // Every column holds one value per row
            for name in table.fields() {
                assert_eq!(table.column(name).map(<[f64]>::len), Some(table.len()));
            }
        }
    }
});
