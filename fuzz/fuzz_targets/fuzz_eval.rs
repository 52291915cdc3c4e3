#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Keep inputs small: loops in generated programs are not bounded.
    if data.len() > 512 {
        return;
    }
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    // Any outcome is fine as long as evaluation does not panic.
    let _ = rose_core::run(source, "fuzz");
});
