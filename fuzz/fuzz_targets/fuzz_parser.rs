#![no_main]

use libfuzzer_sys::fuzz_target;
use rose_core::parser::{parse_source, printer, sema};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(program) = parse_source(source, "fuzz") else {
        return;
    };

    let _ = sema::analyze(&program);

    // Printed source must parse back to the same tree.
    let printed = printer::to_source(&program);
    let reparsed = parse_source(&printed, "fuzz").expect("printed source must parse");
    assert_eq!(printer::dump(&program), printer::dump(&reparsed));
});
