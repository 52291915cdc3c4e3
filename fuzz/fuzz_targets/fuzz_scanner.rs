#![no_main]

use libfuzzer_sys::fuzz_target;
use rose_core::parser::scanner::{Scanner, TokenKind};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Scanning either fails cleanly or yields a stream ending in exactly one
    // `Eof` token.
    if let Ok(tokens) = Scanner::tokenize_all(source, "fuzz") {
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1, "token stream must contain one Eof");
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
});
