#![no_main]

use libfuzzer_sys::fuzz_target;
use tg_parser::{classify_line, parse_candidate, split_relation};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let candidate = parse_candidate(line);
    assert_eq!(candidate.is_some(), classify_line(line).is_ok());

    if let Some(edge) = candidate {
        let (left, right) = split_relation(line).expect("candidate lines split");
        assert_eq!(edge.source.as_str(), left);
        assert_eq!(edge.target.as_str(), right);
        assert!(!edge.source.as_str().is_empty());
        assert!(!edge.target.as_str().is_empty());
    }
});
