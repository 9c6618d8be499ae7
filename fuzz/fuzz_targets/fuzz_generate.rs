#![no_main]

use libfuzzer_sys::fuzz_target;
use tg_core::ToggleRegistry;
use tg_parser::{parse_description, scan_document};
use tg_render_term::{TermRenderConfig, render_source};
use tg_source::generate;

fuzz_target!(|data: &[u8]| {
    let Some((&mask, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };

    // Switch entities off according to the bits of the first byte.
    let mut registry = ToggleRegistry::new();
    for (index, id) in scan_document(text).endpoints().enumerate() {
        if registry.ensure(id) && mask & (1 << (index % 8)) != 0 {
            registry.set(id.clone(), false);
        }
    }
    let snapshot = registry.snapshot();

    let source = generate(text, &snapshot);
    assert_eq!(source, generate(text, &snapshot));

    let description = parse_description(&source).expect("generated descriptions parse");
    for relation in &description.relations {
        for index in [relation.from, relation.to] {
            let label = description.label(index).expect("relation endpoints are declared");
            assert!(snapshot.is_enabled(label));
        }
    }

    let _ = render_source(&source, TermRenderConfig::compact());
});
