#![no_main]

use libfuzzer_sys::fuzz_target;
use receipt_relay::fuzz_api::render_twiml;

fuzz_target!(|text: &str| {
    let rendered = render_twiml(text);
    let inner = &rendered["<Response><Message>".len()..rendered.len() - "</Message></Response>".len()];
    assert!(!inner.contains('<'));
});
