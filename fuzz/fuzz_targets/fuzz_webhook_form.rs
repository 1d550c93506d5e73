#![no_main]

use libfuzzer_sys::fuzz_target;
use receipt_relay::fuzz_api::InboundMessage;

fuzz_target!(|data: &[u8]| {
    let msg = InboundMessage::from_form_body(data);
    let _ = msg.has_single_attachment();
});
