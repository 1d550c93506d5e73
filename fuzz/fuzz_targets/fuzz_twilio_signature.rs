#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use receipt_relay::fuzz_api::{parse_form, validate_twilio_signature};

#[derive(Arbitrary, Debug)]
struct Input {
    auth_token: String,
    signature: String,
    url: String,
    form: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let params = parse_form(&input.form);
    let _ = validate_twilio_signature(&input.auth_token, &input.signature, &input.url, &params);
});
