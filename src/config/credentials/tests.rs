use super::*;
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_overrides_applied() {
    let mut config = Config::default();
    apply_overrides_from(
        &mut config,
        lookup(&[
            ("CLAUDE_API_KEY", "sk-ant-env"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("TWILIO_WHATSAPP_NUMBER", "+14155238886"),
            ("WHATSAPP_NUMBER", "+15550001111"),
        ]),
    );
    assert_eq!(config.analysis.api_key, "sk-ant-env");
    assert_eq!(config.twilio.account_sid, "AC123");
    assert_eq!(config.twilio.auth_token, "tok");
    assert_eq!(config.twilio.whatsapp_number, "+14155238886");
    assert_eq!(config.twilio.notify_number, "+15550001111");
}

#[test]
fn test_empty_value_does_not_override() {
    let mut config = Config::default();
    config.analysis.api_key = "from-file".to_string();
    apply_overrides_from(&mut config, lookup(&[("CLAUDE_API_KEY", "")]));
    assert_eq!(config.analysis.api_key, "from-file");
}

#[test]
fn test_port_override() {
    let mut config = Config::default();
    apply_overrides_from(&mut config, lookup(&[("PORT", "9090")]));
    assert_eq!(config.server.port, 9090);
}

#[test]
fn test_invalid_port_ignored() {
    let mut config = Config::default();
    apply_overrides_from(&mut config, lookup(&[("PORT", "eighty")]));
    assert_eq!(config.server.port, 8080);
}

#[test]
fn test_set_overrides_lists_names_only() {
    let set = set_overrides_from(lookup(&[
        ("CLAUDE_API_KEY", "sk-ant-env"),
        ("TWILIO_AUTH_TOKEN", ""),
        ("PORT", "9090"),
        ("UNRELATED", "x"),
    ]));
    assert_eq!(set, vec!["CLAUDE_API_KEY", "PORT"]);
}

#[test]
fn test_override_table_covers_notify_number() {
    assert!(
        CREDENTIAL_ENV_VARS
            .iter()
            .any(|(name, env)| *name == "whatsapp-number" && *env == "WHATSAPP_NUMBER")
    );
    let set = set_overrides_from(lookup(&[]));
    assert!(set.is_empty());
}
