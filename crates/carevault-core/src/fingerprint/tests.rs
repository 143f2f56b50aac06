use super::*;

fn desktop() -> EnvironmentSignals {
    EnvironmentSignals {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/131.0".to_string(),
        language: "en-GB".to_string(),
        color_depth: 24,
        screen_width: 2560,
        screen_height: 1440,
        timezone_offset_minutes: -60,
    }
}

#[test]
fn test_fingerprint_is_sha256_hex() {
    let fp = compute_fingerprint(&desktop(), &Signal::ALL);
    assert_eq!(fp.len(), 64);
    assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_fingerprint_matches_joined_signals() {
    let expected = hex::encode(Sha256::digest(
        "Mozilla/5.0 (X11; Linux x86_64) Firefox/131.0|en-GB|24|2560x1440|-60".as_bytes(),
    ));
    assert_eq!(compute_fingerprint(&desktop(), &Signal::ALL), expected);
}

#[test]
fn test_fingerprint_deterministic() {
    assert_eq!(
        compute_fingerprint(&desktop(), &Signal::ALL),
        compute_fingerprint(&desktop(), &Signal::ALL)
    );
}

#[test]
fn test_selection_order_is_irrelevant() {
    let forward = [Signal::Language, Signal::UserAgent];
    let backward = [Signal::UserAgent, Signal::Language];
    assert_eq!(
        compute_fingerprint(&desktop(), &forward),
        compute_fingerprint(&desktop(), &backward)
    );
}

#[test]
fn test_each_signal_changes_fingerprint() {
    let base = compute_fingerprint(&desktop(), &Signal::ALL);

    let mut env = desktop();
    env.timezone_offset_minutes = -120;
    assert_ne!(compute_fingerprint(&env, &Signal::ALL), base);

    let mut env = desktop();
    env.screen_width = 1920;
    assert_ne!(compute_fingerprint(&env, &Signal::ALL), base);

    let mut env = desktop();
    env.language = "de-DE".to_string();
    assert_ne!(compute_fingerprint(&env, &Signal::ALL), base);
}

#[test]
fn test_narrowed_signals_ignore_timezone() {
    let stable = [
        Signal::UserAgent,
        Signal::Language,
        Signal::ColorDepth,
        Signal::ScreenResolution,
    ];
    let mut travelled = desktop();
    travelled.timezone_offset_minutes = 300;

    assert_eq!(
        compute_fingerprint(&desktop(), &stable),
        compute_fingerprint(&travelled, &stable)
    );
}

#[test]
fn test_provided_signals_replace_is_shared() {
    let signals = ProvidedSignals::new(desktop());
    let provider = SignalFingerprint::new(signals.clone());
    let before = provider.fingerprint();

    let mut moved = desktop();
    moved.user_agent = "Mozilla/5.0 (Macintosh) Safari/17".to_string();
    signals.replace(moved);

    assert_ne!(provider.fingerprint(), before);
}

#[test]
fn test_host_signals_are_stable_within_process() {
    let provider = SignalFingerprint::new(HostSignals);
    assert_eq!(provider.fingerprint(), provider.fingerprint());
    assert!(HostSignals.signals().user_agent.starts_with("carevault/"));
}

#[test]
fn test_config_deserializes_snake_case() {
    let config: FingerprintConfig =
        serde_json::from_str(r#"{"signals":["user_agent","screen_resolution"]}"#).unwrap();
    assert_eq!(
        config.signals,
        vec![Signal::UserAgent, Signal::ScreenResolution]
    );

    let defaulted: FingerprintConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(defaulted.signals, Signal::ALL.to_vec());
}
