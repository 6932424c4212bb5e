use groover_config::{Config, load_toml};
use rstest::rstest;

#[test]
fn empty_toml_yields_tuned_defaults_and_validates() {
    let cfg = load_toml("").expect("empty config parses");
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.sampling.rate_hz, 8_000);
    assert_eq!(cfg.sampling.block_samples, 160);
    assert_eq!(cfg.sampling.mic_offset, 1_523);
    assert_eq!(cfg.beat.window_epochs, 50);
    assert_eq!(cfg.beat.gate_ms, 650);
    assert!((cfg.beat.threshold - 2.4).abs() < 1e-6);
    assert!((cfg.balance.kp - 6.65).abs() < 1e-6);
    assert_eq!(cfg.balance.loop_period_us, 20_000);
    assert!((cfg.balance.target_deg + 0.3).abs() < 1e-6);
}

#[test]
fn full_file_overrides_defaults() {
    let text = r#"
[sampling]
rate_hz = 4000
block_samples = 128

[beat]
threshold = 3.0
gate_ms = 500
phrase_bands = [{ until_ms = 10000, routine = 1 }, { until_ms = 30000, routine = 2 }]
fallback_routine = 3

[balance]
kp = 5.0
target_deg = 0.0
integral_limit = 400.0

[session]
max_run_ms = 30000
"#;
    let cfg = load_toml(text).expect("parses");
    cfg.validate().expect("valid");
    assert_eq!(cfg.sampling.rate_hz, 4000);
    assert_eq!(cfg.sampling.mic_offset, 1_523); // untouched default
    assert_eq!(cfg.beat.phrase_bands.len(), 2);
    assert_eq!(cfg.beat.phrase_bands[0].until_ms, 10_000);
    assert_eq!(cfg.balance.integral_limit, Some(400.0));
    assert_eq!(cfg.session.max_run_ms, 30_000);
}

#[test]
fn phrase_bands_accept_tuple_form() {
    let text = r#"
[beat]
phrase_bands = [[20868, 1], [62592, 2]]
"#;
    let cfg = load_toml(text).expect("parses");
    assert_eq!(cfg.beat.phrase_bands[1].until_ms, 62_592);
    assert_eq!(cfg.beat.phrase_bands[1].routine, 2);
}

#[rstest]
#[case("[sampling]\nrate_hz = 0\n", "rate_hz")]
#[case("[beat]\nthreshold = 0.0\n", "threshold")]
#[case("[beat]\ngate_ms = 0\n", "gate_ms")]
#[case(
    "[beat]\nphrase_bands = [[30000, 1], [20000, 2]]\n",
    "phrase_bands"
)]
#[case("[beat]\nphrase_bands = [[20000, 7]]\n", "routine")]
#[case("[balance]\nfilter_alpha = 1.5\n", "filter_alpha")]
#[case("[balance]\nloop_period_us = 0\n", "loop_period_us")]
#[case("[balance]\nintegral_limit = -1.0\n", "integral_limit")]
#[case("[drive]\nduty_pct = 140.0\n", "duty_pct")]
#[case("[session]\npoll_us = 0\n", "poll_us")]
fn out_of_range_values_are_rejected(#[case] text: &str, #[case] needle: &str) {
    let cfg = load_toml(text).expect("parses");
    let err = cfg.validate().expect_err("must fail validation");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "error `{msg}` should mention {needle}");
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("groover.toml");
    std::fs::write(&path, "[balance]\nkp = 7.0\n").expect("write");
    let cfg = Config::load(&path).expect("loads");
    assert!((cfg.balance.kp - 7.0).abs() < 1e-6);

    let err = Config::load(&dir.path().join("missing.toml")).expect_err("missing file");
    assert!(format!("{err}").contains("failed to read"));
}
