#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use loadprobe_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
stress:
  memory:
    cap_mbz: 100 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INVALID_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.server.listen, "0.0.0.0:5000");
    assert_eq!(cfg.sampler.interval_ms, 1000);
    assert_eq!(cfg.sampler.cpu_window_ms, 100);
    assert_eq!(cfg.stress.cpu.batch_size, 1_000_000);
    assert_eq!(cfg.stress.cpu.yield_ms, 10);
    assert_eq!(cfg.stress.memory.cap_units(), 10);
    assert_eq!(cfg.stress.memory.unit_bytes(), 10 * 1024 * 1024);
    assert!(cfg.logging.file.is_none());
}

#[test]
fn full_config_overrides_defaults() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
sampler:
  interval_ms: 500
  cpu_window_ms: 50
stress:
  cpu: { batch_size: 5000, yield_ms: 0 }
  memory: { unit_mb: 5, cap_mb: 20, step_interval_ms: 250 }
latency: { home_max_ms: 0, slow_min_ms: 10, slow_max_ms: 10 }
logging:
  file: "/tmp/loadprobe.log"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 9000);
    assert_eq!(cfg.stress.memory.cap_units(), 4);
    assert_eq!(cfg.stress.cpu.batch_size, 5000);
    assert_eq!(cfg.logging.file.as_deref(), Some("/tmp/loadprobe.log"));
}

#[test]
fn rejects_wrong_version() {
    assert!(config::load_from_str("version: 2\n").is_err());
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        "version: 1\nstress: { memory: { unit_mb: 10, cap_mb: 5 } }\n",
        "version: 1\nstress: { cpu: { batch_size: 0 } }\n",
        "version: 1\nlatency: { slow_min_ms: 3000, slow_max_ms: 1000 }\n",
        "version: 1\nsampler: { interval_ms: 1000, cpu_window_ms: 1000 }\n",
        "version: 1\nserver: { listen: \"not-an-addr\" }\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.client_code().as_str(), "INVALID_CONFIG", "{yaml}");
    }
}

#[test]
fn shipped_config_parses() {
    let cfg = config::load_from_str(include_str!("../../../loadprobe.yaml")).expect("must parse");
    assert_eq!(cfg.stress.memory.cap_units(), 10);
    assert!(cfg.logging.file.is_none());
}

#[test]
fn memory_cap_rounds_up_to_whole_units() {
    let cfg = config::load_from_str("version: 1\nstress: { memory: { unit_mb: 2, cap_mb: 5 } }\n")
        .expect("must parse");
    assert_eq!(cfg.stress.memory.cap_units(), 3);

    let exact = config::load_from_str("version: 1\nstress: { memory: { unit_mb: 5, cap_mb: 20 } }\n")
        .expect("must parse");
    assert_eq!(exact.stress.memory.cap_units(), 4);
}
