//! Monitor polling over fake devices.

use std::time::Duration;

use path_checker::config::{parse_config, MonitorConfig, PathConfig};
use path_checker::lifecycle::Shutdown;
use path_checker::scsi::sense::key;
use path_checker::{PathMonitor, PathState};

mod common;
use common::{ScriptedTransport, Step};

fn config_with_devices(dir: &tempfile::TempDir, names: &[&str]) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.checker.async_mode = false;
    config.checker.interval_secs = 1;
    for name in names {
        let device = dir.path().join(name);
        std::fs::write(&device, b"").unwrap();
        config.paths.push(PathConfig {
            name: name.to_string(),
            device: device.to_string_lossy().into_owned(),
            checker: None,
        });
    }
    config
}

#[test]
fn reports_each_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_devices(&dir, &["sda", "sdb"]);
    let transport = ScriptedTransport::new(
        [Step::good(), Step::sense(key::NOT_READY, 0x04, 0x0b)],
        Step::good(),
    );
    let mut monitor = PathMonitor::with_transport(&config, transport).unwrap();

    let reports = monitor.check_all();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].state, PathState::Up);
    assert_eq!(reports[1].state, PathState::Ghost);
    assert_eq!(reports[1].checker, "tur");
    assert_eq!(monitor.paths()[1].last_state(), PathState::Ghost);

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[1]["state"], "ghost");
    assert_eq!(json[1]["code"], 4);
}

#[test]
fn missing_device_is_unsupported() {
    let mut config = MonitorConfig::default();
    config.paths.push(PathConfig {
        name: "gone".into(),
        device: "/nonexistent/dev/sdz".into(),
        checker: None,
    });
    let transport = ScriptedTransport::always(Step::good());
    let mut monitor = PathMonitor::with_transport(&config, transport.clone()).unwrap();
    assert!(!monitor.paths()[0].is_open());

    let reports = monitor.check_all();
    assert_eq!(reports[0].state, PathState::Unsupported);
    assert_eq!(reports[0].message, "no usable fd");
    assert_eq!(transport.calls(), 0);
}

#[test]
fn per_path_checker_override() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_devices(&dir, &["sdc"]);
    config.paths[0].checker = Some("readsector0".into());
    let monitor = PathMonitor::with_transport(&config, ScriptedTransport::always(Step::good())).unwrap();
    assert_eq!(monitor.paths()[0].checker().name(), "readsector0");
}

#[test]
fn unknown_checker_fails_construction() {
    let mut config = parse_config("[checker]\nname = \"tur\"\n").unwrap();
    config.paths.push(PathConfig {
        name: "x".into(),
        device: "/dev/null".into(),
        checker: Some("hp_sw".into()),
    });
    assert!(PathMonitor::with_transport(&config, ScriptedTransport::always(Step::good())).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_devices(&dir, &["sdd"]);
    let transport = ScriptedTransport::always(Step::good());
    let monitor = PathMonitor::with_transport(&config, transport.clone()).unwrap();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(monitor.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(transport.calls() >= 1, "first tick polls immediately");
    shutdown.trigger();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("monitor did not stop")
        .unwrap();
}
