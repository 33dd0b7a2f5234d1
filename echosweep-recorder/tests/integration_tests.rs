use std::io::{Cursor, Write};

use echosweep_core::{outline_layers, read_record_log, write_outline_csv, RecordLog};
use echosweep_recorder::{
    create_device, BatchControl, PromptControl, RecorderConfig, SimulatedSonar, SonarDevice,
    SweepCollector,
};
use tempfile::{tempdir, NamedTempFile};

// ===========================================================================
// Helpers
// ===========================================================================

fn small_config() -> RecorderConfig {
    RecorderConfig {
        angle_count: 40,
        sample_count: 1_200,
        range_m: 25.0,
        workers: 4,
        channel_capacity: 8,
        ..Default::default()
    }
}

// ===========================================================================
// Тесты
// ===========================================================================

#[test]
fn test_prompt_session_appends_to_log() {
    let dir = tempdir().unwrap();
    let config = RecorderConfig {
        output_path: dir.path().join("pool.csv"),
        ..small_config()
    };
    let mut device = create_device(&config).unwrap();

    // Два Enter, затем q
    let mut control = PromptControl::new(Cursor::new("\n\nq\n"), std::io::sink());
    let log = RecordLog::open(&config.output_path).unwrap();
    let (mut collector, metrics) = SweepCollector::new(config.clone(), log).unwrap();

    collector.run(device.as_mut(), &mut control).unwrap();

    let summary = metrics.summary(&std::time::Instant::now());
    assert_eq!(summary.sweeps_completed, 2);
    assert_eq!(summary.sweeps_discarded, 0);

    let records = read_record_log(&config.output_path).unwrap();
    assert_eq!(records.len() as u64, summary.records_written);
    assert_eq!(records.first().map(|r| r.depth), Some(0));
    assert_eq!(records.last().map(|r| r.depth), Some(1));
}

#[test]
fn test_new_session_continues_existing_log() {
    let tmp = NamedTempFile::new().unwrap();
    let config = small_config();

    for _ in 0..2 {
        let mut device = SimulatedSonar::from_config(&config);
        let log = RecordLog::open(tmp.path()).unwrap();
        let (mut collector, _) = SweepCollector::new(config.clone(), log).unwrap();
        collector
            .run(&mut device, &mut BatchControl::new(Some(1)))
            .unwrap();
    }

    let text = std::fs::read_to_string(tmp.path()).unwrap();
    assert_eq!(text.matches("Depth,Angle,Median Distance").count(), 1);

    // Каждая сессия начинает с глубины 0; подряд идущие строки одной глубины
    // образуют один слой
    let records = read_record_log(tmp.path()).unwrap();
    let layers = outline_layers(&records, config.angle_count).unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].points.len(), records.len());
}

#[test]
fn test_outline_matches_pool_geometry() {
    let tmp = NamedTempFile::new().unwrap();
    let config = small_config();
    let mut device = SimulatedSonar::from_config(&config);
    device.spurious_probability = 0.0;

    let log = RecordLog::open(tmp.path()).unwrap();
    let (mut collector, _) = SweepCollector::new(config.clone(), log).unwrap();
    collector
        .run(&mut device, &mut BatchControl::new(Some(3)))
        .unwrap();

    let records = read_record_log(tmp.path()).unwrap();
    let layers = outline_layers(&records, config.angle_count).unwrap();
    assert_eq!(layers.len(), 3);

    // Бассейн 12 × 25 м, головка смещена на (1, -2)
    for layer in &layers {
        assert_eq!(layer.points.len(), 40);
        assert!((layer.bounds.width() - 12.0).abs() < 1.0, "{:?}", layer.bounds);
        assert!((layer.bounds.height() - 25.0).abs() < 1.0, "{:?}", layer.bounds);
    }

    let mut csv = Vec::new();
    write_outline_csv(&layers, &mut csv).unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert_eq!(text.lines().count(), 1 + 3 * 40);
}

#[test]
fn test_config_file_drives_session() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("from_json.csv");

    let mut cfg_file = NamedTempFile::new().unwrap();
    write!(
        cfg_file,
        r#"{{ "device": "sim", "angle_count": 8, "range_m": 30.0, "output_path": {:?} }}"#,
        out.to_string_lossy()
    )
    .unwrap();

    let config = RecorderConfig::from_json_file(cfg_file.path()).unwrap();
    config.validate().unwrap();

    let mut device = create_device(&config).unwrap();
    assert_eq!(device.info().angle_count, 8);

    let log = RecordLog::open(&config.output_path).unwrap();
    let (mut collector, _) = SweepCollector::new(config, log).unwrap();
    collector
        .run(device.as_mut(), &mut BatchControl::new(Some(1)))
        .unwrap();

    let records = read_record_log(&out).unwrap();
    assert_eq!(records.len(), 8);
    assert!(records.iter().enumerate().all(|(i, r)| r.angle == i as u16));
}
