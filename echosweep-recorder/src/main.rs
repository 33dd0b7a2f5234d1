use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    process,
    sync::atomic::Ordering,
    time::Instant,
};

use clap::Parser;
use echosweep_core::{outline_layers, read_record_log, write_outline_csv, RecordLog};
use echosweep_recorder::{
    create_device, parse_range_m, BatchControl, DeviceKind, PromptControl, RecorderConfig,
    RecorderResult, SweepCollector, SweepControl,
};
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "echosweep-recorder",
    version = env!("CARGO_PKG_VERSION"),
    about = "Record sonar sweeps as depth/angle/range rows in a CSV log",
    long_about = None,
)]
struct Cli {
    /// Базовая конфигурация (JSON); флаги ниже её переопределяют
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Сонар: sim, ping360
    #[arg(short, long)]
    device: Option<String>,
    /// Дальность обзора (50, 50m, 500cm)
    #[arg(short, long)]
    range: Option<String>,
    /// Выборок на угол
    #[arg(long)]
    samples: Option<u16>,
    /// Углов в обороте
    #[arg(long)]
    angles: Option<u16>,
    /// Усиление приёмника (0..=2)
    #[arg(short, long)]
    gain: Option<u8>,
    /// Частота излучения, кГц
    #[arg(long)]
    frequency: Option<u16>,
    /// Скорость звука, м/с
    #[arg(long)]
    speed_of_sound: Option<f64>,
    /// Журнал записей (дописывается)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Потоков извлечения дальности
    #[arg(short, long)]
    workers: Option<usize>,
    /// Seed симулятора
    #[arg(long)]
    seed: Option<u64>,
    /// Снять N обзоров без подтверждения. По умолчанию: Enter перед каждым
    #[arg(short, long)]
    sweeps: Option<u32>,
    /// Без подтверждений до Ctrl+C
    #[arg(long, conflicts_with = "sweeps")]
    continuous: bool,
    /// После сессии записать контур (Depth,X,Y) из журнала
    #[arg(long)]
    outline: Option<PathBuf>,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

fn build_config(cli: &Cli) -> Result<RecorderConfig, String> {
    let mut config = match &cli.config {
        Some(path) => RecorderConfig::from_json_file(path).map_err(|e| format!("--config: {e}"))?,
        None => RecorderConfig::default(),
    };

    if let Some(device) = &cli.device {
        config.device = device.parse::<DeviceKind>()?;
    }

    if let Some(range) = &cli.range {
        config.range_m = parse_range_m(range).map_err(|e| format!("--range: {e}"))?;
    }

    if let Some(samples) = cli.samples {
        config.sample_count = samples;
    }

    if let Some(angles) = cli.angles {
        config.angle_count = angles;
    }

    if let Some(gain) = cli.gain {
        config.gain_setting = gain;
    }

    if let Some(frequency) = cli.frequency {
        config.transmit_frequency_khz = frequency;
    }

    if let Some(c) = cli.speed_of_sound {
        config.speed_of_sound_mps = c;
    }

    if let Some(output) = &cli.output {
        config.output_path = output.clone();
    }

    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    config.validate().map_err(|e| e.to_string())?;

    Ok(config)
}

fn export_outline(
    log_path: &Path,
    angle_count: u16,
    out_path: &Path,
) -> RecorderResult<usize> {
    let records = read_record_log(log_path)?;
    let layers = outline_layers(&records, angle_count)?;

    write_outline_csv(&layers, BufWriter::new(File::create(out_path)?))?;

    Ok(layers.len())
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet { "error" } else { "info" };

    env_logger::Builder::new()
        .filter_level(level.parse().unwrap_or(log::LevelFilter::Info))
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let mut device = match create_device(&config) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to open device: {e}");
            process::exit(1);
        }
    };

    let log = match RecordLog::open(&config.output_path) {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to open record log {:?}: {e}", config.output_path);
            process::exit(1);
        }
    };

    let (mut collector, metrics) = match SweepCollector::new(config.clone(), log) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let stop_ctrlc = collector.stop_flag();
    let interactive = !cli.continuous && cli.sweeps.is_none();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C: принудительный выход
            warn!("Force exit");
            process::exit(130);
        }

        if interactive {
            // Чтение stdin не прерывается сигналом
            warn!("Ctrl+C received. Press Enter to end the session, Ctrl+C again to force exit");
        } else {
            warn!("Ctrl+C received. Current sweep will be discarded");
        }
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Device        : {}", config.device);
    info!("  Angles        : {}", config.angle_count);
    info!(
        "  Range         : {:.2} m ({} samples, {} ticks)",
        config.range_m,
        config.sample_count,
        config.sample_period_ticks()
    );
    info!("  Speed of sound: {:.1} m/s", config.speed_of_sound_mps);
    info!("  Workers       : {}", config.workers);
    info!("  Output        : {:?}", config.output_path);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut control: Box<dyn SweepControl> = if cli.continuous {
        Box::new(BatchControl::new(None))
    } else if let Some(n) = cli.sweeps {
        Box::new(BatchControl::new(Some(n)))
    } else {
        Box::new(
            PromptControl::new(io::stdin().lock(), io::stderr())
                .with_stop_flag(collector.stop_flag()),
        )
    };

    let session_start = Instant::now();
    let result = collector.run(device.as_mut(), control.as_mut());

    // --- Итоговая статистика ---
    let summary = metrics.summary(&session_start);
    info!("\n{summary}");

    if let Err(e) = result {
        error!("Session failed at depth {}: {e}", collector.depth());
        process::exit(1);
    }

    if summary.timing_errors > 0 {
        warn!(
            "⚠ {} angles reported an invalid sample period. Check --range and --samples",
            summary.timing_errors
        );
    }

    if let Some(out) = &cli.outline {
        match export_outline(&config.output_path, config.angle_count, out) {
            Ok(n) => info!("Outline: {n} depth layers → {out:?}"),
            Err(e) => {
                error!("Outline export failed: {e}");
                process::exit(1);
            }
        }
    }

    info!(
        "✓ Session complete: {} sweeps, {} rows → {:?}",
        summary.sweeps_completed,
        collector.sink().rows_written(),
        collector.sink().path()
    );
}
