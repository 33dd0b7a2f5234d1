use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

use echosweep_core::{AngleOutcome, RangeExtractor, RecordSink, SealedSweep, Sweep};
use echosweep_types::{SonarError, SonarResult};
use log::{debug, info, warn};

use crate::{
    control::{SweepCommand, SweepControl},
    device::{AnglePing, SonarDevice},
    metrics::RecorderMetrics,
    RecorderConfig, RecorderError, RecorderResult,
};

/// Итог извлечения, который воркер отправляет накопителю.
type AngleResult = (u16, SonarResult<f64>);

/// Собирает обзоры с сонара и сбрасывает их в приёмник записей.
///
/// Глубина растёт на единицу после каждого успешно записанного обзора.
/// Прерванный обзор отбрасывается целиком.
pub struct SweepCollector<S: RecordSink> {
    config: RecorderConfig,
    extractor: RangeExtractor,
    sink: S,
    metrics: Arc<RecorderMetrics>,
    stop_flag: Arc<AtomicBool>,
    depth: u32,
}

impl<S: RecordSink> SweepCollector<S> {
    /// Создаёт коллектор. Возвращает также shared-ссылку на метрики.
    pub fn new(
        config: RecorderConfig,
        sink: S,
    ) -> RecorderResult<(Self, Arc<RecorderMetrics>)> {
        config.validate()?;

        let extractor = config.extractor()?;
        let metrics = RecorderMetrics::new();
        let collector = Self {
            config,
            extractor,
            sink,
            metrics: metrics.clone(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            depth: 0,
        };

        Ok((collector, metrics))
    }

    /// Флаг остановки. Устанавливается в `true` для graceful shutdown.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Глубина следующего обзора.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Цикл сессии: команда оператора → обзор → запись.
    ///
    /// Завершается по `Quit`, по флагу остановки или на первой
    /// неисправимой ошибке (устройство, формат, запись).
    pub fn run(
        &mut self,
        device: &mut dyn SonarDevice,
        control: &mut dyn SweepControl,
    ) -> RecorderResult<()> {
        let info = device.info();

        info!(
            "Starting session: {} ({} angles × {} samples, {} ticks/sample, gain {}, {} kHz, c = {:.1} m/s)",
            info.name,
            info.angle_count,
            info.sample_count,
            info.sample_period_ticks,
            info.gain_setting,
            info.transmit_frequency_khz,
            self.extractor.speed_of_sound_mps()
        );

        if info.angle_count != self.config.angle_count {
            return Err(RecorderError::Config(format!(
                "device reports {} angles, config expects {}",
                info.angle_count, self.config.angle_count
            )));
        }

        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop signal received. Ending session...");
                break;
            }

            if control.next_command(self.depth) == SweepCommand::Quit {
                info!("Session ended by operator at depth {}", self.depth);
                break;
            }

            // Ctrl+C мог прийти, пока ждали оператора
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop signal received. Ending session...");
                break;
            }

            let started = Instant::now();

            let Some(sweep) = self.collect_sweep(device)? else {
                break;
            };

            self.flush(&sweep)?;

            info!(
                "Depth {}: {} records, {} angles without target ({:.2}s)",
                sweep.depth(),
                sweep.records().len(),
                sweep.missing().len(),
                started.elapsed().as_secs_f64()
            );
        }

        Ok(())
    }

    /// Снимает один полный оборот на текущей глубине.
    ///
    /// Захват идёт в отдельном потоке по одному запросу на угол, дальность
    /// считают `workers` потоков, обзор накапливается в текущем потоке.
    /// Возвращает `Ok(None)`, если обзор прерван флагом остановки.
    pub fn collect_sweep(
        &mut self,
        device: &mut dyn SonarDevice,
    ) -> RecorderResult<Option<SealedSweep>> {
        let angle_count = self.config.angle_count;
        let capacity = self.config.channel_capacity;
        let extractor = self.extractor;
        let metrics = &self.metrics;
        let stop_flag = &self.stop_flag;
        let abort = AtomicBool::new(false);

        let mut sweep = Sweep::new(self.depth, angle_count);
        let mut failure: Option<RecorderError> = None;

        let (ping_tx, ping_rx) = crossbeam_channel::bounded::<AnglePing>(capacity);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<AngleResult>(capacity);

        let acquired = thread::scope(|s| {
            let abort = &abort;

            // Захват: последовательно, один запрос на угол
            let acquisition = s.spawn(move || -> RecorderResult<bool> {
                for angle in 0..angle_count {
                    if stop_flag.load(Ordering::Relaxed) || abort.load(Ordering::Relaxed) {
                        return Ok(false);
                    }

                    let ping = device.transmit_angle(angle)?;

                    if ping_tx.send(ping).is_err() {
                        return Err(RecorderError::Pipeline(
                            "extraction workers disconnected".into(),
                        ));
                    }
                }

                Ok(true)
            });

            for _ in 0..self.config.workers {
                let ping_rx = ping_rx.clone();
                let result_tx = result_tx.clone();

                s.spawn(move || {
                    for ping in ping_rx {
                        let result = ping
                            .samples()
                            .and_then(|samples| {
                                extractor.extract_from_ping(&samples, ping.sample_period_ticks)
                            });

                        if result_tx.send((ping.angle, result)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(ping_rx);
            drop(result_tx);

            // Накопитель: единственный владелец обзора
            for (angle, result) in result_rx.iter() {
                if failure.is_some() {
                    continue;
                }

                metrics.angles_processed.fetch_add(1, Ordering::Relaxed);

                let outcome = match result {
                    Ok(distance) => AngleOutcome::Distance(distance),
                    Err(e) if e.is_per_angle() => {
                        if matches!(e, SonarError::InvalidTiming(_)) {
                            metrics.timing_errors.fetch_add(1, Ordering::Relaxed);
                            warn!("Angle {angle}: {e}");
                        } else {
                            debug!("Angle {angle}: {e}");
                        }
                        metrics.angles_without_target.fetch_add(1, Ordering::Relaxed);
                        AngleOutcome::NoTarget
                    }
                    Err(e) => {
                        warn!("Angle {angle}: {e}. Aborting sweep");
                        failure = Some(e.into());
                        abort.store(true, Ordering::Relaxed);
                        continue;
                    }
                };

                if let Err(e) = sweep.insert(angle, outcome) {
                    failure = Some(e.into());
                    abort.store(true, Ordering::Relaxed);
                }
            }

            acquisition
                .join()
                .map_err(|_| RecorderError::Pipeline("acquisition thread panicked".into()))
        })?;

        if let Some(e) = failure {
            self.discard(&sweep, "processing error");
            return Err(e);
        }

        match acquired {
            Ok(true) => Ok(Some(sweep.seal()?)),
            Ok(false) => {
                self.discard(&sweep, "stopped");
                Ok(None)
            }
            Err(e) => {
                self.discard(&sweep, "device error");
                Err(e)
            }
        }
    }

    /// Пишет обзор в приёмник, повторяя попытку до `flush_attempts` раз.
    ///
    /// Глубина увеличивается только после успешной записи.
    pub fn flush(
        &mut self,
        sweep: &SealedSweep,
    ) -> RecorderResult<()> {
        if sweep.depth() != self.depth {
            return Err(RecorderError::Pipeline(format!(
                "sweep for depth {} flushed at depth {}",
                sweep.depth(),
                self.depth
            )));
        }

        let attempts = self.config.flush_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.sink.append_sweep(sweep) {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!("Flush attempt {attempt}/{attempts} for depth {} failed: {e}", self.depth);
                    self.metrics.flush_retries.fetch_add(1, Ordering::Relaxed);
                    attempt += 1;
                }
                Err(e) => {
                    self.metrics.flush_failures.fetch_add(1, Ordering::Relaxed);
                    return Err(RecorderError::FlushFailed {
                        attempts,
                        source: e,
                    });
                }
            }
        }

        self.metrics
            .records_written
            .fetch_add(sweep.records().len() as u64, Ordering::Relaxed);
        self.metrics.sweeps_completed.fetch_add(1, Ordering::Relaxed);
        self.depth += 1;

        Ok(())
    }

    fn discard(
        &self,
        sweep: &Sweep,
        reason: &str,
    ) {
        self.metrics.sweeps_discarded.fetch_add(1, Ordering::Relaxed);

        info!(
            "Discarding sweep at depth {} ({reason}): {}/{} angles collected",
            sweep.depth(),
            sweep.resolved(),
            sweep.angle_count()
        );
    }
}
