// Симулятор изображает бассейн прямоугольной формы: головка сонара стоит не в
// центре, поэтому дальность до стенки зависит от угла. Профиль луча похож на
// настоящий Ping360: звон у датчика, шумовой фон, резкий фронт эха от стенки с
// затуханием и изредка ложное сильное отражение дальше стенки.
// Генератор случайных чисел с seed, поэтому обзоры воспроизводимы.

use std::{
    f64::consts::TAU,
    time::{SystemTime, UNIX_EPOCH},
};

use echosweep_core::{decode_intensities, encode_intensities, meters_per_sample_with};
use echosweep_types::{IntensityFormat, Sample, SonarResult};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{DeviceKind, RecorderConfig, RecorderError, RecorderResult};

/// Источник данных обзора: один запрос к сонару на один угол.
// Реализация: [`SimulatedSonar`]; транспорт Ping360 подключается снаружи
// через этот же трейт.
pub trait SonarDevice: Send {
    /// Информация об устройстве
    fn info(&self) -> DeviceInfo;

    /// Поворачивает головку на `angle`, излучает и возвращает ответ.
    /// Блокируется до получения ответа.
    fn transmit_angle(
        &mut self,
        angle: u16,
    ) -> RecorderResult<AnglePing>;
}

/// Ответ сонара на один угол.
#[derive(Debug, Clone)]
pub struct AnglePing {
    /// Индекс угла
    pub angle: u16,
    /// Период выборки этого ответа (тики по 25 нс)
    pub sample_period_ticks: u32,
    /// Кодирование интенсивностей в `payload`
    pub format: IntensityFormat,
    /// Unix timestamp ответа (наносекунды)
    pub timestamp_ns: u64,
    /// Сырые байты интенсивностей
    pub payload: Vec<u8>,
}

/// Информация об устройстве (для логирования).
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub serial: Option<String>,
    pub angle_count: u16,
    pub sample_count: u16,
    pub sample_period_ticks: u32,
    pub gain_setting: u8,
    pub transmit_frequency_khz: u16,
    pub format: IntensityFormat,
}

/// Синтетический сонар в прямоугольном бассейне.
pub struct SimulatedSonar {
    pub angle_count: u16,
    pub sample_count: u16,
    pub sample_period_ticks: u32,
    pub gain_setting: u8,
    pub transmit_frequency_khz: u16,
    pub speed_of_sound_mps: f64,
    pub format: IntensityFormat,
    /// Размеры бассейна по X и Y (м)
    pub pool_size_m: (f64, f64),
    /// Положение головки относительно центра бассейна (м)
    pub head_offset_m: (f64, f64),
    /// Вероятность ложного отражения за стенкой
    pub spurious_probability: f64,
    /// Углы, на которых ответ приходит пустым
    pub dropouts: Vec<u16>,
    rng: StdRng,
}

impl AnglePing {
    /// Декодирует полезную нагрузку в выборки.
    pub fn samples(&self) -> SonarResult<Vec<Sample>> {
        decode_intensities(&self.payload, self.format)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedSonar {
    pub fn new(
        angle_count: u16,
        sample_count: u16,
        sample_period_ticks: u32,
        seed: u64,
    ) -> Self {
        Self {
            angle_count,
            sample_count,
            sample_period_ticks,
            gain_setting: 2,
            transmit_frequency_khz: 1_000,
            speed_of_sound_mps: echosweep_core::SPEED_OF_SOUND_MPS,
            format: IntensityFormat::U8,
            pool_size_m: (12.0, 25.0),
            head_offset_m: (1.0, -2.0),
            spurious_probability: 0.05,
            dropouts: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &RecorderConfig) -> Self {
        let mut sonar = Self::new(
            config.angle_count,
            config.sample_count,
            config.sample_period_ticks(),
            config.seed,
        );
        sonar.gain_setting = config.gain_setting;
        sonar.transmit_frequency_khz = config.transmit_frequency_khz;
        sonar.speed_of_sound_mps = config.speed_of_sound_mps;
        sonar
    }

    /// Дальность от головки до стенки бассейна вдоль угла (м).
    pub fn wall_range_m(
        &self,
        angle: u16,
    ) -> f64 {
        let theta = TAU * angle as f64 / self.angle_count.max(1) as f64;
        let (dx, dy) = (theta.cos(), theta.sin());
        let (px, py) = self.head_offset_m;
        let (hw, hl) = (self.pool_size_m.0 / 2.0, self.pool_size_m.1 / 2.0);

        let mut t = f64::INFINITY;

        if dx.abs() > 1e-12 {
            let wall_x = if dx > 0.0 { hw } else { -hw };
            t = t.min((wall_x - px) / dx);
        }

        if dy.abs() > 1e-12 {
            let wall_y = if dy > 0.0 { hl } else { -hl };
            t = t.min((wall_y - py) / dy);
        }

        t
    }

    /// Профиль интенсивностей луча в шкале 0..=255.
    fn profile(
        &mut self,
        angle: u16,
        mps: f64,
    ) -> Vec<f64> {
        let wall = self.wall_range_m(angle);
        let gain = 0.5 + 0.25 * self.gain_setting.min(2) as f64;
        let spurious = self
            .rng
            .gen_bool(self.spurious_probability.clamp(0.0, 1.0))
            .then_some(wall * 1.6);

        (0..self.sample_count)
            .map(|i| {
                let r = i as f64 * mps;
                let mut v = self.rng.gen_range(0.0..12.0);

                // звон датчика
                if r < 1.0 {
                    v += 200.0 * (1.0 - r);
                }

                // фронт и затухание эха от стенки
                if r >= wall {
                    v += 220.0 * gain * (-(r - wall) / 0.6).exp();
                } else {
                    v += 220.0 * gain * (-((wall - r) / 0.05).powi(2)).exp();
                }

                if let Some(s) = spurious {
                    if (r - s).abs() < mps / 2.0 {
                        v = 255.0;
                    }
                }

                v.min(255.0)
            })
            .collect()
    }
}

impl SonarDevice for SimulatedSonar {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Simulated Ping360".to_string(),
            serial: Some("SIM-360-0001".to_string()),
            angle_count: self.angle_count,
            sample_count: self.sample_count,
            sample_period_ticks: self.sample_period_ticks,
            gain_setting: self.gain_setting,
            transmit_frequency_khz: self.transmit_frequency_khz,
            format: self.format,
        }
    }

    fn transmit_angle(
        &mut self,
        angle: u16,
    ) -> RecorderResult<AnglePing> {
        if angle >= self.angle_count {
            return Err(RecorderError::DeviceError(format!(
                "angle {angle} outside 0..{}",
                self.angle_count
            )));
        }

        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        let payload = if self.dropouts.contains(&angle) {
            Vec::new()
        } else {
            let mps = meters_per_sample_with(self.sample_period_ticks, self.speed_of_sound_mps)?;
            let scale = match self.format {
                IntensityFormat::U8 => 1.0,
                IntensityFormat::U16Be => 257.0,
            };
            let intensities: Vec<u16> = self
                .profile(angle, mps)
                .into_iter()
                .map(|v| (v * scale).round() as u16)
                .collect();

            encode_intensities(&intensities, self.format)
        };

        Ok(AnglePing {
            angle,
            sample_period_ticks: self.sample_period_ticks,
            format: self.format,
            timestamp_ns,
            payload,
        })
    }
}

/// Создаёт нужное устройство по конфигурации.
pub fn create_device(config: &RecorderConfig) -> RecorderResult<Box<dyn SonarDevice>> {
    match config.device {
        DeviceKind::Simulated => Ok(Box::new(SimulatedSonar::from_config(config))),
        DeviceKind::Ping360 => Err(RecorderError::DeviceNotFound(
            "Ping360 transport is not built in; provide a SonarDevice implementation for your link"
                .to_string(),
        )),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
