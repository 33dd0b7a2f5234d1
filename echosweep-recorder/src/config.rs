use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use echosweep_core::{RangeExtractor, SPEED_OF_SOUND_MPS, TICK_ONE_WAY_SECONDS};
use serde::{Deserialize, Serialize};

use crate::{RecorderError, RecorderResult};

/// Минимальный период выборки Ping360 (тики по 25 нс)
pub const MIN_SAMPLE_PERIOD_TICKS: u32 = 80;

/// Максимальный период выборки (поле протокола u16)
pub const MAX_SAMPLE_PERIOD_TICKS: u32 = u16::MAX as u32;

/// Тип сонара (выбор при старте).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Встроенный симулятор (не требует железа).
    #[serde(alias = "sim")]
    Simulated,
    /// Blue Robotics Ping360 (транспорт не входит в состав).
    Ping360,
}

/// Полная конфигурация сессии записи.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Тип сонара
    pub device: DeviceKind,
    /// Углов в одном обороте (Ping360: 400 градов)
    pub angle_count: u16,
    /// Выборок в ответе на один угол
    pub sample_count: u16,
    /// Дальность обзора (м), из неё выводится период выборки
    pub range_m: f64,
    /// Усиление приёмника (0..=2)
    pub gain_setting: u8,
    /// Частота излучения (кГц)
    pub transmit_frequency_khz: u16,
    /// Скорость звука (м/с)
    pub speed_of_sound_mps: f64,
    /// Путь к журналу записей (CSV, дозапись)
    pub output_path: PathBuf,
    /// Потоков извлечения дальности
    pub workers: usize,
    /// Ёмкость каналов между захватом, воркерами и накопителем
    pub channel_capacity: usize,
    /// Попыток записи обзора в журнал
    pub flush_attempts: u32,
    /// Seed симулятора
    pub seed: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl RecorderConfig {
    /// Загружает конфигурацию из JSON. Отсутствующие поля берутся по
    /// умолчанию.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RecorderResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| RecorderError::Config(format!("{path:?}: {e}")))
    }

    /// Проверяет согласованность параметров.
    pub fn validate(&self) -> RecorderResult<()> {
        if self.angle_count == 0 {
            return Err(RecorderError::Config("angle_count must be > 0".into()));
        }

        if self.sample_count == 0 {
            return Err(RecorderError::Config("sample_count must be > 0".into()));
        }

        if !self.range_m.is_finite() || self.range_m <= 0.0 {
            return Err(RecorderError::Config(format!(
                "range must be positive, got {}",
                self.range_m
            )));
        }

        if self.gain_setting > 2 {
            return Err(RecorderError::Config(format!(
                "gain setting must be 0..=2, got {}",
                self.gain_setting
            )));
        }

        if self.workers == 0 || self.channel_capacity == 0 || self.flush_attempts == 0 {
            return Err(RecorderError::Config(
                "workers, channel_capacity and flush_attempts must be > 0".into(),
            ));
        }

        // Скорость звука проверяет экстрактор
        self.extractor()?;

        Ok(())
    }

    /// Период выборки (тики), при котором `sample_count` выборок покрывают
    /// `range_m`.
    ///
    /// Округляется и ограничивается диапазоном, который принимает сонар.
    pub fn sample_period_ticks(&self) -> u32 {
        let per_tick = self.sample_count as f64 * self.speed_of_sound_mps * TICK_ONE_WAY_SECONDS;
        let ticks = (self.range_m / per_tick).round();

        if !ticks.is_finite() {
            return MIN_SAMPLE_PERIOD_TICKS;
        }

        (ticks as u32).clamp(MIN_SAMPLE_PERIOD_TICKS, MAX_SAMPLE_PERIOD_TICKS)
    }

    /// Экстрактор дальности с настроенной скоростью звука.
    pub fn extractor(&self) -> RecorderResult<RangeExtractor> {
        Ok(RangeExtractor::new(self.speed_of_sound_mps)?)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для DeviceKind, RecorderConfig
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for DeviceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            DeviceKind::Simulated => write!(f, "sim"),
            DeviceKind::Ping360 => write!(f, "ping360"),
        }
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sim" | "simulated" => Ok(DeviceKind::Simulated),
            "ping360" | "ping-360" => Ok(DeviceKind::Ping360),
            _ => Err(format!("Unknown device type: '{s}'. Use: sim, ping360")),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            device: DeviceKind::Simulated,
            angle_count: 400,
            sample_count: 1_200,
            range_m: 50.0,
            gain_setting: 2,
            transmit_frequency_khz: 1_000,
            speed_of_sound_mps: SPEED_OF_SOUND_MPS,
            output_path: PathBuf::from("data.csv"),
            workers: 2,
            channel_capacity: 32,
            flush_attempts: 3,
            seed: 0x5eed,
        }
    }
}

/// Парсит строку дальности в метры.
///
/// Поддерживает суффиксы: `mm`, `cm`, `m` (регистронезависимо).
///
/// # Примеры
/// ```
/// use echosweep_recorder::config::parse_range_m;
/// assert_eq!(parse_range_m("50m").unwrap(), 50.0);
/// assert_eq!(parse_range_m("250cm").unwrap(), 2.5);
/// assert_eq!(parse_range_m("20").unwrap(), 20.0);
/// ```
pub fn parse_range_m(s: &str) -> Result<f64, String> {
    let lower = s.trim().to_lowercase();

    let (num_str, div) = if let Some(v) = lower.strip_suffix("mm") {
        (v.trim(), 1_000.0)
    } else if let Some(v) = lower.strip_suffix("cm") {
        (v.trim(), 100.0)
    } else if let Some(v) = lower.strip_suffix('m') {
        (v.trim(), 1.0)
    } else {
        (lower.as_str(), 1.0)
    };

    let n: f64 = num_str
        .parse()
        .map_err(|e| format!("Invalid range value '{num_str}': {e}"))?;

    if !n.is_finite() || n <= 0.0 {
        return Err(format!("Range must be positive: '{s}'"));
    }

    Ok(n / div)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_parse_range_m() {
        assert_eq!(parse_range_m("50m").unwrap(), 50.0);
        assert_eq!(parse_range_m("50 M").unwrap(), 50.0);
        assert_eq!(parse_range_m("250cm").unwrap(), 2.5);
        assert_eq!(parse_range_m("1500mm").unwrap(), 1.5);
        assert_eq!(parse_range_m("7.5").unwrap(), 7.5);
        assert!(parse_range_m("abc").is_err());
        assert!(parse_range_m("0m").is_err());
        assert!(parse_range_m("-3").is_err());
    }

    #[test]
    fn test_device_kind_fromstr() {
        assert_eq!("sim".parse::<DeviceKind>().unwrap(), DeviceKind::Simulated);
        assert_eq!("Ping360".parse::<DeviceKind>().unwrap(), DeviceKind::Ping360);
        assert!("unknown".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = RecorderConfig::default();
        config.validate().unwrap();
        assert_eq!(config.angle_count, 400);
    }

    #[test]
    fn test_sample_period_for_default_range() {
        // 50 м / (1200 × 1475 × 12.5e-9) ≈ 2259.9
        assert_eq!(RecorderConfig::default().sample_period_ticks(), 2_260);
    }

    #[test]
    fn test_sample_period_clamped() {
        let mut config = RecorderConfig {
            range_m: 0.1,
            ..Default::default()
        };
        assert_eq!(config.sample_period_ticks(), MIN_SAMPLE_PERIOD_TICKS);

        config.range_m = 10_000.0;
        assert_eq!(config.sample_period_ticks(), MAX_SAMPLE_PERIOD_TICKS);
    }

    #[test]
    fn test_extractor_uses_configured_speed_of_sound() {
        let config = RecorderConfig {
            speed_of_sound_mps: 1_500.0,
            ..Default::default()
        };
        let extractor = config.extractor().unwrap();

        assert_eq!(extractor.speed_of_sound_mps(), 1_500.0);
        assert!((extractor.meters_per_sample(1_000).unwrap() - 0.01875).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            RecorderConfig {
                angle_count: 0,
                ..Default::default()
            },
            RecorderConfig {
                range_m: f64::NAN,
                ..Default::default()
            },
            RecorderConfig {
                gain_setting: 3,
                ..Default::default()
            },
            RecorderConfig {
                workers: 0,
                ..Default::default()
            },
            RecorderConfig {
                speed_of_sound_mps: 0.0,
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{ "device": "sim", "angle_count": 8, "output_path": "pool.csv" }}"#
        )
        .unwrap();

        let config = RecorderConfig::from_json_file(tmp.path()).unwrap();
        assert_eq!(config.device, DeviceKind::Simulated);
        assert_eq!(config.angle_count, 8);
        assert_eq!(config.output_path, PathBuf::from("pool.csv"));
        assert_eq!(config.sample_count, 1_200);
    }

    #[test]
    fn test_config_json_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"{{ "device": "sonar9000" }}"#).unwrap();

        assert!(matches!(
            RecorderConfig::from_json_file(tmp.path()),
            Err(RecorderError::Config(_))
        ));
    }
}
