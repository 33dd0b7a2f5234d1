//! Извлечение дальности до цели из одного луча сканирующего сонара.
//!
//! Каждый луч (угол) возвращает буфер интенсивностей. Индекс выборки
//! переводится в дальность через метры на выборку, после чего из сильных
//! отражений выбирается ближайший кластер и берётся его медиана:
//!
//! 1. отбрасываются выборки ближе [`MIN_RANGE_M`] (звон датчика);
//! 2. оставшиеся сортируются по убыванию интенсивности, при равенстве по
//!    возрастанию индекса, берутся первые [`TOP_INTENSITY_COUNT`];
//! 3. их дальности сортируются по возрастанию, берутся первые
//!    [`CLOSEST_CLUSTER_COUNT`];
//! 4. результат медиана этого подмножества.
//!
//! Всё в модуле чистые функции без состояния.

use echosweep_types::{Sample, SonarError, SonarResult};

/// Скорость звука в воде по умолчанию (м/с)
pub const SPEED_OF_SOUND_MPS: f64 = 1475.0;

/// Длительность тика периода выборки (25 нс), уже поделённая на 2 для пути
/// туда-обратно. Больше нигде не делим.
pub const TICK_ONE_WAY_SECONDS: f64 = 12.5e-9;

/// Минимальная дальность (м): всё ближе считается звоном ближней зоны
pub const MIN_RANGE_M: f64 = 2.0;

/// Сколько самых сильных выборок участвует в оценке
pub const TOP_INTENSITY_COUNT: usize = 20;

/// Сколько ближайших из сильных выборок идёт в медиану
pub const CLOSEST_CLUSTER_COUNT: usize = 10;

/// Дальность (м) для индекса выборки.
pub fn compute_distance(
    sample_index: u32,
    meters_per_sample: f64,
) -> f64 {
    sample_index as f64 * meters_per_sample
}

/// Метры дальности на одну выборку при скорости звука по умолчанию.
///
/// # Примеры
/// ```
/// use echosweep_core::range::meters_per_sample;
/// let mps = meters_per_sample(80).unwrap();
/// assert!((mps - 1475.0 * 80.0 * 12.5e-9).abs() < 1e-15);
/// assert!(meters_per_sample(0).is_err());
/// ```
pub fn meters_per_sample(sample_period_ticks: u32) -> SonarResult<f64> {
    meters_per_sample_with(sample_period_ticks, SPEED_OF_SOUND_MPS)
}

/// Метры дальности на одну выборку для заданной скорости звука.
///
/// Нулевой период и неположительная/нечисловая скорость звука дают
/// [`SonarError::InvalidTiming`]; значение не подменяется.
pub fn meters_per_sample_with(
    sample_period_ticks: u32,
    speed_of_sound_mps: f64,
) -> SonarResult<f64> {
    if sample_period_ticks == 0 {
        return Err(SonarError::invalid_timing("sample period is 0 ticks"));
    }

    validate_speed_of_sound(speed_of_sound_mps)?;

    Ok(speed_of_sound_mps * sample_period_ticks as f64 * TICK_ONE_WAY_SECONDS)
}

/// Оценка дальности по выборкам одного угла (политика по умолчанию).
pub fn extract_distance(
    samples: &[Sample],
    meters_per_sample: f64,
) -> SonarResult<f64> {
    RangeExtractor::default().extract(samples, meters_per_sample)
}

/// Медиана уже отсортированного по возрастанию среза.
///
/// Для чётной длины среднее двух центральных значений, `None` для пустого.
pub fn median_sorted(values: &[f64]) -> Option<f64> {
    let n = values.len();

    if n == 0 {
        return None;
    }

    let mid = n / 2;

    if n % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Экстрактор дальности с настраиваемой скоростью звука.
///
/// Пороги (ближняя зона, top-K, размер кластера) фиксированы константами
/// модуля.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeExtractor {
    speed_of_sound_mps: f64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl RangeExtractor {
    /// Создаёт экстрактор для заданной скорости звука (м/с).
    pub fn new(speed_of_sound_mps: f64) -> SonarResult<Self> {
        validate_speed_of_sound(speed_of_sound_mps)?;

        Ok(Self { speed_of_sound_mps })
    }

    pub fn speed_of_sound_mps(&self) -> f64 {
        self.speed_of_sound_mps
    }

    /// Метры на выборку для периода выборки устройства.
    pub fn meters_per_sample(
        &self,
        sample_period_ticks: u32,
    ) -> SonarResult<f64> {
        meters_per_sample_with(sample_period_ticks, self.speed_of_sound_mps)
    }

    /// Оценивает дальность до цели по выборкам одного угла.
    ///
    /// Результат не зависит от порядка выборок во входном срезе.
    pub fn extract(
        &self,
        samples: &[Sample],
        meters_per_sample: f64,
    ) -> SonarResult<f64> {
        if !meters_per_sample.is_finite() || meters_per_sample <= 0.0 {
            return Err(SonarError::InvalidTiming(format!(
                "meters per sample must be positive, got {meters_per_sample}"
            )));
        }

        if samples.is_empty() {
            return Err(SonarError::no_target("empty sample sequence"));
        }

        let mut strongest: Vec<Sample> = samples
            .iter()
            .copied()
            .filter(|s| compute_distance(s.index, meters_per_sample) >= MIN_RANGE_M)
            .collect();

        if strongest.is_empty() {
            return Err(SonarError::NoTarget(format!(
                "all {} samples are closer than {MIN_RANGE_M} m",
                samples.len()
            )));
        }

        strongest.sort_unstable_by(|a, b| {
            b.intensity
                .cmp(&a.intensity)
                .then_with(|| a.index.cmp(&b.index))
        });
        strongest.truncate(TOP_INTENSITY_COUNT);

        let mut distances: Vec<f64> = strongest
            .iter()
            .map(|s| compute_distance(s.index, meters_per_sample))
            .collect();

        distances.sort_unstable_by(f64::total_cmp);
        distances.truncate(CLOSEST_CLUSTER_COUNT);

        median_sorted(&distances)
            .ok_or_else(|| SonarError::no_target("no candidate distances left"))
    }

    /// Переводит период выборки в метры и сразу оценивает дальность.
    pub fn extract_from_ping(
        &self,
        samples: &[Sample],
        sample_period_ticks: u32,
    ) -> SonarResult<f64> {
        let mps = self.meters_per_sample(sample_period_ticks)?;
        self.extract(samples, mps)
    }
}

impl Default for RangeExtractor {
    fn default() -> Self {
        Self {
            speed_of_sound_mps: SPEED_OF_SOUND_MPS,
        }
    }
}

fn validate_speed_of_sound(speed_of_sound_mps: f64) -> SonarResult<()> {
    if !speed_of_sound_mps.is_finite() || speed_of_sound_mps <= 0.0 {
        return Err(SonarError::InvalidTiming(format!(
            "speed of sound must be positive, got {speed_of_sound_mps}"
        )));
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
