/// Одна выборка эхо-сигнала: интенсивность и позиция в буфере ответа.
///
/// Индекс стабилен и переводится в дальность через метры на выборку.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Интенсивность (0..=65535)
    pub intensity: u16,
    /// Позиция в буфере ответа
    pub index: u32,
}

impl Sample {
    pub fn new(
        intensity: u16,
        index: u32,
    ) -> Self {
        Self { intensity, index }
    }
}

/// Строит выборки из интенсивностей, индексируя их по порядку.
pub fn samples_from_intensities(intensities: &[u16]) -> Vec<Sample> {
    intensities
        .iter()
        .enumerate()
        .map(|(i, &intensity)| Sample::new(intensity, i as u32))
        .collect()
}
