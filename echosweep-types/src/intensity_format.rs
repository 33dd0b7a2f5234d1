/// Кодирование интенсивностей в полезной нагрузке ответа сонара
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntensityFormat {
    /// 1 байт на выборку (нативный формат Ping360)
    #[default]
    U8,
    /// 2 байта на выборку, big-endian
    U16Be,
}

impl IntensityFormat {
    /// Размер одной выборки в байтах
    pub fn sample_size(&self) -> usize {
        match self {
            IntensityFormat::U8 => 1,
            IntensityFormat::U16Be => 2,
        }
    }
}
