/// Итог одного угла обзора: глубина, индекс угла и медианная дальность.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRecord {
    /// Номер слоя (увеличивается после каждого записанного обзора)
    pub depth: u32,
    /// Индекс угла в обзоре (0..N-1)
    pub angle: u16,
    /// Оценка дальности в метрах
    pub distance_m: f64,
}

impl AngleRecord {
    pub fn new(
        depth: u32,
        angle: u16,
        distance_m: f64,
    ) -> Self {
        Self {
            depth,
            angle,
            distance_m,
        }
    }
}
