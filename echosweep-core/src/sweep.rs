use echosweep_types::{AngleRecord, SonarError, SonarResult};

/// Итог обработки одного угла.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleOutcome {
    /// Оценка дальности (м)
    Distance(f64),
    /// Цель не найдена (или тайминг некорректен); угол в журнал не попадает
    NoTarget,
}

/// Накопитель одного оборота сонара.
///
/// Каждый угол `0..angle_count` получает итог ровно один раз. Обзор можно
/// запечатать только когда итог есть у всех углов.
#[derive(Debug, Clone)]
pub struct Sweep {
    depth: u32,
    outcomes: Vec<Option<AngleOutcome>>,
    resolved: usize,
}

/// Завершённый обзор, готовый к записи в журнал.
#[derive(Debug, Clone, PartialEq)]
pub struct SealedSweep {
    depth: u32,
    angle_count: u16,
    records: Vec<AngleRecord>,
    missing: Vec<u16>,
}

impl Sweep {
    pub fn new(
        depth: u32,
        angle_count: u16,
    ) -> Self {
        Self {
            depth,
            outcomes: vec![None; angle_count as usize],
            resolved: 0,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn angle_count(&self) -> u16 {
        self.outcomes.len() as u16
    }

    /// Количество углов, для которых уже есть итог.
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    /// Записывает итог угла. Повторная запись и выход за диапазон запрещены.
    pub fn insert(
        &mut self,
        angle: u16,
        outcome: AngleOutcome,
    ) -> SonarResult<()> {
        let angle_count = self.angle_count();
        let slot = self.outcomes.get_mut(angle as usize).ok_or_else(|| {
            SonarError::InvalidRecord(format!(
                "angle {angle} out of range 0..{angle_count}"
            ))
        })?;

        if slot.is_some() {
            return Err(SonarError::InvalidRecord(format!(
                "angle {angle} already recorded for depth {}",
                self.depth
            )));
        }

        if let AngleOutcome::Distance(d) = outcome {
            if !d.is_finite() || d < 0.0 {
                return Err(SonarError::InvalidRecord(format!(
                    "angle {angle}: distance {d} is not a finite non-negative value"
                )));
            }
        }

        *slot = Some(outcome);
        self.resolved += 1;

        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.resolved == self.outcomes.len()
    }

    /// Запечатывает обзор: записи по возрастанию угла плюс список углов без
    /// цели.
    pub fn seal(self) -> SonarResult<SealedSweep> {
        if !self.is_complete() {
            return Err(SonarError::InvalidRecord(format!(
                "sweep at depth {} incomplete: {}/{} angles",
                self.depth,
                self.resolved,
                self.outcomes.len()
            )));
        }

        let angle_count = self.angle_count();
        let mut records = Vec::with_capacity(self.outcomes.len());
        let mut missing = Vec::new();

        for (angle, outcome) in self.outcomes.into_iter().enumerate() {
            match outcome {
                Some(AngleOutcome::Distance(d)) => {
                    records.push(AngleRecord::new(self.depth, angle as u16, d))
                }
                _ => missing.push(angle as u16),
            }
        }

        Ok(SealedSweep {
            depth: self.depth,
            angle_count,
            records,
            missing,
        })
    }
}

impl SealedSweep {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn angle_count(&self) -> u16 {
        self.angle_count
    }

    /// Записи с найденной дальностью, по возрастанию угла.
    pub fn records(&self) -> &[AngleRecord] {
        &self.records
    }

    /// Углы без цели.
    pub fn missing(&self) -> &[u16] {
        &self.missing
    }
}
