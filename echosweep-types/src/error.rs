use thiserror::Error;

/// Результат для операций обработки сонарных данных
pub type SonarResult<T> = std::result::Result<T, SonarError>;

/// Типы ошибок ядра извлечения дальности и журнала записей.
#[derive(Debug, Error)]
pub enum SonarError {
    /// Период выборки (или скорость звука) не позволяет вычислить метры на
    /// выборку
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// После отсечения ближней зоны не осталось ни одной выборки
    #[error("No target detectable: {0}")]
    NoTarget(String),

    /// Нарушение формата полезной нагрузки или журнала
    #[error("Format violation: {0}")]
    FormatViolation(String),

    /// Некорректная запись угла (дубликат, выход за диапазон, незавершённый
    /// обзор)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SonarError {
    /// Удобные конструкторы
    pub fn invalid_timing<S: Into<String>>(s: S) -> Self {
        Self::InvalidTiming(s.into())
    }

    pub fn no_target<S: Into<String>>(s: S) -> Self {
        Self::NoTarget(s.into())
    }

    pub fn format_violation<S: Into<String>>(s: S) -> Self {
        Self::FormatViolation(s.into())
    }

    pub fn invalid_record<S: Into<String>>(s: S) -> Self {
        Self::InvalidRecord(s.into())
    }

    /// `true` для ошибок, после которых угол просто пропускается.
    pub fn is_per_angle(&self) -> bool {
        matches!(self, SonarError::InvalidTiming(_) | SonarError::NoTarget(_))
    }
}
