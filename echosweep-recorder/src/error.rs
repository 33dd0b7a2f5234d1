use echosweep_types::SonarError;
use thiserror::Error;

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Сонар не найден или транспорт не поддерживается
    #[error("Sonar device not found: {0}")]
    DeviceNotFound(String),

    /// Ошибка сонара во время обзора
    #[error("Sonar device error: {0}")]
    DeviceError(String),

    /// Ошибка ядра (формат, журнал, тайминг)
    #[error("Sonar error: {0}")]
    Sonar(#[from] SonarError),

    /// Ошибка ввода/вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректная конфигурация
    #[error("Config error: {0}")]
    Config(String),

    /// Ошибка пайплайна (inter-thread)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Обзор не удалось записать после всех попыток
    #[error("Flush failed after {attempts} attempts: {source}")]
    FlushFailed {
        attempts: u32,
        #[source]
        source: SonarError,
    },
}
