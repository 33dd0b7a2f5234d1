//! Ядро обработки сонарных обзоров
//!
//! Извлечение дальности до цели из интенсивностей одного луча, накопление
//! обзора по углам, журнал записей (CSV) и перевод записей в контур.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use echosweep_core::{decode_intensities, AngleOutcome, RangeExtractor, RecordLog, RecordSink, Sweep};
//! use echosweep_types::IntensityFormat;
//!
//! let extractor = RangeExtractor::default();
//! let mut sweep = Sweep::new(0, 1);
//!
//! let payload = vec![0u8; 1200];
//! let samples = decode_intensities(&payload, IntensityFormat::U8)?;
//! let outcome = match extractor.extract_from_ping(&samples, 2_260) {
//!     Ok(d) => AngleOutcome::Distance(d),
//!     Err(_) => AngleOutcome::NoTarget,
//! };
//! sweep.insert(0, outcome)?;
//!
//! let mut log = RecordLog::open("data.csv")?;
//! log.append_sweep(&sweep.seal()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod decode;
pub mod format;
pub mod outline;
pub mod range;
pub mod sweep;

pub use decode::*;
pub use echosweep_types::{
    samples_from_intensities, AngleRecord, IntensityFormat, Sample, SonarError, SonarResult,
};
pub use format::*;
pub use outline::*;
pub use range::*;
pub use sweep::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
