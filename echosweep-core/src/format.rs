//! Журнал записей углов (CSV).
//!
//! Файл дописывается только в конец: заголовок `Depth,Angle,Median Distance`
//! пишется один раз в пустой файл, затем по строке на угол каждого
//! завершённого обзора. Ранее записанные строки никогда не переписываются.
//! Дальность пишется в кратчайшем представлении, которое читается обратно
//! без потерь.

use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Lines, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use echosweep_types::{AngleRecord, SonarError, SonarResult};
use log::{debug, warn};

use crate::sweep::SealedSweep;

/// Строка заголовка журнала
pub const RECORD_LOG_HEADER: &str = "Depth,Angle,Median Distance";

const HEADER_FIELDS: [&str; 3] = ["depth", "angle", "median distance"];

/// Приёмник завершённых обзоров.
pub trait RecordSink {
    /// Дописывает все записи обзора. Либо записан весь обзор, либо ничего.
    fn append_sweep(
        &mut self,
        sweep: &SealedSweep,
    ) -> SonarResult<()>;
}

/// Файловый журнал записей в режиме дозаписи.
pub struct RecordLog {
    file: File,
    path: PathBuf,
    rows_written: u64,
}

/// Потоковый читатель журнала записей.
pub struct RecordReader<R: Read> {
    lines: Lines<BufReader<R>>,
    line_no: u64,
    stats: ReadStats,
}

/// Статистика, накопленная [`RecordReader`] в процессе чтения.
#[derive(Debug, Default, Clone)]
pub struct ReadStats {
    /// Успешно прочитанных записей.
    pub records_ok: u64,
    /// Пропущенных строк заголовка.
    pub headers_skipped: u64,
    /// Строк, которые не удалось разобрать.
    pub lines_malformed: u64,
}

/// Форматирует одну запись без перевода строки.
pub fn format_record(record: &AngleRecord) -> String {
    format!("{},{},{}", record.depth, record.angle, record.distance_m)
}

/// Форматирует все записи обзора, по строке на угол.
pub fn format_sweep(sweep: &SealedSweep) -> String {
    let mut out = String::with_capacity(sweep.records().len() * 24);

    for record in sweep.records() {
        out.push_str(&format_record(record));
        out.push('\n');
    }

    out
}

/// Разбирает строку `depth,angle,distance`.
pub fn parse_record(line: &str) -> SonarResult<AngleRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    if fields.len() != 3 {
        return Err(SonarError::FormatViolation(format!(
            "expected 3 fields, found {}",
            fields.len()
        )));
    }

    let depth = fields[0]
        .parse::<u32>()
        .map_err(|e| SonarError::format_violation(format!("depth '{}': {e}", fields[0])))?;
    let angle = fields[1]
        .parse::<u16>()
        .map_err(|e| SonarError::format_violation(format!("angle '{}': {e}", fields[1])))?;
    let distance_m = fields[2]
        .parse::<f64>()
        .map_err(|e| SonarError::format_violation(format!("distance '{}': {e}", fields[2])))?;

    if !distance_m.is_finite() {
        return Err(SonarError::format_violation(format!(
            "distance '{}' is not finite",
            fields[2]
        )));
    }

    Ok(AngleRecord::new(depth, angle, distance_m))
}

fn is_header(line: &str) -> bool {
    let fields: Vec<String> = line.split(',').map(|f| f.trim().to_lowercase()).collect();

    fields.len() == HEADER_FIELDS.len() && fields.iter().zip(HEADER_FIELDS).all(|(a, b)| a == b)
}

////////////////////////////////////////////////////////////////////////////////
// RecordLog
////////////////////////////////////////////////////////////////////////////////

impl RecordLog {
    /// Открывает (или создаёт) журнал для дозаписи.
    ///
    /// Заголовок пишется только если файл пуст. Если последняя строка
    /// существующего файла не завершена переводом строки, он дописывается,
    /// чтобы новые строки не склеились со старой записью.
    pub fn open<P: AsRef<Path>>(path: P) -> SonarResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&path)?;

        let len = file.metadata()?.len();

        if len == 0 {
            writeln!(file, "{RECORD_LOG_HEADER}")?;
            file.sync_data()?;
            debug!("Created record log {path:?}");
        } else {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1))?;
            file.read_exact(&mut last)?;

            if last[0] != b'\n' {
                warn!("Record log {path:?} ends mid-line, terminating it");
                file.write_all(b"\n")?;
                file.sync_data()?;
            }
        }

        Ok(Self {
            file,
            path,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Строк, записанных этим экземпляром.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Дописывает `rows` через `write`. При ошибке файл обрезается до
    /// прежней длины.
    fn append_with<F>(
        &mut self,
        rows: &[u8],
        write: F,
    ) -> SonarResult<()>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        let start_len = self.file.metadata()?.len();

        if let Err(e) = write(&mut self.file, rows) {
            // Откатываем хвост, чтобы в журнале не осталось половины обзора
            if let Err(te) = self.file.set_len(start_len) {
                warn!("Failed to roll back {:?} to {start_len} bytes: {te}", self.path);
            }
            return Err(SonarError::Io(e));
        }

        Ok(())
    }
}

impl RecordSink for RecordLog {
    fn append_sweep(
        &mut self,
        sweep: &SealedSweep,
    ) -> SonarResult<()> {
        let rows = format_sweep(sweep);

        if rows.is_empty() {
            return Ok(());
        }

        self.append_with(rows.as_bytes(), |file, bytes| {
            file.write_all(bytes)?;
            file.sync_data()
        })?;

        self.rows_written += sweep.records().len() as u64;

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// RecordReader
////////////////////////////////////////////////////////////////////////////////

impl<R: Read> RecordReader<R> {
    /// Создаёт читатель. Заголовок необязателен: старые журналы без него
    /// читаются так же.
    pub fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            line_no: 0,
            stats: ReadStats::default(),
        }
    }

    /// Возвращает следующую запись или `None` на EOF.
    ///
    /// Повреждённые строки пропускаются и учитываются в [`ReadStats`].
    pub fn next_record(&mut self) -> Option<SonarResult<AngleRecord>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(SonarError::Io(e))),
            };
            self.line_no += 1;

            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if is_header(line) {
                self.stats.headers_skipped += 1;
                continue;
            }

            match parse_record(line) {
                Ok(record) => {
                    self.stats.records_ok += 1;
                    return Some(Ok(record));
                }
                Err(e) => {
                    self.stats.lines_malformed += 1;
                    debug!("Skipping line {}: {e}", self.line_no);
                }
            }
        }
    }

    /// Накопленная статистика чтения.
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = SonarResult<AngleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// Convenience: читает все записи, собирая их в вектор.
pub fn read_all_records<R: Read>(reader: &mut RecordReader<R>) -> SonarResult<Vec<AngleRecord>> {
    let mut records = Vec::new();

    while let Some(result) = reader.next_record() {
        records.push(result?);
    }

    Ok(records)
}

/// Читает журнал целиком из файла.
pub fn read_record_log<P: AsRef<Path>>(path: P) -> SonarResult<Vec<AngleRecord>> {
    let file = File::open(path)?;
    let mut reader = RecordReader::new(file);

    read_all_records(&mut reader)
}
