use std::{
    io::{BufRead, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::warn;

/// Команда оператора между обзорами.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepCommand {
    /// Снять следующий обзор на следующей глубине
    Advance,
    /// Завершить сессию
    Quit,
}

/// Источник команд между обзорами.
pub trait SweepControl {
    /// Блокируется до решения оператора. `depth` - глубина следующего обзора.
    fn next_command(
        &mut self,
        depth: u32,
    ) -> SweepCommand;
}

/// Интерактивное управление через строки ввода.
///
/// Пустая строка (Enter) - следующий обзор; `q`/`quit` или конец ввода -
/// выход. Прочие строки игнорируются с предупреждением.
///
/// С флагом остановки (`with_stop_flag`) поднятый флаг означает выход:
/// подсказка не выводится, а строка, прочитанная после сигнала, не
/// запускает новый обзор.
pub struct PromptControl<R: BufRead, W: Write> {
    input: R,
    prompt: W,
    stop_flag: Option<Arc<AtomicBool>>,
}

/// Фиксированное число обзоров (или бесконечно до Ctrl+C).
#[derive(Debug, Clone)]
pub struct BatchControl {
    remaining: Option<u32>,
}

impl<R: BufRead, W: Write> PromptControl<R, W> {
    pub fn new(
        input: R,
        prompt: W,
    ) -> Self {
        Self {
            input,
            prompt,
            stop_flag: None,
        }
    }

    pub fn with_stop_flag(
        mut self,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        self.stop_flag = Some(stop_flag);
        self
    }

    fn stopped(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
    }
}

impl<R: BufRead, W: Write> SweepControl for PromptControl<R, W> {
    fn next_command(
        &mut self,
        depth: u32,
    ) -> SweepCommand {
        loop {
            if self.stopped() {
                return SweepCommand::Quit;
            }

            // Ошибки вывода подсказки не мешают чтению команды
            let _ = write!(
                self.prompt,
                "Depth {depth}: press Enter to sweep, 'q' to quit > "
            );
            let _ = self.prompt.flush();

            let mut line = String::new();

            match self.input.read_line(&mut line) {
                Ok(0) => return SweepCommand::Quit,
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read command: {e}");
                    return SweepCommand::Quit;
                }
            }

            if self.stopped() {
                return SweepCommand::Quit;
            }

            match line.trim().to_lowercase().as_str() {
                "" => return SweepCommand::Advance,
                "q" | "quit" | "exit" => return SweepCommand::Quit,
                other => warn!("Unknown command '{other}'. Press Enter or type 'q'"),
            }
        }
    }
}

impl BatchControl {
    /// `None` - без ограничения.
    pub fn new(sweeps: Option<u32>) -> Self {
        Self { remaining: sweeps }
    }
}

impl SweepControl for BatchControl {
    fn next_command(
        &mut self,
        _depth: u32,
    ) -> SweepCommand {
        match self.remaining.as_mut() {
            None => SweepCommand::Advance,
            Some(0) => SweepCommand::Quit,
            Some(n) => {
                *n -= 1;
                SweepCommand::Advance
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_prompt_enter_advances() {
        let mut out = Vec::new();
        let mut control = PromptControl::new(Cursor::new("\n\nq\n"), &mut out);

        assert_eq!(control.next_command(0), SweepCommand::Advance);
        assert_eq!(control.next_command(1), SweepCommand::Advance);
        assert_eq!(control.next_command(2), SweepCommand::Quit);

        drop(control);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Depth 2"));
    }

    #[test]
    fn test_prompt_eof_quits() {
        let mut control = PromptControl::new(Cursor::new(""), std::io::sink());
        assert_eq!(control.next_command(0), SweepCommand::Quit);
    }

    #[test]
    fn test_prompt_ignores_unknown_lines() {
        let mut control = PromptControl::new(Cursor::new("go\n  \nQUIT\n"), std::io::sink());

        assert_eq!(control.next_command(0), SweepCommand::Advance);
        assert_eq!(control.next_command(1), SweepCommand::Quit);
    }

    #[test]
    fn test_prompt_quits_once_stopped() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut out = Vec::new();
        let mut control =
            PromptControl::new(Cursor::new("\n\n"), &mut out).with_stop_flag(stop.clone());

        assert_eq!(control.next_command(0), SweepCommand::Advance);

        // Сигнал пришёл между обзорами: ни подсказки, ни чтения
        stop.store(true, Ordering::SeqCst);
        assert_eq!(control.next_command(1), SweepCommand::Quit);

        drop(control);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Depth 0"));
        assert!(!text.contains("Depth 1"));
    }

    #[test]
    fn test_prompt_line_after_stop_does_not_advance() {
        struct StopOnRead {
            inner: Cursor<&'static str>,
            stop: Arc<AtomicBool>,
        }

        impl std::io::Read for StopOnRead {
            fn read(
                &mut self,
                buf: &mut [u8],
            ) -> std::io::Result<usize> {
                std::io::Read::read(&mut self.inner, buf)
            }
        }

        impl BufRead for StopOnRead {
            fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
                // Ctrl+C во время ожидания Enter
                self.stop.store(true, Ordering::SeqCst);
                self.inner.fill_buf()
            }

            fn consume(
                &mut self,
                amt: usize,
            ) {
                self.inner.consume(amt)
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let input = StopOnRead {
            inner: Cursor::new("\n"),
            stop: stop.clone(),
        };
        let mut control = PromptControl::new(input, std::io::sink()).with_stop_flag(stop);

        assert_eq!(control.next_command(0), SweepCommand::Quit);
    }

    #[test]
    fn test_batch_counts_down() {
        let mut control = BatchControl::new(Some(2));

        assert_eq!(control.next_command(0), SweepCommand::Advance);
        assert_eq!(control.next_command(1), SweepCommand::Advance);
        assert_eq!(control.next_command(2), SweepCommand::Quit);
        assert_eq!(control.next_command(2), SweepCommand::Quit);
    }

    #[test]
    fn test_batch_unbounded() {
        let mut control = BatchControl::new(None);
        assert!((0..1_000).all(|d| control.next_command(d) == SweepCommand::Advance));
    }
}
