//! 레벨 라우팅 로거
//!
//! debug / info / warn / error 네 개의 단일 레벨 로거를 묶어
//! 각 기록을 해당 레벨 전용 파일로 보냅니다. panic / fatal 은 error 스트림에 기록됩니다.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::LevelConfig;
use crate::error::{AggregateError, LogError, Result};
use crate::field::Field;
use crate::level::Severity;
use crate::logger::Logger;
use crate::termination::{ProcessTermination, TerminationHandler};

/// 레벨별 파일로 라우팅하는 로거
#[derive(Debug)]
pub struct LevelLogger {
    debug: Logger,
    info: Logger,
    warn: Logger,
    error: Logger,
    lifecycle: Mutex<()>,
}

impl LevelLogger {
    /// 설정으로부터 네 개의 스트림 로거 생성
    ///
    /// 하나라도 실패하면 이미 열린 로거를 닫고 어느 레벨에서 실패했는지 담은
    /// [`LogError::SubLogger`] 를 반환합니다.
    pub fn new(config: &LevelConfig) -> Result<Self> {
        Self::with_termination(config, Arc::new(ProcessTermination))
    }

    /// fatal / panic 처리 전략을 지정해 생성
    pub fn with_termination(
        config: &LevelConfig,
        termination: Arc<dyn TerminationHandler>,
    ) -> Result<Self> {
        let logger = Self::assemble(|level| {
            let cfg = config
                .get(level)
                .ok_or_else(|| LogError::Config(format!("{level} 스트림 설정 없음")))?;
            Ok(Logger::new(cfg)?
                .named(level.config_name())
                .with_termination(termination.clone()))
        })?;

        debug!("레벨 로거 초기화 완료");
        Ok(logger)
    }

    /// debug, info, warn, error 순서로 생성
    ///
    /// 실패하면 앞서 만든 로거를 닫고 실패한 레벨을 담아 반환합니다.
    fn assemble<F>(mut build: F) -> Result<Self>
    where
        F: FnMut(Severity) -> Result<Logger>,
    {
        let mut open = |level: Severity, opened: &[&Logger]| -> Result<Logger> {
            build(level).map_err(|e| {
                close_opened(opened);
                LogError::SubLogger {
                    level,
                    source: Box::new(e),
                }
            })
        };

        let debug = open(Severity::Debug, &[])?;
        let info = open(Severity::Info, &[&debug])?;
        let warn = open(Severity::Warn, &[&debug, &info])?;
        let error = open(Severity::Error, &[&debug, &info, &warn])?;

        Ok(Self::from_loggers(debug, info, warn, error))
    }

    /// 이미 만들어진 로거들로 구성
    pub fn from_loggers(debug: Logger, info: Logger, warn: Logger, error: Logger) -> Self {
        Self {
            debug,
            info,
            warn,
            error,
            lifecycle: Mutex::new(()),
        }
    }

    /// 레벨이 기록될 스트림 로거
    pub fn logger(&self, severity: Severity) -> &Logger {
        match severity {
            Severity::Debug => &self.debug,
            Severity::Info => &self.info,
            Severity::Warn => &self.warn,
            Severity::Error | Severity::Panic | Severity::Fatal => &self.error,
        }
    }

    #[track_caller]
    pub fn debug<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.debug.debug(message, fields);
    }

    #[track_caller]
    pub fn info<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.info.info(message, fields);
    }

    #[track_caller]
    pub fn warn<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.warn.warn(message, fields);
    }

    #[track_caller]
    pub fn error<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.error.error(message, fields);
    }

    /// error 스트림에 기록 후 패닉
    #[track_caller]
    pub fn panic<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.error.panic(message, fields);
    }

    /// error 스트림에 기록 후 프로세스 종료
    #[track_caller]
    pub fn fatal<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.error.fatal(message, fields);
    }

    /// 모든 스트림 플러시
    ///
    /// 일부가 실패해도 나머지는 계속 처리하며 실패 목록을 [`AggregateError`] 로 반환합니다.
    pub fn flush(&self) -> Result<()> {
        self.for_each_stream("flush", Logger::flush)
    }

    /// 모든 스트림을 플러시하고 닫음
    pub fn close(&self) -> Result<()> {
        let result = self.for_each_stream("close", Logger::close);
        if result.is_ok() {
            debug!("레벨 로거 종료");
        }
        result
    }

    fn streams(&self) -> [(Severity, &Logger); 4] {
        [
            (Severity::Debug, &self.debug),
            (Severity::Info, &self.info),
            (Severity::Warn, &self.warn),
            (Severity::Error, &self.error),
        ]
    }

    fn for_each_stream(
        &self,
        operation: &'static str,
        op: fn(&Logger) -> Result<()>,
    ) -> Result<()> {
        let _guard = self.lifecycle.lock();

        let failures: Vec<(Severity, LogError)> = self
            .streams()
            .into_iter()
            .filter_map(|(level, logger)| op(logger).err().map(|e| (level, e)))
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        warn!(
            operation,
            failed = failures.len(),
            "일부 스트림 처리 실패"
        );
        Err(AggregateError::new(operation, failures).into())
    }
}

fn close_opened(opened: &[&Logger]) {
    for logger in opened {
        if let Err(e) = logger.close() {
            warn!(logger = logger.name(), error = %e, "초기화 실패 후 로거 닫기 실패");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::MemorySink;

    fn memory_level_logger() -> (LevelLogger, [MemorySink; 4]) {
        let sinks = [
            MemorySink::new(),
            MemorySink::new(),
            MemorySink::new(),
            MemorySink::new(),
        ];
        let make = |level: Severity, sink: &MemorySink| {
            Logger::with_sink(level, Box::new(sink.clone())).named(level.config_name())
        };
        let logger = LevelLogger::from_loggers(
            make(Severity::Debug, &sinks[0]),
            make(Severity::Info, &sinks[1]),
            make(Severity::Warn, &sinks[2]),
            make(Severity::Error, &sinks[3]),
        );
        (logger, sinks)
    }

    #[test]
    fn test_routes_by_level() {
        let (logger, sinks) = memory_level_logger();

        logger.debug("d", &[]);
        logger.info("i", &[]);
        logger.info("i2", &[]);
        logger.warn("w", &[]);
        logger.error("e", &[]);

        assert_eq!(sinks[0].len(), 1);
        assert_eq!(sinks[1].len(), 2);
        assert_eq!(sinks[2].len(), 1);
        assert_eq!(sinks[3].len(), 1);
        assert!(sinks[1].lines()[1].contains("\"logger\":\"info\""));
    }

    #[test]
    fn test_failed_construction_closes_opened_streams() {
        let sinks = [MemorySink::new(), MemorySink::new(), MemorySink::new()];

        let result = LevelLogger::assemble(|level| match level {
            Severity::Debug => Ok(Logger::with_sink(level, Box::new(sinks[0].clone()))),
            Severity::Info => Ok(Logger::with_sink(level, Box::new(sinks[1].clone()))),
            _ => Err(LogError::Config("broken warn stream".into())),
        });

        match result {
            Err(LogError::SubLogger { level, source }) => {
                assert_eq!(level, Severity::Warn);
                assert!(matches!(*source, LogError::Config(_)));
            }
            other => panic!("expected sub-logger error, got {other:?}"),
        }
        assert!(sinks[0].is_closed());
        assert!(sinks[1].is_closed());
        // 실패 이후의 스트림은 만들어지지 않음
        assert!(!sinks[2].is_closed());
    }

    #[test]
    fn test_cleanup_continues_when_a_close_fails() {
        let sinks = [MemorySink::new(), MemorySink::new()];
        sinks[0].fail_on_flush();

        let result = LevelLogger::assemble(|level| match level {
            Severity::Debug => Ok(Logger::with_sink(level, Box::new(sinks[0].clone()))),
            Severity::Info => Ok(Logger::with_sink(level, Box::new(sinks[1].clone()))),
            Severity::Warn => Err(LogError::Config("broken".into())),
            _ => unreachable!(),
        });

        assert!(matches!(result, Err(LogError::SubLogger { level: Severity::Warn, .. })));
        assert!(sinks.iter().all(MemorySink::is_closed));
    }

    #[test]
    fn test_fatal_routes_to_error_stream() {
        let (logger, _) = memory_level_logger();
        assert_eq!(logger.logger(Severity::Fatal).name(), "error");
        assert_eq!(logger.logger(Severity::Panic).name(), "error");
        assert_eq!(logger.logger(Severity::Warn).name(), "warn");
    }

    #[test]
    fn test_flush_aggregates_failures() {
        let (logger, sinks) = memory_level_logger();
        sinks[1].fail_on_flush();
        sinks[3].fail_on_flush();

        let err = logger.flush().unwrap_err();
        let LogError::Aggregate(agg) = err else {
            panic!("expected aggregate error, got {err:?}");
        };
        assert_eq!(agg.operation(), "flush");
        assert_eq!(agg.failed_levels(), vec![Severity::Info, Severity::Error]);
    }

    #[test]
    fn test_close_releases_every_stream() {
        let (logger, sinks) = memory_level_logger();
        sinks[2].fail_on_flush();

        assert!(logger.close().is_err());
        assert!(sinks.iter().all(MemorySink::is_closed));

        // 두 번째 close 는 모든 스트림에서 실패
        let LogError::Aggregate(agg) = logger.close().unwrap_err() else {
            panic!("expected aggregate error");
        };
        assert_eq!(agg.failures().len(), 4);
    }
}
