//! 단일 레벨 로거
//!
//! 하나의 로테이션 싱크와 최소 레벨을 소유하며, 호출마다 JSON 한 줄을 기록합니다.

use std::backtrace::Backtrace;
use std::fmt;
use std::fs::DirBuilder;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::LoggerConfig;
use crate::convert::convert_fields;
use crate::encoder::{JsonEncoder, Record};
use crate::error::{LogError, Result};
use crate::field::Field;
use crate::level::Severity;
use crate::rotation::RotatingFile;
use crate::termination::{ProcessTermination, TerminationHandler};
use crate::writer::LogSink;

/// 단일 레벨 로거
pub struct Logger {
    name: String,
    threshold: Severity,
    sink: Box<dyn LogSink>,
    encoder: JsonEncoder,
    termination: Arc<dyn TerminationHandler>,
}

impl Logger {
    /// 설정으로부터 파일 기반 로거 생성
    ///
    /// 대상 디렉토리를 (중간 디렉토리 포함) 만들고 로테이션 싱크를 연결합니다.
    /// 디렉토리를 만들 수 없으면 [`LogError::CreateDir`] 를 반환합니다.
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        config.validate()?;
        let path = config.destination()?;
        create_log_dir(&path)?;

        let sink = RotatingFile::new(&path, config.rotation_policy());
        debug!(
            path = %path.display(),
            level = %config.level,
            max_size_mb = config.max_size_mb,
            max_backups = config.max_backups,
            max_age_days = config.max_age_days,
            compress = config.compress,
            "로거 생성됨"
        );

        Ok(Self::with_sink(config.level, Box::new(sink)))
    }

    /// 임의의 싱크로 로거 생성
    pub fn with_sink(threshold: Severity, sink: Box<dyn LogSink>) -> Self {
        Self {
            name: String::new(),
            threshold,
            sink,
            encoder: JsonEncoder::new(),
            termination: Arc::new(ProcessTermination),
        }
    }

    /// `logger` 키에 기록될 이름 지정
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// fatal / panic 처리 전략 교체
    pub fn with_termination(mut self, termination: Arc<dyn TerminationHandler>) -> Self {
        self.termination = termination;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// 한 줄 기록
    ///
    /// 최소 레벨보다 낮은 기록은 포매팅 전에 버려집니다.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: &str, fields: &[Field]) -> Result<()> {
        if !self.enabled(severity) {
            return Ok(());
        }

        let mut record = Record::new(severity, message);
        record.logger = self.name.clone();
        record.caller = Some(short_caller(Location::caller()));
        record.fields = convert_fields(fields);
        if severity.captures_stacktrace() {
            record.stacktrace = Some(Backtrace::force_capture().to_string());
        }

        let line = self.encoder.encode_line(&record)?;
        self.sink.write_line(&line)
    }

    #[track_caller]
    fn emit(&self, severity: Severity, message: &str, fields: &[Field]) {
        if let Err(e) = self.log(severity, message, fields) {
            eprintln!("로그 작성 실패 ({}): {}", self.sink.describe(), e);
        }
    }

    #[track_caller]
    pub fn debug<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.emit(Severity::Debug, message.as_ref(), fields);
    }

    #[track_caller]
    pub fn info<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.emit(Severity::Info, message.as_ref(), fields);
    }

    #[track_caller]
    pub fn warn<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.emit(Severity::Warn, message.as_ref(), fields);
    }

    #[track_caller]
    pub fn error<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.emit(Severity::Error, message.as_ref(), fields);
    }

    /// 기록 후 현재 실행 단위를 중단
    ///
    /// 플러시 성공 여부와 관계없이 [`TerminationHandler::panic`] 이 호출됩니다.
    /// 기본 전략에서는 이 메서드가 반환하지 않습니다.
    #[track_caller]
    pub fn panic<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        let message = message.as_ref();
        self.emit(Severity::Panic, message, fields);
        if let Err(e) = self.sink.flush() {
            eprintln!("로그 플러시 실패 ({}): {}", self.sink.describe(), e);
        }
        self.termination.panic(message);
    }

    /// 기록하고 플러시한 뒤 종료 코드 1 로 프로세스를 종료
    ///
    /// 기본 전략에서는 이 메서드가 반환하지 않습니다.
    #[track_caller]
    pub fn fatal<S: AsRef<str>>(&self, message: S, fields: &[Field]) {
        self.emit(Severity::Fatal, message.as_ref(), fields);
        if let Err(e) = self.sink.flush() {
            eprintln!("로그 플러시 실패 ({}): {}", self.sink.describe(), e);
        }
        self.termination.exit(1);
    }

    /// 버퍼링된 데이터를 파일로 내보냄
    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }

    /// 플러시 후 싱크를 닫음
    ///
    /// 플러시에 실패해도 파일 핸들은 해제되며 첫 번째 에러가 반환됩니다.
    /// 두 번째 호출은 [`LogError::SinkClosed`] 로 실패합니다.
    pub fn close(&self) -> Result<()> {
        let flushed = self.sink.flush();
        let closed = self.sink.close();
        flushed.and(closed)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .field("sink", &self.sink.describe())
            .finish()
    }
}

/// 로그 파일의 상위 디렉토리 생성
fn create_log_dir(path: &Path) -> Result<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    builder.create(dir).map_err(|source| LogError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// `dir/file.rs:line` 형식의 짧은 호출 위치
fn short_caller(location: &Location<'_>) -> String {
    let file = location.file();
    let mut parts = file.rsplitn(3, ['/', '\\']);
    let name = parts.next().unwrap_or(file);
    let short = match parts.next() {
        Some(dir) => format!("{dir}/{name}"),
        None => name.to_string(),
    };
    format!("{}:{}", short, location.line())
}
