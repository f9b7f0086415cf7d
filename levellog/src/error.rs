//! 로거 에러 정의
//!
//! 설정, 초기화, 쓰기, 종료 단계에서 발생하는 에러를 하나의 열거형으로 관리합니다.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::level::Severity;

/// 로거 공통 결과 타입
pub type Result<T> = std::result::Result<T, LogError>;

/// 로거 에러
#[derive(Error, Debug)]
pub enum LogError {
    // 설정 관련 에러
    #[error("설정 오류: {0}")]
    Config(String),

    #[error("YAML 설정 파싱 실패: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // 초기화 관련 에러
    #[error("로그 디렉토리 생성 실패 ({}): {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("로그 파일 열기 실패 ({}): {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{level} 로거 생성 실패: {source}")]
    SubLogger {
        level: Severity,
        #[source]
        source: Box<LogError>,
    },

    // 쓰기 / 종료 관련 에러
    #[error("로그 파일 순환 실패 ({}): {source}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("이미 닫힌 싱크: {sink}")]
    SinkClosed { sink: String },

    #[error("로그 인코딩 실패: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O 오류: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl LogError {
    /// 이미 닫힌 싱크에 대한 접근인지 확인
    pub fn is_closed(&self) -> bool {
        matches!(self, LogError::SinkClosed { .. })
    }
}

/// 여러 하위 로거의 flush / close 실패를 모은 에러
#[derive(Debug)]
pub struct AggregateError {
    operation: &'static str,
    failures: Vec<(Severity, LogError)>,
}

impl AggregateError {
    pub(crate) fn new(operation: &'static str, failures: Vec<(Severity, LogError)>) -> Self {
        Self {
            operation,
            failures,
        }
    }

    /// 실패한 작업 이름 ("flush" 또는 "close")
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// 실패한 하위 로거와 원인 목록
    pub fn failures(&self) -> &[(Severity, LogError)] {
        &self.failures
    }

    /// 실패한 하위 로거의 레벨 목록
    pub fn failed_levels(&self) -> Vec<Severity> {
        self.failures.iter().map(|(level, _)| *level).collect()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}개 로거 {} 실패: [", self.failures.len(), self.operation)?;
        for (i, (level, err)) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{level}: {err}")?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for AggregateError {}
