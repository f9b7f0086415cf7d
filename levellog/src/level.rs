//! 로그 심각도 정의

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// 로그 심각도
///
/// `Debug < Info < Warn < Error < Panic < Fatal` 순서로 정렬됩니다.
/// 설정에서 최소 레벨로 지정할 수 있는 것은 앞의 네 단계뿐이며,
/// `Panic` 과 `Fatal` 은 기록 후 호출자를 중단시키는 쓰기 전용 단계입니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 디버깅 정보
    Debug = 0,
    /// 일반 정보
    #[default]
    Info = 1,
    /// 경고 상황 (복구 가능한 오류)
    Warn = 2,
    /// 오류 상황
    Error = 3,
    /// 기록 후 현재 실행 단위를 중단
    Panic = 4,
    /// 기록 후 프로세스를 종료
    Fatal = 5,
}

impl Severity {
    /// 레벨별 로거가 관리하는 네 개의 스트림 (생성 순서)
    pub const STREAMS: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// 로그 라인에 기록되는 대문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Panic => "PANIC",
            Severity::Fatal => "FATAL",
        }
    }

    /// 설정 파일에서 쓰는 소문자 이름
    pub fn config_name(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
        }
    }

    /// 설정의 최소 레벨로 사용할 수 있는지 여부
    pub fn is_configurable(&self) -> bool {
        *self <= Severity::Error
    }

    /// 스택 트레이스를 함께 기록해야 하는지 여부
    pub fn captures_stacktrace(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    /// 설정 값 파싱 (대소문자 구분, 소문자만 허용)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "panic" => Ok(Severity::Panic),
            "fatal" => Ok(Severity::Fatal),
            other => Err(LogError::Config(format!("알 수 없는 로그 레벨: {other:?}"))),
        }
    }
}
