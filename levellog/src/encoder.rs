//! JSON 라인 인코더
//!
//! 로그 레코드를 한 줄짜리 JSON 객체로 직렬화합니다.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::level::Severity;

/// 고정 키 이름
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const LEVEL_KEY: &str = "level";
pub const LOGGER_KEY: &str = "logger";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "message";
pub const STACKTRACE_KEY: &str = "stacktrace";
pub const ERROR_KEY: &str = "error";

const RESERVED_KEYS: [&str; 6] = [
    TIMESTAMP_KEY,
    LEVEL_KEY,
    LOGGER_KEY,
    CALLER_KEY,
    MESSAGE_KEY,
    STACKTRACE_KEY,
];

/// 인코더가 다루는 필드 표현
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderField {
    String { key: String, value: String },
    Int64 { key: String, value: i64 },
    Float64 { key: String, value: f64 },
    Bool { key: String, value: bool },
    Error { message: String },
    Any { key: String, value: Value },
}

impl EncoderField {
    pub fn key(&self) -> &str {
        match self {
            EncoderField::String { key, .. }
            | EncoderField::Int64 { key, .. }
            | EncoderField::Float64 { key, .. }
            | EncoderField::Bool { key, .. }
            | EncoderField::Any { key, .. } => key,
            EncoderField::Error { .. } => ERROR_KEY,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            EncoderField::String { value, .. } => Value::String(value.clone()),
            EncoderField::Int64 { value, .. } => Value::from(*value),
            EncoderField::Float64 { value, .. } => float_to_json(*value),
            EncoderField::Bool { value, .. } => Value::Bool(*value),
            EncoderField::Error { message } => Value::String(message.clone()),
            EncoderField::Any { value, .. } => value.clone(),
        }
    }
}

/// JSON 은 NaN / Infinity 를 표현할 수 없으므로 문자열로 기록
fn float_to_json(value: f64) -> Value {
    if value.is_nan() {
        Value::String("NaN".into())
    } else if value.is_infinite() {
        let sign = if value.is_sign_positive() { "+Inf" } else { "-Inf" };
        Value::String(sign.into())
    } else {
        Value::from(value)
    }
}

/// 인코딩 대상 로그 레코드
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub logger: String,
    pub caller: Option<String>,
    pub message: String,
    pub fields: Vec<EncoderField>,
    pub stacktrace: Option<String>,
}

impl Record {
    pub fn new<S: Into<String>>(severity: Severity, message: S) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            logger: String::new(),
            caller: None,
            message: message.into(),
            fields: Vec::new(),
            stacktrace: None,
        }
    }
}

/// JSON 라인 인코더
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn new() -> Self {
        Self
    }

    /// 레코드를 JSON 문자열로 인코딩 (줄바꿈 미포함)
    ///
    /// 키 순서: timestamp, level, logger, caller, message, 사용자 필드, stacktrace.
    /// 예약 키와 겹치는 사용자 필드는 `fields.<key>` 로 기록됩니다.
    pub fn encode(&self, record: &Record) -> Result<String> {
        let mut object = Map::new();
        object.insert(
            TIMESTAMP_KEY.into(),
            Value::String(format_timestamp(&record.timestamp)),
        );
        object.insert(LEVEL_KEY.into(), Value::String(record.severity.as_str().into()));
        if !record.logger.is_empty() {
            object.insert(LOGGER_KEY.into(), Value::String(record.logger.clone()));
        }
        if let Some(caller) = &record.caller {
            object.insert(CALLER_KEY.into(), Value::String(caller.clone()));
        }
        object.insert(MESSAGE_KEY.into(), Value::String(record.message.clone()));

        for field in &record.fields {
            let key = field.key();
            let key = if RESERVED_KEYS.contains(&key) {
                format!("fields.{key}")
            } else {
                key.to_string()
            };
            object.insert(key, field.to_json());
        }

        if let Some(stacktrace) = &record.stacktrace {
            object.insert(STACKTRACE_KEY.into(), Value::String(stacktrace.clone()));
        }

        Ok(serde_json::to_string(&Value::Object(object))?)
    }

    /// 줄바꿈을 포함한 바이트 열로 인코딩
    pub fn encode_line(&self, record: &Record) -> Result<Vec<u8>> {
        let mut line = self.encode(record)?.into_bytes();
        line.extend_from_slice(LINE_ENDING.as_bytes());
        Ok(line)
    }
}

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// ISO-8601 (밀리초, 타임존 오프셋 포함)
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string()
}
