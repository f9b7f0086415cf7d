//! 구조화 로그 필드
//!
//! 호출자가 인코더 타입에 의존하지 않고 키-값 데이터를 넘길 수 있도록 하는 경량 모델입니다.

use serde::Serialize;

/// 로그 필드 값
///
/// 지원하지 않는 타입은 `Any` 로 JSON 값으로 변환되어 전달됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// 에러 메시지. 키와 관계없이 `"error"` 키로 기록됩니다.
    Error(String),
    Any(serde_json::Value),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Any(value)
    }
}

/// 로그 필드
///
/// 키는 비어 있으면 안 됩니다 (디버그 빌드에서는 패닉).
/// 필드는 JSON 객체의 최상위에 그대로 펼쳐지지만, 키가 고정 키
/// (`timestamp`, `level`, `logger`, `caller`, `message`, `stacktrace`) 와 겹치면
/// `fields.<key>` 로 이름이 바뀌어 기록됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    value: FieldValue,
}

impl Field {
    /// 새 필드 생성
    ///
    /// `Field::string("message", ..)` 처럼 고정 키를 쓰면 `fields.message` 로 기록됩니다.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        debug_assert!(!key.is_empty(), "로그 필드 키는 비어 있을 수 없음");
        Self {
            key,
            value: value.into(),
        }
    }

    pub fn string<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    pub fn int<K: Into<String>>(key: K, value: i32) -> Self {
        Self::new(key, value)
    }

    pub fn int64<K: Into<String>>(key: K, value: i64) -> Self {
        Self::new(key, value)
    }

    pub fn float64<K: Into<String>>(key: K, value: f64) -> Self {
        Self::new(key, value)
    }

    pub fn bool<K: Into<String>>(key: K, value: bool) -> Self {
        Self::new(key, value)
    }

    /// 에러 필드 (항상 `"error"` 키 사용)
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new("error", FieldValue::Error(err.to_string()))
    }

    /// 임의 타입 필드
    ///
    /// 값은 즉시 JSON 으로 직렬화됩니다. 직렬화할 수 없는 값은 실패 대신
    /// 직렬화 에러 메시지로 대체됩니다.
    pub fn any<K, T>(key: K, value: &T) -> Self
    where
        K: Into<String>,
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| serde_json::Value::String(format!("<직렬화 실패: {e}>")));
        Self::new(key, FieldValue::Any(value))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}
