//! 필드 변환
//!
//! [`Field`] 목록을 인코더 필드 목록으로 변환합니다. 순서와 길이는 그대로 유지됩니다.

use crate::encoder::EncoderField;
use crate::field::{Field, FieldValue};

pub fn convert_fields(fields: &[Field]) -> Vec<EncoderField> {
    fields.iter().map(convert_field).collect()
}

pub fn convert_field(field: &Field) -> EncoderField {
    let key = field.key().to_string();
    match field.value() {
        FieldValue::Str(value) => EncoderField::String {
            key,
            value: value.clone(),
        },
        FieldValue::Int(value) => EncoderField::Int64 { key, value: *value },
        FieldValue::Float(value) => EncoderField::Float64 { key, value: *value },
        FieldValue::Bool(value) => EncoderField::Bool { key, value: *value },
        // 에러 필드는 키를 무시하고 항상 "error" 로 기록
        FieldValue::Error(message) => EncoderField::Error {
            message: message.clone(),
        },
        FieldValue::Any(value) => EncoderField::Any {
            key,
            value: value.clone(),
        },
    }
}
