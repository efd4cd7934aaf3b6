// ==========================================
// 表格记录导入器 - 通用字符串转换
// ==========================================
// 职责: 文本 → 字段运行时值（数值/布尔/枚举/标量/记录文本）
// 记录文本格式: (Field=Value,Other="quoted, value",Nested=(X=1))
// 红线: 容器类型不接受字符串
// ==========================================

use crate::domain::record::{FieldValue, RecordInstance};
use crate::domain::schema::{EnumDef, FieldDescriptor, FieldType, RecordSchema};
use crate::domain::types::{NumericRepr, ScalarType};
use crate::reflection::error::{CoercionError, CoercionResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

// Name 不允许包含的字符
const INVALID_NAME_CHARACTERS: &[char] = &['"', '\'', ',', ' ', '\n', '\r', '\t'];

/// 将文本写入目标槽位；失败时目标保持不变
pub fn assign_str(text: &str, ty: &FieldType, dest: &mut FieldValue) -> CoercionResult<()> {
    match ty {
        FieldType::Record { schema } => {
            // 记录文本只覆盖出现的字段，其余保留原值
            let mut record = match dest {
                FieldValue::Record(existing) => existing.clone(),
                _ => RecordInstance::new(schema),
            };
            assign_record_text(text, schema, &mut record)?;
            *dest = FieldValue::Record(record);
        }
        other => *dest = parse_str(text, other)?,
    }
    Ok(())
}

/// 解析文本为声明类型的值
pub fn parse_str(text: &str, ty: &FieldType) -> CoercionResult<FieldValue> {
    match ty {
        FieldType::Enum { def } => parse_enum(text, def).map(FieldValue::Enum),
        FieldType::Numeric {
            repr,
            enum_hint: Some(def),
        } => integer_value(*repr, parse_enum(text, def)? as i128),
        FieldType::Numeric {
            repr,
            enum_hint: None,
        } => parse_numeric(text, *repr),
        FieldType::Bool => parse_bool(text).map(FieldValue::Bool),
        FieldType::Array { .. } | FieldType::Set { .. } | FieldType::Map { .. } => {
            Err(CoercionError::ContainerFromString(ty.type_name()))
        }
        FieldType::Record { schema } => {
            let mut record = RecordInstance::new(schema);
            assign_record_text(text, schema, &mut record)?;
            Ok(FieldValue::Record(record))
        }
        FieldType::Scalar { scalar } => parse_scalar(text, *scalar),
    }
}

/// JSON 数值 → 字段值（整数表示要求整值且在范围内）
pub fn numeric_value(repr: NumericRepr, value: f64) -> CoercionResult<FieldValue> {
    if repr.is_integer() {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(CoercionError::NotIntegral {
                value: value.to_string(),
            });
        }
        return integer_value(repr, value as i128);
    }

    match repr {
        NumericRepr::Float => Ok(FieldValue::Float(value as f32 as f64)),
        _ => Ok(FieldValue::Float(value)),
    }
}

fn integer_value(repr: NumericRepr, value: i128) -> CoercionResult<FieldValue> {
    let (min, max) = match repr.integer_range() {
        Some(range) => range,
        None => return Ok(FieldValue::Float(value as f64)),
    };

    if value < min || value > max {
        return Err(CoercionError::OutOfRange {
            value: value.to_string(),
            repr: repr.to_string(),
        });
    }

    if min < 0 {
        Ok(FieldValue::Int(value as i64))
    } else {
        Ok(FieldValue::UInt(value as u64))
    }
}

fn parse_numeric(text: &str, repr: NumericRepr) -> CoercionResult<FieldValue> {
    let trimmed = text.trim();
    let invalid = || CoercionError::InvalidNumber {
        text: text.to_string(),
        repr: repr.to_string(),
    };

    if repr.is_integer() {
        let value: i128 = trimmed.parse().map_err(|_| invalid())?;
        integer_value(repr, value)
    } else {
        let value: f64 = trimmed.parse().map_err(|_| invalid())?;
        numeric_value(repr, value)
    }
}

fn parse_bool(text: &str) -> CoercionResult<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CoercionError::InvalidBool(text.to_string()))
    }
}

fn parse_enum(text: &str, def: &EnumDef) -> CoercionResult<i64> {
    def.resolve(text).ok_or_else(|| CoercionError::InvalidEnum {
        text: text.to_string(),
        enum_name: def.name.clone(),
    })
}

fn parse_scalar(text: &str, scalar: ScalarType) -> CoercionResult<FieldValue> {
    match scalar {
        ScalarType::String | ScalarType::Text => Ok(FieldValue::Str(text.to_string())),
        ScalarType::Name => {
            let trimmed = text.trim();
            if trimmed.contains(INVALID_NAME_CHARACTERS) {
                return Err(CoercionError::InvalidName(text.to_string()));
            }
            Ok(FieldValue::Str(trimmed.to_string()))
        }
        ScalarType::Guid => Uuid::parse_str(text.trim())
            .map(FieldValue::Guid)
            .map_err(|e| CoercionError::InvalidGuid {
                text: text.to_string(),
                message: e.to_string(),
            }),
        ScalarType::Date => {
            let trimmed = text.trim();
            // YYYYMMDD，兼容 YYYY-MM-DD
            NaiveDate::parse_from_str(trimmed, "%Y%m%d")
                .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
                .map(FieldValue::Date)
                .map_err(|_| CoercionError::InvalidDate(text.to_string()))
        }
        ScalarType::DateTime => parse_datetime(text).map(FieldValue::DateTime),
    }
}

fn parse_datetime(text: &str) -> CoercionResult<DateTime<Utc>> {
    let trimmed = text.trim();

    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y%m%d%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"));
    if let Ok(naive) = naive {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoercionError::InvalidDateTime(text.to_string()))
}

// ==========================================
// 记录文本
// ==========================================

fn assign_record_text(
    text: &str,
    schema: &RecordSchema,
    record: &mut RecordInstance,
) -> CoercionResult<()> {
    let malformed = |message: String| CoercionError::RecordText {
        text: text.to_string(),
        message,
    };

    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| malformed("expected text enclosed in '(' and ')'".to_string()))?;

    for part in split_top_level(inner).map_err(&malformed)? {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (key, raw_value) = part
            .split_once('=')
            .ok_or_else(|| malformed(format!("'{}' is not a Key=Value pair", part)))?;
        let key = key.trim();

        let field = find_record_field(schema, key).ok_or_else(|| {
            CoercionError::UnknownRecordField {
                record: schema.name.clone(),
                field: key.to_string(),
            }
        })?;

        let wrap = |source: CoercionError| CoercionError::RecordField {
            field: field.name.clone(),
            source: Box::new(source),
        };

        if field.array_dim > 1 {
            return Err(wrap(CoercionError::ContainerFromString(format!(
                "{}[{}]",
                field.ty, field.array_dim
            ))));
        }

        let value = unquote(raw_value.trim());
        assign_str(&value, &field.ty, record.slot_mut(field)).map_err(wrap)?;
    }

    Ok(())
}

fn find_record_field<'a>(schema: &'a RecordSchema, key: &str) -> Option<&'a FieldDescriptor> {
    schema
        .inheritance_chain()
        .into_iter()
        .flat_map(|level| level.fields.iter())
        .find(|field| field.accepted_names().iter().any(|n| n == key))
}

/// 按顶层逗号切分（忽略括号与引号内的逗号）
fn split_top_level(inner: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut in_quote = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in inner.char_indices() {
        if in_quote {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quote = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_quote = true,
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            ',' if depth == 0 => {
                parts.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    if in_quote {
        return Err("unterminated quoted value".to_string());
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }

    parts.push(&inner[start..]);
    Ok(parts)
}

fn unquote(raw: &str) -> String {
    let quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
    if !quoted {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw[1..raw.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}
