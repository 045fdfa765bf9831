//! Language-model extraction of structured exhibition fields from page text.

pub mod openai;

pub use openai::OpenAiExtractor;

use crate::error::{Result, ScraperError};
use crate::types::{push_unique, ExtractedFields};
use async_trait::async_trait;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

#[async_trait]
pub trait ExhibitionExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Turn raw page text plus candidate images into structured fields.
    async fn extract(&self, text: &str, image_urls: &[String]) -> Result<ExtractedFields>;
}

pub const SYSTEM_PROMPT: &str = r#"당신은 전시 정보 정리 도우미입니다.
입력으로 전시 소개 텍스트(description)와 이미지 URL 목록(imageUrls)이 주어집니다.
다음 키를 가진 JSON 객체 하나만 출력하세요.

{
  "title": "전시 제목 한 줄",
  "description": "전시 소개 텍스트, 한국어로 자연스럽게",
  "artists": ["작가 이름", "..."],
  "location": "전시 장소, 없으면 null",
  "period": "YYYY.MM.DD ~ YYYY.MM.DD",
  "hours": "10:00 ~ 18:00"
}

규칙:
- 알 수 없는 값은 null, 작가가 없으면 빈 배열.
- period는 반드시 'YYYY.MM.DD ~ YYYY.MM.DD' 형식.
- 휴관 정보가 있으면 hours 뒤에 괄호로 덧붙일 수 있음.
- JSON 외의 텍스트는 출력하지 마세요."#;

static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["description"],
        "properties": {
            "title": { "type": ["string", "null"] },
            "description": { "type": ["string", "null"] },
            "artists": {
                "anyOf": [
                    { "type": "array", "items": { "type": "string" } },
                    { "type": "string" },
                    { "type": "null" }
                ]
            },
            "location": { "type": ["string", "null"] },
            "period": { "type": ["string", "null"] },
            "hours": { "type": ["string", "null"] }
        }
    })
});

static COMPILED_SCHEMA: Lazy<JSONSchema> =
    Lazy::new(|| JSONSchema::compile(&RESPONSE_SCHEMA).expect("response schema compiles"));

/// User message sent alongside the system prompt.
pub fn build_user_message(text: &str, image_urls: &[String]) -> String {
    json!({ "description": text, "imageUrls": image_urls }).to_string()
}

/// Models sometimes wrap JSON in a markdown fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn optional_text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parse and validate a chat-completion message body.
pub fn parse_response(content: &str) -> Result<ExtractedFields> {
    let value: Value = serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        ScraperError::Extraction {
            message: format!("response is not JSON: {}", e),
        }
    })?;

    if let Err(errors) = COMPILED_SCHEMA.validate(&value) {
        let details: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        return Err(ScraperError::Extraction {
            message: format!("response failed schema validation: {}", details.join("; ")),
        });
    }

    let mut artists = Vec::new();
    match value.get("artists") {
        Some(Value::Array(items)) => {
            for name in items.iter().filter_map(Value::as_str) {
                push_unique(&mut artists, name);
            }
        }
        Some(Value::String(joined)) => {
            for name in joined.split(',') {
                push_unique(&mut artists, name);
            }
        }
        _ => {}
    }

    Ok(ExtractedFields {
        title: optional_text(&value, "title"),
        description: optional_text(&value, "description"),
        artists,
        location: optional_text(&value, "location"),
        period: optional_text(&value, "period"),
        hours: optional_text(&value, "hours"),
    })
}
