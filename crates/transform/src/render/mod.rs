//! 템플릿 렌더링 -- 플레이스홀더 치환 및 필터 체인 적용
//!
//! 템플릿 본문을 깊이 우선으로 순회하며 `${name|filter|filter}` 형태의
//! 플레이스홀더를 추출된 값으로 치환합니다.
//!
//! # 치환 규칙
//! - 문자열 전체가 하나의 플레이스홀더이면 값의 JSON 타입이 유지됩니다
//!   (`"${count}"` -> `42`).
//! - 플레이스홀더가 다른 텍스트와 섞여있으면 값은 정확히 한 번만
//!   문자열화됩니다. 구조화된 값을 이스케이프한 뒤 다시 이스케이프하는
//!   이중 이스케이프는 발생하지 않습니다.
//!
//! # 아키텍처
//! - [`Renderer`]: 본문 순회 및 플레이스홀더 치환
//! - [`filters`]: 닫힌 필터 레지스트리 (순수 함수 집합)

pub mod filters;

pub use filters::Filter;

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::error::TransformError;
use crate::template::MappingTemplate;

/// 플레이스홀더 패턴: `${name}` 또는 `${name|filter|filter:arg}`
const PLACEHOLDER_PATTERN: &str = r"\$\{([^}]+)\}";

/// 템플릿 렌더러
///
/// 템플릿과 추출된 필드 맵으로부터 후보 출력 레코드(JSON)를
/// 생성합니다. 렌더링은 입력을 변경하지 않으며, 같은 입력에 대해
/// 항상 같은 출력을 냅니다. 여러 이벤트가 같은 템플릿에 대해
/// 동시에 렌더링될 수 있습니다.
#[derive(Debug)]
pub struct Renderer {
    placeholder: Regex,
}

impl Renderer {
    /// 새 렌더러를 생성합니다.
    pub fn new() -> Result<Self, TransformError> {
        Ok(Self {
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// 템플릿 본문에 추출된 필드를 치환하여 후보 레코드를 생성합니다.
    pub fn render(
        &self,
        template: &MappingTemplate,
        fields: &HashMap<String, Value>,
    ) -> Result<Value, TransformError> {
        self.render_node(&template.body, fields)
    }

    fn render_node(
        &self,
        node: &Value,
        fields: &HashMap<String, Value>,
    ) -> Result<Value, TransformError> {
        match node {
            Value::String(s) => self.render_string(s, fields),
            Value::Array(items) => {
                let rendered: Result<Vec<Value>, TransformError> = items
                    .iter()
                    .map(|item| self.render_node(item, fields))
                    .collect();
                Ok(Value::Array(rendered?))
            }
            Value::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    rendered.insert(key.clone(), self.render_node(value, fields)?);
                }
                Ok(Value::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }

    fn render_string(
        &self,
        text: &str,
        fields: &HashMap<String, Value>,
    ) -> Result<Value, TransformError> {
        // 문자열 전체가 하나의 플레이스홀더인 경우 타입을 유지합니다
        if let Some(caps) = self.placeholder.captures(text) {
            let whole = caps.get(0).map(|m| m.as_str() == text).unwrap_or(false);
            if whole {
                return self.resolve(&caps[1], fields);
            }
        }

        // 텍스트에 섞인 플레이스홀더는 문자열화하여 치환합니다
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;
        for caps in self.placeholder.captures_iter(text) {
            let matched = caps.get(0).ok_or_else(|| TransformError::Render {
                placeholder: text.to_owned(),
                reason: "placeholder match without capture".to_owned(),
            })?;
            result.push_str(&text[last_end..matched.start()]);
            let value = self.resolve(&caps[1], fields)?;
            result.push_str(&embed(&value));
            last_end = matched.end();
        }
        result.push_str(&text[last_end..]);
        Ok(Value::String(result))
    }

    /// `name|filter|filter` 플레이스홀더 내부를 해석합니다.
    fn resolve(
        &self,
        inner: &str,
        fields: &HashMap<String, Value>,
    ) -> Result<Value, TransformError> {
        let mut parts = inner.split('|');
        let name = parts.next().unwrap_or_default().trim();

        let mut value = fields
            .get(name)
            .cloned()
            .ok_or_else(|| TransformError::Render {
                placeholder: name.to_owned(),
                reason: "no extractor with this name".to_owned(),
            })?;

        for filter_spec in parts {
            let filter = Filter::parse(filter_spec.trim())?;
            value = filter.apply(value);
        }

        Ok(value)
    }
}

/// 값을 주변 텍스트에 삽입하기 위해 문자열화합니다.
///
/// 문자열은 따옴표 없이 그대로, null은 빈 문자열로, 그 외에는
/// 컴팩트 JSON으로 정확히 한 번 직렬화됩니다.
fn embed(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::OutputFormat;
    use serde_json::json;

    fn template_with_body(body: Value) -> MappingTemplate {
        MappingTemplate {
            id: "test".to_owned(),
            event_type: "security_alert".to_owned(),
            format: OutputFormat::Findings,
            extractors: vec![],
            body,
        }
    }

    fn fields(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn whole_placeholder_preserves_type() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "count": "${count}",
            "enabled": "${enabled}",
            "tags": "${tags}"
        }));
        let values = fields(&[
            ("count", json!(42)),
            ("enabled", json!(true)),
            ("tags", json!(["a", "b"])),
        ]);

        let rendered = renderer.render(&template, &values).unwrap();
        assert_eq!(rendered["count"], json!(42));
        assert_eq!(rendered["enabled"], json!(true));
        assert_eq!(rendered["tags"], json!(["a", "b"]));
    }

    #[test]
    fn embedded_placeholder_stringifies_once() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "title": "Alert ${id} on ${host}",
            "summary": "count=${count}"
        }));
        let values = fields(&[
            ("id", json!("a-1")),
            ("host", json!("web-01")),
            ("count", json!(3)),
        ]);

        let rendered = renderer.render(&template, &values).unwrap();
        assert_eq!(rendered["title"], json!("Alert a-1 on web-01"));
        assert_eq!(rendered["summary"], json!("count=3"));
    }

    #[test]
    fn filter_chain_applies_in_order() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "label": "${severity|severity_label}",
            "score": "${severity|severity_score}",
            "host": "${host|lowercase|replace:\\.:_}"
        }));
        let values = fields(&[("severity", json!("high")), ("host", json!("Web.Prod.01"))]);

        let rendered = renderer.render(&template, &values).unwrap();
        assert_eq!(rendered["label"], json!("HIGH"));
        assert_eq!(rendered["score"], json!(80));
        assert_eq!(rendered["host"], json!("web_prod_01"));
    }

    #[test]
    fn structure_is_never_double_escaped() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "additionalEventData": "${details|to_json}"
        }));
        let details = json!({"path": "/etc/passwd", "nested": {"a": 1}});
        let values = fields(&[("details", details.clone())]);

        let rendered = renderer.render(&template, &values).unwrap();
        let serialized = rendered["additionalEventData"].as_str().unwrap();

        // 한 번만 직렬화되었으므로 역직렬화 한 번으로 원본 복원
        let parsed: Value = serde_json::from_str(serialized).unwrap();
        assert_eq!(parsed, details);
    }

    #[test]
    fn quotes_and_angle_brackets_round_trip_unescaped() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "Title": "${message}",
            "Description": "alert: ${message}",
            "additionalEventData": "${details|to_json}"
        }));
        let message = r#"he said "x <script>""#;
        let details = json!({"note": message});
        let values = fields(&[("message", json!(message)), ("details", details.clone())]);

        let rendered = renderer.render(&template, &values).unwrap();
        assert_eq!(rendered["Title"], json!(message));
        assert_eq!(rendered["Description"], json!(format!("alert: {message}")));

        // 레코드 직렬화 후 역직렬화 한 번으로 원본 문자열 복원
        let wire = serde_json::to_string(&rendered).unwrap();
        let parsed: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed["Title"].as_str().unwrap(), message);
        assert_eq!(
            parsed["Description"].as_str().unwrap(),
            format!("alert: {message}")
        );

        // to_json으로 내장된 구조 역시 역직렬화 한 번으로 복원
        let inner: Value =
            serde_json::from_str(parsed["additionalEventData"].as_str().unwrap()).unwrap();
        assert_eq!(inner, details);
        assert_eq!(inner["note"].as_str().unwrap(), message);
    }

    #[test]
    fn unknown_placeholder_name_fails() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({"id": "${missing}"}));
        let result = renderer.render(&template, &HashMap::new());
        assert!(matches!(result, Err(TransformError::Render { .. })));
    }

    #[test]
    fn unknown_filter_fails() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({"id": "${id|exec}"}));
        let values = fields(&[("id", json!("x"))]);
        assert!(renderer.render(&template, &values).is_err());
    }

    #[test]
    fn null_value_renders_as_null_or_empty() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "typed": "${missing_value}",
            "embedded": "id=${missing_value}"
        }));
        let values = fields(&[("missing_value", Value::Null)]);

        let rendered = renderer.render(&template, &values).unwrap();
        assert_eq!(rendered["typed"], Value::Null);
        assert_eq!(rendered["embedded"], json!("id="));
    }

    #[test]
    fn literal_values_pass_through() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "SchemaVersion": "2018-10-08",
            "class_uid": 4001,
            "nested": {"fixed": true}
        }));

        let rendered = renderer.render(&template, &HashMap::new()).unwrap();
        assert_eq!(rendered["SchemaVersion"], json!("2018-10-08"));
        assert_eq!(rendered["class_uid"], json!(4001));
        assert_eq!(rendered["nested"]["fixed"], json!(true));
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "Id": "${alert_id|stable_id}"
        }));
        let values = fields(&[("alert_id", json!("alert-9"))]);

        let first = renderer.render(&template, &values).unwrap();
        let second = renderer.render(&template, &values).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn placeholders_inside_arrays_are_rendered() {
        let renderer = Renderer::new().unwrap();
        let template = template_with_body(json!({
            "Resources": [
                {"Type": "AwsEc2Instance", "Id": "${instance_id}"}
            ]
        }));
        let values = fields(&[("instance_id", json!("i-0abc"))]);

        let rendered = renderer.render(&template, &values).unwrap();
        assert_eq!(rendered["Resources"][0]["Id"], json!("i-0abc"));
    }
}
