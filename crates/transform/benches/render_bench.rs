//! 템플릿 렌더링 벤치마크
//!
//! 플레이스홀더 치환과 필터 체인의 처리량을 측정합니다.

use std::collections::HashMap;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use relayforge_transform::render::Renderer;
use relayforge_transform::template::{MappingTemplate, OutputFormat};
use serde_json::{Value, json};

fn template_of(body: Value) -> MappingTemplate {
    MappingTemplate {
        id: "bench".to_owned(),
        event_type: "security_alert".to_owned(),
        format: OutputFormat::Findings,
        extractors: Vec::new(),
        body,
    }
}

fn sample_fields() -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("alert_id".to_owned(), json!("alert-0001"));
    fields.insert("severity".to_owned(), json!(8.2));
    fields.insert("title".to_owned(), json!("Suspicious console login"));
    fields.insert("account_id".to_owned(), json!("123456789012"));
    fields.insert("region".to_owned(), json!("us-east-1"));
    fields.insert("time".to_owned(), json!(1714564800000i64));
    fields.insert(
        "detail".to_owned(),
        json!({"srcAddr": "203.0.113.45", "dstPort": 22}),
    );
    fields
}

fn bench_placeholders(c: &mut Criterion) {
    let renderer = Renderer::new().unwrap();
    let fields = sample_fields();
    let mut group = c.benchmark_group("render_placeholders");

    group.throughput(Throughput::Elements(1));
    // 전체 문자열 치환 (타입 보존 경로)
    group.bench_function("whole_string", |b| {
        let template = template_of(json!({"Severity": "${severity}"}));
        b.iter(|| renderer.render(black_box(&template), black_box(&fields)).unwrap())
    });

    // 문자열 내 삽입
    group.bench_function("embedded", |b| {
        let template =
            template_of(json!({"Description": "alert ${alert_id} in ${region}: ${title}"}));
        b.iter(|| renderer.render(black_box(&template), black_box(&fields)).unwrap())
    });

    group.finish();
}

fn bench_filter_chains(c: &mut Criterion) {
    let renderer = Renderer::new().unwrap();
    let fields = sample_fields();
    let mut group = c.benchmark_group("render_filters");

    group.bench_function("severity_label", |b| {
        let template = template_of(json!({"Label": "${severity|severity_label}"}));
        b.iter(|| renderer.render(black_box(&template), black_box(&fields)).unwrap())
    });

    group.bench_function("iso8601", |b| {
        let template = template_of(json!({"CreatedAt": "${time|iso8601}"}));
        b.iter(|| renderer.render(black_box(&template), black_box(&fields)).unwrap())
    });

    group.bench_function("stable_id", |b| {
        let template = template_of(json!({"Id": "${alert_id|stable_id}"}));
        b.iter(|| renderer.render(black_box(&template), black_box(&fields)).unwrap())
    });

    group.bench_function("chained", |b| {
        let template = template_of(json!({"Title": "${title|lowercase|to_json}"}));
        b.iter(|| renderer.render(black_box(&template), black_box(&fields)).unwrap())
    });

    group.finish();
}

fn bench_full_record(c: &mut Criterion) {
    let renderer = Renderer::new().unwrap();
    let fields = sample_fields();
    let template = template_of(json!({
        "SchemaVersion": "2018-10-08",
        "Id": "${alert_id|stable_id}",
        "Title": "${title}",
        "Description": "alert ${alert_id} in ${region}",
        "CreatedAt": "${time|iso8601}",
        "Severity": {
            "Label": "${severity|severity_label}",
            "Normalized": "${severity|severity_label|severity_score}"
        },
        "Resources": [
            {"Type": "AwsAccount", "Id": "${account_id}", "Region": "${region}"}
        ],
        "ProductFields": {"Detail": "${detail|to_json}"}
    }));

    let mut group = c.benchmark_group("render_record");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("findings_x1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                renderer
                    .render(black_box(&template), black_box(&fields))
                    .unwrap();
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_placeholders, bench_filter_chains, bench_full_record);
criterion_main!(benches);
