use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use schemalens::position::PathSegment;
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "$defs": {
            "address": {
                "type": "object",
                "properties": {
                    "street": {"type": "string", "minLength": 1},
                    "zip": {"type": "string", "pattern": "^[0-9]{5}$"}
                },
                "required": ["street"]
            },
            "contact": {
                "oneOf": [
                    {"properties": {"email": {"type": "string"}}, "required": ["email"]},
                    {"properties": {"phone": {"type": "string"}}, "required": ["phone"]}
                ]
            }
        },
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "integer", "minimum": 0, "maximum": 150},
            "home": {"$ref": "#/$defs/address"},
            "contacts": {"type": "array", "items": {"$ref": "#/$defs/contact"}, "uniqueItems": true},
            "kind": {"enum": ["person", "company"]}
        },
        "if": {"properties": {"kind": {"const": "company"}}},
        "then": {"required": ["name"]},
        "additionalProperties": false
    })
}

fn instances() -> Vec<(&'static str, Value)> {
    vec![
        (
            "valid",
            json!({
                "name": "Ada",
                "age": 36,
                "home": {"street": "Main", "zip": "12345"},
                "contacts": [{"email": "ada@example.com"}, {"phone": "555"}],
                "kind": "person"
            }),
        ),
        (
            "invalid",
            json!({
                "age": -1,
                "home": {"zip": "abc"},
                "contacts": [{}, {"email": 1, "phone": "1"}],
                "kind": "company",
                "extra": true
            }),
        ),
    ]
}

fn bench_build(c: &mut Criterion) {
    let schema = schema();
    c.bench_with_input(BenchmarkId::new("build", "contacts"), &schema, |b, schema| {
        b.iter_with_large_drop(|| schemalens::validator_for(schema).expect("Valid schema"));
    });
}

fn bench_validate(c: &mut Criterion) {
    let validator = schemalens::validator_for(&schema()).expect("Valid schema");
    for (name, instance) in instances() {
        c.bench_with_input(BenchmarkId::new("is_valid", name), &instance, |b, instance| {
            b.iter(|| validator.is_valid_json(instance));
        });
        c.bench_with_input(BenchmarkId::new("validate", name), &instance, |b, instance| {
            b.iter_with_large_drop(|| validator.validate_json(instance));
        });
    }
}

fn bench_position(c: &mut Criterion) {
    let validator = schemalens::validator_for(&schema()).expect("Valid schema");
    let path = vec![PathSegment::from("contacts"), PathSegment::from(0_usize)];
    c.bench_with_input(BenchmarkId::new("schemas_at", "contacts/0"), &path, |b, path| {
        b.iter_with_large_drop(|| validator.property_names_at(path));
    });
}

criterion_group!(benches, bench_build, bench_validate, bench_position);
criterion_main!(benches);
