use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use courier::env::resolver::{Variables, substitute};
use courier::state::environment::{EnvVariable, Environment};

fn environment(size: usize) -> Environment {
    Environment::with_variables(
        "bench",
        (0..size)
            .map(|i| EnvVariable::new(format!("var{i}"), format!("value-{i}")))
            .collect(),
    )
}

fn bench_substitution(c: &mut Criterion) {
    let env = environment(50);
    let url = "https://{{var1}}.example.com/{{var2}}/items/{{var49}}?q={{missing}}&page={{var3}}";
    let body = json!({
        "user": {"name": "{{var4}}", "tags": ["{{var5}}", "{{var6}}", "static"]},
        "items": (0..20).map(|i| json!({"id": i, "sku": "{{var7}}"})).collect::<Vec<_>>(),
    });

    c.bench_function("substitute_str url", |b| {
        let vars = Variables::from_env(Some(&env));
        b.iter(|| vars.substitute_str(black_box(url)))
    });

    c.bench_function("substitute json body", |b| {
        b.iter(|| substitute(black_box(&body), &env))
    });

    c.bench_function("build variable table", |b| {
        b.iter(|| Variables::from_env(Some(black_box(&env))))
    });
}

criterion_group!(benches, bench_substitution);
criterion_main!(benches);
