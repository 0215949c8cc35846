use criterion::{criterion_group, criterion_main, Criterion};
use rulecast_core::{potential_rules, ContextFilter, Rule, RuleTree};
use std::collections::HashMap;

fn benchmark_resolve_wide_rule_set(c: &mut Criterion) {
    let features: Vec<String> = ["env", "service", "region"]
        .iter()
        .map(|f| f.to_string())
        .collect();

    let mut rules = vec![Rule::default_rule("default".to_string())];
    let mut id = 0;
    for env in ["prod", "staging", "dev"] {
        for service in 0..20 {
            for region in ["eu", "us", "ap"] {
                id += 1;
                let mut context_features = HashMap::new();
                context_features.insert("env".to_string(), env.to_string());
                context_features.insert("service".to_string(), format!("svc-{service}"));
                context_features.insert("region".to_string(), region.to_string());
                rules.push(Rule::new(id, format!("value-{id}"), context_features));
            }
        }
    }
    let tree = RuleTree::build(&rules, &features);

    // env pinned, service open, region open: the worst case for the
    // pairwise pruning pass
    let filter = ContextFilter::new().pin("env", "prod");

    c.bench_function("resolve_180_rules_partial_context", |b| {
        b.iter(|| {
            let ranked = potential_rules(&tree, &features, &filter, |_| true);
            assert!(!ranked.is_empty());
        })
    });
}

fn benchmark_copy_on_write_add(c: &mut Criterion) {
    let features: Vec<String> = ["env", "service"].iter().map(|f| f.to_string()).collect();
    let mut rules = Vec::new();
    for i in 0..100 {
        let mut context_features = HashMap::new();
        context_features.insert("env".to_string(), format!("env-{}", i % 10));
        context_features.insert("service".to_string(), format!("svc-{i}"));
        rules.push(Rule::new(i, "v".to_string(), context_features));
    }
    let tree = RuleTree::build(&rules, &features);

    let mut context_features = HashMap::new();
    context_features.insert("env".to_string(), "env-3".to_string());
    context_features.insert("service".to_string(), "svc-new".to_string());
    let new_rule = Rule::new(1000, "v".to_string(), context_features);

    c.bench_function("add_shares_unaffected_subtrees", |b| {
        b.iter(|| {
            let next = tree.add(&new_rule, &features);
            assert!(!next.is_empty());
        })
    });
}

criterion_group!(
    benches,
    benchmark_resolve_wide_rule_set,
    benchmark_copy_on_write_add
);
criterion_main!(benches);
