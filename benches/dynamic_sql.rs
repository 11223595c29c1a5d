// Copyright 2025 Sqlbind Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sqlbind::cache::CacheKey;
use sqlbind::core::{ObjectMap, Value};
use sqlbind::scripting::{SqlNode, SqlSource};
use sqlbind::types::TypeHandlerRegistry;

fn search_source() -> SqlSource {
    let root = SqlNode::Mixed(vec![
        SqlNode::static_text("select * from post"),
        SqlNode::where_node(SqlNode::Mixed(vec![
            SqlNode::If {
                test: "id != null".to_string(),
                body: Box::new(SqlNode::static_text("AND id = #{id}")),
            },
            SqlNode::If {
                test: "title != null".to_string(),
                body: Box::new(SqlNode::static_text("AND title = #{title}")),
            },
        ])),
    ]);
    SqlSource::dynamic(root)
}

fn in_clause_source() -> SqlSource {
    let root = SqlNode::Mixed(vec![
        SqlNode::static_text("select * from post where id in"),
        SqlNode::Foreach {
            collection: "list".to_string(),
            item: Some("x".to_string()),
            index: None,
            open: Some("(".to_string()),
            close: Some(")".to_string()),
            separator: Some(",".to_string()),
            body: Box::new(SqlNode::static_text("#{x}")),
        },
    ]);
    SqlSource::dynamic(root)
}

fn bench_dynamic_sql(c: &mut Criterion) {
    let registry = TypeHandlerRegistry::new();

    let search = search_source();
    let mut parameter = ObjectMap::new();
    parameter.insert("id".to_string(), Value::Integer(7));
    parameter.insert("title".to_string(), Value::text("rust"));
    let parameter = Value::Object(parameter);
    c.bench_function("dynamic_where_two_conditions", |b| {
        b.iter(|| {
            let bound = search
                .bound_sql(&registry, black_box(&parameter), None)
                .unwrap();
            black_box(bound.sql);
        })
    });

    let in_clause = in_clause_source();
    let mut list_parameter = ObjectMap::new();
    list_parameter.insert(
        "list".to_string(),
        Value::Array((0..50).map(Value::from).collect::<Vec<_>>()),
    );
    let list_parameter = Value::Object(list_parameter);
    c.bench_function("foreach_50_elements", |b| {
        b.iter(|| {
            let bound = in_clause
                .bound_sql(&registry, black_box(&list_parameter), None)
                .unwrap();
            black_box(bound.parameter_mappings.len());
        })
    });
}

fn bench_cache_key(c: &mut Criterion) {
    c.bench_function("cache_key_digest", |b| {
        b.iter(|| {
            let mut key = CacheKey::new();
            key.update(Value::text("blog.PostMapper.selectPost"));
            key.update(Value::Integer(0));
            key.update(Value::Integer(i64::MAX));
            key.update(Value::text("select * from post where id = ?"));
            key.update(Value::Integer(black_box(42)));
            key.update(Value::text("dev"));
            black_box(key);
        })
    });
}

criterion_group!(benches, bench_dynamic_sql, bench_cache_key);
criterion_main!(benches);
