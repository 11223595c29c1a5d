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

// Executor strategies end to end: statement reuse, batch grouping and
// flushing, select-key generation, closed-executor protocol.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{rows, MockDataSource, MockDb};
use sqlbind::config::xml::XmlMapperBuilder;
use sqlbind::config::{Configuration, Environment, ExecutorType};
use sqlbind::core::{meta, Error, Value};
use sqlbind::executor::BATCH_UPDATE_RETURN_VALUE;
use sqlbind::session::SqlSessionFactory;
use sqlbind::types::JdbcType;

const MAPPER: &str = r#"
<mapper namespace="blog.WriteMapper">
  <select id="findById" resultType="map">
    select id, title from post where id = #{id}
  </select>
  <insert id="insertPost">
    insert into post (title) values (#{title})
  </insert>
  <insert id="insertWithSequence">
    <selectKey keyProperty="id" order="BEFORE" resultType="integer">
      select nextval from post_seq
    </selectKey>
    insert into post (id, title) values (#{id}, #{title})
  </insert>
</mapper>
"#;

fn factory(db: &Arc<MockDb>) -> SqlSessionFactory {
    let mut config = Configuration::new();
    config.environment = Some(Environment::new(
        "test",
        Arc::new(MockDataSource::new(db.clone())),
    ));
    XmlMapperBuilder::parse(&mut config, MAPPER).expect("mapper should parse");
    SqlSessionFactory::new(config).expect("factory should build")
}

fn id_param(id: i64) -> Value {
    let mut parameter = Value::empty_object();
    meta::set_path(&mut parameter, "id", Value::Integer(id)).unwrap();
    parameter
}

fn title_param(title: &str) -> Value {
    let mut parameter = Value::empty_object();
    meta::set_path(&mut parameter, "title", Value::text(title)).unwrap();
    parameter
}

#[test]
fn test_reuse_executor_prepares_once() {
    let db = MockDb::new();
    db.on_rows(
        "select id, title from post where id = ?",
        rows(&[("id", JdbcType::BigInt)], vec![vec![Value::Integer(1)]]),
    );
    let factory = factory(&db);
    let mut session = factory
        .open_session_with(ExecutorType::Reuse, false)
        .unwrap();

    session
        .select_list("blog.WriteMapper.findById", id_param(1))
        .unwrap();
    session
        .select_list("blog.WriteMapper.findById", id_param(2))
        .unwrap();

    // two executions over one prepared statement
    assert_eq!(
        db.execution_count("select id, title from post where id = ?"),
        2
    );
    assert_eq!(db.prepares.load(Ordering::SeqCst), 1);
}

#[test]
fn test_batch_groups_consecutive_writes() {
    let db = MockDb::new();
    db.on_update("insert into post (title) values (?)", 1);
    let factory = factory(&db);
    let mut session = factory
        .open_session_with(ExecutorType::Batch, false)
        .unwrap();

    for title in ["a", "b", "c"] {
        let mut parameter = title_param(title);
        let sentinel = session
            .insert("blog.WriteMapper.insertPost", &mut parameter)
            .unwrap();
        assert_eq!(sentinel, BATCH_UPDATE_RETURN_VALUE);
    }
    // nothing hit the driver yet
    assert_eq!(db.execution_count("insert into post (title) values (?)"), 0);

    let results = session.flush_statements().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].update_counts, vec![1, 1, 1]);
    assert_eq!(results[0].parameter_objects.len(), 3);
    assert_eq!(db.execution_count("insert into post (title) values (?)"), 3);
    assert_eq!(
        db.params_of("insert into post (title) values (?)", 2),
        Some(vec![Value::text("c")])
    );
    session.rollback().unwrap();
}

#[test]
fn test_select_interleaved_with_batch_flushes_first() {
    let db = MockDb::new();
    db.on_update("insert into post (title) values (?)", 1);
    db.on_rows(
        "select id, title from post where id = ?",
        rows(&[("id", JdbcType::BigInt)], vec![vec![Value::Integer(1)]]),
    );
    let factory = factory(&db);
    let mut session = factory
        .open_session_with(ExecutorType::Batch, false)
        .unwrap();

    let mut parameter = title_param("pending");
    session
        .insert("blog.WriteMapper.insertPost", &mut parameter)
        .unwrap();
    session
        .select_list("blog.WriteMapper.findById", id_param(1))
        .unwrap();

    // the pending batch was submitted before the select ran
    assert_eq!(db.execution_count("insert into post (title) values (?)"), 1);
    session.rollback().unwrap();
}

#[test]
fn test_rollback_discards_pending_batches() {
    let db = MockDb::new();
    db.on_update("insert into post (title) values (?)", 1);
    let factory = factory(&db);
    let mut session = factory
        .open_session_with(ExecutorType::Batch, false)
        .unwrap();

    let mut parameter = title_param("doomed");
    session
        .insert("blog.WriteMapper.insertPost", &mut parameter)
        .unwrap();
    session.rollback().unwrap();

    assert_eq!(db.execution_count("insert into post (title) values (?)"), 0);
}

#[test]
fn test_select_key_runs_before_insert() {
    let db = MockDb::new();
    db.on_rows(
        "select nextval from post_seq",
        rows(
            &[("nextval", JdbcType::BigInt)],
            vec![vec![Value::Integer(41)]],
        ),
    );
    db.on_update("insert into post (id, title) values (?, ?)", 1);
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let mut parameter = title_param("keyed");
    session
        .insert("blog.WriteMapper.insertWithSequence", &mut parameter)
        .unwrap();

    // the sequence value landed in the parameter and in the insert binding
    assert_eq!(meta::get_path(&parameter, "id").unwrap(), Value::Integer(41));
    assert_eq!(
        db.params_of("insert into post (id, title) values (?, ?)", 0),
        Some(vec![Value::Integer(41), Value::text("keyed")])
    );
    session.rollback().unwrap();
}

#[test]
fn test_closed_session_rejects_work() {
    let db = MockDb::new();
    db.on_rows(
        "select id, title from post where id = ?",
        rows(&[("id", JdbcType::BigInt)], vec![]),
    );
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();
    session.close();

    let result = session.select_list("blog.WriteMapper.findById", id_param(1));
    assert!(matches!(result, Err(Error::ExecutorClosed)));

    let commit = session.commit_force(true);
    assert!(matches!(
        commit,
        Err(Error::TransactionClosed { operation: "commit" })
    ));
}
