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

// Mapper dispatch end to end: argument naming, declared return shapes,
// optional semantics, cursors and super-interface fallback.

mod common;

use std::sync::Arc;

use common::{rows, MockDataSource, MockDb};
use sqlbind::binding::{Args, MapperSpec, MethodSpec, ReturnShape};
use sqlbind::config::xml::XmlMapperBuilder;
use sqlbind::config::{Configuration, Environment};
use sqlbind::core::{meta, Error, Value};
use sqlbind::session::SqlSessionFactory;
use sqlbind::types::JdbcType;

const MAPPER: &str = r#"
<mapper namespace="blog.PostMapper">
  <select id="findById" resultType="map">
    select id, title from post where id = #{id}
  </select>
  <select id="findAll" resultType="map">
    select id, title from post
  </select>
  <select id="findAllById" resultType="map">
    select id, title from post
  </select>
  <select id="countPosts" resultType="integer">
    select count(*) from post
  </select>
  <update id="rename">
    update post set title = #{title} where id = #{id}
  </update>
</mapper>
"#;

fn factory(db: &Arc<MockDb>) -> SqlSessionFactory {
    let mut config = Configuration::new();
    config.environment = Some(Environment::new(
        "test",
        Arc::new(MockDataSource::new(db.clone())),
    ));
    XmlMapperBuilder::parse(&mut config, MAPPER).expect("mapper should parse");

    config
        .mapper_registry
        .add(
            MapperSpec::new("blog.BaseMapper")
                .method(MethodSpec::new("countPosts").returns(ReturnShape::One)),
        )
        .unwrap();
    config
        .mapper_registry
        .add(
            MapperSpec::new("blog.PostMapper")
                .extends("blog.BaseMapper")
                .method(
                    MethodSpec::new("findById")
                        .param("id")
                        .returns(ReturnShape::Optional),
                )
                .method(MethodSpec::new("findAll").returns(ReturnShape::Many))
                .method(MethodSpec::new("findAllById").map_key("id"))
                .method(
                    MethodSpec::new("rename")
                        .param("id")
                        .param("title")
                        .returns(ReturnShape::AffectedBool),
                )
                .method(MethodSpec::new("scan").returns(ReturnShape::Cursor)),
        )
        .unwrap();
    SqlSessionFactory::new(config).expect("factory should build")
}

fn all_rows() -> common::MockRows {
    rows(
        &[("id", JdbcType::BigInt), ("title", JdbcType::Varchar)],
        vec![
            vec![Value::Integer(1), Value::text("a")],
            vec![Value::Integer(2), Value::text("b")],
        ],
    )
}

#[test]
fn test_optional_return_semantics() {
    let db = MockDb::new();
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    // zero rows: empty
    db.on_rows("select id, title from post where id = ?", rows(&[], vec![]));
    let absent: Option<Value> = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call_as("findById", Args::new().add(9i64))
        .unwrap();
    assert!(absent.is_none());

    // one row: present
    db.on_rows(
        "select id, title from post where id = ?",
        rows(
            &[("id", JdbcType::BigInt), ("title", JdbcType::Varchar)],
            vec![vec![Value::Integer(1), Value::text("a")]],
        ),
    );
    let mut session = factory.open_session().unwrap();
    let present: Option<Value> = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call_as("findById", Args::new().add(1i64))
        .unwrap();
    assert!(present.is_some());

    // multiple rows: an error
    db.on_rows("select id, title from post where id = ?", all_rows());
    let mut session = factory.open_session().unwrap();
    let too_many = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call("findById", Args::new().add(1i64));
    assert!(matches!(too_many, Err(Error::TooManyRows(2))));
}

#[test]
fn test_declared_param_name_binds() {
    let db = MockDb::new();
    db.on_rows("select id, title from post where id = ?", rows(&[], vec![]));
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    session
        .mapper("blog.PostMapper")
        .unwrap()
        .call("findById", Args::new().add(42i64))
        .unwrap();
    assert_eq!(
        db.params_of("select id, title from post where id = ?", 0),
        Some(vec![Value::Integer(42)])
    );
}

#[test]
fn test_many_and_map_keyed_shapes() {
    let db = MockDb::new();
    db.on_rows("select id, title from post", all_rows());
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let many = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call("findAll", Args::new())
        .unwrap();
    assert_eq!(many.len(), 2);

    let mut session = factory.open_session().unwrap();
    let keyed = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call("findAllById", Args::new())
        .unwrap();
    assert_eq!(keyed.len(), 2);
    assert_eq!(meta::get_path(&keyed, "1.title").unwrap(), Value::text("a"));
    assert_eq!(meta::get_path(&keyed, "2.title").unwrap(), Value::text("b"));
}

#[test]
fn test_affected_bool_coercion() {
    let db = MockDb::new();
    db.on_update("update post set title = ? where id = ?", 1);
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let renamed: bool = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call_as(
            "rename",
            Args::new().named("id", 1i64).named("title", "new"),
        )
        .unwrap();
    assert!(renamed);
    assert_eq!(
        db.params_of("update post set title = ? where id = ?", 0),
        Some(vec![Value::text("new"), Value::Integer(1)])
    );
    session.rollback().unwrap();
}

#[test]
fn test_scalar_through_super_interface() {
    let db = MockDb::new();
    db.on_rows(
        "select count(*) from post",
        rows(&[("count", JdbcType::BigInt)], vec![vec![Value::Integer(7)]]),
    );
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    // countPosts is declared on the super-interface only
    let count: i64 = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call_as("countPosts", Args::new())
        .unwrap();
    assert_eq!(count, 7);
}

#[test]
fn test_unknown_method_is_a_binding_error() {
    let db = MockDb::new();
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let missing = session
        .mapper("blog.PostMapper")
        .unwrap()
        .call("nope", Args::new());
    assert!(matches!(missing, Err(Error::MethodNotResolved { .. })));
}

#[test]
fn test_cursor_streams_rows() {
    let db = MockDb::new();
    db.on_rows("select id, title from post", all_rows());
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let cursor = session
        .mapper("blog.PostMapper")
        .unwrap()
        .cursor("scan", Args::new());
    // the scan method has no statement of its own
    assert!(cursor.is_err());

    let cursor = session
        .select_cursor(
            "blog.PostMapper.findAll",
            Value::Null,
            sqlbind::RowBounds::DEFAULT,
        )
        .unwrap();
    let collected: Vec<Value> = cursor.map(|row| row.unwrap()).collect();
    assert_eq!(collected.len(), 2);
    assert_eq!(
        meta::get_path(&collected[0], "title").unwrap(),
        Value::text("a")
    );
}
