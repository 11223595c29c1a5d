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

// Dynamic SQL end to end: mapper documents through bound SQL and execution.

mod common;

use std::sync::Arc;

use common::{rows, MockDataSource, MockDb};
use sqlbind::config::xml::XmlMapperBuilder;
use sqlbind::config::{Configuration, Environment};
use sqlbind::core::{ObjectMap, Value};
use sqlbind::session::SqlSessionFactory;
use sqlbind::types::JdbcType;

const MAPPER: &str = r#"
<mapper namespace="blog.PostMapper">
  <select id="search" resultType="map">
    select * from post
    <where>
      <if test="id != null">AND id = #{id}</if>
      <if test="title != null">AND title = #{title}</if>
    </where>
  </select>
  <select id="selectByIds" resultType="map">
    select * from post where id in
    <foreach collection="list" item="x" open="(" close=")" separator=",">#{x}</foreach>
  </select>
  <update id="rename">
    update post
    <set>
      <if test="title != null">title = #{title},</if>
      <if test="subject != null">subject = #{subject},</if>
    </set>
    where id = #{id}
  </update>
  <select id="byKind" resultType="map">
    select * from post
    <choose>
      <when test="kind == 'draft'">where draft = 1</when>
      <otherwise>where draft = 0</otherwise>
    </choose>
  </select>
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

fn object(pairs: &[(&str, Value)]) -> Value {
    let mut map = ObjectMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    Value::Object(map)
}

#[test]
fn test_where_with_all_conditions_false() {
    let db = MockDb::new();
    db.on_rows(
        "select * from post",
        rows(&[("id", JdbcType::BigInt)], vec![vec![Value::Integer(1)]]),
    );
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let rows = session
        .select_list("blog.PostMapper.search", Value::empty_object())
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(db.execution_count("select * from post"), 1);
}

#[test]
fn test_where_strips_leading_and() {
    let db = MockDb::new();
    db.on_rows(
        "select * from post WHERE id = ?",
        rows(&[("id", JdbcType::BigInt)], vec![vec![Value::Integer(7)]]),
    );
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let parameter = object(&[("id", Value::Integer(7))]);
    session
        .select_list("blog.PostMapper.search", parameter)
        .unwrap();
    assert_eq!(
        db.params_of("select * from post WHERE id = ?", 0),
        Some(vec![Value::Integer(7)])
    );
}

#[test]
fn test_where_keeps_second_condition_joined() {
    let db = MockDb::new();
    db.on_rows(
        "select * from post WHERE id = ? AND title = ?",
        rows(&[("id", JdbcType::BigInt)], vec![]),
    );
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let parameter = object(&[("id", Value::Integer(1)), ("title", Value::text("t"))]);
    let rows = session
        .select_list("blog.PostMapper.search", parameter)
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(
        db.params_of("select * from post WHERE id = ? AND title = ?", 0),
        Some(vec![Value::Integer(1), Value::text("t")])
    );
}

#[test]
fn test_foreach_binds_one_parameter_per_element() {
    let db = MockDb::new();
    db.on_rows(
        "select * from post where id in (?,?,?)",
        rows(&[("id", JdbcType::BigInt)], vec![]),
    );
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let ids = Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
    session
        .select_list("blog.PostMapper.selectByIds", ids)
        .unwrap();
    assert_eq!(
        db.params_of("select * from post where id in (?,?,?)", 0),
        Some(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3)
        ])
    );
}

#[test]
fn test_set_strips_trailing_comma() {
    let db = MockDb::new();
    db.on_update("update post SET title = ? where id = ?", 1);
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    let mut parameter = object(&[("id", Value::Integer(3)), ("title", Value::text("new"))]);
    let affected = session
        .update("blog.PostMapper.rename", &mut parameter)
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        db.params_of("update post SET title = ? where id = ?", 0),
        Some(vec![Value::text("new"), Value::Integer(3)])
    );
    session.rollback().unwrap();
}

#[test]
fn test_choose_picks_branch() {
    let db = MockDb::new();
    db.on_rows("select * from post where draft = 1", rows(&[], vec![]));
    db.on_rows("select * from post where draft = 0", rows(&[], vec![]));
    let factory = factory(&db);
    let mut session = factory.open_session().unwrap();

    session
        .select_list(
            "blog.PostMapper.byKind",
            object(&[("kind", Value::text("draft"))]),
        )
        .unwrap();
    session
        .select_list(
            "blog.PostMapper.byKind",
            object(&[("kind", Value::text("published"))]),
        )
        .unwrap();

    assert_eq!(db.execution_count("select * from post where draft = 1"), 1);
    assert_eq!(db.execution_count("select * from post where draft = 0"), 1);
}
