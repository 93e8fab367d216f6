//! Tests for SQL emission: projections, condition rendering, precedence
//! parenthesization, and parameter index assignment.

mod common;
use common::*;

use oql_core::DefaultDialect;

#[test]
fn whole_entity_projection_expands_columns() {
    let s = schema();
    let q = emit(&s, "FROM User AS u WHERE id = :Id and u.name like '%test%'");
    assert_eq!(
        q.sql(),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.id = ? AND _t1.name LIKE '%test%'"
    );
    assert_eq!(q.parameter_indices("Id"), Some(&[1][..]));
    assert_eq!(q.entity().map(|e| e.name()), Some("User"));
    assert_eq!(q.col_count(), 3);
}

#[test]
fn field_projection_leaves_entity_unset() {
    let s = schema();
    let q = emit(&s, "SELECT id, name FROM User WHERE flags = 1");
    assert_eq!(
        q.sql(),
        "SELECT _t1.id, _t1.name FROM users AS _t1 WHERE _t1.flags = 1"
    );
    assert!(q.entity().is_none());
    assert_eq!(q.col_count(), 2);
}

#[test]
fn order_by_renders_desc_only() {
    let s = schema();
    assert_eq!(
        sql(&s, "FROM User ORDER BY name, flags DESC"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         ORDER BY _t1.name, _t1.flags DESC"
    );
    assert_eq!(
        sql(&s, "SELECT id FROM User ORDER BY name ASC"),
        "SELECT _t1.id FROM users AS _t1 ORDER BY _t1.name"
    );
}

#[test]
fn loose_operators_get_parenthesized() {
    let s = schema();
    assert_eq!(
        sql(&s, "FROM User WHERE (id = 1 OR id = 2) AND flags = 3"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE (_t1.id = 1 OR _t1.id = 2) AND _t1.flags = 3"
    );
    // Natural precedence needs no parentheses.
    assert_eq!(
        sql(&s, "FROM User WHERE id = 1 OR id = 2 AND flags = 3"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.id = 1 OR _t1.id = 2 AND _t1.flags = 3"
    );
}

#[test]
fn bracket_idempotence() {
    let s = schema();
    let plain = sql(&s, "FROM User WHERE id = 1 AND name = 'x'");
    let once = sql(&s, "FROM User WHERE (id = 1 AND name = 'x')");
    let twice = sql(&s, "FROM User WHERE ((id = 1 AND name = 'x'))");
    assert_eq!(plain, once);
    assert_eq!(plain, twice);
}

#[test]
fn between_and_arithmetic() {
    let s = schema();
    assert_eq!(
        sql(&s, "FROM User WHERE flags BETWEEN 2*2 AND 42/5"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.flags BETWEEN 2 * 2 AND 42 / 5"
    );
}

#[test]
fn unary_and_not_rendering() {
    let s = schema();
    assert_eq!(
        sql(&s, "FROM User WHERE flags = -5 + 7"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.flags = -5 + 7"
    );
    assert_eq!(
        sql(&s, "FROM User WHERE NOT (flags = 1)"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE NOT (_t1.flags = 1)"
    );
}

#[test]
fn postfix_null_checks() {
    let s = schema();
    assert_eq!(
        sql(&s, "FROM User WHERE name IS NULL AND flags IS NOT NULL"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.name IS NULL AND _t1.flags IS NOT NULL"
    );
}

#[test]
fn keyword_division_operators() {
    let s = schema();
    assert_eq!(
        sql(&s, "FROM User WHERE flags DIV 2 = 1 AND flags MOD 2 = 0"),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.flags DIV 2 = 1 AND _t1.flags MOD 2 = 0"
    );
}

#[test]
fn complex_condition_round_trips_through_emission() {
    let s = schema();
    let q = emit(
        &s,
        "FROM User WHERE ((id = :Id) OR (name LIKE 'a%' AND flags = (-5 + 7))) \
         AND flags BETWEEN 2*2 AND 42/5",
    );
    assert_eq!(
        q.sql(),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE (_t1.id = ? OR _t1.name LIKE 'a%' AND _t1.flags = -5 + 7) \
         AND _t1.flags BETWEEN 2 * 2 AND 42 / 5"
    );
    assert_eq!(q.parameter_indices("Id"), Some(&[1][..]));
}

#[test]
fn embedded_path_flattens_to_parent_table() {
    let s = schema();
    let q = emit(&s, "SELECT id FROM Customer c WHERE c.address.zip = :z");
    assert_eq!(
        q.sql(),
        "SELECT _t1.id FROM customers AS _t1 WHERE _t1.zip_code = ?"
    );
}

#[test]
fn string_escapes_follow_the_dialect() {
    let s = schema();
    let q = emit(&s, "FROM User WHERE name = 'a\nb'");
    assert_eq!(
        q.sql(),
        "SELECT _t1.id, _t1.name, _t1.flags FROM users AS _t1 \
         WHERE _t1.name = 'a\\nb'"
    );
}

#[test]
fn raw_in_and_is_are_rejected_at_emission() {
    let s = schema();
    let parsed = parse(&s, "FROM User WHERE id IN (1, 2)");
    let err = parsed
        .emit(&DefaultDialect::new())
        .expect_err("IN is not supported");
    assert!(err.to_string().contains("operator `IN` is not supported"), "{err}");

    let parsed = parse(&s, "FROM User WHERE id IS 1");
    let err = parsed
        .emit(&DefaultDialect::new())
        .expect_err("raw IS is not supported");
    assert!(err.to_string().contains("operator `IS` is not supported"), "{err}");
}

#[test]
fn parameter_indices_accumulate_in_emission_order() {
    let s = schema();
    let q = emit(
        &s,
        "FROM User WHERE id = :p1 OR id = :p2 OR flags = :p1 AND flags != :p3",
    );
    assert_eq!(q.parameter_indices("p1"), Some(&[1, 3][..]));
    assert_eq!(q.parameter_indices("p2"), Some(&[2][..]));
    assert_eq!(q.parameter_indices("p3"), Some(&[4][..]));
    assert_eq!(q.param_count(), 4);
    assert_eq!(q.sql().matches('?').count(), 4);
}

#[test]
fn display_is_the_sql_text() {
    let s = schema();
    let q = emit(&s, "SELECT id FROM User");
    assert_eq!(q.to_string(), q.sql());
    assert_eq!(q.oql(), "SELECT id FROM User");
}
