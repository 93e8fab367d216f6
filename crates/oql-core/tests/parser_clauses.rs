//! Tests for clause splitting, FROM/SELECT/ORDER BY parsing, and their
//! error cases.

mod common;
use common::*;

#[test]
fn full_query_structure() {
    let s = schema();
    let p = parse(
        &s,
        "SELECT a FROM User AS a WHERE id = :Id AND name != :skipName OR name IS NULL \
         AND a.flags IS NOT NULL ORDER BY name, a.flags DESC",
    );

    assert_eq!(p.parameter_names(), vec!["Id", "skipName"]);

    assert_eq!(p.from_items().len(), 1);
    let from = &p.from_items()[0];
    assert_eq!(from.entity_name, "User");
    assert_eq!(from.entity.table_name(), "users");
    assert_eq!(from.alias.as_deref(), Some("a"));
    assert_eq!(from.sql_alias, "_t1");

    assert_eq!(p.select_items().len(), 1);
    assert!(p.select_items()[0].property.is_none());
    assert_eq!(p.select_items()[0].from_item, 0);

    let order = p.order_by_items();
    assert_eq!(order.len(), 2);
    assert_eq!(order[0].property.name(), "name");
    assert!(order[0].ascending);
    assert_eq!(order[1].property.name(), "flags");
    assert!(!order[1].ascending);
}

#[test]
fn from_alias_forms() {
    let s = schema();
    for source in ["FROM User", "FROM User u", "FROM User AS u"] {
        let p = parse(&s, source);
        assert_eq!(p.from_items().len(), 1, "{source}");
        assert_eq!(p.from_items()[0].sql_alias, "_t1", "{source}");
    }
    assert_eq!(parse(&s, "FROM User").from_items()[0].alias, None);
    assert_eq!(
        parse(&s, "FROM User u").from_items()[0].alias.as_deref(),
        Some("u")
    );
}

#[test]
fn default_projection_is_whole_entity() {
    let s = schema();
    let p = parse(&s, "FROM User");
    assert_eq!(p.select_items().len(), 1);
    assert!(p.select_items()[0].property.is_none());
}

#[test]
fn select_property_list() {
    let s = schema();
    let p = parse(&s, "SELECT id, a.name FROM User a");
    let items = p.select_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].property.unwrap().name(), "id");
    assert_eq!(items[1].property.unwrap().name(), "name");
}

#[test]
fn missing_from_is_rejected() {
    let s = schema();
    let err = parse_err(&s, "WHERE id = 1");
    assert!(err.to_string().contains("FROM clause expected"), "{err}");
    let err = parse_err(&s, "SELECT a");
    assert!(err.to_string().contains("FROM clause expected"), "{err}");
}

#[test]
fn empty_select_clause_is_rejected() {
    let s = schema();
    let err = parse_err(&s, "SELECT FROM User");
    assert!(err.to_string().contains("SELECT clause is empty"), "{err}");
}

#[test]
fn clause_order_is_enforced() {
    let s = schema();
    let err = parse_err(&s, "FROM User ORDER BY id WHERE id = 1");
    assert!(err.to_string().contains("WHERE must precede ORDER BY"), "{err}");
}

#[test]
fn order_requires_by_and_items() {
    let s = schema();
    let err = parse_err(&s, "FROM User ORDER name");
    assert!(err.to_string().contains("BY expected after ORDER"), "{err}");
    let err = parse_err(&s, "FROM User ORDER BY");
    assert!(err.to_string().contains("ORDER BY clause is empty"), "{err}");
}

#[test]
fn unknown_entity() {
    let s = schema();
    let err = parse_err(&s, "FROM Account");
    assert!(err.to_string().contains("entity `Account` not found"), "{err}");
}

#[test]
fn unknown_property_in_select_and_order() {
    let s = schema();
    let err = parse_err(&s, "SELECT missing FROM User");
    assert!(
        err.to_string()
            .contains("property `missing` not found in entity `User`"),
        "{err}"
    );
    let err = parse_err(&s, "FROM User ORDER BY missing");
    assert!(err.to_string().contains("property `missing` not found"), "{err}");
}

#[test]
fn mixed_projection_is_rejected() {
    let s = schema();
    for source in [
        "SELECT a, name FROM User a",
        "SELECT name, a FROM User a",
        "SELECT a, a FROM User a",
    ] {
        let err = parse_err(&s, source);
        assert!(
            err.to_string().contains("whole-entity projection"),
            "{source}: {err}"
        );
    }
}

#[test]
fn from_clause_junk_is_rejected() {
    let s = schema();
    let err = parse_err(&s, "FROM User x y");
    assert!(err.to_string().contains("AS alias expected"), "{err}");
    let err = parse_err(&s, "FROM User AS u extra tokens");
    assert!(
        err.to_string().contains("single entity expected in FROM clause"),
        "{err}"
    );
}

#[test]
fn empty_where_clause_is_rejected() {
    let s = schema();
    let err = parse_err(&s, "FROM User WHERE");
    assert!(err.to_string().contains("WHERE clause is empty"), "{err}");
    let err = parse_err(&s, "FROM User WHERE ORDER BY id");
    assert!(err.to_string().contains("WHERE clause is empty"), "{err}");
}

#[test]
fn error_messages_carry_the_source_fragment() {
    let s = schema();
    let err = parse_err(&s, "FROM User WHERE bogus = 1");
    let msg = err.to_string();
    assert!(msg.contains("near `bogus = 1`"), "{msg}");
    assert!(msg.contains("in query `FROM User WHERE bogus = 1`"), "{msg}");
}
