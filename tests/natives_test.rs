// ABOUTME: Integration coverage for the file, database, JSON, and quest natives

use hexscript::error::{ErrorKind, HexError};
use hexscript::eval::Interpreter;
use hexscript::lexer::Lexer;
use hexscript::parser::Parser;
use hexscript::realm::{Realm, Voice};
use hexscript::value::Value;
use serial_test::serial;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct SilentVoice;

impl Voice for SilentVoice {
    fn speak(&mut self, _text: &str) -> Result<(), HexError> {
        Ok(())
    }
}

fn run(source: &str) -> (Result<Value, HexError>, String) {
    let sink = SharedSink::default();
    let out_buffer = sink.0.clone();
    let realm = Realm::with_parts(Box::new(sink), Box::new(SilentVoice), 7);

    let mut interpreter = Interpreter::with_realm(realm);
    let result = Lexer::new(source)
        .tokenize()
        .and_then(|tokens| Parser::new(tokens).parse())
        .and_then(|program| interpreter.interpret(&program));

    let output = String::from_utf8(out_buffer.borrow().clone()).unwrap();
    (result, output)
}

fn temp_path(name: &str) -> String {
    let mut path = std::env::temp_dir();
    path.push(format!("hexscript-test-{}-{}", std::process::id(), name));
    path.to_string_lossy().into_owned()
}

// ============ Files ============

#[test]
#[serial]
fn test_scroll_round_trip() {
    let path = temp_path("roundtrip.txt");
    let source = format!(
        r#"
inscribe_scroll("{path}", "sacred words")
scribe_line(scroll_exists("{path}"))
scribe_line(decipher_scroll("{path}"))
burn_scroll("{path}")
scribe_line(scroll_exists("{path}"))
"#,
    );
    let (result, output) = run(&source);
    result.expect("program failed");
    assert_eq!(output, "true\nsacred words\nfalse\n");
}

#[test]
#[serial]
fn test_decipher_missing_scroll_is_scroll_damaged() {
    let path = temp_path("never-written.txt");
    let (result, _) = run(&format!("decipher_scroll(\"{}\")", path));
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ScrollDamaged);
    assert!(err.to_string().contains("Scroll Damaged!"));
}

#[test]
#[serial]
fn test_inscribe_stringifies_non_scroll_values() {
    let path = temp_path("numeric.txt");
    let source = format!(
        "inscribe_scroll(\"{path}\", 42)\nscribe_line(decipher_scroll(\"{path}\"))\nburn_scroll(\"{path}\")",
    );
    let (result, output) = run(&source);
    result.expect("program failed");
    assert_eq!(output, "42\n");
}

// ============ Database ============

#[test]
fn test_oracle_full_session() {
    let source = r#"
conjure db as awaken_oracle(":memory:")
decree_oracle(db, "CREATE TABLE hunters (name TEXT, kills INTEGER)")
decree_oracle(db, "INSERT INTO hunters VALUES ('Buffy', 133)")
decree_oracle(db, "INSERT INTO hunters VALUES ('Faith', 71)")
conjure rows as consult_oracle(db, "SELECT name, kills FROM hunters ORDER BY kills DESC")
scribe_line(measure(rows))
scribe_line(rows[0]["name"], rows[0]["kills"])
scribe_line(rows[1].name)
silence_oracle(db)
"#;
    let (result, output) = run(source);
    result.expect("program failed");
    assert_eq!(output, "2\nBuffy 133\nFaith\n");
}

#[test]
fn test_decree_reports_affected_rows() {
    let source = r#"
conjure db as awaken_oracle(":memory:")
decree_oracle(db, "CREATE TABLE t (n INTEGER)")
decree_oracle(db, "INSERT INTO t VALUES (1)")
decree_oracle(db, "INSERT INTO t VALUES (2)")
scribe_line(decree_oracle(db, "UPDATE t SET n = 0"))
"#;
    let (result, output) = run(source);
    result.expect("program failed");
    assert_eq!(output, "2\n");
}

#[test]
fn test_silenced_oracle_rejects_further_use() {
    let source = r#"
conjure db as awaken_oracle(":memory:")
silence_oracle(db)
decree_oracle(db, "CREATE TABLE t (n INTEGER)")
"#;
    let (result, _) = run(source);
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::OracleSilent);
}

#[test]
fn test_bad_sql_is_oracle_silent() {
    let source = "conjure db as awaken_oracle(\":memory:\")\ndecree_oracle(db, \"NOT SQL\")";
    let (result, _) = run(source);
    assert_eq!(result.unwrap_err().kind, ErrorKind::OracleSilent);
}

#[test]
fn test_null_columns_come_back_as_void() {
    let source = r#"
conjure db as awaken_oracle(":memory:")
decree_oracle(db, "CREATE TABLE t (a TEXT, b REAL)")
decree_oracle(db, "INSERT INTO t VALUES (NULL, 1.5)")
conjure rows as consult_oracle(db, "SELECT a, b FROM t")
scribe_line(rows[0]["a"] is void, rows[0]["b"])
"#;
    let (result, output) = run(source);
    result.expect("program failed");
    assert_eq!(output, "true 1.5\n");
}

// ============ JSON ============

#[test]
fn test_json_round_trip_through_language() {
    let source = r#"
conjure hero as grimoire {"name": "Oz", "lives": 9, "tags": ["wolf", "bass"]}
conjure text as weave_json(hero)
conjure back as unweave_json(text)
scribe_line(back["name"], back["lives"], back["tags"][0])
"#;
    let (result, output) = run(source);
    result.expect("program failed");
    assert_eq!(output, "Oz 9 wolf\n");
}

#[test]
fn test_unweave_damaged_json() {
    let (result, _) = run("unweave_json(\"{oops\")");
    assert_eq!(result.unwrap_err().kind, ErrorKind::ScrollDamaged);
}

// ============ Quest ============

#[test]
fn test_forge_and_wound_hero() {
    let source = r#"
conjure hero as forge_hero("Xander")
scribe_line(hero.name)
scribe_line(hero.health)
inflict_wound(hero, 30)
scribe_line(hero.health)
"#;
    let (result, output) = run(source);
    result.expect("program failed");
    assert_eq!(output, "Xander\n100\n70\n");
}

#[test]
fn test_roll_destiny_stays_in_range() {
    let source = r#"
conjure n as 0
patrol until n atleast 50 {
  transmute n as n + 1
  conjure roll as roll_destiny(6)
  prophecy reveals roll under 1 or roll exceeds 6 { scribe_line("out of range") }
}
scribe_line("done")
"#;
    let (result, output) = run(source);
    result.expect("program failed");
    assert_eq!(output, "done\n");
}

#[test]
fn test_roll_destiny_rejects_bad_die() {
    let (result, _) = run("roll_destiny(0)");
    assert_eq!(result.unwrap_err().kind, ErrorKind::QuestFailed);
}

#[test]
fn test_moment_is_a_rune() {
    let (result, _) = run("conjure t as moment()\nt");
    match result.expect("program failed") {
        Value::Int(secs) => assert!(secs > 1_500_000_000),
        other => panic!("expected rune, got {:?}", other),
    }
}

// ============ Natives as values ============

#[test]
fn test_native_arity_checked_at_call() {
    let (result, _) = run("measure(1, 2)");
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    assert!(err.to_string().contains("Expected 1 arguments but got 2"));
}

#[test]
fn test_natives_are_first_class() {
    let source = "conjure f as measure\nf(\"abcd\")";
    let (result, _) = run(source);
    assert!(matches!(result.expect("program failed"), Value::Int(4)));
}

#[test]
fn test_native_pretty_form() {
    let (result, _) = run("measure");
    assert_eq!(result.expect("program failed").to_string(), "<builtin measure>");
}
