//! End-to-end pipeline tests: surface source in, host text and position
//! table out, through real files.
#![allow(clippy::unwrap_used)]

use roux::{CompileOptions, HelperLevel, compile, compile_file};
use roux_srcmap::{Pos, TranslationTable};
use std::fs;

const SHAPES_UNIT: &str = "package shapes\n\nunion Shape {\n\tCircle(radius float64)\n\tSquare(side float64)\n\tPoint\n}\n\nfn Describe(s Shape) string {\n\treturn match s {\n\t\tCircle(r) if r > 100.0 => \"huge circle\",\n\t\tCircle(_) => \"circle\",\n\t\tSquare(_) => \"square\",\n\t\tPoint => \"point\",\n\t}\n}\n";

const CONFIG_UNIT: &str = "package config\n\nfn Load(path: string) (Config, error) {\n\tlet data = ReadFile(path)? \"read config\"\n\tlet cfg = Parse(data)?\n\treturn cfg, nil\n}\n";

#[test]
fn test_shapes_unit_compiles() {
    let out = compile(SHAPES_UNIT).unwrap();
    assert!(out.go_code.starts_with("package shapes\n"));
    assert!(out.go_code.contains("type ShapeKind int"));
    assert!(out.go_code.contains("const (\n\tShape_Circle ShapeKind = iota\n"));
    assert!(out.go_code.contains("func NewShapeCircle(radius float64) Shape {"));
    assert!(out.go_code.contains("func (s Shape) IsPoint() bool {"));
    // the guarded arm shares one host case with the unguarded one
    assert_eq!(out.go_code.matches("case Shape_Circle:").count(), 1);
    assert!(out.go_code.contains("if r > 100.0 {"));
}

#[test]
fn test_config_unit_expands_and_imports() {
    let out = compile(CONFIG_UNIT).unwrap();
    assert!(out.go_code.contains("import \"fmt\"\n"));
    assert!(out.go_code.contains("__tmp0, __err0 := ReadFile(path)"));
    assert!(
        out.go_code
            .contains("return Config{}, fmt.Errorf(\"read config: %w\", __err0)")
    );
    assert!(out.go_code.contains("__tmp1, __err1 := Parse(data)"));
    assert!(out.go_code.contains("return Config{}, __err1"));
}

#[test]
fn test_build_artifacts_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("shapes.roux");
    fs::write(&src_path, SHAPES_UNIT).unwrap();

    let source = fs::read_to_string(&src_path).unwrap();
    let out = compile_file(&source, "shapes.roux", &CompileOptions::default()).unwrap();

    let go_path = dir.path().join("shapes.go");
    let map_path = dir.path().join("shapes.go.map.json");
    fs::write(&go_path, &out.go_code).unwrap();
    fs::write(&map_path, out.table.to_json().unwrap()).unwrap();

    // a diagnostics-translation consumer loads the persisted table and
    // rewrites generated positions before display
    let table = TranslationTable::from_json(&fs::read_to_string(&map_path).unwrap()).unwrap();
    let generated = fs::read_to_string(&go_path).unwrap();
    let (line, col) = find_token(&generated, "case Shape_Square:");
    let orig = table.to_original(Pos::new(line, col + "case ".len()));
    // points at the Square arm in the surface source
    let (want_line, _) = find_token(SHAPES_UNIT, "Square(_)");
    assert_eq!(orig.line, want_line);
}

#[test]
fn test_table_records_sorted_by_generated_position() {
    let out = compile(CONFIG_UNIT).unwrap();
    let mappings = out.table.mappings();
    assert!(!mappings.is_empty());
    for pair in mappings.windows(2) {
        let a = (pair[0].generated_line, pair[0].generated_column);
        let b = (pair[1].generated_line, pair[1].generated_column);
        assert!(a <= b, "table not sorted: {:?} then {:?}", a, b);
    }
}

#[test]
fn test_units_share_no_state() {
    // compile two different units back to back; temp counters and the
    // variant registry must start fresh each time
    let first = compile(CONFIG_UNIT).unwrap();
    let second = compile(SHAPES_UNIT).unwrap();
    let third = compile(CONFIG_UNIT).unwrap();
    assert!(second.go_code.contains("__m0 := s"));
    assert_eq!(first.go_code, third.go_code);
}

#[test]
fn test_minimal_helpers_option() {
    let options = CompileOptions {
        helpers: HelperLevel::Minimal,
        ..Default::default()
    };
    let out = compile_file(SHAPES_UNIT, "shapes.roux", &options).unwrap();
    assert!(out.go_code.contains("IsCircle"));
    assert!(!out.go_code.contains("AsCircle"));
}

#[test]
fn test_qualified_patterns_option() {
    let options = CompileOptions {
        allow_bare_variants: false,
        ..Default::default()
    };
    let err = compile_file(SHAPES_UNIT, "shapes.roux", &options).unwrap_err();
    assert!(err.to_string().contains("bare variant 'Circle' is disabled"));

    let qualified = SHAPES_UNIT
        .replace("Circle(r)", "Shape.Circle(r)")
        .replace("Circle(_)", "Shape.Circle(_)")
        .replace("Square(_)", "Shape.Square(_)")
        .replace("\t\tPoint =>", "\t\tShape.Point =>");
    let out = compile_file(&qualified, "shapes.roux", &options).unwrap();
    assert!(out.go_code.contains("case Shape_Circle:"));
}

#[test]
fn test_failed_unit_emits_nothing_partial() {
    let broken = "package p\n\nfn Area(s Shape) float64 {\n\treturn match s {\n\t\tCircle(r) => r,\n\t}\n}\n";
    // Shape is never declared: unknown variant, unit fails
    let err = compile(broken).unwrap_err();
    assert!(err.to_string().contains("unknown variant 'Circle'"));
}

fn find_token(text: &str, token: &str) -> (usize, usize) {
    for (i, line) in text.lines().enumerate() {
        if let Some(at) = line.find(token) {
            return (i + 1, line[..at].chars().count() + 1);
        }
    }
    panic!("token '{}' not found in:\n{}", token, text);
}
