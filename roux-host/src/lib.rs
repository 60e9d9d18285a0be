//! Host-text emitter.
//!
//! Serializes the lowered declaration tree to host-language source while
//! recording the emit-stage position map: verbatim lines contribute line
//! shift deltas, structured nodes contribute token mappings. The emitter
//! makes no other promises about formatting, and consumers must not
//! assume any beyond the positions recorded here.

pub mod ast;
mod decl;
mod stmt;

use ast::GoModule;
use roux_srcmap::{Delta, Mapping, MappingKind, Pos, StageMap};

pub struct Codegen {
    pub(crate) output: String,
    /// 1-based number of the line currently being written.
    pub(crate) line: usize,
    pub(crate) stage: StageMap,
    /// Running shift between source lines and output lines.
    pub(crate) shift: isize,
    /// Indentation applied to synthesized statements.
    pub(crate) indent: String,
}

impl Default for Codegen {
    fn default() -> Self {
        Codegen::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Codegen {
            output: String::new(),
            line: 1,
            stage: StageMap::new(),
            shift: 0,
            indent: String::new(),
        }
    }

    pub fn emit_module(&mut self, module: &GoModule) {
        for decl in &module.decls {
            self.emit_decl(decl);
        }
    }

    pub fn finish(self) -> (String, StageMap) {
        (self.output, self.stage)
    }

    pub(crate) fn write_line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
        self.line += 1;
    }

    /// Record the shift between a verbatim line's source position and the
    /// output line it is about to land on.
    pub(crate) fn note_source_line(&mut self, src_line: usize) {
        let now = self.line as isize - src_line as isize;
        if now != self.shift {
            self.stage
                .push_delta(Delta::new(src_line, 1, now - self.shift, 0));
            self.shift = now;
        }
    }

    /// Map a source anchor onto the line currently being written.
    pub(crate) fn map_token(
        &mut self,
        orig: Pos,
        gen_col: usize,
        length: usize,
        kind: MappingKind,
        name: Option<String>,
    ) {
        self.stage.push_mapping(Mapping::new(
            orig,
            Pos::new(self.line, gen_col),
            length,
            kind,
            name,
        ));
    }
}

pub(crate) fn leading_ws(line: &str) -> &str {
    let end = line.len() - line.trim_start().len();
    &line[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::ast::*;
    use super::*;

    #[test]
    fn test_raw_lines_verbatim() {
        let module = GoModule {
            decls: vec![
                GoDecl::Raw {
                    text: "package main".into(),
                    line: Some(1),
                },
                GoDecl::Raw {
                    text: String::new(),
                    line: Some(2),
                },
            ],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, stage) = cg.finish();
        assert_eq!(text, "package main\n\n");
        assert!(stage.is_empty());
    }

    #[test]
    fn test_const_block_layout() {
        let module = GoModule {
            decls: vec![GoDecl::ConstBlock {
                ty: "ShapeKind".into(),
                entries: vec![
                    ConstEntry {
                        name: "Shape_Circle".into(),
                        pos: None,
                    },
                    ConstEntry {
                        name: "Shape_Square".into(),
                        pos: None,
                    },
                ],
            }],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, _) = cg.finish();
        assert_eq!(
            text,
            "const (\n\tShape_Circle ShapeKind = iota\n\tShape_Square\n)\n"
        );
    }

    #[test]
    fn test_struct_layout() {
        let module = GoModule {
            decls: vec![GoDecl::StructDef {
                name: "Shape".into(),
                fields: vec![
                    GoField {
                        name: "Kind".into(),
                        ty: "ShapeKind".into(),
                    },
                    GoField {
                        name: "Circle".into(),
                        ty: "*ShapeCircleData".into(),
                    },
                ],
                pos: None,
            }],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, _) = cg.finish();
        assert_eq!(
            text,
            "type Shape struct {\n\tKind ShapeKind\n\tCircle *ShapeCircleData\n}\n"
        );
    }

    #[test]
    fn test_shift_delta_for_inserted_lines() {
        // a generated decl pushes the following verbatim line down
        let module = GoModule {
            decls: vec![
                GoDecl::Raw {
                    text: "package main".into(),
                    line: Some(1),
                },
                GoDecl::TypeDef {
                    name: "ShapeKind".into(),
                    underlying: "int".into(),
                    pos: None,
                },
                GoDecl::Raw {
                    text: "func main() {".into(),
                    line: Some(2),
                },
            ],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, stage) = cg.finish();
        assert_eq!(text, "package main\ntype ShapeKind int\nfunc main() {\n");
        assert_eq!(stage.shift_forward(Pos::new(2, 1)), Pos::new(3, 1));
    }

    #[test]
    fn test_switch_with_guard_coalesced() {
        let sw = GoSwitch {
            subject: "__m0.Kind".into(),
            indent: "\t".into(),
            pos: None,
            default: None,
            cases: vec![
                GoCase {
                    label: "Shape_Square".into(),
                    guard: Some("side > 0".into()),
                    binds: vec![GoStmt::raw("side := __m0.Square.Side")],
                    body: vec![GoStmt::raw("big()")],
                    pos: None,
                },
                GoCase {
                    label: "Shape_Square".into(),
                    guard: None,
                    binds: vec![],
                    body: vec![GoStmt::raw("small()")],
                    pos: None,
                },
                GoCase {
                    label: "Shape_Circle".into(),
                    guard: None,
                    binds: vec![],
                    body: vec![GoStmt::raw("round()")],
                    pos: None,
                },
            ],
        };
        let module = GoModule {
            decls: vec![GoDecl::Func {
                header: "func F(s Shape) {".into(),
                body: vec![GoStmt::Switch(sw)],
                closer: "}".into(),
                line: None,
            }],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, _) = cg.finish();
        let expected = "func F(s Shape) {\n\
                        \tswitch __m0.Kind {\n\
                        \tcase Shape_Square:\n\
                        \t\tside := __m0.Square.Side\n\
                        \t\tif side > 0 {\n\
                        \t\t\tbig()\n\
                        \t\t\tbreak\n\
                        \t\t}\n\
                        \t\tsmall()\n\
                        \tcase Shape_Circle:\n\
                        \t\tround()\n\
                        \t}\n\
                        }\n";
        assert_eq!(text, expected);
        // one case label per discriminant, even with the guarded arm
        assert_eq!(text.matches("case Shape_Square:").count(), 1);
    }

    #[test]
    fn test_bind_match_wraps_in_function_literal() {
        let sw = GoSwitch {
            subject: "__m0.Kind".into(),
            indent: "\t\t".into(),
            pos: None,
            default: None,
            cases: vec![GoCase {
                label: "Shape_Point".into(),
                guard: None,
                binds: vec![],
                body: vec![GoStmt::Return {
                    expr: Some("0.0".into()),
                }],
                pos: None,
            }],
        };
        let module = GoModule {
            decls: vec![GoDecl::Func {
                header: "func F(s Shape) {".into(),
                body: vec![GoStmt::BindMatch {
                    name: "area".into(),
                    ty: "float64".into(),
                    switch: sw,
                }],
                closer: "}".into(),
                line: None,
            }],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, _) = cg.finish();
        assert!(text.contains("\tvar area float64 = func() float64 {\n"));
        assert!(text.contains("\t\tswitch __m0.Kind {\n"));
        assert!(text.contains("\t\tpanic(\"unreachable match\")\n"));
        assert!(text.contains("\t}()\n"));
    }

    #[test]
    fn test_guarded_terminal_body_has_no_break() {
        let sw = GoSwitch {
            subject: "__m0.Kind".into(),
            indent: "\t".into(),
            pos: None,
            default: None,
            cases: vec![
                GoCase {
                    label: "Res_Ok".into(),
                    guard: Some("x > 0".into()),
                    binds: vec![GoStmt::raw("x := __m0.Ok.F0")],
                    body: vec![GoStmt::Return {
                        expr: Some("x".into()),
                    }],
                    pos: None,
                },
                GoCase {
                    label: "Res_Ok".into(),
                    guard: None,
                    binds: vec![],
                    body: vec![GoStmt::Return {
                        expr: Some("0".into()),
                    }],
                    pos: None,
                },
            ],
        };
        let module = GoModule {
            decls: vec![GoDecl::Func {
                header: "func F(r Res) int {".into(),
                body: vec![GoStmt::Switch(sw)],
                closer: "}".into(),
                line: None,
            }],
        };
        let mut cg = Codegen::new();
        cg.emit_module(&module);
        let (text, _) = cg.finish();
        assert!(text.contains("\t\tif x > 0 {\n\t\t\treturn x\n\t\t}\n"));
        assert!(!text.contains("break"));
    }
}
