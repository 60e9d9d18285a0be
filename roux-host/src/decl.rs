//! Declaration emission.

use crate::Codegen;
use crate::ast::{ConstEntry, GoDecl, GoField};
use roux_srcmap::MappingKind;

impl Codegen {
    pub(crate) fn emit_decl(&mut self, decl: &GoDecl) {
        match decl {
            GoDecl::Raw { text, line } => {
                if let Some(l) = line {
                    self.note_source_line(*l);
                }
                self.write_line(text);
            }
            GoDecl::TypeDef {
                name,
                underlying,
                pos,
            } => {
                if let Some(p) = pos {
                    self.map_token(
                        *p,
                        "type ".chars().count() + 1,
                        name.chars().count(),
                        MappingKind::Identifier,
                        Some(name.clone()),
                    );
                }
                self.write_line(&format!("type {} {}", name, underlying));
            }
            GoDecl::ConstBlock { ty, entries } => self.emit_const_block(ty, entries),
            GoDecl::StructDef { name, fields, pos } => {
                if let Some(p) = pos {
                    self.map_token(
                        *p,
                        "type ".chars().count() + 1,
                        name.chars().count(),
                        MappingKind::Identifier,
                        Some(name.clone()),
                    );
                }
                self.write_line(&format!("type {} struct {{", name));
                self.emit_fields(fields);
                self.write_line("}");
            }
            GoDecl::Func {
                header,
                body,
                closer,
                line,
            } => {
                if let Some(l) = line {
                    self.note_source_line(*l);
                }
                self.write_line(header);
                let saved = std::mem::replace(&mut self.indent, "\t".to_string());
                for stmt in body {
                    self.emit_stmt(stmt);
                }
                self.indent = saved;
                self.write_line(closer);
            }
        }
    }

    fn emit_const_block(&mut self, ty: &str, entries: &[ConstEntry]) {
        self.write_line("const (");
        for (i, entry) in entries.iter().enumerate() {
            if let Some(p) = entry.pos {
                self.map_token(
                    p,
                    2,
                    entry.name.chars().count(),
                    MappingKind::Identifier,
                    Some(entry.name.clone()),
                );
            }
            if i == 0 {
                self.write_line(&format!("\t{} {} = iota", entry.name, ty));
            } else {
                self.write_line(&format!("\t{}", entry.name));
            }
        }
        self.write_line(")");
    }

    fn emit_fields(&mut self, fields: &[GoField]) {
        for field in fields {
            self.write_line(&format!("\t{} {}", field.name, field.ty));
        }
    }
}
