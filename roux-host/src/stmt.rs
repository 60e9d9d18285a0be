//! Statement and switch emission.

use crate::ast::{GoCase, GoStmt, GoSwitch};
use crate::{Codegen, leading_ws};
use roux_srcmap::MappingKind;

impl Codegen {
    pub(crate) fn emit_stmt(&mut self, stmt: &GoStmt) {
        match stmt {
            GoStmt::Raw { text, line } => {
                if let Some(l) = line {
                    self.note_source_line(*l);
                    self.write_line(text);
                } else {
                    let indented = format!("{}{}", self.indent, text);
                    self.write_line(&indented);
                }
            }
            GoStmt::Assign { lhs, rhs, pos } => {
                if let Some(p) = pos {
                    let gen_col = self.indent.chars().count() + lhs.chars().count() + 5;
                    self.map_token(
                        *p,
                        gen_col,
                        rhs.chars().count(),
                        MappingKind::Expression,
                        None,
                    );
                }
                let text = format!("{}{} := {}", self.indent, lhs, rhs);
                self.write_line(&text);
            }
            GoStmt::Return { expr } => {
                let text = match expr {
                    Some(e) => format!("{}return {}", self.indent, e),
                    None => format!("{}return", self.indent),
                };
                self.write_line(&text);
            }
            GoStmt::Panic { message } => {
                let text = format!("{}panic(\"{}\")", self.indent, message);
                self.write_line(&text);
            }
            GoStmt::Switch(sw) => self.emit_switch(sw),
            GoStmt::BindMatch { name, ty, switch } => {
                let base = switch
                    .indent
                    .strip_suffix('\t')
                    .unwrap_or(&switch.indent)
                    .to_string();
                self.write_line(&format!(
                    "{}var {} {} = func() {} {{",
                    base, name, ty, ty
                ));
                self.emit_switch(switch);
                self.write_line(&format!("{}\tpanic(\"unreachable match\")", base));
                self.write_line(&format!("{}}}()", base));
            }
            GoStmt::Block {
                header,
                body,
                closer,
                line,
            } => {
                let saved = self.indent.clone();
                if !header.is_empty() {
                    if let Some(l) = line {
                        self.note_source_line(*l);
                    }
                    self.write_line(header);
                    self.indent = format!("{}\t", leading_ws(header));
                }
                for stmt in body {
                    self.emit_stmt(stmt);
                }
                self.indent = saved;
                self.write_line(closer);
            }
        }
    }

    /// Emit a switch. Consecutive cases sharing a label collapse into one
    /// host case: each guarded segment runs its bindings, then
    /// conditionally its body (breaking out on success so control cannot
    /// reach the next segment), which is fall-through-on-guard-false
    /// without duplicate case labels.
    pub(crate) fn emit_switch(&mut self, sw: &GoSwitch) {
        let ind = &sw.indent;
        if let Some(p) = sw.pos {
            self.map_token(
                p,
                ind.chars().count() + "switch ".chars().count() + 1,
                sw.subject.chars().count(),
                MappingKind::Expression,
                None,
            );
        }
        self.write_line(&format!("{}switch {} {{", ind, sw.subject));

        let saved = self.indent.clone();
        let mut i = 0;
        while i < sw.cases.len() {
            let label = &sw.cases[i].label;
            let mut run_end = i + 1;
            while run_end < sw.cases.len() && sw.cases[run_end].label == *label {
                run_end += 1;
            }

            if let Some(p) = sw.cases[i].pos {
                self.map_token(
                    p,
                    ind.chars().count() + "case ".chars().count() + 1,
                    label.chars().count(),
                    MappingKind::Identifier,
                    Some(label.clone()),
                );
            }
            self.write_line(&format!("{}case {}:", ind, label));
            for case in &sw.cases[i..run_end] {
                self.emit_case_segment(case, ind);
            }
            i = run_end;
        }

        if let Some(default) = &sw.default {
            self.write_line(&format!("{}default:", ind));
            self.indent = format!("{}\t", ind);
            for stmt in default {
                self.emit_stmt(stmt);
            }
        }
        self.indent = saved;
        self.write_line(&format!("{}}}", ind));
    }

    fn emit_case_segment(&mut self, case: &GoCase, ind: &str) {
        self.indent = format!("{}\t", ind);
        for bind in &case.binds {
            self.emit_stmt(bind);
        }
        match &case.guard {
            Some(guard) => {
                let guard_line = format!("{}if {} {{", self.indent, guard);
                self.write_line(&guard_line);
                self.indent = format!("{}\t\t", ind);
                let terminal = case.body.last().is_some_and(GoStmt::is_terminal);
                for stmt in &case.body {
                    self.emit_stmt(stmt);
                }
                if !terminal {
                    let brk = format!("{}break", self.indent);
                    self.write_line(&brk);
                }
                self.indent = format!("{}\t", ind);
                let close = format!("{}}}", self.indent);
                self.write_line(&close);
            }
            None => {
                for stmt in &case.body {
                    self.emit_stmt(stmt);
                }
            }
        }
    }
}
