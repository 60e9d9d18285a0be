//! Structural, idempotent import insertion.
//!
//! The wrap call emitted by the `?` expansion needs the `fmt` package.
//! The import block is parsed structurally — entry by entry, alias-aware —
//! never by substring search, which false-positives on the module name
//! appearing inside string literals, comments or unrelated import paths.

use crate::scanlines::{LineScanner, SegmentKind};
use roux_srcmap::{Delta, StageMap};

pub struct PassOutput {
    pub text: String,
    pub stage: StageMap,
}

/// One entry of a factored import block, or a single-line import.
struct ImportEntry {
    alias: Option<String>,
    path: String,
}

fn parse_entry(text: &str) -> Option<ImportEntry> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (alias, quoted) = match tokens.as_slice() {
        [q] => (None, *q),
        [a, q] => (Some((*a).to_string()), *q),
        _ => return None,
    };
    let path = quoted.strip_prefix('"')?.strip_suffix('"')?;
    Some(ImportEntry {
        alias,
        path: path.to_string(),
    })
}

fn satisfies(entry: &ImportEntry, path: &str) -> bool {
    entry.path == path && entry.alias.as_deref().is_none_or(|a| a == path)
}

pub fn ensure_import(input: &str, path: &str) -> PassOutput {
    let mut scanner = LineScanner::new();
    let lines: Vec<&str> = input.lines().collect();

    let mut block_open: Option<usize> = None; // index of `import (`
    let mut block_close: Option<usize> = None;
    let mut block_entries: Vec<(usize, ImportEntry)> = Vec::new();
    let mut last_single: Option<usize> = None;
    let mut package_line: Option<usize> = None;
    let mut in_block = false;

    for (i, line) in lines.iter().enumerate() {
        let segments = scanner.segments(line);
        let code: String = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Code)
            .map(|s| &line[s.start..s.end])
            .collect();
        let code = code.trim();

        if in_block {
            if code == ")" {
                block_close = Some(i);
                in_block = false;
            } else if let Some(entry) = parse_entry(code) {
                block_entries.push((i, entry));
            }
            continue;
        }
        if code == "import (" {
            block_open = Some(i);
            in_block = true;
        } else if let Some(rest) = code.strip_prefix("import ") {
            if parse_entry(rest.trim()).is_some() {
                last_single = Some(i);
            }
        } else if code.starts_with("package ") {
            package_line = Some(i);
        }
    }

    // already imported under its own name: nothing to do
    let satisfied = block_entries.iter().any(|(_, e)| satisfies(e, path))
        || single_import_satisfies(&lines, path);
    if satisfied {
        return PassOutput {
            text: input.to_string(),
            stage: StageMap::new(),
        };
    }

    let mut stage = StageMap::new();
    let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

    if let (Some(_), Some(close)) = (block_open, block_close) {
        // keep the block sorted; adopt the indentation of its entries
        let indent = block_entries
            .first()
            .map(|&(i, _)| leading_ws(lines[i]))
            .unwrap_or_else(|| "\t".to_string());
        let at = block_entries
            .iter()
            .find(|(_, e)| e.path.as_str() > path)
            .map(|&(i, _)| i)
            .unwrap_or(close);
        out.insert(at, format!("{}\"{}\"", indent, path));
        stage.push_delta(Delta::new(at + 1, 1, 1, 0));
    } else if let Some(last) = last_single {
        out.insert(last + 1, format!("import \"{}\"", path));
        stage.push_delta(Delta::new(last + 2, 1, 1, 0));
    } else if let Some(pkg) = package_line {
        out.insert(pkg + 1, format!("import \"{}\"", path));
        out.insert(pkg + 1, String::new());
        stage.push_delta(Delta::new(pkg + 2, 1, 2, 0));
    } else {
        out.insert(0, format!("import \"{}\"", path));
        stage.push_delta(Delta::new(1, 1, 1, 0));
    }

    let mut text = out.join("\n");
    text.push('\n');
    PassOutput { text, stage }
}

fn single_import_satisfies(lines: &[&str], path: &str) -> bool {
    let mut scanner = LineScanner::new();
    for line in lines {
        let segments = scanner.segments(line);
        let code: String = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Code)
            .map(|s| &line[s.start..s.end])
            .collect();
        if let Some(rest) = code.trim().strip_prefix("import ") {
            if parse_entry(rest.trim()).is_some_and(|e| satisfies(&e, path)) {
                return true;
            }
        }
    }
    false
}

fn leading_ws(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_into_block_sorted() {
        let src = "package main\n\nimport (\n\t\"os\"\n\t\"strings\"\n)\n";
        let out = ensure_import(src, "fmt");
        assert_eq!(
            out.text,
            "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n\t\"strings\"\n)\n"
        );
    }

    #[test]
    fn test_block_already_has_it() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n";
        let out = ensure_import(src, "fmt");
        assert_eq!(out.text, src);
        assert!(out.stage.is_empty());
    }

    #[test]
    fn test_single_import_already_has_it() {
        let src = "package main\n\nimport \"fmt\"\n";
        let out = ensure_import(src, "fmt");
        assert_eq!(out.text, src);
    }

    #[test]
    fn test_appends_after_single_imports() {
        let src = "package main\n\nimport \"os\"\n";
        let out = ensure_import(src, "fmt");
        assert_eq!(out.text, "package main\n\nimport \"os\"\nimport \"fmt\"\n");
    }

    #[test]
    fn test_no_imports_inserts_after_package() {
        let src = "package main\n\nfunc main() {\n}\n";
        let out = ensure_import(src, "fmt");
        assert_eq!(
            out.text,
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n}\n"
        );
    }

    #[test]
    fn test_name_inside_string_is_not_an_import() {
        let src = "package main\n\nfunc main() {\n\tlog(\"import \\\"fmt\\\"\")\n}\n";
        let out = ensure_import(src, "fmt");
        assert!(out.text.starts_with("package main\n\nimport \"fmt\"\n"));
    }

    #[test]
    fn test_name_inside_comment_is_not_an_import() {
        let src = "package main\n\n// import \"fmt\"\nfunc main() {\n}\n";
        let out = ensure_import(src, "fmt");
        assert!(out.text.contains("\nimport \"fmt\"\n"));
        assert!(out.text.contains("// import \"fmt\""));
    }

    #[test]
    fn test_unrelated_path_containing_name() {
        let src = "package main\n\nimport (\n\t\"myapp/fmtutil\"\n)\n";
        let out = ensure_import(src, "fmt");
        assert!(out.text.contains("\t\"fmt\"\n"));
    }

    #[test]
    fn test_aliased_fmt_does_not_satisfy() {
        let src = "package main\n\nimport (\n\tf \"fmt\"\n)\n";
        let out = ensure_import(src, "fmt");
        // generated code references the package by its own name
        assert!(out.text.contains("\t\"fmt\"\n\tf \"fmt\"\n") || out.text.contains("\tf \"fmt\"\n\t\"fmt\"\n"));
    }

    #[test]
    fn test_delta_shifts_following_lines() {
        let src = "package main\n\nimport (\n\t\"os\"\n)\n\nfunc main() {\n}\n";
        let out = ensure_import(src, "fmt");
        use roux_srcmap::Pos;
        // `func main() {` was line 7, is now line 8
        assert_eq!(out.stage.shift_forward(Pos::new(7, 1)), Pos::new(8, 1));
    }
}
