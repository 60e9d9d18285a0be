use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use roux::{CompileOptions, HelperLevel};

// ─────────────────────────────────────────────────────────────────────────────
// Flag Definitions — single source of truth for CLI parsing AND help text
// ─────────────────────────────────────────────────────────────────────────────

struct FlagDef {
    flag: &'static str,
    description: &'static str,
}

const COMPILER_OPTIONS: &[FlagDef] = &[
    FlagDef {
        flag: "--emit-pre",
        description: "Emit preprocessed text to stdout (debug)",
    },
    FlagDef {
        flag: "--emit-ast",
        description: "Dump the parsed surface tree (debug)",
    },
    FlagDef {
        flag: "--emit-map",
        description: "Write the position table next to the output",
    },
    FlagDef {
        flag: "--helpers <minimal|exhaustive>",
        description: "Union helper generation level (default: exhaustive)",
    },
    FlagDef {
        flag: "--qualified-patterns",
        description: "Require Union.Variant qualification in match patterns",
    },
];

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") || args.len() < 2 {
        print_usage();
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    if args[1] == "build" {
        run_build(&args[2..]);
        return;
    }

    let filename = &args[1];
    let options = parse_options(&args[2..]);
    let source = read_source(filename);

    if has_flag(&args, "--emit-pre") {
        let (text, _, diagnostics) = roux::preprocess_only(&source);
        for diag in &diagnostics {
            eprintln!("{}: {}", filename, diag.message);
        }
        print!("{}", text);
        return;
    }

    if has_flag(&args, "--emit-ast") {
        let (text, _, _) = roux::preprocess_only(&source);
        match roux_parser::parse(&text) {
            Ok(module) => println!("{:#?}", module),
            Err(e) => {
                eprintln!("Parse error:\n{}", e);
                process::exit(1);
            }
        }
        return;
    }

    match roux::compile_file(&source, filename, &options) {
        Ok(output) => {
            report_warnings(&output.warnings, filename);
            print!("{}", output.go_code);
        }
        Err(e) => {
            roux_shared::Emitter::print_failed_header(filename);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// roux build — compile .roux units to .go (+ position table)
// ─────────────────────────────────────────────────────────────────────────────

fn run_build(args: &[String]) {
    let files: Vec<&String> = args
        .iter()
        .take_while(|a| !a.starts_with('-'))
        .collect();
    if files.is_empty() {
        eprintln!("usage: roux build <file.roux>... [-o <output.go>] [--emit-map]");
        process::exit(2);
    }

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| PathBuf::from(&w[1]));
    if output_path.is_some() && files.len() > 1 {
        eprintln!("error: -o only applies to a single input file");
        process::exit(2);
    }

    let options = parse_options(args);
    let emit_map = args.iter().any(|a| a == "--emit-map");
    let mut failed = false;

    // each unit gets its own pipeline run; nothing carries over
    for file in files {
        let source = read_source(file);
        match roux::compile_file(&source, file, &options) {
            Ok(output) => {
                report_warnings(&output.warnings, file);
                let out_path = output_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(file).with_extension("go"));
                write_output(&out_path, &output.go_code);
                if emit_map {
                    match output.table.to_json() {
                        Ok(json) => {
                            let map_path = map_path_for(&out_path);
                            write_output(&map_path, &json);
                        }
                        Err(e) => {
                            eprintln!("error: failed to serialize position table: {}", e);
                            failed = true;
                        }
                    }
                }
            }
            Err(e) => {
                roux_shared::Emitter::print_failed_header(file);
                eprintln!("{}", e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

fn map_path_for(out_path: &std::path::Path) -> PathBuf {
    let mut name = out_path.as_os_str().to_os_string();
    name.push(".map.json");
    PathBuf::from(name)
}

fn write_output(path: &std::path::Path, content: &str) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                eprintln!("error: failed to create {}: {}", parent.display(), e);
                process::exit(1);
            });
        }
    }
    fs::write(path, content).unwrap_or_else(|e| {
        eprintln!("error: failed to write {}: {}", path.display(), e);
        process::exit(1);
    });
}

fn read_source(filename: &str) -> String {
    match fs::read_to_string(filename) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: failed to read '{}': {}", filename, e);
            process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> CompileOptions {
    let mut options = CompileOptions::default();
    if args.iter().any(|a| a == "--qualified-patterns") {
        options.allow_bare_variants = false;
    }
    if let Some(level) = args.windows(2).find(|w| w[0] == "--helpers") {
        options.helpers = match level[1].as_str() {
            "minimal" => HelperLevel::Minimal,
            "exhaustive" => HelperLevel::Exhaustive,
            other => {
                eprintln!("error: unknown helper level '{}'", other);
                process::exit(2);
            }
        };
    }
    options
}

fn report_warnings(warnings: &[roux_shared::Diagnostic], filename: &str) {
    for diag in warnings {
        match diag.span {
            Some(span) => eprintln!(
                "{}:{}:{}: warning: {}",
                filename, span.line, span.column, diag.message
            ),
            None => eprintln!("{}: warning: {}", filename, diag.message),
        }
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn print_usage() {
    eprintln!(
        "roux - ergonomic Go transpiler\n\
         \n\
         USAGE:\n\
         \x20   roux <file.roux> [OPTIONS]\n\
         \x20   roux build <file.roux>... [-o <output.go>] [OPTIONS]\n\
         \n\
         By default, roux compiles one unit and prints the generated Go.\n\
         `roux build` writes a .go file per unit, plus a .go.map.json\n\
         position table with --emit-map.\n\
         \n\
         OPTIONS:"
    );
    for def in COMPILER_OPTIONS {
        eprintln!("    {:<28}{}", def.flag, def.description);
    }
    eprintln!(
        "\nEXAMPLES:\n\
         \x20   roux shapes.roux                        # print generated Go\n\
         \x20   roux build shapes.roux --emit-map       # shapes.go + shapes.go.map.json\n\
         \x20   roux build a.roux b.roux                # independent units"
    );
}
