use std::{fs, path::Path, process::ExitCode};

use driver::{compile, run_compiler, CompilerArgs};
use ir_anf::{Comp, Context, Expr, Ident, Imm, Program};
use session::{CompilerOption, Session};

/// `let a = None in let b = None in (a, b)`
fn duplicated_constructions(ctx: &Context) -> (Program, Ident) {
    let a = ctx.fresh_ident("a");
    let b = ctx.fresh_ident("b");
    let program = Program::new(Expr::let_one(
        a.clone(),
        Comp::adt(0, 0, vec![]),
        Expr::let_one(
            b.clone(),
            Comp::adt(0, 0, vec![]),
            Expr::Comp(Comp::Tuple(vec![Imm::id(&a), Imm::id(&b)])),
        ),
    ));
    (program, a)
}

fn write_input(dir: &Path, name: &str, program: &Program) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(program).unwrap()).unwrap();
    path
}

#[test]
fn optimized_build_matches_the_hand_merged_program() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::new();
    let (program, a) = duplicated_constructions(&ctx);
    let merged = Program::new(Expr::let_one(
        a.clone(),
        Comp::adt(0, 0, vec![]),
        Expr::Comp(Comp::Tuple(vec![Imm::id(&a), Imm::id(&a)])),
    ));

    let compile_to = |program: &Program, name: &str| {
        let input = write_input(dir.path(), &format!("{name}.json"), program);
        let output = dir.path().join(format!("{name}.wasm"));
        compile(&Session::new(input, output.clone(), CompilerOption::default())).unwrap();
        fs::read(output).unwrap()
    };

    assert_eq!(compile_to(&program, "optimized"), compile_to(&merged, "merged"));
}

#[test]
fn unoptimized_build_keeps_every_construction() {
    let dir = tempfile::tempdir().unwrap();
    let (program, _) = duplicated_constructions(&Context::new());
    let input = write_input(dir.path(), "main.json", &program);

    let output_with = dir.path().join("with.wasm");
    compile(&Session::new(
        input.clone(),
        output_with.clone(),
        CompilerOption::default(),
    ))
    .unwrap();

    let output_without = dir.path().join("without.wasm");
    compile(&Session::new(
        input,
        output_without.clone(),
        CompilerOption {
            optimize: false,
            ..CompilerOption::default()
        },
    ))
    .unwrap();

    let with = fs::read(output_with).unwrap();
    let without = fs::read(output_without).unwrap();
    assert!(without.len() > with.len());
}

#[test]
fn debug_build_with_source_map_writes_every_companion() {
    let dir = tempfile::tempdir().unwrap();
    let (program, _) = duplicated_constructions(&Context::new());
    let input = write_input(dir.path(), "main.json", &program);
    let output = dir.path().join("out").join("main.wasm");

    let emitted = compile(&Session::new(
        input,
        output.clone(),
        CompilerOption {
            debug: true,
            source_map: true,
            ..CompilerOption::default()
        },
    ))
    .unwrap();

    assert_eq!(emitted.files().count(), 4);
    for file in emitted.files() {
        assert!(file.exists(), "{}", file.display());
    }
    // the input path stands in for a missing source name
    let map = fs::read_to_string(emit::source_map_path(&output)).unwrap();
    assert!(map.contains(r#""file":"main.wasm""#), "{map}");
}

#[test]
fn malformed_programs_are_rejected_before_codegen() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::new();
    let dangling = ctx.fresh_ident("dangling");
    let program = Program::new(Expr::imm(Imm::id(&dangling)));
    let input = write_input(dir.path(), "main.json", &program);
    let output = dir.path().join("main.wasm");

    let err = compile(&Session::new(input, output.clone(), CompilerOption::default()))
        .unwrap_err();
    assert!(format!("{err:#}").contains("malformed"), "{err:#}");
    assert!(!output.exists());
}

#[test]
fn invalid_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.json");
    fs::write(&input, "{ not json").unwrap();

    let err = compile(&Session::new(
        input,
        dir.path().join("main.wasm"),
        CompilerOption::default(),
    ))
    .unwrap_err();
    assert!(err.to_string().contains("is not a valid ANF program"), "{err}");
}

#[test]
fn missing_arguments_fail_without_compiling() {
    let code = run_compiler(CompilerArgs {
        input: None,
        output: None,
        compiler_option: CompilerOption::default(),
    });
    assert_eq!(code, ExitCode::FAILURE);
}
