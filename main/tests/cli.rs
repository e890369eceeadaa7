use std::{fs, process::Command};

use ir_anf::{Comp, Context, Expr, Imm, Program};

fn anfc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_anfc"))
}

#[test]
fn compiles_with_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::new();
    let none = ctx.fresh_ident("none");
    let program = Program::new(Expr::let_one(
        none.clone(),
        Comp::adt(2, 0, vec![]),
        Expr::Comp(Comp::Tuple(vec![Imm::id(&none), Imm::id(&none)])),
    ));
    let input = dir.path().join("main.json");
    fs::write(&input, serde_json::to_string(&program).unwrap()).unwrap();
    let config = dir.path().join("anfc.toml");
    fs::write(&config, "debug = true\n").unwrap();
    let output = dir.path().join("main.wasm");

    let status = anfc()
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(output.exists());
    assert!(dir.path().join("main.wasm.wast").exists());
    assert!(dir.path().join("main.wasm.modsig").exists());
    assert!(!dir.path().join("main.wasm.lock").exists());
}

#[test]
fn fails_without_an_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.json");
    fs::write(&input, "{}").unwrap();

    let status = anfc().arg("--input").arg(&input).status().unwrap();
    assert!(!status.success());
}
