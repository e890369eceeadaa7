use ir_anf::{
    check_program, map_program, Binding, Comp, Context, Expr, Function, Ident, Imm, Import, Mapper,
    Prim2, Program,
};

fn sample_program(ctx: &Context) -> Program {
    let print = ctx.fresh_ident("print");
    let add = ctx.fresh_ident("add");
    let x = ctx.fresh_ident("x");
    let y = ctx.fresh_ident("y");
    let sum = ctx.fresh_ident("sum");
    let a = ctx.fresh_ident("a");
    let b = ctx.fresh_ident("b");
    let r = ctx.fresh_ident("r");

    let add_fn = Function {
        id: add.clone(),
        params: vec![x.clone(), y.clone()],
        body: Expr::let_one(
            sum.clone(),
            Comp::Prim2(Prim2::Add, Imm::id(&x), Imm::id(&y)),
            Expr::imm(Imm::id(&sum)),
        ),
        export: true,
        span: None,
    };

    let body = Expr::let_(
        vec![
            Binding::new(a.clone(), Comp::adt(1, 0, vec![])),
            Binding::new(b.clone(), Comp::Call(add.clone(), vec![Imm::int(1), Imm::int(2)])),
        ],
        Expr::seq(
            Comp::CallForeign(print.clone(), vec![Imm::id(&b)]),
            Expr::let_one(
                r.clone(),
                Comp::If(
                    Imm::bool(true),
                    Box::new(Expr::imm(Imm::id(&a))),
                    Box::new(Expr::Comp(Comp::Fail(1))),
                ),
                Expr::imm(Imm::id(&r)),
            ),
        ),
    );

    Program {
        source: Some("sample.gr".to_owned()),
        imports: vec![Import {
            id: print,
            module: "env".to_owned(),
            name: "print".to_owned(),
            arity: 1,
        }],
        functions: vec![add_fn],
        body,
    }
}

struct Identity;

impl Mapper for Identity {}

#[test]
fn identity_hooks_preserve_the_program() {
    let ctx = Context::new();
    let program = sample_program(&ctx);
    assert_eq!(check_program(&program), Ok(()));

    let mapped = map_program(&mut Identity, program.clone());
    assert_eq!(mapped, program);
}

/// Renames every use of `from` to `to` in `leave_imm` and records the order of hooks.
struct Recorder {
    events: Vec<String>,
    from: Ident,
    to: Ident,
}

impl Mapper for Recorder {
    fn enter_expr(&mut self, expr: Expr) -> Expr {
        if let Expr::Let { bindings, .. } = &expr {
            let names: Vec<_> = bindings.iter().map(|b| b.id.name.clone()).collect();
            self.events.push(format!("enter let {}", names.join(",")));
        }
        expr
    }

    fn leave_expr(&mut self, expr: Expr) -> Expr {
        if let Expr::Let { bindings, .. } = &expr {
            let names: Vec<_> = bindings.iter().map(|b| b.id.name.clone()).collect();
            self.events.push(format!("leave let {}", names.join(",")));
        }
        expr
    }

    fn enter_binding(&mut self, binding: Binding) -> Binding {
        self.events.push(format!("enter binding {}", binding.id.name));
        binding
    }

    fn leave_binding(&mut self, binding: Binding) -> Binding {
        self.events.push(format!("leave binding {}", binding.id.name));
        binding
    }

    fn enter_comp(&mut self, comp: Comp) -> Comp {
        if let Comp::Tuple(args) = &comp {
            self.events
                .push(format!("enter tuple {}", args[0].as_id().unwrap().name));
        }
        comp
    }

    fn leave_comp(&mut self, comp: Comp) -> Comp {
        if let Comp::Tuple(args) = &comp {
            self.events
                .push(format!("leave tuple {}", args[0].as_id().unwrap().name));
        }
        comp
    }

    fn leave_imm(&mut self, imm: Imm) -> Imm {
        match imm {
            Imm::Id(ident) if ident == self.from => Imm::id(&self.to),
            imm => imm,
        }
    }
}

#[test]
fn enter_sees_original_children_and_leave_sees_rewritten_ones() {
    let ctx = Context::new();
    let a = ctx.fresh_ident("a");
    let b = ctx.fresh_ident("b");
    let t = ctx.fresh_ident("t");

    let program = Program::new(Expr::let_one(
        a.clone(),
        Comp::Imm(Imm::int(1)),
        Expr::let_one(
            b.clone(),
            Comp::Imm(Imm::int(2)),
            Expr::let_one(
                t.clone(),
                Comp::Tuple(vec![Imm::id(&a)]),
                Expr::imm(Imm::id(&t)),
            ),
        ),
    ));

    let mut recorder = Recorder {
        events: Vec::new(),
        from: a.clone(),
        to: b.clone(),
    };
    let mapped = map_program(&mut recorder, program);

    assert_eq!(
        recorder.events,
        vec![
            "enter let a",
            "enter binding a",
            "leave binding a",
            "enter let b",
            "enter binding b",
            "leave binding b",
            "enter let t",
            "enter binding t",
            "enter tuple a",
            "leave tuple b",
            "leave binding t",
            "leave let t",
            "leave let b",
            "leave let a",
        ]
    );

    let expected = Program::new(Expr::let_one(
        a,
        Comp::Imm(Imm::int(1)),
        Expr::let_one(
            b.clone(),
            Comp::Imm(Imm::int(2)),
            Expr::let_one(
                t.clone(),
                Comp::Tuple(vec![Imm::id(&b)]),
                Expr::imm(Imm::id(&t)),
            ),
        ),
    ));
    assert_eq!(mapped, expected);
}

/// Counts how often each node kind is visited.
#[derive(Default)]
struct Counter {
    exprs: usize,
    bindings: usize,
    imms: usize,
}

impl Mapper for Counter {
    fn enter_expr(&mut self, expr: Expr) -> Expr {
        self.exprs += 1;
        expr
    }

    fn enter_binding(&mut self, binding: Binding) -> Binding {
        self.bindings += 1;
        binding
    }

    fn enter_imm(&mut self, imm: Imm) -> Imm {
        self.imms += 1;
        imm
    }
}

#[test]
fn every_node_is_visited_once() {
    let ctx = Context::new();
    let program = sample_program(&ctx);
    let mut counter = Counter::default();
    map_program(&mut counter, program);

    // function body: let, terminal; main: let, seq, let, two arms, terminal
    assert_eq!(counter.exprs, 8);
    assert_eq!(counter.bindings, 4);
    // x, y, sum | 1, 2 | b | true | a | r
    assert_eq!(counter.imms, 9);
}

#[test]
fn programs_are_read_from_json() {
    let json = r#"{
        "source": "main.gr",
        "body": {
            "Let": {
                "bindings": [
                    { "id": { "name": "none", "stamp": 0 },
                      "comp": { "Adt": { "type_tag": 4, "variant": 0, "args": [] } } }
                ],
                "body": { "Comp": { "Imm": { "Id": { "name": "none", "stamp": 0 } } } }
            }
        }
    }"#;
    let program: Program = serde_json::from_str(json).unwrap();
    let none = Ident::new("none", 0);
    assert_eq!(
        program.body,
        Expr::let_one(
            none.clone(),
            Comp::adt(4, 0, vec![]),
            Expr::imm(Imm::id(&none))
        )
    );
    assert_eq!(check_program(&program), Ok(()));
}
