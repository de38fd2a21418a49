//! Tests for the bytecode compiler.

use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::{
    compiler::{CompileError, Compiler},
    parser,
    vm::{ArithOp, ClassId, ComparisonOp, Constant, Instruction, Program},
};
use Instruction::*;

/// Parses and compiles `source` with a fresh compiler.
fn compile(source: &str) -> Result<Program, CompileError> {
    let parsed = parser::parse(source);
    assert!(parsed.is_ok(), "parse errors: {:?}", parsed.errors);
    Compiler::new().compile(&parsed.statements)
}

fn main_of(source: &str) -> Vec<Instruction> {
    compile(source).unwrap().main.instructions.clone()
}

fn num(n: f64) -> Instruction {
    PushConst(Constant::Number(n))
}

#[test]
fn test_compile_var_declaration() {
    let program = compile("5 x = 2 + 3").unwrap();

    // Verify bytecode: 2, 3, Add, StoreSlot(0), Pop, Halt
    assert_eq!(
        program.main.instructions,
        vec![
            num(2.0),
            num(3.0),
            Arith(ArithOp::Add),
            StoreSlot(0),
            Pop,
            Halt
        ]
    );
    assert_eq!(program.main.max_stack_size, 2, "two operands of `+`");
}

#[test]
fn test_declaration_without_initializer() {
    assert_eq!(
        main_of("5 x"),
        vec![PushConst(Constant::Nil), StoreSlot(0), Pop, Halt]
    );
}

#[test]
fn test_slot_and_name_resolution() {
    // `x` is declared, `y` is not.
    assert_eq!(
        main_of("5 x = 1 y = x"),
        vec![
            num(1.0),
            StoreSlot(0),
            Pop,
            LoadSlot(0),
            StoreName("y".into()),
            Pop,
            Halt
        ]
    );
    assert_eq!(
        main_of("z.o(w)"),
        vec![
            PushConst(Constant::System),
            LoadName("w".into()),
            Print(1),
            Pop,
            Halt
        ]
    );
}

#[test]
fn test_redeclaration_reuses_slot() {
    let program = compile("5 x = 1 5 y = 2 5 x = 3").unwrap();
    assert_eq!(program.main.instructions[6], num(3.0));
    assert_eq!(program.main.instructions[7], StoreSlot(0));
}

#[test]
fn test_if_else_backpatching() {
    assert_eq!(
        main_of("i (1) z.o(1) e z.o(2)"),
        vec![
            num(1.0),
            JumpIfFalse(7),
            PushConst(Constant::System),
            num(1.0),
            Print(1),
            Pop,
            Jump(11),
            PushConst(Constant::System), // 7
            num(2.0),
            Print(1),
            Pop,
            Halt, // 11
        ]
    );
}

#[test]
fn test_if_without_else() {
    assert_eq!(
        main_of("i (0) z.o(1)"),
        vec![
            num(0.0),
            JumpIfFalse(6),
            PushConst(Constant::System),
            num(1.0),
            Print(1),
            Pop,
            Halt,
        ]
    );
}

#[test]
fn test_loop_jumps_back_to_condition() {
    assert_eq!(
        main_of("5 x = 3 l (x > 0) { x = x - 1 }"),
        vec![
            num(3.0),
            StoreSlot(0),
            Pop,
            LoadSlot(0), // 3
            num(0.0),
            Compare(ComparisonOp::Gt),
            JumpIfFalse(13),
            LoadSlot(0),
            num(1.0),
            Arith(ArithOp::Sub),
            StoreSlot(0),
            Pop,
            Jump(3),
            Halt, // 13
        ]
    );
}

#[test]
fn test_try_handle_shape() {
    let program = compile("t { z.t() } h (1 err) { z.o(err) }").unwrap();
    assert_eq!(
        program.main.instructions,
        vec![
            SetupTry(6),
            PushConst(Constant::System),
            Call("t".into(), 0),
            Pop,
            PopTry,
            Jump(12),
            StoreSlot(0), // 6: handler binds the thrown value
            Pop,
            PushConst(Constant::System),
            LoadSlot(0),
            Print(1),
            Pop,
            Halt, // 12
        ]
    );
}

#[test]
fn test_logical_and_unary() {
    assert_eq!(
        main_of("5 x = !1 && -2 || 3"),
        vec![
            num(1.0),
            Not,
            num(2.0),
            Negate,
            And,
            num(3.0),
            Or,
            StoreSlot(0),
            Pop,
            Halt,
        ]
    );
}

#[test]
fn test_at_operator_is_rejected() {
    assert_eq!(
        compile("5 x = @y"),
        Err(CompileError::Unsupported { construct: "'@'" })
    );
}

#[test]
fn test_collections_and_indexing() {
    assert_eq!(
        main_of("5 d = {\"a\": [1, 2]} d[\"a\"][0] = d[\"b\"]"),
        vec![
            PushConst(Constant::Str("a".into())),
            num(1.0),
            num(2.0),
            BuildList(2),
            BuildMap(1),
            StoreSlot(0),
            Pop,
            LoadSlot(0),
            PushConst(Constant::Str("a".into())),
            LoadIndex,
            num(0.0),
            LoadSlot(0),
            PushConst(Constant::Str("b".into())),
            LoadIndex,
            StoreIndex,
            Pop,
            Halt,
        ]
    );
}

#[test]
fn test_calls() {
    assert_eq!(
        main_of("5 x = 0 x.go(1, 2) run(3)"),
        vec![
            num(0.0),
            StoreSlot(0),
            Pop,
            LoadSlot(0),
            num(1.0),
            num(2.0),
            Call("go".into(), 2),
            Pop,
            // A bare call goes to `this`.
            LoadName("this".into()),
            num(3.0),
            Call("run".into(), 1),
            Pop,
            Halt,
        ]
    );
}

#[test]
fn test_call_of_computed_value_is_rejected() {
    assert_eq!(
        compile("(1)(2)").unwrap_err(),
        CompileError::Unsupported {
            construct: "call of a computed value"
        }
    );
}

#[test]
fn test_new_pushes_its_arguments() {
    assert_eq!(
        main_of("n Foo(1, 2)"),
        vec![num(1.0), num(2.0), New("Foo".into(), 2), Pop, Halt]
    );
}

#[test]
fn test_class_ids_start_at_15_in_declaration_order() {
    let program = compile(indoc! {"
        c A { }
        j Shape { m 1 area() }
        c B ^ A, Shape { }
        z.o(B)
    "})
    .unwrap();
    let names: Vec<_> = program.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(program.class("A").unwrap().id, ClassId(15));
    assert_eq!(program.class("B").unwrap().id, ClassId(16));
    assert_eq!(program.class("B").unwrap().superclass.as_deref(), Some("A"));
    assert_eq!(
        program.main.instructions[1],
        PushConst(Constant::Class(ClassId(16)))
    );
}

#[test]
fn test_class_used_before_declaration() {
    let program = compile("z.o(Later) c Later { }").unwrap();
    assert_eq!(
        program.main.instructions[1],
        PushConst(Constant::Class(ClassId(15)))
    );
}

#[test]
fn test_static_access_is_syntactic() {
    let program = compile(indoc! {"
        c Counter {
            s 5 n = 0
            s m 5 bump() {
                Counter.n = Counter.n + 1
                r Counter.n
            }
        }
    "})
    .unwrap();
    let counter = program.class("Counter").unwrap();
    let counter_id = PushConst(Constant::Class(ClassId(15)));

    assert_eq!(
        counter.static_init.instructions,
        vec![counter_id.clone(), num(0.0), SetStatic("n".into()), Pop]
    );
    assert_eq!(
        counter.static_methods["bump"].code.instructions,
        vec![
            counter_id.clone(),
            counter_id.clone(),
            GetStatic("n".into()),
            num(1.0),
            Arith(ArithOp::Add),
            SetStatic("n".into()),
            Pop,
            counter_id,
            GetStatic("n".into()),
            Return,
        ]
    );
    assert!(counter.methods.is_empty());
    assert_eq!(counter.static_fields.len(), 1);
}

#[test]
fn test_class_receiver_wins_over_a_global_of_the_same_name() {
    let main = main_of("c A { s 5 x = 3 } 5 A = 7 z.o(A.x, A)");
    let print = main.iter().position(|i| *i == Print(2)).unwrap();
    assert_eq!(
        main[print - 3..print],
        [
            PushConst(Constant::Class(ClassId(15))),
            GetStatic("x".into()),
            LoadSlot(0),
        ]
    );
}

#[test]
fn test_method_gets_implicit_return() {
    let program = compile("c A { m 1 f() { z.o(1) } m 1 g() { r 2 } }").unwrap();
    let class = program.class("A").unwrap();
    assert_eq!(
        class.methods["f"].code.instructions,
        vec![
            PushConst(Constant::System),
            num(1.0),
            Print(1),
            Pop,
            PushConst(Constant::Nil),
            Return,
        ]
    );
    assert_eq!(class.methods["g"].code.instructions, vec![num(2.0), Return]);
}

#[test]
fn test_instance_fields_and_visibility() {
    let program = compile(indoc! {"
        c A {
            p 5 secret
            5 open
            p m 1 hidden() { r this.secret }
        }
    "})
    .unwrap();
    let class = program.class("A").unwrap();
    assert_eq!(class.fields.len(), 2);
    assert_eq!(
        class.fields["secret"].visibility,
        crate::parser::Visibility::Private
    );
    assert_eq!(
        class.fields["open"].visibility,
        crate::parser::Visibility::Public
    );
    assert_eq!(
        class.methods["hidden"].code.instructions,
        vec![LoadName("this".into()), LoadField("secret".into()), Return]
    );
    // Instance fields have no initializer code.
    assert!(class.static_init.is_empty());
}

#[test]
fn test_params_are_recorded() {
    let program = compile("c A { m 1 f(5 u, 3 w) { r u } }").unwrap();
    let method = &program.class("A").unwrap().methods["f"];
    let params: Vec<_> = method.params.iter().map(|p| p.as_str()).collect();
    assert_eq!(params, vec!["u", "w"]);
    // Parameters are not bound, `u` is an ordinary name lookup.
    assert_eq!(method.code.instructions, vec![LoadName("u".into()), Return]);
}

#[test]
fn test_redeclared_class_replaces_descriptor() {
    let program = compile("c A { m 1 f() { r 1 } } c A { m 1 g() { r 2 } }").unwrap();
    assert_eq!(program.classes.len(), 1);
    let class = &program.classes[0];
    assert_eq!(class.id, ClassId(15));
    assert!(class.methods.contains_key("g"));
    assert!(!class.methods.contains_key("f"));
}

#[test]
fn test_misplaced_declarations() {
    let err = compile("i (1) { c Inner { } }").unwrap_err();
    assert_eq!(
        err,
        CompileError::MisplacedDeclaration {
            kind: "class",
            name: "Inner".into()
        }
    );
}

#[test]
fn test_compiler_state_persists_across_calls() {
    let mut compiler = Compiler::new();
    let first = parser::parse("5 x = 1 c A { }");
    compiler.compile(&first.statements).unwrap();

    let second = parser::parse("c B { } z.o(x, A, B)");
    let program = compiler.compile(&second.statements).unwrap();
    assert_eq!(
        program.main.instructions,
        vec![
            PushConst(Constant::System),
            LoadSlot(0),
            PushConst(Constant::Class(ClassId(15))),
            PushConst(Constant::Class(ClassId(16))),
            Print(3),
            Pop,
            Halt,
        ]
    );
    assert_eq!(compiler.globals().len(), 1);
}

#[test]
fn test_failed_compile_leaves_state_untouched() {
    let mut compiler = Compiler::new();
    let bad = parser::parse("5 x = 1 c A { } 5 y = @x");
    assert!(compiler.compile(&bad.statements).is_err());
    assert!(compiler.globals().is_empty());
    assert_eq!(compiler.class_id("A"), None);
}

#[test]
fn test_max_stack_size_tracks_deepest_point() {
    let program = compile("5 x = 1 + (2 * (3 - 4))").unwrap();
    assert_eq!(program.main.max_stack_size, 4);
}
