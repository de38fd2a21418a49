#[macro_use]
mod cases;

use alphabet::{Error, ExecutionOptions, Fault, ResourceExceeded};
use indoc::indoc;

test_case!(
    handler_catches_system_throw,
    input: indoc! {r#"
        t {
            z.t()
            z.o("unreached")
        } h (1 err) {
            z.o("caught", err)
        }
        z.o("after")
    "#},
    output: "caught Custom Error 15\nafter\n",
);

test_case!(
    try_without_throw_skips_the_handler,
    input: r#"t { z.o("body") } h (1 err) { z.o("handler") } z.o("done")"#,
    output: "body\ndone\n",
);

test_case!(
    uncaught_exception_stops_the_program,
    input: r#"z.o("before") z.t() z.o("after")"#,
    output: "before\n",
    error: Error::Uncaught(_),
);

test_case!(
    exception_unwinds_method_frames,
    input: indoc! {r#"
        c Risky {
            m 1 go() { deeper() z.o("no") }
            m 1 deeper() { z.t() }
        }
        t { n Risky().go() } h (1 err) { z.o("handled") }
        z.o("done")
    "#},
    output: "handled\ndone\n",
);

test_case!(
    handler_inside_a_method,
    input: indoc! {r#"
        c Safe {
            m 5 attempt() {
                t { z.t() } h (1 err) { r "recovered" }
                r "unreachable"
            }
        }
        z.o(n Safe().attempt())
    "#},
    output: "recovered\n",
);

test_case!(
    nested_handlers,
    input: indoc! {r#"
        t {
            t { z.t() } h (1 inner) { z.o("inner") z.t() }
        } h (1 outer) {
            z.o("outer", outer)
        }
    "#},
    output: "inner\nouter Custom Error 15\n",
);

test_case!(
    handler_inside_a_loop,
    input: indoc! {"
        5 x = 3
        l (x > 0) {
            t { z.t() } h (1 err) { z.o(x) }
            x = x - 1
        }
    "},
    output: "3\n2\n1\n",
);

test_case!(
    faults_are_not_catchable,
    input: r#"t { z.o(1 / 0) } h (1 err) { z.o("no") }"#,
    output: "",
    error: Error::Runtime(Fault::DivisionByZero),
);

#[test]
fn uncaught_exception_renders_the_value() {
    let run = cases::run("z.t()");
    assert_eq!(
        run.result,
        Err(Error::Uncaught("Custom Error 15".to_string()))
    );
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "Unhandled exception: Custom Error 15"
    );
}

#[test]
fn runaway_recursion_hits_the_call_depth_limit() {
    let source = "c R { m 1 down() { r down() } } n R().down()";
    let options = ExecutionOptions {
        max_depth: 64,
        ..Default::default()
    };
    let run = cases::run_with(source, "", options);
    assert_eq!(
        run.result,
        Err(Error::ResourceExceeded(ResourceExceeded::CallDepth {
            depth: 65,
            max_depth: 64
        }))
    );
}

#[test]
fn infinite_loop_hits_the_instruction_budget() {
    let options = ExecutionOptions {
        max_instructions: Some(1000),
        ..Default::default()
    };
    let run = cases::run_with("l (1) { }", "", options);
    assert_eq!(
        run.result,
        Err(Error::ResourceExceeded(ResourceExceeded::Instructions {
            limit: 1000
        }))
    );
}

#[test]
fn resource_limits_are_not_catchable() {
    let options = ExecutionOptions {
        max_instructions: Some(50),
        ..Default::default()
    };
    let run = cases::run_with(
        r#"t { l (1) { } } h (1 err) { z.o("no") }"#,
        "",
        options,
    );
    assert!(
        matches!(run.result, Err(Error::ResourceExceeded(_))),
        "{:?}",
        run.result
    );
    assert_eq!(run.output, "");
}
