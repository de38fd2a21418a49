#[macro_use]
mod cases;

use alphabet::{Error, Fault};
use indoc::indoc;

test_case!(
    static_counter_keeps_its_value_between_calls,
    input: indoc! {"
        c Counter {
            s 5 n = 0
            s m 5 bump() {
                Counter.n = Counter.n + 1
                r Counter.n
            }
        }
        z.o(Counter.bump())
        z.o(Counter.bump())
    "},
    output: "1\n2\n",
);

test_case!(
    static_initializers_run_before_main,
    input: indoc! {"
        z.o(Config.limit)
        c Config { s 5 limit = 10 * 4 + 2 }
    "},
    output: "42\n",
);

test_case!(
    static_initializers_run_in_declaration_order,
    input: indoc! {"
        c A { s 5 x = B.y + 1 }
        c B { s 5 y = 10 }
        z.o(A.x, B.y)
    "},
    output: "1 10\n",
);

test_case!(
    static_without_initializer_is_zero,
    input: "c A { s 5 x } z.o(A.x)",
    output: "0\n",
);

test_case!(
    statics_assigned_from_main,
    input: indoc! {"
        c Settings { s 5 level = 1 }
        Settings.level = Settings.level + 4
        z.o(Settings.level)
    "},
    output: "5\n",
);

test_case!(
    static_initializer_may_print,
    input: indoc! {r#"
        c Loud { s 5 x = z.o("init") }
        z.o("main")
    "#},
    output: "init\nmain\n",
);

test_case!(
    static_methods_are_not_inherited,
    input: indoc! {"
        c A { s m 5 f() { r 1 } }
        c B ^ A { }
        z.o(A.f())
        B.f()
    "},
    output: "1\n",
    error: Error::Runtime(Fault::StaticMethodNotFound { .. }),
);

test_case!(
    static_methods_are_not_instance_methods,
    input: "c A { s m 5 f() { r 1 } } n A().f()",
    output: "",
    error: Error::Runtime(Fault::MethodNotFound(_)),
);

test_case!(
    declared_global_shadows_a_class_name,
    input: indoc! {"
        c A { s 5 x = 3 }
        5 A = 7
        z.o(A)
    "},
    output: "7\n",
);

test_case!(
    class_field_access_ignores_a_global_of_the_same_name,
    input: indoc! {"
        c A { s 5 x = 3 }
        5 A = 7
        z.o(A.x)
        A.x = 4
        z.o(A.x, A)
    "},
    output: "3\n4 7\n",
);
