#[macro_use]
mod cases;

use alphabet::{Error, Fault};
use indoc::indoc;

test_case!(
    instance_fields_default_to_zero,
    input: indoc! {"
        c Box {
            5 w
            m 1 fill() { this.w = 9 }
        }
        5 bx = n Box
        z.o(bx.w)
        bx.fill()
        z.o(bx.w, bx)
    "},
    output: "0\n9 Object#15\n",
);

test_case!(
    fields_set_from_outside,
    input: indoc! {"
        c Point { 5 x 5 y }
        5 pt = n Point(1, 2)
        pt.x = 4
        pt.y = pt.x * 2
        z.o(pt.x, pt.y)
    "},
    output: "4 8\n",
);

test_case!(
    inherited_methods_are_found_on_the_superclass,
    input: indoc! {r#"
        c Animal {
            m 1 speak() { z.o("...") }
            m 1 kind() { r "animal" }
        }
        c Dog ^ Animal {
            m 1 speak() { z.o("woof", kind()) }
        }
        5 d = n Dog
        d.speak()
        n Animal().speak()
    "#},
    output: "woof animal\n...\n",
);

test_case!(
    interfaces_have_no_runtime_effect,
    input: indoc! {"
        j Shape { m 5 area() }
        c Base { }
        c Square ^ Base, Shape { m 5 area() { r 4 * 4 } }
        z.o(n Square().area())
    "},
    output: "16\n",
);

test_case!(
    method_without_return_yields_null,
    input: "c A { m 1 f() { } } z.o(n A().f())",
    output: "null\n",
);

test_case!(
    arguments_are_not_bound_to_parameters,
    input: indoc! {"
        c A { m 5 echo(5 v) { r v } }
        z.o(n A().echo(3))
    "},
    output: "0\n",
);

test_case!(
    class_names_evaluate_to_their_identifier,
    input: "c A { } c B { } z.o(A, B, A == 15)",
    output: "15 16 true\n",
);

test_case!(
    instances_compare_by_identity,
    input: indoc! {"
        c A { }
        5 x = n A
        5 y = x
        z.o(x == y, x == n A)
    "},
    output: "true false\n",
);

test_case!(
    private_members_are_usable_inside_their_class,
    input: indoc! {"
        c Vault {
            p 5 secret
            p m 5 code() { r 1234 }
            m 5 open() {
                this.secret = code()
                r this.secret
            }
        }
        z.o(n Vault().open())
    "},
    output: "1234\n",
);

test_case!(
    private_field_is_hidden_from_main,
    input: indoc! {"
        c Vault { p 5 secret m 1 peek() { r this.secret } }
        5 q = n Vault
        z.o(q.peek())
        z.o(q.secret)
    "},
    output: "0\n",
    error: Error::Runtime(Fault::PrivateField(_)),
);

test_case!(
    private_method_is_hidden_from_main,
    input: indoc! {"
        c A { p m 1 hid() { r 1 } m 1 show() { r hid() } }
        5 x = n A
        z.o(x.show())
        x.hid()
    "},
    output: "1\n",
    error: Error::Runtime(Fault::PrivateMethod(_)),
);

test_case!(
    private_method_is_hidden_from_subclasses,
    input: indoc! {"
        c A { p m 1 hid() { r 1 } }
        c B ^ A { m 1 probe() { r hid() } }
        n B().probe()
    "},
    output: "",
    error: Error::Runtime(Fault::PrivateMethod(_)),
);

test_case!(
    missing_method_faults,
    input: "c A { } n A().nope()",
    output: "",
    error: Error::Runtime(Fault::MethodNotFound(_)),
);

test_case!(
    unknown_class_faults,
    input: "5 g = n Ghost",
    output: "",
    error: Error::Runtime(Fault::UnknownClass(_)),
);

test_case!(
    calling_a_method_on_a_number_faults,
    input: "5 x = 1 x.go()",
    output: "",
    error: Error::Runtime(Fault::InvalidReceiver { .. }),
);

test_case!(
    redeclared_class_replaces_the_earlier_one,
    input: indoc! {"
        c A { m 1 f() { r 1 } }
        c A { m 1 f() { r 2 } }
        z.o(n A().f(), A)
    "},
    output: "2 15\n",
);

test_case!(
    class_declared_after_use,
    input: "z.o(n Later().f()) c Later { m 1 f() { r 7 } }",
    output: "7\n",
);
