//! End-to-end scenarios: whole files in, filtered diagnostic streams out.
//!
//! Each scenario builds the AST the external front-end would produce for a
//! small source file and asserts the exact issue stream after filtering at
//! minimum severity 0.

use augur_analyzer::FileAst;
use augur_analyzer::error::DriverError;
use augur_analyzer::run;
use augur_analyzer::settings::Settings;
use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::Value;
use augur_ast::flags;
use augur_atom::atom;
use augur_reporting::IssueInstance;

fn name(text: &str, line: u32) -> Node {
    Node::new(NodeKind::Name, line).with_name(atom(text))
}

fn fq_name(text: &str, line: u32) -> Node {
    Node::new(NodeKind::Name, line).with_name(atom(text)).with_flags(flags::NAME_FULLY_QUALIFIED)
}

fn variable(text: &str, line: u32) -> Node {
    Node::new(NodeKind::Var, line).with_name(atom(text))
}

fn int_literal(value: i64, line: u32) -> Node {
    Node::new(NodeKind::Literal, line).with_value(Value::Int(value))
}

fn string_literal(value: &str, line: u32) -> Node {
    Node::new(NodeKind::Literal, line).with_value(Value::Str(value.to_string()))
}

fn stmt_list(line: u32, children: Vec<Node>) -> Node {
    Node::new(NodeKind::StmtList, line).with_children(children)
}

fn expr_stmt(expression: Node) -> Node {
    let line = expression.line;
    Node::new(NodeKind::ExprStmt, line).with_child(expression)
}

fn assign(target: Node, value: Node) -> Node {
    let line = target.line;
    Node::new(NodeKind::Assign, line).with_child(target).with_child(value)
}

fn arg_list(line: u32, arguments: Vec<Node>) -> Node {
    Node::new(NodeKind::ArgList, line).with_children(arguments)
}

fn call(function: &str, line: u32, arguments: Vec<Node>) -> Node {
    Node::new(NodeKind::Call, line).with_child(name(function, line)).with_child(arg_list(line, arguments))
}

fn param(param_name: &str, line: u32, type_hint: Option<&str>, default: Option<Node>) -> Node {
    let type_child = match type_hint {
        Some(hint) => name(hint, line),
        None => Node::missing(line),
    };
    let default_child = default.unwrap_or_else(|| Node::missing(line));

    Node::new(NodeKind::Param, line).with_name(atom(param_name)).with_child(type_child).with_child(default_child)
}

fn function_decl(
    function_name: &str,
    line: u32,
    parameters: Vec<Node>,
    body: Vec<Node>,
    return_hint: Option<&str>,
) -> Node {
    let return_child = match return_hint {
        Some(hint) => name(hint, line),
        None => Node::missing(line),
    };

    Node::new(NodeKind::FunctionDecl, line)
        .with_name(atom(function_name))
        .with_child(Node::new(NodeKind::ParamList, line).with_children(parameters))
        .with_child(stmt_list(line, body))
        .with_child(return_child)
}

fn method_decl(
    method_name: &str,
    line: u32,
    modifier_flags: u32,
    parameters: Vec<Node>,
    body: Vec<Node>,
) -> Node {
    Node::new(NodeKind::MethodDecl, line)
        .with_name(atom(method_name))
        .with_flags(modifier_flags)
        .with_child(Node::new(NodeKind::ParamList, line).with_children(parameters))
        .with_child(stmt_list(line, body))
        .with_child(Node::missing(line))
}

fn class_decl(class_name: &str, line: u32, extends: Option<Node>, members: Vec<Node>) -> Node {
    Node::new(NodeKind::ClassDecl, line)
        .with_name(atom(class_name))
        .with_child(extends.unwrap_or_else(|| Node::missing(line)))
        .with_child(Node::new(NodeKind::NameList, line))
        .with_child(Node::new(NodeKind::NameList, line))
        .with_child(stmt_list(line, members))
}

fn property_decl(property_name: &str, line: u32, type_hint: Option<&str>) -> Node {
    let type_child = match type_hint {
        Some(hint) => name(hint, line),
        None => Node::missing(line),
    };
    let element = Node::new(NodeKind::PropertyElem, line)
        .with_name(atom(property_name))
        .with_child(type_child)
        .with_child(Node::missing(line));

    Node::new(NodeKind::PropertyDecl, line).with_flags(flags::MODIFIER_PUBLIC).with_child(element)
}

fn file(path: &str, statements: Vec<Node>) -> FileAst {
    FileAst { path: atom(path), root: stmt_list(1, statements) }
}

fn rendered(issues: &[IssueInstance]) -> Vec<String> {
    issues.iter().map(IssueInstance::to_string).collect()
}

#[test]
fn test_extending_an_undeclared_class_is_reported() {
    // class A {} class B extends C {}
    let input = file(
        "src",
        vec![class_decl("A", 1, None, vec![]), class_decl("B", 1, Some(name("C", 1)), vec![])],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(rendered(&issues), vec!["src:1 UndeclaredExtendedClass Class extends undeclared class \\C"]);
}

#[test]
fn test_argument_type_mismatch_is_reported() {
    // function f(int $x) {} f("s");
    let input = file(
        "src",
        vec![
            function_decl("f", 1, vec![param("x", 1, Some("int"), None)], vec![], None),
            expr_stmt(call("f", 1, vec![string_literal("s", 1)])),
        ],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:1 TypeMismatchArgument Argument 1 (x) is string but \\f() takes int defined at src:1"]
    );
}

#[test]
fn test_property_assignment_type_mismatch_is_reported() {
    // class A { public int $n; function g() { $this->n = "s"; } }
    let write = assign(
        Node::new(NodeKind::Prop, 1).with_child(variable("this", 1)).with_child(name("n", 1)),
        string_literal("s", 1),
    );
    let input = file(
        "src",
        vec![class_decl(
            "A",
            1,
            None,
            vec![
                property_decl("n", 1, Some("int")),
                method_decl("g", 1, flags::MODIFIER_PUBLIC, vec![], vec![expr_stmt(write)]),
            ],
        )],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:1 TypeMismatchProperty Assigning string to property but \\A::n is int"]
    );
}

#[test]
fn test_foreach_over_inferred_array_is_clean() {
    // $x = [1,2,3]; foreach ($x as $k => $v) { echo $v + 1; }
    let array = Node::new(NodeKind::ArrayLit, 1).with_children(vec![
        Node::new(NodeKind::ArrayElem, 1).with_child(int_literal(1, 1)).with_child(Node::missing(1)),
        Node::new(NodeKind::ArrayElem, 1).with_child(int_literal(2, 1)).with_child(Node::missing(1)),
        Node::new(NodeKind::ArrayElem, 1).with_child(int_literal(3, 1)).with_child(Node::missing(1)),
    ]);
    let sum = Node::new(NodeKind::BinaryOp, 1)
        .with_flags(flags::BINARY_ADD)
        .with_child(variable("v", 1))
        .with_child(int_literal(1, 1));
    let foreach = Node::new(NodeKind::Foreach, 1)
        .with_child(variable("x", 1))
        .with_child(variable("v", 1))
        .with_child(variable("k", 1))
        .with_child(stmt_list(1, vec![Node::new(NodeKind::Echo, 1).with_child(sum)]));

    let input = file("src", vec![expr_stmt(assign(variable("x", 1), array)), foreach]);

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(rendered(&issues), Vec::<String>::new());
}

#[test]
fn test_missing_parent_constructor_call_is_reported() {
    // class A { function __construct() {} }
    // class B extends A { function __construct() { } }
    let input = file(
        "src",
        vec![
            class_decl("A", 1, None, vec![method_decl("__construct", 1, flags::MODIFIER_PUBLIC, vec![], vec![])]),
            class_decl(
                "B",
                1,
                Some(name("A", 1)),
                vec![method_decl("__construct", 1, flags::MODIFIER_PUBLIC, vec![], vec![])],
            ),
        ],
    );

    let settings = Settings { parent_constructor_required: vec!["A".to_string()], ..Settings::default() };
    let issues = run(&settings, &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:1 TypeParentConstructorCalled Must call parent::__construct() from \\B which extends \\A"]
    );
}

#[test]
fn test_calling_parent_constructor_satisfies_the_requirement() {
    let parent_call = Node::new(NodeKind::StaticCall, 1)
        .with_child(name("parent", 1))
        .with_child(name("__construct", 1))
        .with_child(arg_list(1, vec![]));
    let input = file(
        "src",
        vec![
            class_decl("A", 1, None, vec![method_decl("__construct", 1, flags::MODIFIER_PUBLIC, vec![], vec![])]),
            class_decl(
                "B",
                1,
                Some(name("A", 1)),
                vec![method_decl(
                    "__construct",
                    1,
                    flags::MODIFIER_PUBLIC,
                    vec![],
                    vec![expr_stmt(parent_call)],
                )],
            ),
        ],
    );

    let settings = Settings { parent_constructor_required: vec!["A".to_string()], ..Settings::default() };
    let issues = run(&settings, &[input]).unwrap();

    assert_eq!(rendered(&issues), Vec::<String>::new());
}

#[test]
fn test_undeclared_return_type_through_use_map_is_reported() {
    // namespace N; use \OtherNs\X; function f(): X { return new X(); }
    let use_decl = Node::new(NodeKind::UseDecl, 1)
        .with_flags(flags::USE_NORMAL)
        .with_child(Node::new(NodeKind::UseElem, 1).with_name(atom("OtherNs\\X")));
    let new_x = Node::new(NodeKind::New, 1).with_child(name("X", 1)).with_child(arg_list(1, vec![]));
    let body = vec![Node::new(NodeKind::Return, 1).with_child(new_x)];

    let input = file(
        "src",
        vec![
            Node::new(NodeKind::Namespace, 1).with_name(atom("N")),
            use_decl,
            function_decl("f", 1, vec![], body, Some("X")),
        ],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec![
            "src:1 UndeclaredClass Reference to undeclared class \\OtherNs\\X",
            "src:1 UndeclaredTypeReturn Return type of undeclared type \\OtherNs\\X",
        ]
    );
}

#[test]
fn test_undeclared_parameter_type_is_reported() {
    let input = file(
        "src",
        vec![function_decl("f", 2, vec![param("w", 2, Some("\\Missing\\Widget"), None)], vec![], None)],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:2 UndeclaredTypeParameter Parameter of undeclared type \\Missing\\Widget"]
    );
}

#[test]
fn test_undeclared_variable_in_function_scope() {
    let input = file(
        "src",
        vec![function_decl(
            "f",
            1,
            vec![],
            vec![expr_stmt(assign(variable("a", 2), variable("missing", 2)))],
            None,
        )],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(rendered(&issues), vec!["src:2 UndeclaredVariable Variable $missing is undeclared"]);
}

#[test]
fn test_condition_narrowing_flows_into_the_true_branch() {
    // function f($x) { if (is_string($x)) { g($x); } }  with g(int $i)
    let guard = call("is_string", 3, vec![variable("x", 3)]);
    let call_g = call("g", 4, vec![variable("x", 4)]);
    let if_stmt = Node::new(NodeKind::If, 3).with_child(
        Node::new(NodeKind::IfElem, 3).with_child(guard).with_child(stmt_list(4, vec![expr_stmt(call_g)])),
    );

    let input = file(
        "src",
        vec![
            function_decl("g", 1, vec![param("i", 1, Some("int"), None)], vec![], None),
            function_decl("f", 2, vec![param("x", 2, None, None)], vec![if_stmt], None),
        ],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:4 TypeMismatchArgument Argument 1 (i) is string but \\g() takes int defined at src:1"]
    );
}

#[test]
fn test_branch_merge_adds_null_for_partial_assignment() {
    // function f($c) { if ($c) { $v = 1; } h($v); }  with h(int|null $x): clean
    let if_stmt = Node::new(NodeKind::If, 2).with_child(
        Node::new(NodeKind::IfElem, 2)
            .with_child(variable("c", 2))
            .with_child(stmt_list(3, vec![expr_stmt(assign(variable("v", 3), int_literal(1, 3)))])),
    );
    let call_h = call("h", 4, vec![variable("v", 4)]);

    let input = file(
        "src",
        vec![
            function_decl("h", 1, vec![param("x", 1, Some("?int"), None)], vec![], None),
            function_decl("f", 2, vec![param("c", 2, None, None)], vec![if_stmt, expr_stmt(call_h)], None),
        ],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(rendered(&issues), Vec::<String>::new());
}

#[test]
fn test_template_parameters_flow_from_constructor_to_member_access() {
    // /** @template T */ class Box { /** @param T $v */ __construct($v); /** @return T */ get() }
    // wants_string(string $s); $b = new Box(1); wants_string($b->get());
    let constructor = Node::new(NodeKind::MethodDecl, 2)
        .with_name(atom("__construct"))
        .with_flags(flags::MODIFIER_PUBLIC)
        .with_doc_comment("/** @param T $v */")
        .with_child(Node::new(NodeKind::ParamList, 2).with_child(param("v", 2, None, None)))
        .with_child(stmt_list(2, vec![]))
        .with_child(Node::missing(2));
    let getter = Node::new(NodeKind::MethodDecl, 3)
        .with_name(atom("get"))
        .with_flags(flags::MODIFIER_PUBLIC)
        .with_doc_comment("/** @return T */")
        .with_child(Node::new(NodeKind::ParamList, 3))
        .with_child(stmt_list(3, vec![Node::new(NodeKind::Return, 3).with_child(int_literal(1, 3))]))
        .with_child(Node::missing(3));
    let container = Node::new(NodeKind::ClassDecl, 1)
        .with_name(atom("Box"))
        .with_doc_comment("/** @template T */")
        .with_child(Node::missing(1))
        .with_child(Node::new(NodeKind::NameList, 1))
        .with_child(Node::new(NodeKind::NameList, 1))
        .with_child(stmt_list(1, vec![constructor, getter]));

    let new_box = Node::new(NodeKind::New, 5)
        .with_child(name("Box", 5))
        .with_child(arg_list(5, vec![int_literal(1, 5)]));
    let get_call = Node::new(NodeKind::MethodCall, 6)
        .with_child(variable("b", 6))
        .with_child(name("get", 6))
        .with_child(arg_list(6, vec![]));

    let input = file(
        "src",
        vec![
            container,
            function_decl("wants_string", 4, vec![param("s", 4, Some("string"), None)], vec![], None),
            expr_stmt(assign(variable("b", 5), new_box)),
            expr_stmt(call("wants_string", 6, vec![get_call])),
        ],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:6 TypeMismatchArgument Argument 1 (s) is int but \\wants_string() takes string defined at src:4"]
    );
}

#[test]
fn test_internal_function_mismatch_uses_internal_variant() {
    // strlen([]) — the signature comes from the bundled map.
    let array = Node::new(NodeKind::ArrayLit, 1);
    let input = file("src", vec![expr_stmt(call("strlen", 1, vec![array]))]);

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:1 TypeMismatchArgumentInternal Argument 1 (string) is array but \\strlen() takes string"]
    );
}

#[test]
fn test_too_few_arguments_to_internal_function() {
    let input = file("src", vec![expr_stmt(call("strlen", 1, vec![]))]);

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:1 ParamTooFewInternal Call with 0 arg(s) to \\strlen() which requires 1 arg(s)"]
    );
}

#[test]
fn test_dead_code_detection_reports_unreferenced_function() {
    let input = file(
        "src",
        vec![
            function_decl("used", 1, vec![], vec![], None),
            function_decl("unused", 2, vec![], vec![], None),
            expr_stmt(call("used", 3, vec![])),
        ],
    );

    let settings = Settings { dead_code_detection: true, ..Settings::default() };
    let issues = run(&settings, &[input]).unwrap();

    assert_eq!(rendered(&issues), vec!["src:2 UnreferencedFunction Possibly zero references to function \\unused"]);
}

#[test]
fn test_dead_code_detection_rejects_multiple_processes() {
    let settings = Settings { dead_code_detection: true, processes: 4, ..Settings::default() };

    assert_eq!(run(&settings, &[]).unwrap_err(), DriverError::DeadCodeWithMultipleProcesses);
}

#[test]
fn test_scope_suppression_silences_the_issue() {
    let body = vec![expr_stmt(assign(variable("a", 2), variable("missing", 2)))];
    let function = Node::new(NodeKind::FunctionDecl, 1)
        .with_name(atom("f"))
        .with_doc_comment("/** @suppress UndeclaredVariable */")
        .with_child(Node::new(NodeKind::ParamList, 1))
        .with_child(stmt_list(1, body))
        .with_child(Node::missing(1));

    let input = file("src", vec![function]);
    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(rendered(&issues), Vec::<String>::new());
}

#[test]
fn test_whitelist_keeps_only_listed_issue_types() {
    let input = file(
        "src",
        vec![
            class_decl("B", 1, Some(name("C", 1)), vec![]),
            expr_stmt(call("nope", 2, vec![])),
        ],
    );

    let settings =
        Settings { whitelist_issue_types: vec!["UndeclaredFunction".to_string()], ..Settings::default() };
    let issues = run(&settings, &[input]).unwrap();

    assert_eq!(rendered(&issues), vec!["src:2 UndeclaredFunction Call to undeclared function \\nope"]);
}

#[test]
fn test_duplicate_files_are_analyzed_once() {
    let make = || file("src", vec![expr_stmt(call("nope", 1, vec![]))]);

    let issues = run(&Settings::default(), &[make(), make()]).unwrap();

    assert_eq!(rendered(&issues), vec!["src:1 UndeclaredFunction Call to undeclared function \\nope"]);
}

#[test]
fn test_worker_partitioning_matches_single_process_output() {
    let files: Vec<FileAst> = (0..6)
        .map(|index| {
            file(&format!("src{index}"), vec![expr_stmt(call("nope", 1, vec![]))])
        })
        .collect();

    let single = run(&Settings::default(), &files).unwrap();
    let parallel = run(&Settings { processes: 3, ..Settings::default() }, &files).unwrap();

    assert_eq!(rendered(&single), rendered(&parallel));
    assert_eq!(single.len(), 6);
}

#[test]
fn test_redefined_class_gets_an_alternate_and_a_diagnostic() {
    let input = file("src", vec![class_decl("A", 1, None, vec![]), class_decl("A", 5, None, vec![])]);

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, augur_reporting::IssueKind::RedefineClass);
    assert_eq!(issues[0].line, 5);
}

#[test]
fn test_parameter_declaration_problems_are_reported() {
    // function f($dup, int $dup = 1, $late) {}
    let input = file(
        "src",
        vec![function_decl(
            "f",
            1,
            vec![
                param("dup", 1, None, None),
                param("dup", 2, Some("int"), Some(int_literal(1, 2))),
                param("late", 3, None, None),
            ],
            vec![],
            None,
        )],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec![
            "src:2 ParamRedefined Redefinition of parameter $dup",
            "src:3 ParamReqAfterOpt Required argument follows optional",
        ]
    );
}

#[test]
fn test_default_value_must_cast_to_declared_type() {
    // function f(int $x = "nope") {}
    let input = file(
        "src",
        vec![function_decl("f", 1, vec![param("x", 1, Some("int"), Some(string_literal("nope", 1)))], vec![], None)],
    );

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(rendered(&issues), vec!["src:1 TypeMismatchDefault Default value for \\f $x can't be string"]);
}

#[test]
fn test_static_call_to_instance_method_is_reported() {
    let method = method_decl("helper", 1, flags::MODIFIER_PUBLIC, vec![], vec![]);
    let static_call = Node::new(NodeKind::StaticCall, 2)
        .with_child(fq_name("\\A", 2))
        .with_child(name("helper", 2))
        .with_child(arg_list(2, vec![]));

    let input = file("src", vec![class_decl("A", 1, None, vec![method]), expr_stmt(static_call)]);

    let issues = run(&Settings::default(), &[input]).unwrap();

    assert_eq!(
        rendered(&issues),
        vec!["src:2 StaticCallToNonStatic Static call to non-static method \\A::helper defined at src:1"]
    );
}
