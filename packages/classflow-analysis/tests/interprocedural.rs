//! Interprocedural scenarios: pointer-analysis-backed heap constants,
//! call/return value flow, and the alias round-trip through methods.

use rustc_hash::FxHashMap;

use classflow_analysis::{
    AnalysisError, AnalysisOptions, BinaryOp, CiSolver, IcfgBuilder, ProgramBuilder,
    Type, Value,
};

#[test]
fn heap_constant_through_alias() {
    // x = new O(); y = x; y.f = 1; z = x.f
    //   →  pt(x) = pt(y) = {O@site}, and z = CONST(1)
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let o_class = b.add_class("O");
    let f = b.add_field(o_class, "f", Type::int(), false);
    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let mut mb = b.body(main);
    let x = mb.var("x", Type::Reference(o_class));
    let y = mb.var("y", Type::Reference(o_class));
    let one = mb.var("one", Type::int());
    let z = mb.var("z", Type::int());
    mb.new_obj(x, Type::Reference(o_class));
    mb.copy(y, x);
    mb.assign_lit(one, 1);
    mb.store_field(y, f, one);
    mb.load_field(z, x, f);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let pta = CiSolver::new(&program).solve().unwrap();
    assert!(pta.may_alias(x, y));
    assert_eq!(pta.points_to(x).count(), 1);

    let icfg = IcfgBuilder::build(&program, pta.call_graph()).unwrap();
    let mut results = FxHashMap::default();
    results.insert("ci".to_string(), pta);
    let options = AnalysisOptions::new().with_pta("ci");
    let facts =
        classflow_analysis::run_inter_constant_propagation(&program, &icfg, &options, &results)
            .unwrap();

    let body = program.method(main).body.as_ref().unwrap();
    let exit = body.exit;
    assert_eq!(facts.in_fact(exit).get(z), Value::Const(1));
}

#[test]
fn alias_round_trip_across_methods() {
    // set(p) { p.f = 1 }  main { o = new O(); set(o); t = o.f }
    //   →  t = CONST(1): the store in set() dirties the load in main()
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let o_class = b.add_class("O");
    let f = b.add_field(o_class, "f", Type::int(), false);

    let set = b.add_method(main_class, "set", vec![Type::Reference(o_class)], Type::Void);
    b.mark_static(set);
    let mut mb = b.body(set);
    let p = mb.param("p", Type::Reference(o_class));
    let one = mb.var("one", Type::int());
    mb.assign_lit(one, 1);
    mb.store_field(p, f, one);
    mb.ret(None);
    mb.finish();

    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let set_ref = b.method_ref(set);
    let mut mb = b.body(main);
    let o = mb.var("o", Type::Reference(o_class));
    let t = mb.var("t", Type::int());
    mb.new_obj(o, Type::Reference(o_class));
    mb.call_static(set_ref, vec![o], None);
    mb.load_field(t, o, f);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let pta = CiSolver::new(&program).solve().unwrap();
    assert!(pta.may_alias(o, p));

    let icfg = IcfgBuilder::build(&program, pta.call_graph()).unwrap();
    let mut results = FxHashMap::default();
    results.insert("ci".to_string(), pta);
    let options = AnalysisOptions::new().with_pta("ci");
    let facts =
        classflow_analysis::run_inter_constant_propagation(&program, &icfg, &options, &results)
            .unwrap();

    let exit = program.method(main).body.as_ref().unwrap().exit;
    assert_eq!(facts.in_fact(exit).get(t), Value::Const(1));
}

#[test]
fn constants_flow_through_call_and_return() {
    // add(a, b) { r = a + b; return r }  main { z = add(1, 2); }  →  z = 3
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let add = b.add_method(main_class, "add", vec![Type::int(), Type::int()], Type::int());
    b.mark_static(add);
    let mut mb = b.body(add);
    let pa = mb.param("a", Type::int());
    let pb = mb.param("b", Type::int());
    let r = mb.var("r", Type::int());
    mb.binary(r, BinaryOp::Add, pa, pb);
    mb.ret(Some(r));
    mb.finish();

    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let add_ref = b.method_ref(add);
    let mut mb = b.body(main);
    let x = mb.var("x", Type::int());
    let y = mb.var("y", Type::int());
    let z = mb.var("z", Type::int());
    mb.assign_lit(x, 1);
    mb.assign_lit(y, 2);
    mb.call_static(add_ref, vec![x, y], Some(z));
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let pta = CiSolver::new(&program).solve().unwrap();
    let icfg = IcfgBuilder::build(&program, pta.call_graph()).unwrap();
    let mut results = FxHashMap::default();
    results.insert("ci".to_string(), pta);
    let options = AnalysisOptions::new().with_pta("ci");
    let facts =
        classflow_analysis::run_inter_constant_propagation(&program, &icfg, &options, &results)
            .unwrap();

    let exit = program.method(main).body.as_ref().unwrap().exit;
    assert_eq!(facts.in_fact(exit).get(z), Value::Const(3));
}

#[test]
fn array_constants_respect_unknown_index_stores() {
    // a[0] = 1; a[nac] = 2; t = a[0]  →  t = NAC (unknown store aliases slot 0)
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let arr_ty = Type::Array(Box::new(Type::int()));
    let main = b.add_method(main_class, "main", vec![Type::int()], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let mut mb = b.body(main);
    let nac = mb.param("input", Type::int());
    let a = mb.var("a", arr_ty.clone());
    let i0 = mb.var("i0", Type::int());
    let one = mb.var("one", Type::int());
    let two = mb.var("two", Type::int());
    let t = mb.var("t", Type::int());
    mb.new_obj(a, arr_ty);
    mb.assign_lit(i0, 0);
    mb.assign_lit(one, 1);
    mb.assign_lit(two, 2);
    mb.store_array(a, i0, one);
    mb.store_array(a, nac, two);
    mb.load_array(t, a, i0);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let pta = CiSolver::new(&program).solve().unwrap();
    let icfg = IcfgBuilder::build(&program, pta.call_graph()).unwrap();
    let mut results = FxHashMap::default();
    results.insert("ci".to_string(), pta);
    let options = AnalysisOptions::new().with_pta("ci");
    let facts =
        classflow_analysis::run_inter_constant_propagation(&program, &icfg, &options, &results)
            .unwrap();

    let exit = program.method(main).body.as_ref().unwrap().exit;
    assert_eq!(facts.in_fact(exit).get(t), Value::Nac);
}

#[test]
fn static_field_constant_flows_between_methods() {
    // init() { C.s = 7 }  main { init(); v = C.s }  →  v = CONST(7)
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let c_class = b.add_class("C");
    let s_field = b.add_field(c_class, "s", Type::int(), true);

    let init = b.add_method(main_class, "init", vec![], Type::Void);
    b.mark_static(init);
    let mut mb = b.body(init);
    let seven = mb.var("seven", Type::int());
    mb.assign_lit(seven, 7);
    mb.store_static(s_field, seven);
    mb.ret(None);
    mb.finish();

    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let init_ref = b.method_ref(init);
    let mut mb = b.body(main);
    let v = mb.var("v", Type::int());
    mb.call_static(init_ref, vec![], None);
    mb.load_static(v, s_field);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let pta = CiSolver::new(&program).solve().unwrap();
    let icfg = IcfgBuilder::build(&program, pta.call_graph()).unwrap();
    let mut results = FxHashMap::default();
    results.insert("ci".to_string(), pta);
    let options = AnalysisOptions::new().with_pta("ci");
    let facts =
        classflow_analysis::run_inter_constant_propagation(&program, &icfg, &options, &results)
            .unwrap();

    let exit = program.method(main).body.as_ref().unwrap().exit;
    assert_eq!(facts.in_fact(exit).get(v), Value::Const(7));
}

#[test]
fn missing_pta_result_is_fatal() {
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let mut mb = b.body(main);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let pta = CiSolver::new(&program).solve().unwrap();
    let icfg = IcfgBuilder::build(&program, pta.call_graph()).unwrap();
    let results = FxHashMap::default();
    let options = AnalysisOptions::new().with_pta("cs");
    let err =
        classflow_analysis::run_inter_constant_propagation(&program, &icfg, &options, &results)
            .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingResult(_)));
}
