//! Fixed-point and solver-equivalence properties: once a solver
//! terminates, no transfer changes any fact, and both engines agree.

use classflow_analysis::{
    BinaryOp, Cfg, ConstantPropagation, DataflowAnalysis, IterativeSolver, LiveVariableAnalysis,
    ProgramBuilder, Type, WorkListSolver,
};

fn looped_program() -> (classflow_analysis::Program, classflow_analysis::MethodId) {
    // i = 0; while (i < n) { i = i + 1 }; r = i
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let main = b.add_method(main_class, "main", vec![Type::int()], Type::int());
    b.mark_static(main);
    b.set_entry(main);
    let mut mb = b.body(main);
    let n = mb.param("n", Type::int());
    let i = mb.var("i", Type::int());
    let one = mb.var("one", Type::int());
    let r = mb.var("r", Type::int());
    mb.assign_lit(i, 0);
    mb.assign_lit(one, 1);
    let head = mb.fresh_label();
    let exit = mb.fresh_label();
    mb.bind(head);
    mb.if_goto(BinaryOp::Ge, i, n, exit);
    mb.binary(i, BinaryOp::Add, i, one);
    mb.goto(head);
    mb.bind(exit);
    mb.copy(r, i);
    mb.ret(Some(r));
    mb.finish();
    (b.finish().unwrap(), main)
}

#[test]
fn constprop_fixed_point_is_stable() {
    let (program, main) = looped_program();
    let cfg = Cfg::build(&program, main).unwrap();
    let cp = ConstantPropagation::new(&program);
    let result = WorkListSolver::solve(&cfg, &cp);

    for node in cfg.nodes() {
        if node == cfg.entry() {
            continue;
        }
        let mut out = result.out_fact(node).clone();
        let changed = cp.transfer_node(node, result.in_fact(node), &mut out);
        assert!(!changed, "transfer changed node {node} after the fixed point");
        assert_eq!(out, *result.out_fact(node));
    }
}

#[test]
fn liveness_fixed_point_is_stable() {
    let (program, main) = looped_program();
    let cfg = Cfg::build(&program, main).unwrap();
    let live = LiveVariableAnalysis::new(&program);
    let result = WorkListSolver::solve(&cfg, &live);

    for node in cfg.nodes() {
        if node == cfg.exit() {
            continue;
        }
        let mut in_fact = result.in_fact(node).clone();
        let changed = live.transfer_node(node, result.out_fact(node), &mut in_fact);
        assert!(!changed, "transfer changed node {node} after the fixed point");
    }
}

#[test]
fn worklist_and_iterative_solvers_agree_on_loops() {
    let (program, main) = looped_program();
    let cfg = Cfg::build(&program, main).unwrap();
    let cp = ConstantPropagation::new(&program);
    let a = WorkListSolver::solve(&cfg, &cp);
    let b = IterativeSolver::solve(&cfg, &cp);
    for node in cfg.nodes() {
        assert_eq!(a.in_fact(node), b.in_fact(node));
        assert_eq!(a.out_fact(node), b.out_fact(node));
    }
}
