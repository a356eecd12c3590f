//! Taint scenarios: direct source→sink flow, transfer rules, and the
//! determinism of reported flows.

use classflow_analysis::{
    CallSiteSelector, ClassId, ContextInsensitiveSelector, CsSolver, MethodId, Program,
    ProgramBuilder, StmtId, TaintAnalysis, TaintConfig, TaintFlow, TransferIndex, Type, VarId,
};

struct TaintWorld {
    program: Program,
    source: MethodId,
    sink: MethodId,
    data_class: ClassId,
}

/// Declares `Data`, `static Data Io.source()` and `static void Io.sink(Data)`
fn taint_world(b: &mut ProgramBuilder) -> (ClassId, MethodId, MethodId) {
    let data = b.add_class("Data");
    let io = b.add_class("Io");
    let source = b.add_method(io, "source", vec![], Type::Reference(data));
    b.mark_static(source);
    let mut mb = b.body(source);
    let fresh = mb.var("fresh", Type::Reference(data));
    mb.new_obj(fresh, Type::Reference(data));
    mb.ret(Some(fresh));
    mb.finish();
    let sink = b.add_method(io, "sink", vec![Type::Reference(data)], Type::Void);
    b.mark_static(sink);
    let mut mb = b.body(sink);
    mb.param("payload", Type::Reference(data));
    mb.ret(None);
    mb.finish();
    (data, source, sink)
}

fn simple_flow_world() -> (TaintWorld, StmtId, StmtId, VarId) {
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let (data, source, sink) = taint_world(&mut b);

    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let source_ref = b.method_ref(source);
    let sink_ref = b.method_ref(sink);
    let mut mb = b.body(main);
    let s = mb.var("s", Type::Reference(data));
    let t = mb.var("t", Type::Reference(data));
    mb.call_static(source_ref, vec![], Some(s));
    mb.copy(t, s);
    mb.call_static(sink_ref, vec![t], None);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let sites: Vec<StmtId> = program.call_sites_in(main).collect();
    let source_site = sites[0];
    let sink_site = sites[1];
    (TaintWorld { program, source, sink, data_class: data }, source_site, sink_site, t)
}

#[test]
fn source_to_sink_through_copy() {
    // s = source(); t = s; sink(t)  →  one flow (source site → sink site, arg 0)
    let (world, source_site, sink_site, _) = simple_flow_world();
    let mut config = TaintConfig::new();
    config.add_source(world.source, Type::Reference(world.data_class));
    config.add_sink(world.sink, 0);

    let selector = ContextInsensitiveSelector;
    let result = CsSolver::new(&world.program, &selector)
        .with_taint(TaintAnalysis::new(config))
        .solve()
        .unwrap();

    let flows: Vec<_> = result.taint_flows().iter().copied().collect();
    assert_eq!(
        flows,
        vec![TaintFlow { source_call: source_site, sink_call: sink_site, index: 0 }]
    );
}

#[test]
fn no_rules_no_flows() {
    let (world, _, _, _) = simple_flow_world();
    let selector = ContextInsensitiveSelector;
    let result = CsSolver::new(&world.program, &selector)
        .with_taint(TaintAnalysis::new(TaintConfig::new()))
        .solve()
        .unwrap();
    assert!(result.taint_flows().is_empty());
}

#[test]
fn arg_to_result_transfer_propagates_taint() {
    // s = source(); w = wrap(s); sink(w)  with transfer (wrap, arg0 → result)
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let (data, source, sink) = taint_world(&mut b);
    let wrap = b.add_method(main_class, "wrap", vec![Type::Reference(data)], Type::Reference(data));
    b.mark_static(wrap);
    let mut mb = b.body(wrap);
    mb.param("inner", Type::Reference(data));
    let fresh = mb.var("fresh", Type::Reference(data));
    mb.new_obj(fresh, Type::Reference(data));
    mb.ret(Some(fresh));
    mb.finish();

    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let source_ref = b.method_ref(source);
    let wrap_ref = b.method_ref(wrap);
    let sink_ref = b.method_ref(sink);
    let mut mb = b.body(main);
    let s = mb.var("s", Type::Reference(data));
    let w = mb.var("w", Type::Reference(data));
    mb.call_static(source_ref, vec![], Some(s));
    mb.call_static(wrap_ref, vec![s], Some(w));
    mb.call_static(sink_ref, vec![w], None);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let mut config = TaintConfig::new();
    config.add_source(source, Type::Reference(data));
    config.add_sink(sink, 0);
    config.add_transfer(
        wrap,
        TransferIndex::Arg(0),
        TransferIndex::Result,
        Type::Reference(data),
    );

    let selector = ContextInsensitiveSelector;
    let result = CsSolver::new(&program, &selector)
        .with_taint(TaintAnalysis::new(config))
        .solve()
        .unwrap();

    let mut sites = program.call_sites_in(main);
    let source_site = sites.next().unwrap();
    let _wrap_site = sites.next().unwrap();
    let sink_site = sites.next().unwrap();
    let flows: Vec<_> = result.taint_flows().iter().copied().collect();
    // the flow is attributed to the original source call
    assert_eq!(
        flows,
        vec![TaintFlow { source_call: source_site, sink_call: sink_site, index: 0 }]
    );
}

#[test]
fn flows_found_under_call_site_sensitivity() {
    let (world, source_site, sink_site, _) = simple_flow_world();
    let mut config = TaintConfig::new();
    config.add_source(world.source, Type::Reference(world.data_class));
    config.add_sink(world.sink, 0);

    let selector = CallSiteSelector::new(1);
    let result = CsSolver::new(&world.program, &selector)
        .with_taint(TaintAnalysis::new(config))
        .solve()
        .unwrap();

    let flows: Vec<_> = result.taint_flows().iter().copied().collect();
    assert_eq!(
        flows,
        vec![TaintFlow { source_call: source_site, sink_call: sink_site, index: 0 }]
    );
}

#[test]
fn untainted_value_does_not_flow() {
    // u = new Data(); sink(u)  →  no flows even with rules configured
    let mut b = ProgramBuilder::new();
    let main_class = b.add_class("Main");
    let (data, source, sink) = taint_world(&mut b);
    let main = b.add_method(main_class, "main", vec![], Type::Void);
    b.mark_static(main);
    b.set_entry(main);
    let sink_ref = b.method_ref(sink);
    let mut mb = b.body(main);
    let u = mb.var("u", Type::Reference(data));
    mb.new_obj(u, Type::Reference(data));
    mb.call_static(sink_ref, vec![u], None);
    mb.ret(None);
    mb.finish();
    let program = b.finish().unwrap();

    let mut config = TaintConfig::new();
    config.add_source(source, Type::Reference(data));
    config.add_sink(sink, 0);

    let selector = ContextInsensitiveSelector;
    let result = CsSolver::new(&program, &selector)
        .with_taint(TaintAnalysis::new(config))
        .solve()
        .unwrap();
    assert!(result.taint_flows().is_empty());
}
