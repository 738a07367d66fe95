use truthscan_netlist::{Circuit, GateKind, SymbolId, GATE_SPAN};
use truthscan_sim::{compile, CircuitState, FunctionId, LogicState};

fn function(state: &CircuitState, symbol: SymbolId) -> FunctionId {
    state.function_for(symbol).expect("symbol compiles to a function")
}

#[test]
fn test_full_adder_from_gates() {
    let mut c = Circuit::new("full_adder");
    let a = c.add_constant(0, 1, (-5, 0)).unwrap();
    let b = c.add_constant(0, 1, (-5, 1)).unwrap();
    let cin = c.add_constant(0, 1, (10, 1)).unwrap();

    c.add_gate(GateKind::Xor, 2, 1, (0, 0)).unwrap();
    c.add_gate(GateKind::Xor, 2, 1, (10, 0)).unwrap();
    c.add_gate(GateKind::And, 2, 1, (0, 20)).unwrap();
    c.add_gate(GateKind::And, 2, 1, (10, 20)).unwrap();
    c.add_gate(GateKind::Or, 2, 1, (20, 20)).unwrap();
    let sum = c.add_probe(1, (10 + GATE_SPAN, 0)).unwrap();
    let carry = c.add_probe(1, (20 + GATE_SPAN, 20)).unwrap();

    c.add_wire((-5, 0), (0, 0)).unwrap();
    c.add_wire((-5, 0), (0, 20)).unwrap();
    c.add_wire((-5, 1), (0, 1)).unwrap();
    c.add_wire((-5, 1), (0, 21)).unwrap();
    c.add_wire((GATE_SPAN, 0), (10, 0)).unwrap();
    c.add_wire((GATE_SPAN, 0), (10, 20)).unwrap();
    c.add_wire((10, 1), (10, 21)).unwrap();
    c.add_wire((GATE_SPAN, 20), (20, 20)).unwrap();
    c.add_wire((10 + GATE_SPAN, 20), (20, 21)).unwrap();

    let mut state = compile(&c).unwrap();
    let (fa, fb, fc) = (
        function(&state, a),
        function(&state, b),
        function(&state, cin),
    );
    let (fs, fco) = (function(&state, sum), function(&state, carry));

    for bits in 0u32..8 {
        let (x, y, z) = (bits >> 2 & 1, bits >> 1 & 1, bits & 1);
        state.set_constant(fa, x).unwrap();
        state.set_constant(fb, y).unwrap();
        state.set_constant(fc, z).unwrap();
        assert!(state.evaluate(), "adder settles for {:03b}", bits);
        let total = x + y + z;
        assert_eq!(state.packed(fs).unwrap().decode(1), Some(total & 1));
        assert_eq!(state.packed(fco).unwrap().decode(1), Some(total >> 1));
    }
}

#[test]
fn test_tri_state_bus() {
    let mut c = Circuit::new("bus");
    let d0 = c.add_constant(0, 4, (0, 0)).unwrap();
    let e0 = c.add_constant(0, 4, (0, 1)).unwrap();
    let d1 = c.add_constant(0, 4, (0, 10)).unwrap();
    let e1 = c.add_constant(0, 4, (0, 11)).unwrap();
    c.add_gate(GateKind::TriState, 2, 4, (0, 0)).unwrap();
    c.add_gate(GateKind::TriState, 2, 4, (0, 10)).unwrap();
    c.add_wire((GATE_SPAN, 0), (GATE_SPAN, 10)).unwrap();
    let probe = c.add_probe(4, (GATE_SPAN, 0)).unwrap();

    let mut state = compile(&c).unwrap();
    let [fd0, fe0, fd1, fe1] = [d0, e0, d1, e1].map(|s| function(&state, s));
    let fp = function(&state, probe);

    // nobody drives the bus
    assert!(state.evaluate());
    let idle = state.packed(fp).unwrap();
    assert_eq!(idle.decode(4), None);
    assert!((0..4).all(|bit| idle.state(bit) == LogicState::Floating));

    // first driver enabled on every bit
    state.set_constant(fd0, 0b1010).unwrap();
    state.set_constant(fe0, 0b1111).unwrap();
    assert!(state.evaluate());
    assert_eq!(state.packed(fp).unwrap().decode(4), Some(0b1010));

    // hand over to the second driver
    state.set_constant(fe0, 0).unwrap();
    state.set_constant(fd1, 0b0110).unwrap();
    state.set_constant(fe1, 0b1111).unwrap();
    assert!(state.evaluate());
    assert_eq!(state.packed(fp).unwrap().decode(4), Some(0b0110));

    // both enabled: bits where they disagree conflict
    state.set_constant(fe0, 0b1111).unwrap();
    assert!(state.evaluate());
    let fight = state.packed(fp).unwrap();
    assert_eq!(fight.to_bit_string(4), "XX10");
}
