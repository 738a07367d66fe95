//! End-to-end truth-table construction over small sheets

use proptest::prelude::*;
use num_bigint::BigUint;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use truthscan_netlist::{Circuit, GateKind, Pin, GATE_SPAN};
use truthscan_testing::chunk::Include;
use truthscan_testing::{
    join_combination, partition_range, split_combination, total_combinations, CircuitTestSocket,
    RowFilter, SocketConfig, TestError, TruthState,
};

fn config(workers: usize) -> SocketConfig {
    SocketConfig {
        workers,
        ..Default::default()
    }
}

fn build_all(socket: &mut CircuitTestSocket, max_rows: usize) -> truthscan_testing::TruthTable {
    socket
        .build_truth_table(&|_| {}, &|| true, None, max_rows)
        .unwrap()
}

/// Two-input gate with its inputs and output placed on the jacks
fn two_input(kind: GateKind, width: u8) -> Circuit {
    let mut c = Circuit::new(kind.to_string());
    let a = c.add_pin(Pin::input("A", width).unwrap()).unwrap();
    let b = c.add_pin(Pin::input("B", width).unwrap()).unwrap();
    let y = c.add_pin(Pin::output("Y", width).unwrap()).unwrap();
    c.add_gate(kind, 2, width, (0, 0)).unwrap();
    c.place_pin(a, (-4, 0)).unwrap();
    c.place_pin(b, (-4, 1)).unwrap();
    c.place_pin(y, (GATE_SPAN + 4, 0)).unwrap();
    c.add_wire((-4, 0), (0, 0)).unwrap();
    c.add_wire((-4, 1), (0, 1)).unwrap();
    c.add_wire((GATE_SPAN, 0), (GATE_SPAN + 4, 0)).unwrap();
    c
}

/// A `width`-bit buffer from A to Y
fn buffer(width: u8) -> Circuit {
    let mut c = Circuit::new("buffer");
    let a = c.add_pin(Pin::input("A", width).unwrap()).unwrap();
    let y = c.add_pin(Pin::output("Y", width).unwrap()).unwrap();
    c.add_gate(GateKind::Buffer, 1, width, (0, 0)).unwrap();
    c.place_pin(a, (0, 0)).unwrap();
    c.place_pin(y, (GATE_SPAN, 0)).unwrap();
    c
}

/// A buffer next to an inverter whose output feeds its own input
fn with_ring(width: u8) -> Circuit {
    let mut c = buffer(width);
    c.add_gate(GateKind::Not, 1, 1, (20, 0)).unwrap();
    c.add_wire((20 + GATE_SPAN, 0), (20, 0)).unwrap();
    c
}

#[test]
fn test_and_gate_table() {
    let mut socket =
        CircuitTestSocket::new(&two_input(GateKind::And, 1), true, &SocketConfig::default())
            .unwrap();
    let table = build_all(&mut socket, 100);
    assert!(!table.truncated);
    let rows: Vec<_> = table
        .rows()
        .unwrap()
        .iter()
        .map(|r| (r.inputs().to_vec(), r.output(0).unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (vec![0, 0], 0),
            (vec![0, 1], 0),
            (vec![1, 0], 0),
            (vec![1, 1], 1),
        ]
    );
}

#[test]
fn test_oscillation_single_chunk() {
    let mut socket = CircuitTestSocket::new(&with_ring(1), false, &config(4)).unwrap();
    assert_eq!(socket.chunk_count(), 1);
    let table = build_all(&mut socket, 100);
    assert!(table.is_oscillation());
    assert!(table.rows().is_none());
}

#[test]
fn test_oscillation_across_chunks() {
    let mut socket = CircuitTestSocket::new(&with_ring(16), true, &config(4)).unwrap();
    assert_eq!(socket.chunk_count(), 4);
    let table = build_all(&mut socket, 1000);
    assert!(table.rows.is_none());
}

#[test]
fn test_row_cap_on_wide_inputs() {
    let mut socket = CircuitTestSocket::new(&buffer(20), true, &config(4)).unwrap();
    assert_eq!(socket.input_bit_count(), 20);
    assert_eq!(socket.chunk_count(), 4);

    let reports = Mutex::new(Vec::new());
    let progress = |pct: f64| reports.lock().unwrap().push(pct);
    let table = socket
        .build_truth_table(&progress, &|| true, None, 1000)
        .unwrap();

    assert!(table.truncated);
    let rows = table.rows().unwrap();
    assert_eq!(rows.len(), 1000);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.input(0), Some(i as u32));
        assert_eq!(row.output(0), Some(i as u32));
    }
    let reports = reports.into_inner().unwrap();
    assert!(reports.iter().all(|pct| (0.0..=100.0).contains(pct)));
}

#[test]
fn test_chunked_table_matches_single_chunk() {
    let circuit = two_input(GateKind::Xor, 8);

    let mut serial = CircuitTestSocket::new(&circuit, false, &config(3)).unwrap();
    let mut parallel = CircuitTestSocket::new(&circuit, true, &config(3)).unwrap();
    assert_eq!(serial.chunk_count(), 1);
    assert_eq!(parallel.chunk_count(), 3);

    let a = build_all(&mut serial, 1 << 17);
    let b = build_all(&mut parallel, 1 << 17);
    assert!(!a.truncated && !b.truncated);
    assert_eq!(a.len(), 1 << 16);
    assert_eq!(a.rows, b.rows);

    let row = &b.rows().unwrap()[0x12_34];
    assert_eq!(row.inputs(), &[0x12, 0x34]);
    assert_eq!(row.output(0), Some(0x12 ^ 0x34));
}

#[test]
fn test_chunk_ranges_cover_input_space() {
    let socket = CircuitTestSocket::new(&two_input(GateKind::Or, 8), true, &config(3)).unwrap();
    let ranges = socket.chunk_ranges();
    let mut next = BigUint::from(0u32);
    for range in &ranges {
        assert_eq!(range.start, next);
        next = range.end();
    }
    assert_eq!(next, total_combinations(16));
    assert_eq!(ranges[2].count, BigUint::from(21846u32));
}

#[test]
fn test_cancellation_truncates() {
    let mut socket =
        CircuitTestSocket::new(&two_input(GateKind::And, 4), false, &SocketConfig::default())
            .unwrap();
    let polls = AtomicUsize::new(0);
    let keep_going = || polls.fetch_add(1, Ordering::Relaxed) < 10;
    let table = socket
        .build_truth_table(&|_| {}, &keep_going, None, 1000)
        .unwrap();
    assert!(table.truncated);
    assert_eq!(table.len(), 10);
}

#[test]
fn test_expression_filter() {
    let mut socket = CircuitTestSocket::new(
        &two_input(GateKind::And, 1),
        false,
        &SocketConfig::default(),
    )
    .unwrap();
    let filter = RowFilter::compile("Y == 1 || (A = 0 && B = 0)", &socket.pin_names()).unwrap();
    let pred = |row: &TruthState| filter.matches(row);
    let include: Include<'_> = &pred;
    let table = socket
        .build_truth_table(&|_| {}, &|| true, Some(include), 100)
        .unwrap();
    let inputs: Vec<_> = table
        .rows()
        .unwrap()
        .iter()
        .map(|r| r.inputs().to_vec())
        .collect();
    assert_eq!(inputs, vec![vec![0, 0], vec![1, 1]]);
}

#[test]
fn test_floating_rows_bypass_filter() {
    let mut c = Circuit::new("tribuf");
    let a = c.add_pin(Pin::input("A", 1).unwrap()).unwrap();
    let en = c.add_pin(Pin::input("EN", 1).unwrap()).unwrap();
    let y = c.add_pin(Pin::output("Y", 1).unwrap()).unwrap();
    c.add_gate(GateKind::TriState, 2, 1, (0, 0)).unwrap();
    c.place_pin(a, (0, 0)).unwrap();
    c.place_pin(en, (0, 1)).unwrap();
    c.place_pin(y, (GATE_SPAN, 0)).unwrap();

    let mut socket = CircuitTestSocket::new(&c, false, &SocketConfig::default()).unwrap();
    let filter = RowFilter::compile("Y == 1", &socket.pin_names()).unwrap();
    let pred = |row: &TruthState| filter.matches(row);
    let include: Include<'_> = &pred;
    let table = socket
        .build_truth_table(&|_| {}, &|| true, Some(include), 100)
        .unwrap();

    let rows = table.rows().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].inputs(), &[0, 0]);
    assert!(!rows[0].is_unpacked());
    assert_eq!(rows[0].format_output(0, 1), "Z");
    assert_eq!(rows[1].inputs(), &[1, 0]);
    assert_eq!(rows[2].inputs(), &[1, 1]);
    assert_eq!(rows[2].output(0), Some(1));
}

#[test]
fn test_unplaced_pins_are_left_out() {
    let mut c = two_input(GateKind::Nand, 1);
    c.add_pin(Pin::input("spare", 3).unwrap()).unwrap();
    let mut socket = CircuitTestSocket::new(&c, false, &SocketConfig::default()).unwrap();
    assert_eq!(socket.input_bit_count(), 2);
    let table = build_all(&mut socket, 100);
    assert_eq!(table.len(), 4);
    assert!(table.rows().unwrap().iter().all(|r| r.input_count() == 2));
}

#[test]
fn test_circuit_without_inputs_is_rejected() {
    let mut c = Circuit::new("const");
    let y = c.add_pin(Pin::output("Y", 1).unwrap()).unwrap();
    c.add_constant(1, 1, (0, 0)).unwrap();
    c.place_pin(y, (0, 0)).unwrap();
    assert!(!CircuitTestSocket::is_testable(&c));
    assert!(matches!(
        CircuitTestSocket::new(&c, true, &SocketConfig::default()),
        Err(TestError::NotTestable(name)) if name == "const"
    ));
}

proptest! {
    #[test]
    fn split_then_join_restores_value(widths in prop::collection::vec(1u8..=32, 1..5), seed in any::<u128>()) {
        let bits: u32 = widths.iter().map(|w| u32::from(*w)).sum();
        let value = BigUint::from(seed) % total_combinations(bits);
        let fields = split_combination(&value, &widths);
        prop_assert_eq!(fields.len(), widths.len());
        for (field, width) in fields.iter().zip(&widths) {
            prop_assert!(u64::from(*field) < (1u64 << width));
        }
        prop_assert_eq!(join_combination(&fields, &widths), value);
    }

    #[test]
    fn partition_is_contiguous_and_complete(total in 0u64..1_000_000, chunks in 1usize..16) {
        let total = BigUint::from(total);
        let ranges = partition_range(&total, chunks);
        prop_assert_eq!(ranges.len(), chunks);
        let mut next = BigUint::from(0u32);
        for range in &ranges {
            prop_assert_eq!(&range.start, &next);
            next = range.end();
        }
        prop_assert_eq!(next, total);
    }
}
