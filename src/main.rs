use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use truthscan_netlist::{Circuit, ConductorMap, Point};
use truthscan_testing::{CircuitTestSocket, RowFilter, SocketConfig, TruthState, TruthTable};

/// truthscan - net extraction and exhaustive truth tables for logic sheets
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the conductors of a circuit
    Nets {
        /// Circuit file (JSON)
        circuit: PathBuf,
    },

    /// Build the truth table of a circuit
    Table {
        /// Circuit file (JSON)
        circuit: PathBuf,

        /// Keep only rows matching this expression, e.g. "Y == 1 && A != B"
        #[arg(short, long)]
        filter: Option<String>,

        /// Maximum number of rows
        #[arg(short = 'n', long, default_value_t = 10_000)]
        max_rows: usize,

        /// Enumerate on the calling thread only
        #[arg(long)]
        no_parallel: bool,

        /// Worker count, overrides the config file
        #[arg(short, long)]
        workers: Option<usize>,

        /// Socket configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Evaluate a circuit for one input assignment
    Eval {
        /// Circuit file (JSON)
        circuit: PathBuf,

        /// Input assignment NAME=VALUE; unset inputs are 0
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        assignments: Vec<String>,

        /// Socket configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Nets { circuit } => {
            let circuit = load_circuit(&circuit)?;
            print!("{}", describe_nets(&circuit)?);
        }

        Commands::Table {
            circuit,
            filter,
            max_rows,
            no_parallel,
            workers,
            config,
            format,
        } => {
            let circuit = load_circuit(&circuit)?;
            let mut config = load_config(config.as_deref())?;
            if let Some(workers) = workers {
                config.workers = workers.max(1);
            }
            let report = build_table(&circuit, &config, !no_parallel, filter.as_deref(), max_rows)?;
            match format {
                OutputFormat::Text => print!("{}", report.to_text()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }

        Commands::Eval {
            circuit,
            assignments,
            config,
        } => {
            let circuit = load_circuit(&circuit)?;
            let config = load_config(config.as_deref())?;
            let assignments = assignments
                .iter()
                .map(|a| parse_assignment(a))
                .collect::<Result<Vec<_>>>()?;
            for (name, value) in evaluate_once(&circuit, &config, &assignments)? {
                println!("{} = {}", name, value);
            }
        }
    }

    Ok(())
}

fn load_circuit(path: &Path) -> Result<Circuit> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read circuit file {:?}", path))?;
    let circuit: Circuit = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse circuit file {:?}", path))?;
    circuit
        .validate()
        .with_context(|| format!("Invalid circuit file {:?}", path))?;
    info!(
        "Loaded circuit '{}': {} pins, {} symbols, {} wires",
        circuit.name,
        circuit.pins.len(),
        circuit.symbols.len(),
        circuit.wires.len()
    );
    Ok(circuit)
}

fn load_config(path: Option<&Path>) -> Result<SocketConfig> {
    let Some(path) = path else {
        return Ok(SocketConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: SocketConfig =
        toml::from_str(&text).with_context(|| format!("Invalid config file {:?}", path))?;
    if config.workers == 0 {
        bail!("Config file {:?}: workers must be at least 1", path);
    }
    Ok(config)
}

/// `NAME=VALUE`, value in decimal, `0x` hex or `0b` binary
fn parse_assignment(text: &str) -> Result<(String, u32)> {
    let Some((name, value)) = text.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{}'", text);
    };
    let name = name.trim();
    let value = value.trim();
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if let Some(bin) = value.strip_prefix("0b").or_else(|| value.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2)
    } else {
        value.parse()
    };
    let value = parsed.with_context(|| format!("Invalid value '{}' for input '{}'", value, name))?;
    if name.is_empty() {
        bail!("Missing input name in '{}'", text);
    }
    Ok((name.to_string(), value))
}

fn describe_nets(circuit: &Circuit) -> Result<String> {
    use std::fmt::Write;

    let map = ConductorMap::new(&circuit.wires);
    let jacks: Vec<_> = circuit.jacks().collect();
    let jack_points: HashSet<Point> = jacks.iter().map(|j| j.point).collect();

    let mut out = String::new();
    writeln!(
        out,
        "{}: {} wires, {} conductors",
        circuit.name,
        circuit.wires.len(),
        map.conductor_count()
    )?;
    for conductor in map.conductors() {
        let attached: Vec<String> = jacks
            .iter()
            .filter(|j| conductor.contains_point(j.point))
            .map(|j| format!("{}#{}", j.symbol.0, j.index))
            .collect();
        writeln!(
            out,
            "  net {}: {} wire(s), {} point(s), jacks [{}]",
            conductor.id().0,
            conductor.wires().len(),
            conductor.points().count(),
            attached.join(", ")
        )?;
    }

    let junctions: Vec<String> = map.junction_points(3).map(|p| p.to_string()).collect();
    if !junctions.is_empty() {
        writeln!(out, "junctions: {}", junctions.join(" "))?;
    }
    let free: Vec<String> = map
        .free_wires(&jack_points)
        .map(|w| w.0.to_string())
        .collect();
    if !free.is_empty() {
        writeln!(out, "dangling wires: {}", free.join(" "))?;
    }
    Ok(out)
}

/// A finished truth table with the names needed to print it
#[derive(Debug, Serialize)]
struct TableReport {
    circuit: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    #[serde(skip)]
    output_widths: Vec<u8>,
    truncated: bool,
    rows: Vec<TruthState>,
}

impl TableReport {
    fn to_text(&self) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.inputs.iter().map(String::as_str).collect();
        let outputs: Vec<&str> = self.outputs.iter().map(String::as_str).collect();
        out.push_str(&format!("{} | {}\n", header.join(" "), outputs.join(" ")));
        for row in &self.rows {
            let inputs: Vec<String> = row.inputs().iter().map(u32::to_string).collect();
            let outputs: Vec<String> = self
                .output_widths
                .iter()
                .enumerate()
                .map(|(j, width)| row.format_output(j, *width))
                .collect();
            out.push_str(&format!("{} | {}\n", inputs.join(" "), outputs.join(" ")));
        }
        if self.truncated {
            out.push_str(&format!("... truncated after {} rows\n", self.rows.len()));
        }
        out
    }
}

fn build_table(
    circuit: &Circuit,
    config: &SocketConfig,
    parallel: bool,
    filter: Option<&str>,
    max_rows: usize,
) -> Result<TableReport> {
    if !CircuitTestSocket::is_testable(circuit) {
        bail!("Circuit '{}' needs at least one input and one output pin", circuit.name);
    }
    let mut socket = CircuitTestSocket::new(circuit, parallel, config)
        .with_context(|| format!("Failed to build test socket for '{}'", circuit.name))?;
    let filter = filter
        .map(|source| RowFilter::compile(source, &socket.pin_names()))
        .transpose()
        .context("Invalid row filter")?;

    // log each 10% step once
    let last_decile = AtomicU64::new(0);
    let progress = |pct: f64| {
        let decile = (pct / 10.0) as u64;
        if decile > last_decile.fetch_max(decile, Ordering::Relaxed) {
            info!("{:.0}% done", pct);
        }
    };
    let matches = |row: &TruthState| filter.as_ref().map_or(true, |f| f.matches(row));

    let TruthTable { rows, truncated } =
        socket.build_truth_table(&progress, &|| true, Some(&matches), max_rows)?;
    let Some(rows) = rows else {
        bail!("Circuit '{}' oscillates; it has no truth table", circuit.name);
    };

    Ok(TableReport {
        circuit: circuit.name.clone(),
        inputs: socket.inputs().iter().map(|s| s.name().to_string()).collect(),
        outputs: socket.outputs().iter().map(|s| s.name().to_string()).collect(),
        output_widths: socket.outputs().iter().map(|s| s.bit_width()).collect(),
        truncated,
        rows,
    })
}

/// Drive the given inputs, settle, and read every output
fn evaluate_once(
    circuit: &Circuit,
    config: &SocketConfig,
    assignments: &[(String, u32)],
) -> Result<Vec<(String, String)>> {
    let mut socket = CircuitTestSocket::new(circuit, false, config)
        .with_context(|| format!("Failed to build test socket for '{}'", circuit.name))?;

    for (name, value) in assignments {
        let Some(index) = socket.inputs().iter().position(|s| s.name() == name) else {
            bail!("Circuit '{}' has no input '{}'", circuit.name, name);
        };
        let held = socket.set_input(index, *value)?;
        if held != *value {
            bail!(
                "Value {} does not fit input '{}' ({} bits)",
                value,
                name,
                socket.inputs()[index].bit_width()
            );
        }
    }

    if !socket.evaluate() {
        bail!("Circuit '{}' oscillates", circuit.name);
    }

    socket
        .outputs()
        .iter()
        .enumerate()
        .map(|(j, output)| {
            let state = socket.output_state(j)?;
            let text = match state.decode(output.bit_width()) {
                Some(value) => value.to_string(),
                None => state.to_bit_string(output.bit_width()),
            };
            Ok((output.name().to_string(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use truthscan_netlist::{GateKind, Pin, GATE_SPAN};

    fn half_adder() -> Circuit {
        let mut c = Circuit::new("half_adder");
        let a = c.add_pin(Pin::input("A", 1).unwrap()).unwrap();
        let b = c.add_pin(Pin::input("B", 1).unwrap()).unwrap();
        let s = c.add_pin(Pin::output("S", 1).unwrap()).unwrap();
        let co = c.add_pin(Pin::output("C", 1).unwrap()).unwrap();
        c.place_pin(a, (-4, 0)).unwrap();
        c.place_pin(b, (-4, 1)).unwrap();
        c.add_gate(GateKind::Xor, 2, 1, (0, 0)).unwrap();
        c.add_gate(GateKind::And, 2, 1, (0, 4)).unwrap();
        // A fans out to both gates through a junction at (-2, 0)
        c.add_wire((-4, 0), (-2, 0)).unwrap();
        c.add_wire((-2, 0), (0, 0)).unwrap();
        c.add_wire((-2, 0), (0, 4)).unwrap();
        c.add_wire((-4, 1), (-3, 1)).unwrap();
        c.add_wire((-3, 1), (0, 1)).unwrap();
        c.add_wire((-3, 1), (0, 5)).unwrap();
        c.place_pin(s, (GATE_SPAN, 0)).unwrap();
        c.place_pin(co, (GATE_SPAN, 4)).unwrap();
        c
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("A=3").unwrap(), ("A".to_string(), 3));
        assert_eq!(parse_assignment(" bus = 0xff ").unwrap(), ("bus".to_string(), 255));
        assert_eq!(parse_assignment("x=0b101").unwrap(), ("x".to_string(), 5));
        assert!(parse_assignment("A").is_err());
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("A=two").is_err());
    }

    #[test]
    fn test_load_circuit_and_config() {
        let circuit = half_adder();
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&circuit).unwrap()).unwrap();
        assert_eq!(load_circuit(file.path()).unwrap(), circuit);

        let mut config = NamedTempFile::new().unwrap();
        writeln!(config, "workers = 2\n\n[sim]\nmax_passes = 64").unwrap();
        let config = load_config(Some(config.path())).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.parallel_threshold_bits, 15);
        assert_eq!(config.sim.max_passes, Some(64));

        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "workers = 0").unwrap();
        assert!(load_config(Some(bad.path())).is_err());
    }

    fn inverter_json(symbols: &str, width: u8) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "inverter",
                "pins": [
                    {{"name": "A", "bit_width": {width}, "pin_type": "input"}},
                    {{"name": "Y", "bit_width": 1, "pin_type": "output"}}
                ],
                "symbols": [{symbols}]
            }}"#
        )
        .unwrap();
        file
    }

    const GATE: &str = r#"{"type": "gate", "gate": "not", "inputs": 1, "width": 1}"#;

    #[test]
    fn test_load_hand_written_document() {
        let symbols = format!(
            r#"{{"id": 0, "position": {{"x": 0, "y": 0}}, "kind": {GATE}}},
               {{"id": 1, "position": {{"x": 0, "y": 0}}, "kind": {{"type": "pin", "pin": 0}}}},
               {{"id": 2, "position": {{"x": 3, "y": 0}}, "kind": {{"type": "pin", "pin": 1}}}}"#
        );
        let file = inverter_json(&symbols, 1);
        let circuit = load_circuit(file.path()).unwrap();
        let report = build_table(&circuit, &SocketConfig::default(), false, None, 10).unwrap();
        assert_eq!(report.to_text(), "A | Y\n0 | 1\n1 | 0\n");
    }

    #[test]
    fn test_load_rejects_reordered_symbols() {
        let symbols = format!(
            r#"{{"id": 1, "position": {{"x": 0, "y": 0}}, "kind": {{"type": "pin", "pin": 0}}}},
               {{"id": 0, "position": {{"x": 0, "y": 0}}, "kind": {GATE}}},
               {{"id": 2, "position": {{"x": 3, "y": 0}}, "kind": {{"type": "pin", "pin": 1}}}}"#
        );
        let file = inverter_json(&symbols, 1);
        let err = load_circuit(file.path()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid circuit file"));
        assert!(message.contains("Symbol at index 0 has id 1"));
    }

    #[test]
    fn test_load_rejects_out_of_range_pin_widths() {
        let symbols = format!(
            r#"{{"id": 0, "position": {{"x": 0, "y": 0}}, "kind": {GATE}}}"#
        );
        for width in [0, 33, 34] {
            let file = inverter_json(&symbols, width);
            let err = load_circuit(file.path()).unwrap_err();
            assert!(format!("{:#}", err).contains(&format!("Invalid bit width {} for 'A'", width)));
        }
    }

    #[test]
    fn test_describe_nets() {
        let text = describe_nets(&half_adder()).unwrap();
        assert!(text.starts_with("half_adder: 6 wires, 2 conductors"));
        assert!(text.contains("junctions: (-2, 0) (-3, 1)"));
        assert!(!text.contains("dangling"));
    }

    #[test]
    fn test_table_text() {
        let report =
            build_table(&half_adder(), &SocketConfig::default(), true, None, 100).unwrap();
        assert_eq!(
            report.to_text(),
            "A B | S C\n0 0 | 0 0\n0 1 | 1 0\n1 0 | 1 0\n1 1 | 0 1\n"
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 4);
        assert_eq!(json["truncated"], false);
    }

    #[test]
    fn test_table_filter_and_cap() {
        let report = build_table(
            &half_adder(),
            &SocketConfig::default(),
            false,
            Some("S == 1"),
            1,
        )
        .unwrap();
        assert!(report.truncated);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].inputs(), &[0, 1]);
        assert!(report.to_text().ends_with("... truncated after 1 rows\n"));

        let err = build_table(&half_adder(), &SocketConfig::default(), false, Some("Q"), 10)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown pin 'Q'"));
    }

    #[test]
    fn test_evaluate_once() {
        let config = SocketConfig::default();
        let outputs = evaluate_once(
            &half_adder(),
            &config,
            &[("A".to_string(), 1), ("B".to_string(), 1)],
        )
        .unwrap();
        assert_eq!(
            outputs,
            vec![
                ("S".to_string(), "0".to_string()),
                ("C".to_string(), "1".to_string())
            ]
        );
        assert!(evaluate_once(&half_adder(), &config, &[("Z".to_string(), 1)]).is_err());
        assert!(evaluate_once(&half_adder(), &config, &[("A".to_string(), 2)]).is_err());
    }
}
