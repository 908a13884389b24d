use std::fs;
use std::path::PathBuf;

use logsim_core::dsl::{Parser, Scanner};
use logsim_core::{
    DiagnosticKind, Devices, LogsimError, Monitors, Names, Network, Signal, Simulator,
};
use tempfile::TempDir;

// Helper function to create a temporary circuit file
fn create_circuit_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("circuit.txt");
    fs::write(&file_path, content).expect("Failed to write circuit file");
    (temp_dir, file_path)
}

fn diagnostics_of(source: &str) -> logsim_core::Diagnostics {
    match Simulator::from_source(source) {
        Err(LogsimError::InvalidCircuit(diagnostics)) => diagnostics,
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("source parsed without errors"),
    }
}

fn nand_source(s1: u8, s2: u8) -> String {
    format!(
        "devices {{
           G is a NAND gate;
           G has 2 inputs;
           S1, S2 are SWITCH;
           S1 set {};
           S2 set {};
         }}
         connections {{
           device G {{ S1 to G.I1; S2 to G.I2; }}
         }}
         monitor {{ G; }}",
        s1, s2
    )
}

#[test]
fn test_nand_gate_single_cycle() {
    for (s1, s2) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let mut names = Names::new();
        let devices = Devices::new(&mut names);
        let mut network = Network::new(devices);
        let mut monitors = Monitors::new();
        let scanner = Scanner::new(&nand_source(s1, s2));

        let mut parser = Parser::new(&mut names, &mut network, &mut monitors, scanner);
        assert!(parser.parse_network(), "{}", parser.diagnostics());
        assert_eq!(parser.error_count(), 0);
        drop(parser);

        network.execute_network().unwrap();
        monitors.record_signals(&network);

        let gate = names.query("G").unwrap();
        let expected = Signal::from(!(s1 == 1 && s2 == 1));
        assert_eq!(monitors.history(gate, None), Some(&[expected][..]));
    }
}

#[test]
fn test_section_order_violation_builds_nothing() {
    let mut names = Names::new();
    let devices = Devices::new(&mut names);
    let mut network = Network::new(devices);
    let mut monitors = Monitors::new();
    let mut parser = Parser::new(
        &mut names,
        &mut network,
        &mut monitors,
        Scanner::new("connections{} devices{}"),
    );

    assert!(!parser.parse_network());
    let diagnostics = parser.into_diagnostics();
    assert_eq!(diagnostics.count(DiagnosticKind::Syntax), 1);
    assert!(network.devices().is_empty());
}

#[test]
fn test_errors_accumulate() {
    let diagnostics = diagnostics_of(
        "devices {
           S1, S2, S3 are SWITCH;
           A is NAND;
           A has 3 inputs;
         }
         connections {
           device A {
             S1 to A.I1;
             S2 to A.I2;
             S3 to A.I3;
             X1 to A.I1;
             X2 to A.I2;
             X3 to A.I3;
           }
         }",
    );
    assert_eq!(diagnostics.len(), 3, "{}", diagnostics);
    assert_eq!(diagnostics.count(DiagnosticKind::Semantic), 3);
    let lines: Vec<usize> = diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![11, 12, 13]);
}

#[test]
fn test_range_declares_every_device() {
    let sim = Simulator::from_source(
        "devices { A1 => A4 are SWITCH; }
         connections { }
         monitor { A1, A2, A3, A4; }",
    )
    .unwrap();
    assert_eq!(sim.signal_names(), vec!["A1", "A2", "A3", "A4"]);

    let diagnostics = diagnostics_of("devices { A4 => A1 are SWITCH; } connections { }");
    assert_eq!(diagnostics.count(DiagnosticKind::Value), 1);

    let diagnostics = diagnostics_of("devices { A1 => B4 are SWITCH; } connections { }");
    assert_eq!(diagnostics.count(DiagnosticKind::Syntax), 1);
}

#[test]
fn test_input_count_enforced() {
    let cases = [
        "devices { A is a NOT gate; A has 3 inputs; } connections { }",
        "devices { A is a XOR gate; A has 3 inputs; } connections { }",
        "devices { A is a AND gate; A has 17 inputs; } connections { }",
    ];
    for source in cases {
        let diagnostics = diagnostics_of(source);
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.kind, DiagnosticKind::Semantic, "{}", source);
    }
}

#[test]
fn test_report_points_at_source() {
    let diagnostics = diagnostics_of("devices {\n  A is a NAND gat;\n}\nconnections { }");
    let report = diagnostics.to_string();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Error on line 2:");
    assert_eq!(lines[1], "      A is a NAND gat;");
    assert_eq!(lines[2], "                  ^");
    assert!(lines[3].starts_with("SyntaxError: expected ';'"));
    assert!(report.ends_with("error(s) found.\n"));
}

#[test]
fn test_load_from_file() {
    let (_temp_dir, path) = create_circuit_file(&nand_source(1, 1));
    let mut sim = Simulator::from_file(&path).unwrap();
    sim.run(3).unwrap();
    assert_eq!(sim.trace("G").unwrap(), &[Signal::Low; 3]);

    sim.set_switch("S2", Signal::Low).unwrap();
    sim.step().unwrap();
    assert_eq!(sim.display_signals(), "G : ___-\n");
}

#[test]
fn test_missing_file_is_fatal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let err = Simulator::from_file(temp_dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, LogsimError::FileRead { .. }));
}

#[test]
fn test_failed_reload_keeps_previous_circuit() {
    let mut sim = Simulator::from_source(&nand_source(0, 0)).unwrap();
    sim.step().unwrap();

    let reload = Simulator::from_source("devices { G is NAND; }");
    assert!(reload.is_err());
    sim.step().unwrap();
    assert_eq!(sim.trace("G").unwrap().len(), 2);
}

#[test]
fn test_latch_holds_until_reset_pulse() {
    let mut sim = Simulator::from_source(
        "devices {
           SN, RN are SWITCH;
           SN, RN set 1;
           P, Q are NAND gates;
           P, Q have 2 inputs;
         }
         connections {
           device P { SN to P.I1; Q to P.I2; }
           device Q { RN to Q.I1; P to Q.I2; }
         }
         monitor { P, Q; }",
    )
    .unwrap();

    sim.set_switch("SN", Signal::Low).unwrap();
    sim.step().unwrap();
    sim.set_switch("SN", Signal::High).unwrap();
    sim.step().unwrap();
    sim.set_switch("RN", Signal::Low).unwrap();
    sim.step().unwrap();

    assert_eq!(sim.trace("P").unwrap(), &[Signal::High, Signal::High, Signal::Low]);
    assert_eq!(sim.trace("Q").unwrap(), &[Signal::Low, Signal::Low, Signal::High]);
}

#[test]
fn test_gated_data_latches_like_direct_data() {
    let mut sim = Simulator::from_source(
        "devices {
           CK, S, DA, Z are SWITCH;
           S set 1;
           N is NOT;
           D1, D2 are DTYPE;
         }
         connections {
           device N { S to N.I1; }
           device D1 { CK to D1.CLK; N to D1.DATA; Z to D1.SET; Z to D1.CLEAR; }
           device D2 { CK to D2.CLK; DA to D2.DATA; Z to D2.SET; Z to D2.CLEAR; }
         }
         monitor { D1.Q, D2.Q; }",
    )
    .unwrap();
    sim.step().unwrap();

    sim.set_switch("S", Signal::Low).unwrap();
    sim.set_switch("DA", Signal::High).unwrap();
    sim.set_switch("CK", Signal::High).unwrap();
    sim.step().unwrap();

    assert_eq!(sim.trace("D1.Q").unwrap(), &[Signal::Low, Signal::High]);
    assert_eq!(sim.trace("D2.Q").unwrap(), &[Signal::Low, Signal::High]);
}

#[test]
fn test_clock_switch_set_high_does_not_latch_on_first_cycle() {
    let mut sim = Simulator::from_source(
        "devices {
           CK, DA, Z are SWITCH;
           CK, DA set 1;
           D1 is DTYPE;
         }
         connections {
           device D1 { CK to D1.CLK; DA to D1.DATA; Z to D1.SET; Z to D1.CLEAR; }
         }
         monitor { D1.Q; }",
    )
    .unwrap();
    sim.step().unwrap();
    sim.set_switch("CK", Signal::Low).unwrap();
    sim.step().unwrap();
    sim.set_switch("CK", Signal::High).unwrap();
    sim.step().unwrap();

    assert_eq!(sim.trace("D1.Q").unwrap(), &[Signal::Low, Signal::Low, Signal::High]);
}

#[test]
fn test_oversized_range_is_refused() {
    let diagnostics = diagnostics_of("devices { A0 => A4294967295 are SWITCH; } connections { }");
    assert_eq!(diagnostics.len(), 1, "{}", diagnostics);
    assert_eq!(diagnostics.count(DiagnosticKind::Semantic), 1);
    let message = &diagnostics.iter().next().unwrap().message;
    assert!(message.contains("range"), "{}", message);
}
