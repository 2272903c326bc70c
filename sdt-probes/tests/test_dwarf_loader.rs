use sdt_probes::config::LoadConfig;
use sdt_probes::debug_info::load_binary;
use sdt_probes::domain::LoadError;
use sdt_probes::encoder::EncoderRegistry;
use sdt_probes::note::NoteReader;
use sdt_probes::session::{EncodingSession, FailurePolicy, SessionOptions};
use std::path::Path;
use std::sync::Arc;

#[test]
fn test_load_own_binary() {
    // Test binaries are built with debug info, so our own executable works as input
    let binary_path = env!("CARGO_BIN_EXE_sdt-probes");

    println!("Loading debug info from: {binary_path}");

    let loaded = load_binary(Path::new(binary_path));
    assert!(loaded.is_ok(), "Failed to load debug info: {:?}", loaded.err());
    let loaded = loaded.unwrap();

    assert!(!loaded.units.is_empty());
    assert!(!loaded.symbols.is_empty());

    let linked: usize = loaded
        .units
        .iter()
        .map(|unit| unit.functions().filter(|(_, f)| f.addr != 0).count())
        .sum();
    println!("{} units, {linked} linked functions", loaded.units.len());
    assert!(linked > 0);

    let has_main = loaded
        .units
        .iter()
        .flat_map(|unit| unit.functions())
        .any(|(_, f)| f.name == "main" && f.addr != 0);
    assert!(has_main, "no linked function named main");
}

#[test]
fn test_encode_own_binary() {
    let binary_path = env!("CARGO_BIN_EXE_sdt-probes");
    let loaded = load_binary(Path::new(binary_path)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(EncoderRegistry::new());

    let session = EncodingSession::new(
        Arc::clone(&registry),
        LoadConfig::default(),
        SessionOptions { policy: FailurePolicy::Skip, ..SessionOptions::default() },
    );
    let report = session.run(&loaded.units, dir.path(), Some(&loaded.symbols));

    println!(
        "{} probes, {} outputs, {} failures",
        report.probes,
        report.outputs.len(),
        report.failures.len()
    );
    assert_eq!(report.outputs.len() + report.failures.len(), loaded.units.len());
    assert!(registry.is_empty());

    // Whatever was written must parse back completely
    let mut total = 0;
    for output in &report.outputs {
        let bytes = std::fs::read(&output.path).unwrap();
        let records = NoteReader::read_all(&bytes).unwrap();
        assert_eq!(records.len(), output.probes);
        assert!(records.iter().all(|r| r.provider.is_empty() && r.arguments.is_empty()));
        total += records.len();
    }
    assert_eq!(total, report.probes);
}

#[test]
fn test_missing_file() {
    let result = load_binary(Path::new("/nonexistent/path/to/binary"));
    assert!(matches!(result, Err(LoadError::Io { .. })));
}

#[test]
fn test_not_an_object_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"plain text, not ELF").unwrap();

    let result = load_binary(file.path());
    assert!(matches!(result, Err(LoadError::Object(_))));
}
