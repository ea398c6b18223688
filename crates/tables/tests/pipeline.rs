use oci_core::{CoreConfig, OciService};
use oci_tables::{
    load_catalog_dir, read_requisitions_path, write_annotated, ColumnMapping, TableError,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const REQUISITIONS: &str = "\
id_registro,id_paciente,co_procedimento,dt_solicitacao,dt_execucao,cbo_executante,cid_motivo
1,P1,A,2025-01-02,2025-01-10,,c50
2,P1,C,2025-01-02,,,C50
3,P1,D,2025-01-02,not-a-date,,C50
4,P2,A,2025-01-03,,,C50
5,P2,D,2025-01-03,,,C50
6,P3,0301010,2025-01-04,2025-01-05,225125,C50
7,P3,E,2025-01-04,2025-01-04,,C50
,P4,A,2025-01-04,,,C50
";

const RULES: &str = "\
CO_OCI,CO_PROCEDIMENTO,TP_COMPATIBILIDADE,OBRIGATORIO_ALTERNATIVO
100,A,5,
100,B,5,G
100,C,5,G
100,D,1,
200,0301010,5,
200,E,5,
300,E,5,
300,0301010|225125,5,
300,X,7,
";

const DIAGNOSES: &str = "CO_OCI,CO_CID\n100,C50\n300,c50\n";

const NAMES: &str = "co_oci,no_oci\n100,Bundle one hundred\n300,Bundle three hundred\n";

fn write_catalogs(dir: &Path) {
    fs::write(dir.join("pacotes.csv"), RULES).expect("write rules");
    fs::write(dir.join("cid.csv"), DIAGNOSES).expect("write diagnoses");
    fs::write(dir.join("oci_nome.csv"), NAMES).expect("write names");
}

fn run(dir: &Path, cfg: CoreConfig) -> String {
    let mapping = ColumnMapping::default();
    let requisitions_path = dir.join("mira.csv");
    fs::write(&requisitions_path, REQUISITIONS).expect("write requisitions");

    let table = read_requisitions_path(&requisitions_path, &mapping).expect("read requisitions");
    let catalogs = load_catalog_dir(dir, &mapping).expect("load catalogues");
    let service = OciService::new(Arc::new(cfg));
    let summarized = service.config().summarize();
    let rows = service.process(catalogs.into_input(table.rows), None);

    let mut out = Vec::new();
    write_annotated(&mut out, &table.headers, &rows, &mapping, summarized).expect("write output");
    String::from_utf8(out).expect("utf8 output")
}

#[test]
fn identifies_bundles_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_catalogs(dir.path());

    let output = run(dir.path(), CoreConfig::default());
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(
        lines,
        vec![
            "id_registro,id_paciente,co_procedimento,dt_solicitacao,dt_execucao,cbo_executante,\
             cid_motivo,bundle_id,in_bundle,cid_compativel,display_name,bundle_instance_id,\
             action,tier,status",
            "1,P1,A,2025-01-02,2025-01-10,,C50,100,true,true,Bundle one hundred,P1|100,\
             Bill as bundle,qualified,started",
            "2,P1,C,2025-01-02,,,C50,100,true,true,Bundle one hundred,P1|100,\
             Execute as bundle,qualified,started",
            "3,P1,D,2025-01-02,,,C50,100,true,true,Bundle one hundred,P1|100,\
             Execute as bundle,qualified,started",
            "6,P3,0301010,2025-01-04,2025-01-05,225125,C50,300,true,true,Bundle three hundred,\
             P3|300,Bill as bundle,qualified,completed",
            "7,P3,E,2025-01-04,2025-01-04,,C50,300,true,true,Bundle three hundred,P3|300,\
             Bill as bundle,qualified,completed",
        ]
    );
}

#[test]
fn keeps_unmatched_rows_when_configured() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_catalogs(dir.path());

    let output = run(dir.path(), CoreConfig::default().with_keep_unmatched(true));
    let unmatched: Vec<&str> = output
        .lines()
        .skip(1)
        .filter(|line| line.contains(",false,false,,,,"))
        .collect();

    assert_eq!(
        unmatched,
        vec![
            "4,P2,A,2025-01-03,,,C50,,false,false,,,,,",
            "5,P2,D,2025-01-03,,,C50,,false,false,,,,,",
        ]
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_catalogs(dir.path());

    let first = run(dir.path(), CoreConfig::default());
    let second = run(dir.path(), CoreConfig::default());
    assert_eq!(first, second);
}

#[test]
fn missing_required_column_fails_before_processing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("mira.csv");
    fs::write(&path, "id_registro,co_procedimento,dt_execucao\n1,A,\n").expect("write");

    let err = read_requisitions_path(&path, &ColumnMapping::default()).expect_err("missing column");
    assert!(matches!(
        err,
        TableError::MissingColumn { ref column, .. } if column == "id_paciente"
    ));
}
