mod common;
use common::*;
use driftcheck::model::DiagnosticKind;
use driftcheck::parser::PairingPolicy;

#[test]
fn clean_project_passes() {
    let project = clean_project();
    let result = verify(&project.options()).unwrap();

    assert_eq!(result.status(), ExitStatus::Clean);
    assert!(result.passed());
    assert_eq!(result.report.tables.len(), 2);
    assert_eq!(result.report.foreign_keys.len(), 1);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn alter_in_later_migration_is_visible_to_types() {
    let project = Project::new()
        .migration("001_init.sql", INIT_SQL)
        .types(SYNCED_TYPES);
    let result = verify(&project.options().with_check(Check::Sync)).unwrap();

    let profiles = &result.report.tables["profiles"];
    assert!(profiles.missing_in_sql.contains("phone"));
    assert_eq!(result.status(), ExitStatus::DriftFound);
}

#[test]
fn phantom_column_in_module_fails_usage() {
    let project = clean_project().module(
        "stats",
        r#"
        const { data } = await supabase
          .from('bilans')
          .select('id')
          .gte('score_final', 10)
        "#,
    );
    let result = verify(&project.options()).unwrap();

    let bilans = &result.report.tables["bilans"];
    assert!(bilans.phantom_backend.contains("score_final"));
    assert_eq!(result.status(), ExitStatus::DriftFound);

    let text = render_text(&result.report, result.check);
    assert!(text.contains("      - score_final\n"));
}

#[test]
fn undeclared_relation_does_not_fail() {
    let project = clean_project().module(
        "consultants",
        r#"
        export const forConsultant = (consultantId: string) =>
          supabase.from('bilans').select('*').eq('consultant_id', consultantId)
        "#,
    );
    let result = verify(&project.options()).unwrap();

    let bilans = &result.report.tables["bilans"];
    assert_eq!(bilans.undeclared_relations.len(), 1);
    assert!(result.passed());
}

#[test]
fn sync_check_does_not_need_modules() {
    let project = clean_project();
    fs::remove_dir_all(project.modules_dir()).unwrap();

    let result = verify(&project.options().with_check(Check::Sync)).unwrap();
    assert!(result.passed());

    let err = verify(&project.options()).unwrap_err();
    assert!(err.is_missing_input());
    assert!(err.to_string().contains("modules directory not found"));
}

#[test]
fn usage_check_does_not_need_types() {
    let project = Project::new()
        .migration("001_init.sql", INIT_SQL)
        .module("bilans", CLEAN_MODULE);

    let result = verify(&project.options().with_check(Check::Usage)).unwrap();
    assert!(result.passed());
    assert!(result
        .report
        .tables
        .values()
        .all(|table| table.missing_in_types.is_empty()));
}

#[test]
fn missing_migrations_is_a_fault() {
    let project = clean_project();
    let options = VerifyOptions::new(
        project.root.path().join("nope"),
        project.types_file(),
        project.modules_dir(),
    );

    let err = verify(&options).unwrap_err();
    assert!(err.is_missing_input());
}

#[test]
fn excluded_tables_leave_the_report() {
    let project = clean_project().types(
        r#"
        profiles: { Row: { id: string; email: string; phone: string } }
        bilans: { Row: { id: string; beneficiaire_id: string; consultant_id: string; statut: string } }
        _audit: { Row: { id: string } }
        "#,
    );

    let result = verify(&project.options()).unwrap();
    assert!(!result.passed());

    let result = verify(&project.options().with_exclude_tables(vec!["_*".into()])).unwrap();
    assert!(!result.report.tables.contains_key("_audit"));
    assert!(result.passed());
}

#[test]
fn include_filter_keeps_only_matching_tables() {
    let project = clean_project();
    let result = verify(&project.options().with_include_tables(vec!["bil*".into()])).unwrap();
    assert_eq!(
        result.report.tables.keys().collect::<Vec<_>>(),
        vec!["bilans"]
    );
}

#[test]
fn invalid_filter_is_an_error() {
    let project = clean_project();
    let err = verify(&project.options().with_exclude_tables(vec!["[oops".into()])).unwrap_err();
    assert!(err.to_string().contains("Invalid table filter pattern"));
}

#[test]
fn diagnostics_are_collected_not_fatal() {
    let project = clean_project()
        .migration("003_cleanup.sql", "ALTER TABLE bilans DROP COLUMN statut;\n")
        .module("orphan", "query.eq('statut', 'x');\n");

    let result = verify(&project.options()).unwrap();
    assert_eq!(
        result
            .diagnostics_of(DiagnosticKind::UnsupportedStatement)
            .count(),
        1
    );
    assert_eq!(
        result
            .diagnostics_of(DiagnosticKind::UnpairedPredicate)
            .count(),
        1
    );
    assert!(result.report.tables["bilans"].missing_in_types.is_empty());
}

#[test]
fn module_file_name_is_configurable() {
    let project = clean_project();
    let dir = project.modules_dir().join("legacy");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("queries.ts"), "supabase.from('bilans').eq('ghost', 1)").unwrap();

    let result = verify(&project.options()).unwrap();
    assert!(result.passed());

    let result = verify(&project.options().with_module_file_name("queries.ts")).unwrap();
    assert!(result.report.tables["bilans"].phantom_backend.contains("ghost"));
}

#[test]
fn cross_product_pairing_over_approximates() {
    let project = clean_project().module(
        "mixed",
        r#"
        await supabase.from('profiles').select('*').eq('email', email)
        await supabase.from('bilans').select('*').eq('statut', statut)
        "#,
    );

    let nearest = verify(&project.options()).unwrap();
    assert!(nearest.passed());

    let cross = verify(&project.options().with_pairing(PairingPolicy::CrossProduct)).unwrap();
    assert!(cross.report.tables["profiles"].phantom_backend.contains("statut"));
    assert!(cross.report.tables["bilans"].phantom_backend.contains("email"));
}

#[test]
fn cross_product_does_not_mix_modules_sharing_a_name() {
    let project = clean_project();
    for (area, query) in [
        ("admin", "supabase.from('profiles').select('*').eq('email', email)"),
        ("client", "supabase.from('bilans').select('*').eq('statut', statut)"),
    ] {
        let dir = project.modules_dir().join(area).join("stats");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.ts"), query).unwrap();
    }

    let result = verify(&project.options().with_pairing(PairingPolicy::CrossProduct)).unwrap();
    assert!(result.report.tables["profiles"].phantom_backend.is_empty());
    assert!(result.report.tables["bilans"].phantom_backend.is_empty());
}

#[test]
fn non_utf8_migration_is_read_lossily() {
    let project = clean_project();
    fs::write(
        project.migrations_dir().join("003_note.sql"),
        b"-- cr\xe9ation\nALTER TABLE bilans ADD COLUMN note TEXT;\n",
    )
    .unwrap();

    let result = verify(&project.options().with_check(Check::Sync)).unwrap();
    assert!(result.report.tables["bilans"].missing_in_types.contains("note"));
}
