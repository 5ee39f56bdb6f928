use std::fs;
use std::path::PathBuf;

use pycraft::{
    ContainerKind, SessionOptions, Value,
    cli::{self, CliError, EditCommand, EditOptions},
    to_source,
};
use tempfile::TempDir;

const SETTINGS: &str = "\
DEBUG = False

INSTALLED_APPS = [
    'admin',
    'auth',
]

DATABASES = {'default': {'ENGINE': 'sqlite3'}}
FEATURES = set()
";

fn settings_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.py");
    fs::write(&path, SETTINGS).unwrap();
    (dir, path)
}

fn options(path: &PathBuf, name: &str, command: EditCommand) -> EditOptions {
    EditOptions {
        path: path.clone(),
        name: name.to_string(),
        command,
        session: SessionOptions::unformatted(),
        dry_run: false,
    }
}

#[test]
fn test_list_append_from_argument() {
    let (_dir, path) = settings_file();
    let command = EditCommand::ListAppend(cli::parse_value("reports"));

    let result = cli::execute_edit(&options(&path, "INSTALLED_APPS", command)).unwrap();
    assert_eq!(result.removed, None);
    assert_eq!(result.preview, None);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("INSTALLED_APPS = [\n    'admin',\n    'auth',\n    'reports',\n]\n"));
}

#[test]
fn test_dict_set_json_value() {
    let (_dir, path) = settings_file();
    let command = EditCommand::DictSet {
        key: cli::parse_value("replica"),
        value: cli::parse_value(r#"{"ENGINE": "postgres", "PORT": 5432}"#),
    };

    cli::execute_edit(&options(&path, "DATABASES", command)).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(
        "DATABASES = {'default': {'ENGINE': 'sqlite3'}, 'replica': {'ENGINE': 'postgres', 'PORT': 5432}}\n"
    ));
}

#[test]
fn test_list_pop_reports_removed_element() {
    let (_dir, path) = settings_file();

    let result =
        cli::execute_edit(&options(&path, "INSTALLED_APPS", EditCommand::ListPop(0))).unwrap();

    assert_eq!(result.removed.as_ref().map(to_source), Some("'admin'".to_string()));
    assert!(fs::read_to_string(&path).unwrap().contains("    'auth',\n]"));
}

#[test]
fn test_set_update_on_empty_call() {
    let (_dir, path) = settings_file();
    let values = cli::parse_values(r#"["search", "search", "export"]"#).unwrap();

    cli::execute_edit(&options(&path, "FEATURES", EditCommand::SetUpdate(values))).unwrap();

    assert!(
        fs::read_to_string(&path)
            .unwrap()
            .contains("FEATURES = set('search', 'export')\n")
    );
}

#[test]
fn test_dry_run_does_not_write() {
    let (_dir, path) = settings_file();
    let mut opts = options(&path, "INSTALLED_APPS", EditCommand::ListClear);
    opts.dry_run = true;

    let result = cli::execute_edit(&opts).unwrap();

    let preview = result.preview.unwrap();
    assert!(preview.contains("INSTALLED_APPS = []\n"));
    assert_eq!(fs::read_to_string(&path).unwrap(), SETTINGS);
}

#[test]
fn test_wrong_kind_is_not_found() {
    let (_dir, path) = settings_file();
    let command = EditCommand::SetAdd(Value::from("x"));

    let err = cli::execute_edit(&options(&path, "INSTALLED_APPS", command)).unwrap_err();

    assert!(matches!(
        err,
        CliError::NotFound { ref name, kind: ContainerKind::Set } if name == "INSTALLED_APPS"
    ));
    assert!(err.to_string().contains("No set named 'INSTALLED_APPS'"));
    assert_eq!(fs::read_to_string(&path).unwrap(), SETTINGS);
}

#[test]
fn test_failed_operation_does_not_write() {
    let (_dir, path) = settings_file();
    let command = EditCommand::ListRemove(Value::from("missing"));

    let err = cli::execute_edit(&options(&path, "INSTALLED_APPS", command)).unwrap_err();

    assert!(matches!(err, CliError::Edit(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), SETTINGS);
}

#[test]
fn test_format_command() {
    let (_dir, path) = settings_file();

    let formatted = cli::execute_format(&path, SessionOptions::default(), true)
        .unwrap()
        .unwrap();
    assert!(formatted.contains("\"admin\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), SETTINGS);

    assert_eq!(cli::execute_format(&path, SessionOptions::default(), false).unwrap(), None);
    assert_eq!(fs::read_to_string(&path).unwrap(), formatted);
}

#[test]
fn test_list_bindings() {
    let (_dir, path) = settings_file();

    let bindings = cli::execute_list(&path).unwrap();
    let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["DEBUG", "INSTALLED_APPS", "DATABASES", "FEATURES"]);
    assert_eq!(bindings[0].kind, None);
    assert_eq!(bindings[3].kind, Some(ContainerKind::Set));
}

#[test]
fn test_show_binding() {
    let (_dir, path) = settings_file();

    let shown = cli::execute_show(&path, "DATABASES").unwrap().unwrap();
    assert_eq!(shown.source, "{'default': {'ENGINE': 'sqlite3'}}");
    assert_eq!(
        shown.json,
        Some(serde_json::json!({"default": {"ENGINE": "sqlite3"}}))
    );

    assert!(cli::execute_show(&path, "MISSING").unwrap().is_none());
}
