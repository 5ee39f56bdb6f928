use std::fs;
use std::path::PathBuf;

use pycraft::{
    EditError, FileSession, FormatterChoice, MappingOps, SequenceOps, SessionError,
    SessionOptions, SetOps, edit_file,
};
use tempfile::TempDir;

const SOURCE: &str = "
my_list = [1, 2, 3]
my_dict = {'key': 'value'}
";

#[derive(Debug)]
enum TestError {
    Session(SessionError),
    Edit(EditError),
    Missing(&'static str),
}

impl From<SessionError> for TestError {
    fn from(e: SessionError) -> Self {
        TestError::Session(e)
    }
}

impl From<EditError> for TestError {
    fn from(e: EditError) -> Self {
        TestError::Edit(e)
    }
}

fn python_file(source: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test_file.py");
    fs::write(&path, source).unwrap();
    (dir, path)
}

#[test]
fn test_edit_file_writes_formatted_result() {
    let (_dir, path) = python_file(SOURCE);

    edit_file(&path, SessionOptions::default(), |doc| {
        doc.find_sequence("my_list")
            .ok_or(TestError::Missing("my_list"))?
            .append(4);
        doc.find_mapping("my_dict")
            .ok_or(TestError::Missing("my_dict"))?
            .update([("new_key", "new_value")])?;
        Ok::<_, TestError>(())
    })
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("my_list = [1, 2, 3, 4]"));
    assert!(content.contains("my_dict = {\"key\": \"value\", \"new_key\": \"new_value\"}"));
    assert!(content.starts_with("my_list"));
}

#[test]
fn test_edit_file_returns_body_result() {
    let (_dir, path) = python_file(SOURCE);

    let popped = edit_file(&path, SessionOptions::unformatted(), |doc| {
        let mut list = doc
            .find_sequence("my_list")
            .ok_or(TestError::Missing("my_list"))?;
        Ok::<_, TestError>(list.pop_last()?)
    })
    .unwrap();

    assert_eq!(pycraft::to_source(&popped), "3");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\nmy_list = [1, 2]\nmy_dict = {'key': 'value'}\n"
    );
}

#[test]
fn test_failed_edit_leaves_file_untouched() {
    let (_dir, path) = python_file(SOURCE);

    let result = edit_file(&path, SessionOptions::default(), |doc| {
        let mut list = doc
            .find_sequence("my_list")
            .ok_or(TestError::Missing("my_list"))?;
        list.append(4);
        list.remove(99)?;
        Ok::<_, TestError>(())
    });

    assert!(matches!(
        result,
        Err(TestError::Edit(EditError::ValueNotFound(ref v))) if v == "99"
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
}

#[test]
fn test_missing_binding_leaves_file_untouched() {
    let (_dir, path) = python_file(SOURCE);

    let result = edit_file(&path, SessionOptions::default(), |doc| {
        doc.find_set("my_list").ok_or(TestError::Missing("my_list"))?.add(1);
        Ok::<_, TestError>(())
    });

    assert!(matches!(result, Err(TestError::Missing("my_list"))));
    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
}

#[test]
fn test_formatter_failure_prevents_write() {
    let (_dir, path) = python_file(SOURCE);
    let options = SessionOptions {
        format: true,
        formatter: FormatterChoice::Command(vec!["pycraft-missing-formatter".to_string()]),
    };

    let result = edit_file(&path, options, |doc| {
        doc.find_sequence("my_list")
            .ok_or(TestError::Missing("my_list"))?
            .append(4);
        Ok::<_, TestError>(())
    });

    assert!(matches!(
        result,
        Err(TestError::Session(SessionError::Format(_)))
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
}

#[cfg(unix)]
#[test]
fn test_external_formatter_output_is_written() {
    let (_dir, path) = python_file("x = {1}\n");
    let options = SessionOptions {
        format: true,
        formatter: FormatterChoice::Command(vec!["cat".to_string()]),
    };

    let mut session = FileSession::open_with(&path, options).unwrap();
    session.find_set("x").unwrap().add(2);
    session.commit().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "x = {1, 2}\n");
}

#[test]
fn test_unformatted_session_keeps_quotes() {
    let (_dir, path) = python_file(SOURCE);

    let mut session = FileSession::open_with(&path, SessionOptions::unformatted()).unwrap();
    session
        .find_mapping("my_dict")
        .unwrap()
        .set("new_key", "new_value")
        .unwrap();
    session.commit().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\nmy_list = [1, 2, 3]\nmy_dict = {'key': 'value', 'new_key': 'new_value'}\n"
    );
}

#[test]
fn test_discarded_session_writes_nothing() {
    let (_dir, path) = python_file(SOURCE);

    let mut session = FileSession::open(&path).unwrap();
    session.find_sequence("my_list").unwrap().clear();
    assert!(session.document().is_modified());
    assert!(session.render().unwrap().contains("my_list = []"));
    session.discard();

    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
}

#[test]
fn test_dropped_session_writes_nothing() {
    let (_dir, path) = python_file(SOURCE);

    {
        let mut session = FileSession::open(&path).unwrap();
        session.find_sequence("my_list").unwrap().append(4);
    }

    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
}

#[test]
fn test_open_reports_syntax_errors() {
    let (_dir, path) = python_file("x = [1, 2\n");
    let err = FileSession::open(&path).err().unwrap();
    assert!(matches!(err, SessionError::Syntax(_)));
    assert!(err.to_string().contains("was never closed"));
}

#[test]
fn test_open_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = FileSession::open(dir.path().join("missing.py")).err().unwrap();
    assert!(matches!(err, SessionError::Io(_)));
}
