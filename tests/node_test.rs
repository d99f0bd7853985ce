use semantic_rewrite::{
    EntityKind, EntityTree, Error, Literal, line_col_to_offset, offset_to_line_col,
};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Get the path to the fixture project
fn fixture_project() -> PathBuf {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        PathBuf::from(manifest_dir).join("tests/fixtures/test_project")
    } else {
        PathBuf::from("tests/fixtures/test_project")
    }
}

const CLASS_SOURCE: &str = "class Employee(object):

    def __init__(self, first_name, last_name):
        self.first_name = first_name
        self.last_name = last_name
        self.pay_rate = settings.BASE_PAY

    def full_name(self):
        return self.first_name + ' ' + self.last_name
";

const CLASS_BODY_SOURCE: &str = "
    def __init__(self, first_name, last_name):
        self.first_name = first_name
        self.last_name = last_name
        self.pay_rate = settings.BASE_PAY

    def full_name(self):
        return self.first_name + ' ' + self.last_name
";

const VARIABLE_SOURCE: &str = "MULTILINE_SETTING = {
    'some_key': 42,
    'other_key': {


        'baz': 'quux'
    }  #some comment


}";

const VARIABLE_BODY_SOURCE: &str = "{
    'some_key': 42,
    'other_key': {


        'baz': 'quux'
    }  #some comment


}";

#[test]
fn test_node_tree() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();
    let root = tree.root();
    let children = tree.children(root).unwrap();

    let names: Vec<&str> = children.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["lib", "run", "settings"]);

    assert_eq!(tree.node(children["lib"]).kind, EntityKind::Package);
    assert_eq!(tree.node(children["settings"]).kind, EntityKind::Module);

    let employee = tree.find("lib.employee.Employee").unwrap();
    assert_eq!(tree.node(employee).kind, EntityKind::Class);
    assert_eq!(tree.node(employee).path, "lib.employee.Employee");

    let setting = tree.find("settings.MULTILINE_SETTING").unwrap();
    assert_eq!(tree.node(setting).kind, EntityKind::Variable);

    let module = tree.parent(employee).unwrap();
    assert_eq!(tree.node(module).path, "lib.employee");
}

#[test]
fn test_statement_kinds() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();

    let import = tree.find("run.Employee").unwrap();
    assert_eq!(tree.node(import).kind, EntityKind::Import);

    let print = tree.find("run.print").unwrap();
    assert_eq!(tree.node(print).kind, EntityKind::Expression);

    let method = tree.find("lib.employee.Employee.full_name").unwrap();
    assert_eq!(tree.node(method).kind, EntityKind::Function);
    assert!(tree.children(method).unwrap().is_empty());
}

#[test]
fn test_unknown_path() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();

    assert!(matches!(
        tree.find("lib.employee.Manager"),
        Err(Error::UnknownNode { .. })
    ));
}

#[test]
fn test_source() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();
    let employee = tree.find("lib.employee.Employee").unwrap();
    let setting = tree.find("settings.MULTILINE_SETTING").unwrap();

    assert_eq!(tree.get_source(employee).unwrap(), CLASS_SOURCE);
    assert_eq!(tree.get_body_source(employee).unwrap(), CLASS_BODY_SOURCE);

    assert_eq!(tree.get_source(setting).unwrap(), VARIABLE_SOURCE);
    assert_eq!(tree.get_body_source(setting).unwrap(), VARIABLE_BODY_SOURCE);
}

#[test]
fn test_eval_body() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();
    let setting = tree.find("settings.MULTILINE_SETTING").unwrap();
    let one_liner = tree.find("settings.ONE_LINER").unwrap();

    let expected = Literal::Dict(vec![
        (Literal::str("some_key"), Literal::Int(42)),
        (
            Literal::str("other_key"),
            Literal::Dict(vec![(Literal::str("baz"), Literal::str("quux"))]),
        ),
    ]);
    assert_eq!(tree.eval_body(setting).unwrap(), Some(expected));
    assert_eq!(tree.eval_body(one_liner).unwrap(), Some(Literal::str("foobar")));
}

#[test]
fn test_multiline_signatures() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();
    let lair = tree.find("lib.edge_cases.Lair").unwrap();
    let memo = tree.find("lib.edge_cases.send_memo").unwrap();
    let source = tree.file_source(lair).unwrap();

    assert_eq!(
        tree.offsets(lair).unwrap().body_start,
        source.find("    pass  # Lair body").unwrap()
    );
    assert_eq!(
        tree.offsets(memo).unwrap().body_start,
        source.find("    '''Compose a memo.'''").unwrap()
    );

    let weird = tree.find("lib.edge_cases.WeirdSubclass").unwrap();
    assert_eq!(
        tree.get_source(weird).unwrap(),
        "class WeirdSubclass(datetime.datetime):\n    pass  # WeirdSubclass body\n"
    );
}

#[test]
fn test_indentation() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();
    let memo = tree.find("lib.edge_cases.send_memo").unwrap();
    let method = tree.find("lib.employee.Employee.full_name").unwrap();

    assert_eq!(tree.outer_indentation(memo).unwrap(), "");
    assert_eq!(tree.inner_indentation(memo).unwrap(), "    ");
    assert_eq!(tree.outer_indentation(method).unwrap(), "    ");
    assert_eq!(tree.inner_indentation(method).unwrap(), "        ");
}

#[test]
fn test_offsets_are_ordered_for_every_node() {
    let mut tree = EntityTree::open(fixture_project()).unwrap();

    for id in tree.descendants(tree.root()).unwrap() {
        if tree.source_file(id).is_err() {
            continue;
        }
        let offsets = tree.offsets(id).unwrap();
        let path = &tree.node(id).path;

        assert!(offsets.start <= offsets.body_start, "{}: {:?}", path, offsets);
        assert!(offsets.body_start <= offsets.body_end, "{}: {:?}", path, offsets);
        assert!(offsets.body_end <= offsets.end, "{}: {:?}", path, offsets);
    }
}

#[test]
fn test_position_round_trip() {
    let content = fs::read_to_string(fixture_project().join("lib/edge_cases.py")).unwrap();

    for offset in (0..=content.len()).filter(|&o| content.is_char_boundary(o)) {
        let position = offset_to_line_col(&content, offset).unwrap();
        assert_eq!(
            line_col_to_offset(&content, position.line, position.column).unwrap(),
            offset
        );
    }

    for (line, text) in content.split_inclusive('\n').enumerate() {
        for column in 0..text.len() {
            let offset = line_col_to_offset(&content, line, column).unwrap();
            let position = offset_to_line_col(&content, offset).unwrap();
            assert_eq!((position.line, position.column), (line, column));
        }
    }
}
