// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    DiscoveryOptions,
    matches::{CAPTURE_CASE, CAPTURE_DEFINITION, CAPTURE_NAME, QueryCapture, QueryMatch},
};
use crate::{
    errors::DiscoveryError,
    list::{SourcePoint, SourceRange},
};
use camino::Utf8Path;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

/// Test functions, test methods and `Run` calls with a literal first argument.
const TEST_QUERY: &str = r#"
((function_declaration
   name: (identifier) @test.name) @test.definition
 (#match? @test.name "^(Test|Example)"))

((method_declaration
   name: (field_identifier) @test.name) @test.definition
 (#match? @test.name "^(Test|Example)"))

((call_expression
   function: (selector_expression
     field: (field_identifier) @test.method)
   arguments: (argument_list
     .
     [(interpreted_string_literal) (raw_string_literal)] @test.name)) @test.definition
 (#eq? @test.method "Run"))
"#;

const STRING_LITERAL_KINDS: &[&str] = &["interpreted_string_literal", "raw_string_literal"];
const FUNCTION_KINDS: &[&str] = &["function_declaration", "method_declaration", "func_literal"];

/// Extracts [`QueryMatch`]es from Go source with tree-sitter.
pub struct GoTestQuery {
    language: Language,
    query: Query,
}

impl GoTestQuery {
    /// Loads the Go grammar and compiles the test query.
    pub fn new() -> Result<Self, DiscoveryError> {
        let language = tree_sitter_go::language();
        let query = Query::new(&language, TEST_QUERY).map_err(DiscoveryError::Query)?;
        Ok(Self { language, query })
    }

    /// Returns the matches found in `source`.
    ///
    /// `path` is only used for error reporting.
    pub fn matches(
        &self,
        path: &Utf8Path,
        source: &str,
        options: &DiscoveryOptions,
    ) -> Result<Vec<QueryMatch>, DiscoveryError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(DiscoveryError::Language)?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| DiscoveryError::Parse {
                path: path.to_owned(),
            })?;

        let bytes = source.as_bytes();
        let capture_names = self.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches: Vec<_> = cursor
            .matches(&self.query, tree.root_node(), bytes)
            .map(|m| {
                QueryMatch::new(m.captures.iter().map(|c| {
                    capture(capture_names[c.index as usize], c.node, bytes)
                }))
            })
            .collect();

        if options.table_tests {
            matches.extend(table_case_matches(tree.root_node(), bytes));
        }

        Ok(matches)
    }
}

/// Finds the cases of table-driven tests.
///
/// Recognizes a `for _, tt := range <cases>` loop whose body calls
/// `t.Run(tt.<field>, ...)`, where `<cases>` is either an inline composite
/// literal or a variable bound to one by a short variable declaration earlier
/// in the same function. Each element of the literal with a string `<field>`
/// yields one match.
fn table_case_matches(root: Node<'_>, source: &[u8]) -> Vec<QueryMatch> {
    let mut matches = Vec::new();
    for for_statement in descendants_of_kind(root, "for_statement") {
        let Some(range_clause) = named_children(for_statement)
            .into_iter()
            .find(|child| child.kind() == "range_clause")
        else {
            continue;
        };
        let Some(case_var) = range_value_variable(range_clause, source) else {
            continue;
        };
        let Some(body) = for_statement.child_by_field_name("body") else {
            continue;
        };
        let Some(name_field) = run_name_field(body, case_var, source) else {
            continue;
        };
        let Some(cases) = range_clause.child_by_field_name("right") else {
            continue;
        };
        let literal = match cases.kind() {
            "composite_literal" => Some(cases),
            "identifier" => declared_literal(for_statement, node_text(cases, source), source),
            _ => None,
        };
        if let Some(literal) = literal {
            matches.extend(case_matches(literal, name_field, source));
        }
    }
    matches
}

/// Returns the value variable of `for _, tt := range ...`.
fn range_value_variable<'s>(range_clause: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let left = range_clause.child_by_field_name("left")?;
    let vars = named_children(left);
    match vars.as_slice() {
        [_, value] if value.kind() == "identifier" => {
            let name = node_text(*value, source);
            (name != "_").then_some(name)
        }
        _ => None,
    }
}

/// Returns `field` if `body` contains `<recv>.Run(<case_var>.<field>, ...)`.
fn run_name_field<'s>(body: Node<'_>, case_var: &str, source: &'s [u8]) -> Option<&'s str> {
    descendants_of_kind(body, "call_expression")
        .into_iter()
        .find_map(|call| {
            let function = call.child_by_field_name("function")?;
            if function.kind() != "selector_expression"
                || node_text(function.child_by_field_name("field")?, source) != "Run"
            {
                return None;
            }
            let first_arg = call.child_by_field_name("arguments")?.named_child(0)?;
            if first_arg.kind() != "selector_expression"
                || node_text(first_arg.child_by_field_name("operand")?, source) != case_var
            {
                return None;
            }
            Some(node_text(first_arg.child_by_field_name("field")?, source))
        })
}

/// Finds the composite literal bound to `name` by the nearest short variable
/// declaration preceding `for_statement` in the same function.
fn declared_literal<'t>(for_statement: Node<'t>, name: &str, source: &[u8]) -> Option<Node<'t>> {
    let mut scope = for_statement;
    while let Some(parent) = scope.parent() {
        scope = parent;
        if FUNCTION_KINDS.contains(&scope.kind()) {
            break;
        }
    }

    descendants_of_kind(scope, "short_var_declaration")
        .into_iter()
        .filter(|decl| decl.end_byte() <= for_statement.start_byte())
        .filter_map(|decl| {
            let left = named_children(decl.child_by_field_name("left")?);
            let index = left
                .iter()
                .position(|ident| node_text(*ident, source) == name)?;
            let value = decl.child_by_field_name("right")?.named_child(index)?;
            (value.kind() == "composite_literal").then_some(value)
        })
        .last()
}

/// Yields one match per element of `literal` whose `name_field` is a string.
fn case_matches(literal: Node<'_>, name_field: &str, source: &[u8]) -> Vec<QueryMatch> {
    let Some(elements) = literal.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut matches = Vec::new();
    for element in named_children(elements) {
        let case = unwrap_element(element);
        let fields = match case.kind() {
            "literal_value" => case,
            "composite_literal" => match case.child_by_field_name("body") {
                Some(body) => body,
                None => continue,
            },
            _ => continue,
        };

        let name = named_children(fields).into_iter().find_map(|keyed| {
            if keyed.kind() != "keyed_element" {
                return None;
            }
            let key = unwrap_element(keyed.named_child(0)?);
            let value = unwrap_element(keyed.named_child(1)?);
            (node_text(key, source) == name_field
                && STRING_LITERAL_KINDS.contains(&value.kind()))
            .then_some((keyed, value))
        });

        if let Some((keyed, value)) = name {
            matches.push(QueryMatch::new([
                capture(CAPTURE_DEFINITION, element, source),
                capture(CAPTURE_NAME, value, source),
                capture(CAPTURE_CASE, keyed, source),
            ]));
        }
    }
    matches
}

/// Strips the `literal_element` wrappers the grammar puts around list items and values.
fn unwrap_element(mut node: Node<'_>) -> Node<'_> {
    while matches!(node.kind(), "literal_element" | "element") && node.named_child_count() == 1 {
        match node.named_child(0) {
            Some(child) => node = child,
            None => break,
        }
    }
    node
}

fn descendants_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(next) = stack.pop() {
        if next.kind() == kind {
            found.push(next);
        }
        stack.extend(named_children(next).into_iter().rev());
    }
    found
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn capture(name: &str, node: Node<'_>, source: &[u8]) -> QueryCapture {
    QueryCapture::new(name, node_text(node, source), source_range(node))
}

fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

fn source_range(node: Node<'_>) -> SourceRange {
    let start = node.start_position();
    let end = node.end_position();
    SourceRange {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start: SourcePoint {
            row: start.row,
            column: start.column,
        },
        end: SourcePoint {
            row: end.row,
            column: end.column,
        },
    }
}
