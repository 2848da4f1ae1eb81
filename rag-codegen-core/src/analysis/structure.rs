//! Structural summary of Python source using tree-sitter

use super::CheckError;
use serde::Serialize;
use std::path::Path;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Positional parameter names, `self` included
    pub args: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    /// Functions defined directly in the class body
    pub methods: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Complexity {
    /// `if`, `elif`, `try` and `except`
    pub branches: usize,
    pub loops: usize,
    pub functions: usize,
    pub classes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub imports: Vec<String>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub complexity: Complexity,
}

pub async fn check(file: &Path) -> Result<StructureSummary, CheckError> {
    let source = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| CheckError::Io { path: file.to_path_buf(), message: e.to_string() })?;
    analyze_source(&source)
}

/// Summarise imports, functions, classes and complexity counts
pub fn analyze_source(source: &str) -> Result<StructureSummary, CheckError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into()).map_err(|e| {
        CheckError::InvalidOutput { tool: "tree-sitter".to_string(), message: e.to_string() }
    })?;

    let tree = parser.parse(source, None).ok_or_else(|| CheckError::InvalidOutput {
        tool: "tree-sitter".to_string(),
        message: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    let invalid = first_invalid(root).or_else(|| root.has_error().then_some(root));
    if let Some(node) = invalid {
        let position = node.start_position();
        return Err(CheckError::Syntax { line: position.row + 1, column: position.column + 1 });
    }

    let mut visitor = StructureVisitor { source: source.as_bytes(), summary: StructureSummary::default() };
    visitor.visit(root);
    Ok(visitor.summary)
}

/// Python 2 statements the grammar still accepts but Python 3 rejects
const LEGACY_STATEMENTS: [&str; 2] = ["print_statement", "exec_statement"];

/// First node, in source order, that makes the file invalid Python 3
fn first_invalid(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() || LEGACY_STATEMENTS.contains(&node.kind()) {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_invalid)
}

struct StructureVisitor<'a> {
    source: &'a [u8],
    summary: StructureSummary,
}

impl<'a> StructureVisitor<'a> {
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "import_statement" => self.record_import(node),
            "import_from_statement" => self.record_from_import(node),
            "function_definition" => {
                self.summary.complexity.functions += 1;
                self.record_function(node);
            }
            "class_definition" => {
                self.summary.complexity.classes += 1;
                self.record_class(node);
            }
            "if_statement" | "elif_clause" | "try_statement" | "except_clause" => {
                self.summary.complexity.branches += 1;
            }
            "for_statement" | "while_statement" => self.summary.complexity.loops += 1,
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    /// Name of a `dotted_name` or `aliased_import`
    fn imported_name(&self, node: Node<'_>) -> String {
        match node.kind() {
            "aliased_import" => {
                node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or_default()
            }
            _ => self.text(node),
        }
    }

    fn record_import(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.imported_name(n))
            .collect();
        self.summary.imports.extend(names);
    }

    fn record_from_import(&mut self, node: Node<'_>) {
        let module = node.child_by_field_name("module_name").map(|n| self.text(n)).unwrap_or_default();

        let mut cursor = node.walk();
        let mut names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.imported_name(n))
            .collect();

        let mut cursor = node.walk();
        if node.children(&mut cursor).any(|c| c.kind() == "wildcard_import") {
            names.push("*".to_string());
        }

        self.summary.imports.extend(names.into_iter().map(|name| format!("{}.{}", module, name)));
    }

    fn record_function(&mut self, node: Node<'_>) {
        let name = node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or_default();
        let args = node
            .child_by_field_name("parameters")
            .map(|params| self.positional_params(params))
            .unwrap_or_default();

        self.summary.functions.push(FunctionInfo {
            name,
            args,
            line: node.start_position().row + 1,
        });
    }

    /// Parameters before `*`, `*args` or `**kwargs`
    fn positional_params(&self, params: Node<'_>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = params.walk();

        for param in params.named_children(&mut cursor) {
            let name_node = match param.kind() {
                "identifier" => Some(param),
                "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
                "typed_parameter" => param.named_child(0),
                "positional_separator" => continue,
                _ => break,
            };

            match name_node {
                Some(n) if n.kind() == "identifier" => names.push(self.text(n)),
                _ => break,
            }
        }

        names
    }

    fn record_class(&mut self, node: Node<'_>) {
        let name = node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or_default();

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for item in body.named_children(&mut cursor) {
                let definition = match item.kind() {
                    "decorated_definition" => item.child_by_field_name("definition"),
                    _ => Some(item),
                };
                if let Some(def) = definition.filter(|d| d.kind() == "function_definition") {
                    if let Some(method) = def.child_by_field_name("name") {
                        methods.push(self.text(method));
                    }
                }
            }
        }

        self.summary.classes.push(ClassInfo { name, methods, line: node.start_position().row + 1 });
    }
}
