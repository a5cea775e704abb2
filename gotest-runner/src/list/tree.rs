// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutputFormat, Position, PositionId, PositionKind};
use owo_colors::{OwoColorize, Style};
use serde::{Serialize, Serializer};
use std::{collections::HashMap, io};
use tracing::debug;

/// An ordered hierarchy of [`Position`]s.
///
/// Positions are stored in an arena and refer to each other by index, so the
/// tree never holds references into the parser's syntax tree or back to its
/// own parents. Child order is source order.
#[derive(Clone, Debug)]
pub struct PositionTree {
    nodes: Vec<PositionNode>,
    by_id: HashMap<PositionId, usize>,
    styles: Box<TreeStyles>,
}

#[derive(Clone, Debug)]
struct PositionNode {
    position: Position,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl PositionTree {
    /// Creates a tree containing only `root`.
    pub fn new(root: Position) -> Self {
        let mut by_id = HashMap::new();
        by_id.insert(root.id.clone(), 0);
        Self {
            nodes: vec![PositionNode {
                position: root,
                parent: None,
                children: Vec::new(),
            }],
            by_id,
            styles: Box::default(),
        }
    }

    /// Creates a directory tree whose children are the given file trees.
    pub fn from_dir(dir: Position, files: impl IntoIterator<Item = PositionTree>) -> Self {
        let mut tree = Self::new(dir);
        for file_tree in files {
            tree.graft(0, &file_tree, 0);
        }
        tree
    }

    /// Colorizes human-readable output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Returns the root position.
    pub fn root(&self) -> &Position {
        &self.nodes[0].position
    }

    /// Returns the number of positions in the tree, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree contains at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the position with the given id.
    pub fn get(&self, id: &PositionId) -> Option<&Position> {
        self.by_id.get(id).map(|&index| &self.nodes[index].position)
    }

    /// Returns the children of the given position, in source order.
    pub fn children(&self, id: &PositionId) -> impl Iterator<Item = &Position> + '_ {
        let children = match self.by_id.get(id) {
            Some(&index) => self.nodes[index].children.as_slice(),
            None => &[],
        };
        children.iter().map(|&index| &self.nodes[index].position)
    }

    /// Returns the ancestors of the given position, nearest first.
    ///
    /// The position itself is not included.
    pub fn ancestors(&self, id: &PositionId) -> impl Iterator<Item = &Position> + '_ {
        let mut next = self
            .by_id
            .get(id)
            .and_then(|&index| self.nodes[index].parent);
        std::iter::from_fn(move || {
            let index = next?;
            next = self.nodes[index].parent;
            Some(&self.nodes[index].position)
        })
    }

    /// Iterates over every position in pre-order (parents before children, siblings in source
    /// order).
    pub fn iter(&self) -> impl Iterator<Item = &Position> + '_ {
        self.iter_from(0)
    }

    /// Returns a new tree rooted at the given position, or `None` if it isn't in this tree.
    pub fn subtree(&self, id: &PositionId) -> Option<PositionTree> {
        let &index = self.by_id.get(id)?;
        let mut subtree = PositionTree::new(self.nodes[index].position.clone());
        for &child in &self.nodes[index].children {
            subtree.graft(0, self, child);
        }
        Some(subtree)
    }

    /// Outputs this tree to the given writer.
    pub fn write(&self, output_format: OutputFormat, writer: impl io::Write) -> io::Result<()> {
        match output_format {
            OutputFormat::Human { verbose } => self.write_human(writer, verbose),
            OutputFormat::Serializable(format) => format
                .write_document(self, writer)
                .map_err(io::Error::other),
        }
    }

    /// Outputs this tree as a string with the given format.
    pub fn to_string(&self, output_format: OutputFormat) -> io::Result<String> {
        let mut buf = Vec::with_capacity(1024);
        self.write(output_format, &mut buf)?;
        String::from_utf8(buf).map_err(io::Error::other)
    }

    // ---
    // Helper methods
    // ---

    /// Appends `position` as the last child of the node at `parent`.
    ///
    /// Returns `None`, leaving the tree unchanged, if a position with the same
    /// id already exists. This happens when two source names normalize to the
    /// same string.
    pub(crate) fn push(&mut self, parent: usize, position: Position) -> Option<usize> {
        if self.by_id.contains_key(&position.id) {
            debug!(id = %position.id, "skipping position with duplicate id");
            return None;
        }
        let index = self.nodes.len();
        self.by_id.insert(position.id.clone(), index);
        self.nodes.push(PositionNode {
            position,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        Some(index)
    }

    pub(crate) fn position_at(&self, index: usize) -> &Position {
        &self.nodes[index].position
    }

    /// Copies the subtree at `other_index` in `other` under `parent` in `self`.
    fn graft(&mut self, parent: usize, other: &PositionTree, other_index: usize) {
        let mut stack = vec![(parent, other_index)];
        while let Some((parent, other_index)) = stack.pop() {
            let node = &other.nodes[other_index];
            let Some(new_index) = self.push(parent, node.position.clone()) else {
                continue;
            };
            // Push in reverse so children are inserted in source order.
            for &child in node.children.iter().rev() {
                stack.push((new_index, child));
            }
        }
    }

    fn iter_from(&self, start: usize) -> impl Iterator<Item = &Position> + '_ {
        let mut stack = vec![start];
        std::iter::from_fn(move || {
            let index = stack.pop()?;
            stack.extend(self.nodes[index].children.iter().rev());
            Some(&self.nodes[index].position)
        })
    }

    fn depth(&self, mut index: usize) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.nodes[index].parent {
            depth += 1;
            index = parent;
        }
        depth
    }

    fn write_human(&self, mut writer: impl io::Write, verbose: bool) -> io::Result<()> {
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            stack.extend(self.nodes[index].children.iter().rev());
            let position = &self.nodes[index].position;
            let indent = "  ".repeat(self.depth(index));
            match position.kind {
                PositionKind::Dir | PositionKind::File => {
                    writeln!(writer, "{indent}{}:", position.path.style(self.styles.path))?;
                }
                PositionKind::Namespace | PositionKind::Test => {
                    write!(
                        writer,
                        "{indent}{}",
                        position.name.style(self.styles.test_name)
                    )?;
                    if verbose {
                        write!(writer, " {} {}", "id:".style(self.styles.field), position.id)?;
                    }
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }

    fn serialize_node(&self, index: usize) -> SerializedPosition<'_> {
        let node = &self.nodes[index];
        SerializedPosition {
            position: &node.position,
            children: node
                .children
                .iter()
                .map(|&child| self.serialize_node(child))
                .collect(),
        }
    }
}

/// Host-facing nested form of a tree: each position with its children inline.
#[derive(Serialize)]
struct SerializedPosition<'a> {
    #[serde(flatten)]
    position: &'a Position,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<SerializedPosition<'a>>,
}

impl Serialize for PositionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize_node(0).serialize(serializer)
    }
}

#[derive(Clone, Debug, Default)]
struct TreeStyles {
    path: Style,
    test_name: Style,
    field: Style,
}

impl TreeStyles {
    fn colorize(&mut self) {
        self.path = Style::new().magenta().bold();
        self.test_name = Style::new().blue().bold();
        self.field = Style::new().yellow().bold();
    }
}
