//! Edit batches
//!
//! [`TableEditor`] owns the document. An edit batch runs against a copy of the
//! tree; the post-fixers then repair the copy until it settles, and only then
//! does the copy replace the document. A failure anywhere leaves the document
//! as it was.

use crate::commands::{CommandOutcome, TableCommand};
use crate::config::TableConfig;
use crate::heading_refresh::{HeadingRefresher, Reconversion};
use crate::post_fixers::{default_post_fixers, run_post_fixers, PostFixer};
use crate::Result;
use doc_model::{DocumentTree, Writer};
use tracing::{debug, warn};

/// The table editing engine: document state plus the batch pipeline
#[derive(Debug)]
pub struct TableEditor {
    /// Current document tree
    tree: DocumentTree,
    config: TableConfig,
    post_fixers: Vec<Box<dyn PostFixer>>,
    heading_refresher: HeadingRefresher,
    /// Heading re-renders queued by committed batches
    reconversions: Vec<Reconversion>,
}

impl TableEditor {
    /// Create an editor over an empty document
    pub fn new() -> Self {
        Self::with_tree(DocumentTree::default())
    }

    /// Create an editor over an existing document
    pub fn with_tree(tree: DocumentTree) -> Self {
        Self::with_config(tree, TableConfig::default())
    }

    pub fn with_config(mut tree: DocumentTree, config: TableConfig) -> Self {
        tree.reset_differ();
        let mut heading_refresher = HeadingRefresher::new();
        heading_refresher.prime(&tree);
        Self {
            tree,
            post_fixers: default_post_fixers(&config),
            config,
            heading_refresher,
            reconversions: Vec::new(),
        }
    }

    /// Get the current document tree
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Add a fixer that runs after the built-in ones
    pub fn register_post_fixer(&mut self, fixer: Box<dyn PostFixer>) {
        self.post_fixers.push(fixer);
    }

    /// Run `edit` as one batch and commit the repaired result.
    ///
    /// Returns whatever `edit` returns. On error the document is unchanged.
    pub fn change<T>(&mut self, edit: impl FnOnce(&mut Writer<'_>) -> Result<T>) -> Result<T> {
        let mut draft = self.tree.clone();
        draft.reset_differ();

        let (value, passes) = {
            let mut writer = Writer::new(&mut draft);
            let value = edit(&mut writer)?;
            let passes = run_post_fixers(&mut writer, &self.post_fixers, self.config.post_fixer_iteration_limit)?;
            (value, passes)
        };

        let changes = draft.take_changes();
        let reconversions = self.heading_refresher.refresh(&draft, &changes);
        draft.document.increment_version();
        debug!(
            changes = changes.len(),
            passes,
            reconversions = reconversions.len(),
            version = draft.document.version(),
            "Committed edit batch"
        );

        self.reconversions.extend(reconversions);
        self.tree = draft;
        Ok(value)
    }

    /// Run a command if it is enabled
    pub fn execute(&mut self, command: &dyn TableCommand) -> Result<CommandOutcome> {
        if !command.is_enabled(&self.tree) {
            debug!(command = command.display_name(), "Command not applicable");
            return Ok(CommandOutcome::NotApplicable);
        }
        let config = self.config.clone();
        let result = self.change(|writer| command.execute(writer, &config));
        if let Err(e) = &result {
            warn!(command = command.display_name(), "Command failed: {}", e);
        }
        result.map(|()| CommandOutcome::Applied)
    }

    pub fn is_enabled(&self, command: &dyn TableCommand) -> bool {
        command.is_enabled(&self.tree)
    }

    /// Hand out the heading re-renders queued since the last call
    pub fn take_reconversions(&mut self) -> Vec<Reconversion> {
        std::mem::take(&mut self.reconversions)
    }
}

impl Default for TableEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{InsertTable, MergeCell, SetHeadingRows};
    use crate::merge::MergeDirection;
    use crate::test_support::{cell_at, grid};
    use crate::TableError;
    use doc_model::{Run, TableBuilder};

    fn editor_with(rows: Vec<Vec<&str>>) -> (TableEditor, doc_model::NodeId) {
        let mut tree = DocumentTree::new();
        let root = tree.root_id();
        let table = Writer::new(&mut tree)
            .insert_fragment(&TableBuilder::new(rows).build(), root, None)
            .unwrap();
        (TableEditor::with_tree(tree), table)
    }

    #[test]
    fn test_insert_table_uses_configured_size() {
        let mut editor = TableEditor::with_config(
            DocumentTree::new(),
            TableConfig {
                default_rows: 3,
                default_columns: 4,
                ..TableConfig::default()
            },
        );
        let outcome = editor.execute(&InsertTable::default()).unwrap();
        assert_eq!(outcome, CommandOutcome::Applied);

        let table = editor.tree().tables()[0];
        assert_eq!(grid(editor.tree(), table), vec!["[] [] [] []"; 3]);
        assert_eq!(editor.tree().document.version(), 1);
    }

    #[test]
    fn test_failed_batch_leaves_document_untouched() {
        let (mut editor, table) = editor_with(vec![vec!["a", "b"]]);
        let before = editor.tree().outline(table);

        let result = editor.change(|writer| {
            let row = writer.tree().table_rows(table)[0];
            writer.remove(row)?;
            Err::<(), _>(TableError::InvalidCount {
                operation: "test",
                count: 0,
            })
        });
        assert!(result.is_err());
        assert_eq!(editor.tree().outline(table), before);
        assert_eq!(editor.tree().document.version(), 0);
    }

    #[test]
    fn test_batch_is_post_fixed_before_commit() {
        let (mut editor, table) = editor_with(vec![vec!["a", "b"], vec!["c", "d"]]);
        editor
            .change(|writer| {
                let d = cell_at(writer.tree(), table, 1, 1);
                writer.remove_children(d)?;
                writer.insert(Run::new("loose"), d, None)?;
                let b = cell_at(writer.tree(), table, 0, 1);
                writer.remove(b)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(grid(editor.tree(), table), vec!["a []", "c loose"]);
        assert!(editor.tree().differ().is_empty());
    }

    #[test]
    fn test_disabled_command_is_not_applicable() {
        let (mut editor, table) = editor_with(vec![vec!["a"], vec!["b"]]);
        let a = cell_at(editor.tree(), table, 0, 0);
        let merge_left = MergeCell {
            cell: a,
            direction: MergeDirection::Left,
        };
        assert!(!editor.is_enabled(&merge_left));
        assert_eq!(editor.execute(&merge_left).unwrap(), CommandOutcome::NotApplicable);
        assert_eq!(editor.tree().document.version(), 0);
    }

    #[test]
    fn test_heading_change_queues_reconversions() {
        let (mut editor, table) = editor_with(vec![vec!["a", "b"], vec!["c", "d"]]);
        editor.execute(&SetHeadingRows { table, count: 1 }).unwrap();
        let reconversions = editor.take_reconversions();
        assert_eq!(reconversions.len(), 3);
        assert!(editor.take_reconversions().is_empty());
    }

    #[derive(Debug)]
    struct AlwaysFixing;

    impl PostFixer for AlwaysFixing {
        fn name(&self) -> &'static str {
            "always"
        }

        fn fix(&self, _writer: &mut Writer<'_>) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_unsettled_fixers_abort_batch() {
        let (mut editor, table) = editor_with(vec![vec!["a"]]);
        editor.register_post_fixer(Box::new(AlwaysFixing));
        let result = editor.execute(&SetHeadingRows { table, count: 1 });
        assert!(matches!(result, Err(TableError::PostFixersDidNotSettle { .. })));
        assert_eq!(editor.tree().get_table(table).unwrap().heading_rows(), 0);
    }
}
