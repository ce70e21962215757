// dry-runモードのフォーマッター
//
// generateコマンドのdry-run出力をセクション単位で組み立てます。

use crate::core::schema::Action;
use crate::core::schema_diff::EntityChange;
use colored::Colorize;
use std::fmt::Write;

/// dry-run出力のフォーマッター
pub(crate) struct DryRunFormatter;

impl DryRunFormatter {
    /// dry-run出力全体をフォーマット
    pub fn format(
        migration_name: &str,
        up_sql: &str,
        down_sql: &str,
        changes: &[EntityChange],
    ) -> String {
        let mut output = String::new();

        Self::append_header(&mut output, migration_name);
        Self::append_rename_section(&mut output, changes);
        Self::append_destructive_section(&mut output, changes);
        Self::append_sql_section(&mut output, "UP SQL", up_sql);
        Self::append_sql_section(&mut output, "DOWN SQL", down_sql);
        Self::append_summary(&mut output, changes);

        output
    }

    fn append_header(output: &mut String, migration_name: &str) {
        let _ = writeln!(output, "{}", "=== Dry Run: Migration Preview ===".bold());
        let _ = writeln!(output, "Migration: {}", migration_name.cyan());
        let _ = writeln!(output);
    }

    fn append_rename_section(output: &mut String, changes: &[EntityChange]) {
        let renames: Vec<_> = changes
            .iter()
            .filter(|c| matches!(c.action, Action::Rename { .. }))
            .collect();
        if renames.is_empty() {
            return;
        }

        let _ = writeln!(output, "{}", "--- Renames ---".bold());
        for change in renames {
            if let Action::Rename { old_name } = &change.action {
                let scope = match &change.table {
                    Some(table) => format!(" {}", table.cyan()),
                    None => String::new(),
                };
                let _ = writeln!(
                    output,
                    "  {}{}: {} {} {}",
                    change.kind,
                    scope,
                    old_name,
                    "→".bold(),
                    change.name
                );
            }
        }
        let _ = writeln!(output);
    }

    fn append_destructive_section(output: &mut String, changes: &[EntityChange]) {
        let removed: Vec<_> = changes
            .iter()
            .filter(|c| c.action == Action::Remove)
            .collect();
        if removed.is_empty() {
            return;
        }

        let _ = writeln!(output, "{}", "⚠ Destructive Changes Detected".red().bold());
        for change in removed {
            let target = match &change.table {
                Some(table) => format!("{}.{}", table, change.name),
                None => change.name.clone(),
            };
            let _ = writeln!(
                output,
                "  {}",
                format!("DROP {}: {}", change.kind.to_string().to_uppercase(), target).red()
            );
        }
        let _ = writeln!(output);
    }

    fn append_sql_section(output: &mut String, label: &str, sql: &str) {
        let _ = writeln!(output, "{}", format!("--- {} ---", label).bold());
        let _ = writeln!(output, "{}", sql);
        let _ = writeln!(output);
    }

    fn append_summary(output: &mut String, changes: &[EntityChange]) {
        let _ = writeln!(output, "{}", "=== Summary ===".bold());
        let _ = writeln!(output, "{}", format!("Changes: {}", changes.len()).green());
        let _ = writeln!(output, "Files would be created: 2 (up.sql, down.sql)");
        let _ = writeln!(
            output,
            "\n{}",
            "No files were created (dry-run mode).".dimmed()
        );
    }
}
