//! Dispatch from parsed commands to service calls, plus text rendering.

use crate::cli::{Command, ItemCommand, SectionCommand, StoreCommand};
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use grocery_core::{
    GroceryService, ImportStep, JsonStateRepository, KvRepository, LoadReport, StateRepository,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Runs one command against the records in `kv`.
///
/// Imported records are written before the service opens, so they pass
/// through the normal load and migration path.
pub(crate) fn run<K: KvRepository>(
    kv: &K,
    command: Command,
    prompter: &mut impl Prompter,
    out: &mut impl Write,
) -> Result<()> {
    let imported = match &command {
        Command::Import { file } => Some(import_file(kv, file)?),
        _ => None,
    };

    let (mut service, report) = GroceryService::open(JsonStateRepository::new(kv))?;
    describe_load(&report, out)?;

    match command {
        Command::List { hide_completed } => {
            service.set_hide_completed(hide_completed);
            render_items(&service, out)
        }
        Command::Store { command } => run_store(&mut service, command, prompter, out),
        Command::Section { command } => run_section(&mut service, command, prompter, out),
        Command::Item { command } => run_item(&mut service, command, out),
        Command::Paste {
            lines,
            file,
            no_prompt,
        } => {
            let mut text = lines.join("\n");
            if let Some(path) = file {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                text.push('\n');
                text.push_str(&contents);
            }

            let mut import = service.begin_paste(&text);
            while let ImportStep::NeedsSection(request) = import.next_step() {
                let choice = if no_prompt {
                    None
                } else {
                    prompter.choose_section(&request)?
                };
                import.resolve(request.token, choice.as_deref())?;
            }
            let report = import.commit()?;

            writeln!(
                out,
                "Added {} item(s), {} needed a section.",
                report.items_added, report.prompted
            )?;
            for section in &report.sections_added {
                writeln!(out, "New section: {section}")?;
            }
            render_items(&service, out)
        }
        Command::Cache => {
            for (name, section) in service.item_sections() {
                writeln!(out, "{name} -> {section}")?;
            }
            Ok(())
        }
        Command::Export { output } => {
            let records = service.repository().export_records()?;
            let json = serde_json::to_string_pretty(&records)?;
            match output {
                Some(path) => std::fs::write(&path, json + "\n")
                    .with_context(|| format!("failed to write `{}`", path.display()))?,
                None => writeln!(out, "{json}")?,
            }
            Ok(())
        }
        Command::Import { .. } => {
            writeln!(out, "Imported {} record(s).", imported.unwrap_or_default())?;
            render_stores(&service, out)
        }
    }
}

fn import_file<K: KvRepository>(kv: &K, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    let records: BTreeMap<String, Value> = serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not a JSON object", path.display()))?;
    Ok(JsonStateRepository::new(kv).import_records(&records)?)
}

fn describe_load(report: &LoadReport, out: &mut impl Write) -> Result<()> {
    if report.legacy_items_migrated > 0 {
        writeln!(
            out,
            "Moved {} item(s) from the old single list into the first store.",
            report.legacy_items_migrated
        )?;
    }
    if report.repaired {
        writeln!(out, "Saved data was inconsistent and has been repaired.")?;
    }
    Ok(())
}

fn run_store<R: StateRepository>(
    service: &mut GroceryService<R>,
    command: StoreCommand,
    prompter: &mut impl Prompter,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        StoreCommand::List => {}
        StoreCommand::Select { index } => service.select_store(index)?,
        StoreCommand::Add { name } => {
            if service.add_store(&name)?.is_none() {
                writeln!(out, "Store name is empty; nothing added.")?;
            }
        }
        StoreCommand::Rename { name } => {
            if !service.rename_store(&name)? {
                writeln!(out, "Store name unchanged.")?;
            }
        }
        StoreCommand::Delete { yes } => {
            let name = service.active_store().name.clone();
            if !yes && !prompter.confirm(&format!("Delete store \"{name}\"?"))? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            service.delete_store()?;
            writeln!(out, "Deleted store \"{name}\".")?;
        }
    }
    render_stores(service, out)
}

fn run_section<R: StateRepository>(
    service: &mut GroceryService<R>,
    command: SectionCommand,
    prompter: &mut impl Prompter,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        SectionCommand::List => {}
        SectionCommand::Add { name } => {
            if !service.add_section(&name)? {
                writeln!(out, "Section name is empty; nothing added.")?;
            }
        }
        SectionCommand::Move { index, direction } => {
            if !service.move_section(index, direction.into())? {
                writeln!(out, "Section is already at that end of the list.")?;
            }
        }
        SectionCommand::Edit { index, name } => {
            if !service.edit_section(index, &name)? {
                writeln!(out, "Section name unchanged.")?;
            }
        }
        SectionCommand::Delete { index, yes } => {
            let Some(name) = service.active_store().sections.get(index).cloned() else {
                // Let the service report the range error.
                service.delete_section(index)?;
                return Ok(());
            };
            let fallback = service.active_store().fallback_section();
            let question = format!(
                "Delete section \"{name}\"? Items in this section will move to \"{fallback}\"."
            );
            if !yes && !prompter.confirm(&question)? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            let deletion = service.delete_section(index)?;
            writeln!(
                out,
                "Deleted \"{}\"; {} item(s) moved to \"{}\".",
                deletion.removed, deletion.reassigned_items, deletion.fallback
            )?;
        }
    }
    render_sections(service, out)
}

fn run_item<R: StateRepository>(
    service: &mut GroceryService<R>,
    command: ItemCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        ItemCommand::Add { name, section } => {
            // Without a choice the first section in aisle order is used.
            let section = section.unwrap_or_else(|| {
                let store = service.active_store();
                store
                    .sections
                    .first()
                    .cloned()
                    .unwrap_or_else(|| store.fallback_section())
            });
            service.add_item(&name, &section)?;
        }
        ItemCommand::Toggle { index } => {
            service.toggle_complete(index)?;
        }
        ItemCommand::Delete { index } => {
            let removed = service.delete_item(index)?;
            writeln!(out, "Removed {}.", removed.name)?;
        }
        ItemCommand::Section { index, section } => {
            if !service.edit_item_section(index, &section)? {
                writeln!(out, "Item is already in \"{section}\".")?;
            }
        }
        ItemCommand::Move { from, to } => {
            service.reorder_item(from, to)?;
        }
    }
    render_items(service, out)
}

fn render_stores<R: StateRepository>(
    service: &GroceryService<R>,
    out: &mut impl Write,
) -> Result<()> {
    for (index, store) in service.stores().iter().enumerate() {
        let marker = if index == service.current_store_index() {
            '*'
        } else {
            ' '
        };
        writeln!(
            out,
            "{marker} [{index}] {} ({} items)",
            store.name,
            store.items.len()
        )?;
    }
    Ok(())
}

fn render_sections<R: StateRepository>(
    service: &GroceryService<R>,
    out: &mut impl Write,
) -> Result<()> {
    let store = service.active_store();
    writeln!(out, "Sections of {}:", store.name)?;
    for (index, section) in store.sections.iter().enumerate() {
        writeln!(out, "  [{index}] {section}")?;
    }
    Ok(())
}

fn render_items<R: StateRepository>(
    service: &GroceryService<R>,
    out: &mut impl Write,
) -> Result<()> {
    let store = service.active_store();
    writeln!(out, "{}:", store.name)?;
    let visible = service.visible_items();
    if visible.is_empty() {
        writeln!(out, "  (nothing to buy)")?;
    }
    for (index, item) in visible {
        let check = if item.completed { 'x' } else { ' ' };
        writeln!(out, "  [{index}] [{check}] {} ({})", item.name, item.section)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::cli::{Command, ItemCommand, SectionCommand};
    use crate::prompt::LinePrompter;
    use grocery_core::{GroceryService, JsonStateRepository, MemoryKvRepository};
    use std::io::Cursor;

    fn reopen(kv: &MemoryKvRepository) -> GroceryService<JsonStateRepository<&MemoryKvRepository>> {
        GroceryService::open(JsonStateRepository::new(kv))
            .expect("open service")
            .0
    }

    #[test]
    fn paste_prompts_then_lists_sorted_items() {
        let kv = MemoryKvRepository::new();
        let mut prompter = LinePrompter::new(Cursor::new("Produce\n"), Vec::new());
        let mut out = Vec::new();

        let command = Command::Paste {
            lines: vec!["milk".to_string(), "kiwi".to_string()],
            file: None,
            no_prompt: false,
        };
        run(&kv, command, &mut prompter, &mut out).expect("run command");

        let shown = String::from_utf8(out).expect("utf-8 output");
        assert!(shown.contains("Added 2 item(s), 1 needed a section."));
        let kiwi = shown.find("Kiwi (Produce)").expect("kiwi listed");
        let milk = shown.find("Milk (Dairy)").expect("milk listed");
        assert!(kiwi < milk);
    }

    #[test]
    fn declined_confirmation_keeps_section() {
        let kv = MemoryKvRepository::new();
        let sections_before = reopen(&kv).active_store().sections.clone();
        let mut prompter = LinePrompter::new(Cursor::new("n\n"), Vec::new());
        let mut out = Vec::new();

        let command = Command::Section {
            command: SectionCommand::Delete {
                index: 0,
                yes: false,
            },
        };
        run(&kv, command, &mut prompter, &mut out).expect("run command");

        assert_eq!(reopen(&kv).active_store().sections, sections_before);
        assert!(String::from_utf8(out).expect("utf-8 output").contains("Cancelled."));
    }

    #[test]
    fn item_add_defaults_to_first_section() {
        let kv = MemoryKvRepository::new();
        let mut prompter = LinePrompter::new(Cursor::new(""), Vec::new());
        let mut out = Vec::new();

        let command = Command::Item {
            command: ItemCommand::Add {
                name: "Tape".to_string(),
                section: None,
            },
        };
        run(&kv, command, &mut prompter, &mut out).expect("run command");

        assert_eq!(reopen(&kv).active_store().items[0].section, "Electronics");
    }
}
