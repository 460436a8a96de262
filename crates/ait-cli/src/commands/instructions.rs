use ait::instructions::Instruction;
use ait::store::{load_instruction_set, save_instruction_set, ConfigStore};
use anyhow::Result;
use console::style;

pub async fn add_instruction(
    store: &dyn ConfigStore,
    title: &str,
    instruction: &str,
) -> Result<Instruction> {
    let mut set = load_instruction_set(store).await?;
    let added = set.add_custom(title, instruction)?;
    save_instruction_set(store, set).await?;
    Ok(added)
}

pub async fn remove_instruction(store: &dyn ConfigStore, id: &str) -> Result<Instruction> {
    let mut set = load_instruction_set(store).await?;
    let removed = set.remove_custom(id)?;
    save_instruction_set(store, set).await?;
    Ok(removed)
}

pub async fn list(store: &dyn ConfigStore) -> Result<()> {
    let set = load_instruction_set(store).await?;
    for instruction in set.all() {
        let kind = if instruction.is_builtin() {
            style("built-in").dim()
        } else {
            style("custom").cyan()
        };
        println!(
            "{:<20} {:<24} {}",
            style(&instruction.id).bold(),
            instruction.title,
            kind
        );
    }
    Ok(())
}

pub async fn add(store: &dyn ConfigStore, title: &str, instruction: &str) -> Result<()> {
    let added = add_instruction(store, title, instruction).await?;
    println!("Added {} as {}", added.title, style(&added.id).bold());
    Ok(())
}

pub async fn remove(store: &dyn ConfigStore, id: &str) -> Result<()> {
    let removed = remove_instruction(store, id).await?;
    println!("Removed {}", removed.title);
    Ok(())
}
