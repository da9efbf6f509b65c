use anyhow::Result;
use calday_core::config::Settings;
use calday_core::store::EventStore;
use owo_colors::OwoColorize;

pub async fn run(store: &EventStore) -> Result<()> {
    let stored = store.load_settings().await;
    let effective = stored.clone().resolve()?;

    println!("{}", "Paths".bold());
    println!("  State:      {}", store.path().display());
    if let Some(folder) = effective.notes_folder_path() {
        println!("  Notes:      {}", folder.display());
    }
    if let Some(template) = effective.template_file() {
        println!("  Template:   {}", template.display());
    }

    println!();
    println!("{}", "Settings".bold());
    print!("{}", indent(&toml::to_string_pretty(&effective)?));

    if effective != stored {
        println!();
        println!("{}", "Some values are overridden by CALDAY_* environment variables".dimmed());
    }

    Ok(())
}

pub async fn set(store: &EventStore, key: &str, value: &str) -> Result<()> {
    let mut settings: Settings = store.load_settings().await;
    settings.set(key, value)?;
    store.save_settings(&settings).await?;

    println!("{} {} = {}", "✓".green(), key, value);
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {}\n", line)).collect()
}
