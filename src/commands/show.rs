use anyhow::Result;
use calday_core::description::trim_boilerplate;
use calday_core::engine::Engine;

use crate::render::Render;

pub async fn run(engine: &Engine, uid: &str, json: bool) -> Result<()> {
    let Some(mut event) = engine.find(uid).await else {
        anyhow::bail!("No event with UID '{}'", uid);
    };

    if engine.settings().trim_teams_links {
        event.description = trim_boilerplate(&event.description);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
    } else {
        println!("{}", event.render());
    }

    Ok(())
}
