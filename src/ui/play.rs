//! Interactive terminal client: pick an item, pick an object, repeat.

use super::style;
use crate::app::Services;
use crate::game::TurnOutcome;
use anyhow::{Context, Result};
use dialoguer::FuzzySelect;

const QUIT: &str = "(quit)";
const BACK: &str = "(back)";

/// What the player chose at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Act { item: String, object: String },
    Quit,
}

pub fn render_outcome(outcome: &TurnOutcome) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&style::story(&outcome.story_text));
    out.push_str("\n\n");
    if let Some(url) = &outcome.image_url {
        out.push_str(&format!("{} {}\n", style::dim("Scene art:"), style::url(url)));
    }
    let inventory = if outcome.inventory.is_empty() {
        style::dim("(empty)")
    } else {
        outcome
            .inventory
            .iter()
            .map(style::item)
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push_str(&format!("{} {inventory}\n", style::header("Inventory:")));
    out
}

/// Blocking prompt: `None` when the player picked the escape entry.
fn pick(prompt: &str, options: &[String], escape: &str) -> Result<Option<String>> {
    let mut entries: Vec<&str> = options.iter().map(String::as_str).collect();
    entries.push(escape);

    let index = FuzzySelect::new()
        .with_prompt(prompt)
        .items(&entries)
        .default(0)
        .interact()
        .context("read selection")?;

    Ok(options.get(index).cloned())
}

fn prompt_choice(inventory: &[String], objects: &[String]) -> Result<Choice> {
    loop {
        let Some(item) = pick("Use which item?", inventory, QUIT)? else {
            return Ok(Choice::Quit);
        };
        if let Some(object) = pick(&format!("Use {item} on?"), objects, BACK)? {
            return Ok(Choice::Act { item, object });
        }
    }
}

/// Play one session in the terminal until the player quits.
pub async fn run_play(services: Services) -> Result<()> {
    println!("{}", style::header("Infinite Adventure"));
    println!("{}", style::dim("Generating the opening scene..."));

    let started = services.engine.start_session().await?;
    let session_id = started.session_id;
    tracing::debug!(session_id = session_id.as_str(), "terminal session started");

    let mut current = started.outcome;
    print!("{}", render_outcome(&current));

    loop {
        if current.inventory.is_empty() || current.objects.is_empty() {
            println!("{}", style::yellow("There is nothing left to do."));
            break;
        }

        let (inventory, objects) = (current.inventory.clone(), current.objects.clone());
        let choice = tokio::task::spawn_blocking(move || prompt_choice(&inventory, &objects))
            .await
            .context("prompt task failed")??;

        let Choice::Act { item, object } = choice else {
            break;
        };

        match services.engine.act(&session_id, &item, &object).await {
            Ok(outcome) => {
                print!("{}", render_outcome(&outcome));
                current = outcome;
            }
            Err(e) if e.is_retryable() => {
                println!("{}", style::yellow(format!("The narrator hesitates ({e}). Try again.")));
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", style::dim(format!("Session {session_id} saved.")));
    Ok(())
}
