use anyhow::Result;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::Render;

pub async fn run(ctx: &Context, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) => {
            let template = ctx.api.template(id).await?;
            println!("{}", template.render());
        }
        None => {
            let templates = ctx.api.templates().await?;
            if templates.is_empty() {
                println!("{}", "No templates".dimmed());
            }
            for template in &templates {
                println!("{:<12} {}", template.id, template.title);
            }
        }
    }

    Ok(())
}
