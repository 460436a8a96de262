use anyhow::{anyhow, Result};
use bat::WrappingMode;
use console::style;

use ait::presenter::{ViewBody, ViewModel};

pub fn markdown(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("failed to render output: {}", e))?;
    println!();
    Ok(())
}

/// Draw a presenter view. Loading views are drawn by the spinner instead.
pub fn view(view: &ViewModel) -> Result<()> {
    match &view.body {
        ViewBody::Loading { .. } => Ok(()),
        ViewBody::Result {
            original_text,
            result_text,
        } => {
            println!("{}", style(&view.title).bold().green());
            println!("{}", style(original_text).dim());
            println!();
            markdown(result_text)
        }
        ViewBody::Error { message } => {
            println!("{} {}", style(&view.title).bold().red(), message);
            Ok(())
        }
    }
}
