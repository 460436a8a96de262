use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use ait::coordinator::{Coordinator, OriginId, SettingsOpener};
use ait::page::PageContext;
use ait::presenter::{PresenterState, ViewAction, ViewModel};
use ait::providers::factory::StoreResolver;
use ait::selection::{ApplyOutcome, ElementKind, TextDocument};
use ait::store::{load_instruction_set, ConfigStore};
use anyhow::{anyhow, bail, Context, Result};
use cliclack::spinner;
use console::style;

use crate::render;

const ORIGIN: &str = "terminal";

struct TerminalSettingsOpener;

impl SettingsOpener for TerminalSettingsOpener {
    fn open_settings(&self, _origin: &OriginId) {
        eprintln!("Run `ait configure` to change provider settings.");
    }
}

/// The text as a single-element document plus the state after one request.
pub struct Processed {
    pub document: TextDocument,
    pub page: PageContext<TextDocument>,
}

impl Processed {
    pub fn view(&self) -> Option<ViewModel> {
        self.page.view()
    }

    pub fn accept(&mut self) -> ApplyOutcome {
        self.page.accept(&mut self.document)
    }

    pub fn text(&self) -> &str {
        self.document.text(0).unwrap_or_default()
    }
}

/// Run one instruction over `text` through the same page and background
/// pipeline a browser tab uses, with both sides in this process.
pub async fn process(
    store: Arc<dyn ConfigStore>,
    instruction_id: &str,
    text: &str,
    editable: bool,
) -> Result<Processed> {
    let set = load_instruction_set(store.as_ref()).await?;
    let instruction = set
        .find(instruction_id)
        .ok_or_else(|| anyhow!("Unknown instruction: {}", instruction_id))?;

    let mut document = TextDocument::new();
    let kind = if editable {
        ElementKind::TextArea
    } else {
        ElementKind::Paragraph
    };
    let element = document.push(kind, text);
    document.select_all(element);

    // A terminal sends exactly one trigger, so there is nothing to debounce.
    let coordinator = Coordinator::with_debounce(
        Arc::new(StoreResolver::new(store)),
        Arc::new(TerminalSettingsOpener),
        Duration::ZERO,
    );
    let origin = OriginId::from(ORIGIN);
    let mut from_background = coordinator.connect(origin.clone());
    let (to_background, mut outbound) = tokio::sync::mpsc::unbounded_channel();
    let mut page = PageContext::new(to_background);

    page.handle(&document, instruction.trigger(text));
    while let Ok(envelope) = outbound.try_recv() {
        coordinator.dispatch(&origin, envelope);
    }

    if matches!(page.state(), PresenterState::Loading { .. }) {
        let reply = from_background
            .recv()
            .await
            .context("background closed before replying")?;
        page.handle(&document, reply);
    }
    coordinator.shutdown();

    Ok(Processed { document, page })
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

pub async fn execute(
    store: Arc<dyn ConfigStore>,
    instruction_id: &str,
    text: Option<String>,
    editable: bool,
    apply: bool,
) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => read_stdin()?,
    };
    if text.trim().is_empty() {
        bail!("Nothing to process, the text is empty");
    }

    let spin = spinner();
    spin.start(format!("Running {}...", instruction_id));
    let result = process(store, instruction_id, &text, editable).await;
    spin.stop("");
    let mut processed = result?;

    let Some(view) = processed.view() else {
        bail!("The request was dismissed");
    };
    render::view(&view)?;
    if let PresenterState::Error { message } = processed.page.state() {
        bail!("{}", message);
    }

    if !view.has_action(ViewAction::Replace) {
        return Ok(());
    }
    let replace = apply
        || cliclack::confirm("Replace the original text with this result?")
            .initial_value(false)
            .interact()?;
    if !replace {
        return Ok(());
    }

    match processed.accept() {
        ApplyOutcome::Applied => {
            println!("{}", processed.text());
            Ok(())
        }
        outcome => {
            eprintln!("{}", style(format!("Could not apply the result: {:?}", outcome)).yellow());
            Ok(())
        }
    }
}
