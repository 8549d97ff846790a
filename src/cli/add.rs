//! `ivcompat add` command
//!
//! Interactive entry of compatibility pairs. This is also what runs when
//! `ivcompat` is started without a subcommand.
//!
//! # Flow
//! 1. Pick the base drug (A) once
//! 2. For each partner drug (B): enter route values, accept or edit the
//!    generated note, give a source, review, then save / edit / cancel
//! 3. Saved entries are written under both A and B and the whole document
//!    is persisted immediately
//!
//! Typing the stop word (default `stop`) at any prompt ends the session.
//! Entries that were not confirmed are never written.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use thiserror::Error;

use super::prompt::{PromptError, Prompter};
use crate::config::Config;
use crate::core::compat::{CompatibilityRecord, PairEntry, Route};
use crate::core::document::{self, Document, DocumentError};
use crate::core::note;
use crate::core::resolver::{self, Lookup, Resolver};
use crate::core::store::{DocumentStore, StoreError};

#[derive(Args, Debug, Default)]
pub struct AddArgs {}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("save failed, entry was not recorded: {0}")]
    Save(#[from] StoreError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// User declined to add more pairs
    Finished { saved: usize },
    /// Stop word or end of input
    Stopped { saved: usize },
}

enum ReviewChoice {
    Save,
    Edit,
    Cancel,
}

pub fn run(_args: AddArgs, config: &Config) -> Result<()> {
    let store = DocumentStore::new(config.data_path());
    let mut doc = store.load();

    let stdin = io::stdin();
    let prompter = Prompter::new(stdin.lock(), io::stdout(), config.entry.stop_word.clone());
    let mut session = EntrySession::new(config, &store, prompter);

    match session.run(&mut doc)? {
        SessionEnd::Finished { saved } => {
            println!("👋 Session finished ({} pair(s) saved).", saved);
        }
        SessionEnd::Stopped { .. } => {
            println!("\n{}\n", "🛑 Stopped by user — all safe and saved.".red());
        }
    }

    Ok(())
}

/// One interactive entry session over a loaded document
pub struct EntrySession<'a, R, W> {
    config: &'a Config,
    store: &'a DocumentStore,
    resolver: Resolver,
    prompt: Prompter<R, W>,
    saved: usize,
}

impl<'a, R: BufRead, W: Write> EntrySession<'a, R, W> {
    pub fn new(config: &'a Config, store: &'a DocumentStore, prompt: Prompter<R, W>) -> Self {
        Self {
            config,
            store,
            resolver: Resolver::new(&config.resolver),
            prompt,
            saved: 0,
        }
    }

    /// Run until the user finishes or stops
    ///
    /// `doc` only changes when a save succeeds.
    pub fn run(&mut self, doc: &mut Document) -> Result<SessionEnd, SessionError> {
        match self.entries(doc) {
            Ok(()) => Ok(SessionEnd::Finished { saved: self.saved }),
            Err(SessionError::Prompt(PromptError::Stopped)) => {
                Ok(SessionEnd::Stopped { saved: self.saved })
            }
            Err(e) => Err(e),
        }
    }

    pub fn into_prompter(self) -> Prompter<R, W> {
        self.prompt
    }

    fn entries(&mut self, doc: &mut Document) -> Result<(), SessionError> {
        self.prompt.say(format!("\n{}", "💊 IV Compatibility Manager — Ready".magenta()))?;
        self.prompt
            .say(format!("📦 Currently tracking {} drugs", doc.drug_count()).yellow())?;
        self.prompt.say("────────────────────────────────────────\n".magenta())?;

        let drug_a = self.ask_drug_name("Enter first drug name: ", doc)?;
        self.prompt.say(format!("\n📌 First drug set as: {}", drug_a).yellow())?;
        self.prompt
            .say("💡 You can add multiple pairings with this base drug.\n".yellow())?;

        loop {
            let prompt = format!(
                "Enter second drug name (or '{}' to exit): ",
                self.config.entry.stop_word
            );
            let drug_b = self.ask_drug_name(&prompt, doc)?;

            if drug_b == drug_a {
                self.prompt
                    .say(format!("⚠️  {} is paired with itself.", drug_a).yellow())?;
            }
            if let Some(existing) = doc.get_pair(&drug_a, &drug_b) {
                let notice = format!(
                    "ℹ️  Existing entry will be replaced on save:\n   {}",
                    existing.notes
                );
                self.prompt.say(notice.yellow())?;
            }

            let Some(entry) = self.compose_entry(&drug_a, &drug_b)? else {
                self.prompt.say("❌ Entry cancelled.\n".red())?;
                continue;
            };

            self.commit(doc, &drug_a, &drug_b, entry)?;

            let another = format!("➕ Add another with same {}? (y/n): ", shorten(&drug_a));
            if !self.prompt.confirm(another.cyan())? {
                self.prompt.say("")?;
                return Ok(());
            }
        }
    }

    /// Collect values, note and source until saved or cancelled
    fn compose_entry(
        &mut self,
        drug_a: &str,
        drug_b: &str,
    ) -> Result<Option<PairEntry>, SessionError> {
        loop {
            let compatibility = self.ask_compatibility()?;

            let auto_note = note::generate(&compatibility, Some(drug_a));
            self.prompt
                .say(format!("\n{}\n{}", "📝 Auto-generated note:".cyan(), auto_note))?;
            let manual = self
                .prompt
                .ask("\nPress Enter to accept or type a custom note: ".yellow())?;
            let notes = if manual.is_empty() { auto_note } else { manual };

            let source_prompt = format!(
                "\n📚 Source (default '{}'): ",
                self.config.entry.default_source
            );
            let source = self.prompt.ask(source_prompt.cyan())?;
            let source = if source.is_empty() {
                self.config.entry.default_source.clone()
            } else {
                source
            };

            let entry = PairEntry::new(compatibility, notes, source);
            self.review(drug_a, drug_b, &entry)?;

            match self.ask_review_choice()? {
                ReviewChoice::Save => return Ok(Some(entry)),
                ReviewChoice::Cancel => return Ok(None),
                ReviewChoice::Edit => {
                    self.prompt
                        .say("\n🔁 Re-entering compatibility details...\n".yellow())?;
                }
            }
        }
    }

    /// Save to a staged copy; adopt it only once the write succeeded
    fn commit(
        &mut self,
        doc: &mut Document,
        drug_a: &str,
        drug_b: &str,
        entry: PairEntry,
    ) -> Result<(), SessionError> {
        let mut staged = doc.clone();
        staged.insert_pair(drug_a, drug_b, entry.normalized())?;

        if let Err(e) = self.store.save(&mut staged) {
            self.prompt
                .say(format!("❌ Could not save {}: {}", self.store.path().display(), e).red())?;
            return Err(e.into());
        }

        *doc = staged;
        self.saved += 1;
        self.prompt.say("✅ Data saved successfully.\n".green())?;
        Ok(())
    }

    fn ask_drug_name(&mut self, prompt: &str, doc: &Document) -> Result<String, SessionError> {
        let names = doc.drug_names();

        loop {
            let input = self.prompt.ask(prompt.cyan())?;
            if input.is_empty() {
                self.prompt.say("❌ Drug name cannot be empty.".red())?;
                continue;
            }
            if document::is_reserved(&input) {
                self.prompt
                    .say(format!("❌ '{}' is reserved and cannot be a drug name.", input).red())?;
                continue;
            }

            match self.resolver.lookup(&input, &names) {
                Lookup::Candidates(candidates) => {
                    return self.pick_candidate(&input, &candidates, &names);
                }
                Lookup::Suggestion(suggestion) => {
                    let question = format!("Did you mean '{}'? (y/n): ", suggestion);
                    if self.prompt.confirm(question.yellow())? {
                        return Ok(suggestion);
                    }
                    return Ok(input);
                }
                Lookup::NoMatch => return Ok(input),
            }
        }
    }

    fn pick_candidate(
        &mut self,
        input: &str,
        candidates: &[String],
        names: &[&str],
    ) -> Result<String, SessionError> {
        self.prompt.say(format!("\n{}", "💡 Suggestions:".yellow()))?;
        for (i, candidate) in candidates.iter().enumerate() {
            let number = format!("{}.", i + 1);
            self.prompt
                .say(format!("{} {}", number.yellow(), highlight(candidate, input)))?;
        }

        loop {
            let choice = self
                .prompt
                .ask("Select number or press Enter to keep your input: ".green())?;
            if choice.is_empty() {
                // Keep the input, but reuse the stored spelling when only the case differs
                let name = resolver::canonical(input, names).unwrap_or(input);
                return Ok(name.to_string());
            }
            match choice.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => {
                    return Ok(candidates[n - 1].clone());
                }
                _ => {
                    let hint = format!(
                        "❌ Enter a number from 1 to {} or press Enter.",
                        candidates.len()
                    );
                    self.prompt.say(hint.red())?;
                }
            }
        }
    }

    fn ask_compatibility(&mut self) -> Result<CompatibilityRecord, SessionError> {
        let legend = self
            .config
            .entry
            .choices
            .iter()
            .map(|(code, value)| format!("{} = {}", code, value))
            .collect::<Vec<_>>()
            .join("   ");

        self.prompt
            .say(format!("\n{}", "⚗️  Enter Compatibility Values (Enter = No Data)\n".cyan()))?;
        self.prompt.say(format!("{}   (Enter = No Data)\n", legend).yellow())?;

        let mut record = CompatibilityRecord::new();
        for route in Route::ENTRY_ORDER {
            loop {
                let answer = self.prompt.ask(format!("{}: ", route.label()).green())?;
                match self.config.parse_choice(&answer) {
                    Some(value) => {
                        record.set(route, value);
                        break;
                    }
                    None => {
                        self.prompt.say(
                            "❌ Invalid entry. Enter one of the codes above or press Enter for No Data."
                                .red(),
                        )?;
                    }
                }
            }
        }

        Ok(record)
    }

    fn review(
        &mut self,
        drug_a: &str,
        drug_b: &str,
        entry: &PairEntry,
    ) -> Result<(), SessionError> {
        self.prompt
            .say(format!("\n{}", "────────────────────────────────────────".magenta()))?;
        self.prompt.say("🧾  Review Entry Before Saving".magenta())?;
        self.prompt.say("────────────────────────────────────────".magenta())?;
        self.prompt.say(format!("💊 Drug A: {}", drug_a).cyan())?;
        self.prompt.say(format!("💊 Drug B: {}\n", drug_b).cyan())?;
        for route in Route::ENTRY_ORDER {
            self.prompt.say(format!(
                "{}: {}",
                format!("{:<12}", route.label()).green(),
                entry.compatibility.get(route)
            ))?;
        }
        self.prompt.say(format!("\n📝 Note: {}", entry.notes))?;
        self.prompt.say(format!("📚 Source: {}", entry.source))?;
        self.prompt.say("────────────────────────────────────────".magenta())?;
        Ok(())
    }

    fn ask_review_choice(&mut self) -> Result<ReviewChoice, SessionError> {
        loop {
            let answer = self
                .prompt
                .ask("Confirm and save? (y = yes / e = edit / c = cancel): ".yellow())?
                .to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(ReviewChoice::Save),
                "e" | "edit" => return Ok(ReviewChoice::Edit),
                "c" | "cancel" => return Ok(ReviewChoice::Cancel),
                _ => self.prompt.say("❌ Enter y, e or c.".red())?,
            }
        }
    }
}

/// Emphasize the part of `name` that matched the query
fn highlight(name: &str, query: &str) -> String {
    match resolver::match_range(name, query) {
        Some(range) => format!(
            "{}{}{}",
            &name[..range.start],
            name[range.clone()].cyan().bold(),
            &name[range.end..]
        ),
        None => name.to_string(),
    }
}

/// Long names are cut for the "add another" prompt
fn shorten(name: &str) -> String {
    if name.chars().count() > 40 {
        let head: String = name.chars().take(35).collect();
        format!("{}…", head)
    } else {
        name.to_string()
    }
}
