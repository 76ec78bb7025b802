//! Headless journal interface for scripts and automated tests.
//!
//! A line-oriented command protocol over a [`Journal`]. The first word names
//! the command; remaining fields are separated by `|`. Records are addressed
//! by any unique prefix of their id.
//!
//! # Example
//!
//! ```ignore
//! use craft_core::headless::HeadlessJournal;
//!
//! let mut session = HeadlessJournal::new(journal);
//! for line in session.handle_line("entry 泥坯 | Tall vase").await {
//!     println!("{line}");
//! }
//! ```

use crate::image::{encode_file, ImageError};
use crate::journal::{Journal, JournalError, View};
use crate::mode::{CraftMode, UnknownMode};
use crate::model::{CraftEntry, Material, ValidationError};
use crate::store::Store;
use crate::views::SearchFilter;
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// Help text printed by the `help` command.
pub const HELP: &str = "\
Commands (fields after the first word are separated by '|'):
  mode <slug-or-label>                        switch craft mode
  entry <stage> [| title [| memo [| image]]]  create an entry
  stage <id> <stage>                          change an entry's stage
  discard <id>                                mark an entry as discarded
  material <type> | <name> [| brand [| memo]] create a material
  quick <type> | <name> [| brand]             quick-add a material
  list [recent|wip|portfolio|inspirations|discarded|materials|users]
  search <query> [| stage]                    search titles and memos
  register <name> | <email> | <password>
  login <email> | <password>
  logout
  whoami
  help
  quit";

/// Errors from parsing or executing a command line.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("No entry or material matches id '{0}'")]
    NoMatch(String),

    #[error("Id prefix '{0}' is ambiguous")]
    Ambiguous(String),

    #[error("Material name is empty, nothing added")]
    EmptyName,

    #[error("{0}")]
    Mode(#[from] UnknownMode),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Image(#[from] ImageError),

    #[error("{0}")]
    Journal(#[from] JournalError),
}

/// Which list the `list` command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListTarget {
    #[default]
    Recent,
    InProgress,
    Portfolio,
    Inspirations,
    Discarded,
    Materials,
    Users,
}

impl FromStr for ListTarget {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "recent" => Ok(ListTarget::Recent),
            "wip" | "progress" => Ok(ListTarget::InProgress),
            "portfolio" => Ok(ListTarget::Portfolio),
            "inspirations" | "ideas" => Ok(ListTarget::Inspirations),
            "discarded" => Ok(ListTarget::Discarded),
            "materials" => Ok(ListTarget::Materials),
            "users" => Ok(ListTarget::Users),
            _ => Err(CommandError::Usage(
                "list [recent|wip|portfolio|inspirations|discarded|materials|users]",
            )),
        }
    }
}

/// A parsed headless command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mode(CraftMode),
    Entry {
        stage: String,
        title: String,
        memo: String,
        image: Option<String>,
    },
    Stage {
        id: String,
        stage: String,
    },
    Discard {
        id: String,
    },
    Material {
        type_id: String,
        name: String,
        brand: String,
        memo: String,
    },
    Quick {
        type_id: String,
        name: String,
        brand: String,
    },
    List(ListTarget),
    Search {
        query: String,
        stage: Option<String>,
    },
    Register {
        name: String,
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    WhoAmI,
    Help,
    Quit,
}

/// Split `|`-separated fields, trimming each. Always yields at least one field.
fn fields(rest: &str) -> Vec<String> {
    rest.split('|').map(|f| f.trim().to_string()).collect()
}

fn field(fields: &[String], index: usize) -> String {
    fields.get(index).cloned().unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word.to_lowercase().as_str() {
            "mode" => Ok(Command::Mode(rest.parse()?)),
            "entry" => {
                let f = fields(rest);
                let stage = non_empty(field(&f, 0))
                    .ok_or(CommandError::Usage("entry <stage> [| title [| memo [| image]]]"))?;
                Ok(Command::Entry {
                    stage,
                    title: field(&f, 1),
                    memo: field(&f, 2),
                    image: non_empty(field(&f, 3)),
                })
            }
            "stage" => match rest.split_once(char::is_whitespace) {
                Some((id, stage)) if !stage.trim().is_empty() => Ok(Command::Stage {
                    id: id.to_string(),
                    stage: stage.trim().to_string(),
                }),
                _ => Err(CommandError::Usage("stage <id> <stage>")),
            },
            "discard" if !rest.is_empty() => Ok(Command::Discard {
                id: rest.to_string(),
            }),
            "discard" => Err(CommandError::Usage("discard <id>")),
            "material" | "quick" => {
                let f = fields(rest);
                let type_id = field(&f, 0);
                if type_id.is_empty() || f.len() < 2 {
                    return Err(CommandError::Usage(if word.eq_ignore_ascii_case("quick") {
                        "quick <type> | <name> [| brand]"
                    } else {
                        "material <type> | <name> [| brand [| memo]]"
                    }));
                }
                if word.eq_ignore_ascii_case("quick") {
                    Ok(Command::Quick {
                        type_id,
                        name: field(&f, 1),
                        brand: field(&f, 2),
                    })
                } else {
                    Ok(Command::Material {
                        type_id,
                        name: field(&f, 1),
                        brand: field(&f, 2),
                        memo: field(&f, 3),
                    })
                }
            }
            "list" | "ls" => Ok(Command::List(rest.parse()?)),
            "search" => {
                let f = fields(rest);
                Ok(Command::Search {
                    query: field(&f, 0),
                    stage: non_empty(field(&f, 1)),
                })
            }
            "register" => {
                let f = fields(rest);
                if f.len() != 3 {
                    return Err(CommandError::Usage("register <name> | <email> | <password>"));
                }
                Ok(Command::Register {
                    name: field(&f, 0),
                    email: field(&f, 1),
                    password: field(&f, 2),
                })
            }
            "login" => {
                let f = fields(rest);
                if f.len() != 2 {
                    return Err(CommandError::Usage("login <email> | <password>"));
                }
                Ok(Command::Login {
                    email: field(&f, 0),
                    password: field(&f, 1),
                })
            }
            "logout" => Ok(Command::Logout),
            "whoami" => Ok(Command::WhoAmI),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Short display form of an id.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// One-line summary of an entry.
pub fn format_entry(entry: &CraftEntry) -> String {
    let mut line = format!("{}  [{}]  {}", short_id(&entry.id), entry.stage, entry.title);
    let materials = entry.material_count();
    if materials > 0 {
        let _ = write!(line, "  ({materials} materials)");
    }
    if !entry.images.is_empty() {
        let _ = write!(line, "  +{} img", entry.images.len());
    }
    line
}

/// One-line summary of a material.
pub fn format_material(material: &Material) -> String {
    if material.brand.is_empty() {
        format!("{}  <{}>  {}", short_id(&material.id), material.type_id, material.name)
    } else {
        format!(
            "{}  <{}>  {} / {}",
            short_id(&material.id),
            material.type_id,
            material.name,
            material.brand
        )
    }
}

/// A headless session driving a journal.
pub struct HeadlessJournal<S: Store> {
    journal: Journal<S>,
    done: bool,
}

impl<S: Store> HeadlessJournal<S> {
    pub fn new(journal: Journal<S>) -> Self {
        Self {
            journal,
            done: false,
        }
    }

    pub fn journal(&self) -> &Journal<S> {
        &self.journal
    }

    pub fn into_journal(self) -> Journal<S> {
        self.journal
    }

    /// True once `quit` has been handled.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Parse and execute one line, rendering errors as `error: ...` lines.
    ///
    /// Blank lines and `#` comments produce no output.
    pub async fn handle_line(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Vec::new();
        }
        let result = match line.parse::<Command>() {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| vec![format!("error: {e}")])
    }

    /// Execute a parsed command, returning the output lines.
    pub async fn execute(&mut self, command: Command) -> Result<Vec<String>, CommandError> {
        let journal = &mut self.journal;
        match command {
            Command::Mode(mode) => {
                journal.switch_mode(mode)?;
                Ok(vec![format!(
                    "mode: {} ({} entries, {} materials)",
                    mode.label(),
                    journal.entries().len(),
                    journal.materials().len()
                )])
            }
            Command::Entry {
                stage,
                title,
                memo,
                image,
            } => {
                let image = image.map(encode_file).transpose()?;
                journal.begin_entry(image);
                let Some(editor) = journal.entry_editor_mut() else {
                    return Ok(Vec::new());
                };
                if !editor.set_stage(&stage) {
                    let mode = editor.mode();
                    journal.cancel_entry();
                    return Err(ValidationError::UnknownStage { mode, stage }.into());
                }
                editor.set_title(title);
                editor.set_memo(memo);
                let Some(entry) = journal.confirm_entry().await? else {
                    return Ok(Vec::new());
                };
                let mut lines = vec![format!("created {}", format_entry(entry))];
                if let Some(insight) = &entry.ai_insights {
                    lines.push(format!("insight: {insight}"));
                }
                Ok(lines)
            }
            Command::Stage { id, stage } => {
                let id = resolve_entry(journal, &id)?;
                journal.edit_entry(&id)?;
                let Some(editor) = journal.entry_editor_mut() else {
                    return Ok(Vec::new());
                };
                if !editor.set_stage(&stage) {
                    let mode = editor.mode();
                    journal.cancel_entry();
                    return Err(ValidationError::UnknownStage { mode, stage }.into());
                }
                match journal.confirm_entry().await? {
                    Some(entry) => Ok(vec![format!("updated {}", format_entry(entry))]),
                    None => Ok(Vec::new()),
                }
            }
            Command::Discard { id } => {
                let id = resolve_entry(journal, &id)?;
                journal.edit_entry(&id)?;
                match journal.discard_entry().await? {
                    Some(entry) => Ok(vec![format!("discarded {}", format_entry(entry))]),
                    None => Ok(Vec::new()),
                }
            }
            Command::Material {
                type_id,
                name,
                brand,
                memo,
            } => {
                journal.begin_material();
                let Some(editor) = journal.material_editor_mut() else {
                    return Ok(Vec::new());
                };
                if !editor.set_type(&type_id) {
                    let mode = journal.mode();
                    journal.cancel_material();
                    return Err(ValidationError::UnknownMaterialType { mode, type_id }.into());
                }
                editor.name = name;
                editor.brand = brand;
                editor.memo = memo;
                match journal.confirm_material()? {
                    Some(material) => Ok(vec![format!("created {}", format_material(material))]),
                    None => {
                        journal.cancel_material();
                        Err(CommandError::EmptyName)
                    }
                }
            }
            Command::Quick {
                type_id,
                name,
                brand,
            } => match journal.quick_add_material(&type_id, &name, &brand)? {
                Some(material) => Ok(vec![format!("added {}", format_material(&material))]),
                None => Err(CommandError::EmptyName),
            },
            Command::List(target) => Ok(list(journal, target)),
            Command::Search { query, stage } => {
                let mut filter = SearchFilter::new(query);
                if let Some(stage) = stage {
                    let def = journal.mode().config().stage(&stage).ok_or_else(|| {
                        ValidationError::UnknownStage {
                            mode: journal.mode(),
                            stage: stage.clone(),
                        }
                    })?;
                    filter = filter.with_stage(def.value);
                }
                journal.set_search_query(filter.query.clone());
                journal.set_stage_filter(filter.stage.clone());
                journal.set_view(View::Search);
                let results = journal.search_results();
                let mut lines = vec![format!("{} result(s)", results.len())];
                lines.extend(results.into_iter().map(format_entry));
                Ok(lines)
            }
            Command::Register {
                name,
                email,
                password,
            } => {
                let user = journal.register_user(&name, &email, &password)?;
                Ok(vec![format!("registered {} <{}>", user.name, user.email)])
            }
            Command::Login { email, password } => {
                let user = journal.login_user(&email, &password)?;
                Ok(vec![format!("logged in as {}", user.name)])
            }
            Command::Logout => {
                journal.logout_user()?;
                Ok(vec!["logged out".to_string()])
            }
            Command::WhoAmI => Ok(vec![match journal.current_user() {
                Some(user) => format!("{} <{}>", user.name, user.email),
                None => "not logged in".to_string(),
            }]),
            Command::Help => Ok(HELP.lines().map(str::to_string).collect()),
            Command::Quit => {
                self.done = true;
                Ok(vec!["bye".to_string()])
            }
        }
    }
}

/// Resolve a unique id prefix against the active mode's entries.
fn resolve_entry<S: Store>(journal: &Journal<S>, prefix: &str) -> Result<String, CommandError> {
    let mut matches = journal
        .entries()
        .iter()
        .filter(|e| e.id.starts_with(prefix))
        .map(|e| e.id.clone());
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (Some(_), Some(_)) => Err(CommandError::Ambiguous(prefix.to_string())),
        (None, _) => Err(CommandError::NoMatch(prefix.to_string())),
    }
}

fn list<S: Store>(journal: &Journal<S>, target: ListTarget) -> Vec<String> {
    let entries = match target {
        ListTarget::Recent => journal.recent(),
        ListTarget::InProgress => journal.in_progress(),
        ListTarget::Portfolio => journal.portfolio(),
        ListTarget::Inspirations => journal.inspirations(),
        ListTarget::Discarded => journal.discarded(),
        ListTarget::Materials => {
            let config = journal.mode().config();
            let mut lines = Vec::new();
            for material_type in config.material_types {
                let materials = journal.materials_of_type(material_type.id);
                if materials.is_empty() {
                    continue;
                }
                lines.push(format!("{} ({})", material_type.label, materials.len()));
                lines.extend(materials.into_iter().map(|m| format!("  {}", format_material(m))));
            }
            if lines.is_empty() {
                lines.push("(no materials)".to_string());
            }
            return lines;
        }
        ListTarget::Users => {
            let current = journal.current_user().map(|u| u.id.as_str());
            let lines: Vec<String> = journal
                .users()
                .iter()
                .map(|u| {
                    let marker = if Some(u.id.as_str()) == current { '*' } else { ' ' };
                    format!("{marker} {} <{}>", u.name, u.email)
                })
                .collect();
            if lines.is_empty() {
                return vec!["(no accounts)".to_string()];
            }
            return lines;
        }
    };
    if entries.is_empty() {
        return vec!["(empty)".to_string()];
    }
    entries.into_iter().map(format_entry).collect()
}
