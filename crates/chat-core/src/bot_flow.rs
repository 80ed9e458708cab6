//! Scripted pre-chat bot.
//!
//! The flow is a tagged state enum driven by a pure transition function:
//!
//! ```text
//! RoleChoice ─customer→ Welcome → AskName → AskPhone → AskLanguage → DepartmentSelection → Chat
//!      └─────agent────→ AgentHandoff
//! ```
//!
//! Every state except `Chat` can go back to `RoleChoice`, which discards
//! the collected answers. Bad answers keep the state and add a re-prompt.
//! Bot lines are local only and never reach the repository.

use chat_types::{
    identity::ViewerRole,
    language::{find_language, Language, SUPPORTED_LANGUAGES},
    message::SenderType,
    session::{CustomerContact, Department},
    ChatError, Result,
};

const MIN_PHONE_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    RoleChoice,
    Welcome,
    AskName,
    AskPhone,
    AskLanguage,
    DepartmentSelection,
    /// Terminal: the customer is handed to session resolution.
    Chat { department: Department },
    /// Terminal: the visitor is an agent and goes to the login screen.
    AgentHandoff,
}

impl BotState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BotState::Chat { .. } | BotState::AgentHandoff)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BotInput {
    ChooseRole(ViewerRole),
    /// The welcome screen's "start" button.
    Continue,
    Text(String),
    PickLanguage(Language),
    PickDepartment(Department),
    BackToRoleChoice,
}

/// Why an input did not advance the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reprompt {
    EmptyName,
    InvalidPhone,
    UnknownLanguage,
    UnknownDepartment,
}

impl Reprompt {
    pub fn text(&self) -> &'static str {
        match self {
            Reprompt::EmptyName => "Please enter your name so the agent knows who they are talking to.",
            Reprompt::InvalidPhone => {
                "That doesn't look like a phone number. Use digits, spaces, +, - or parentheses, at least 6 digits."
            }
            Reprompt::UnknownLanguage => "Sorry, I don't know that language. Please pick one from the list.",
            Reprompt::UnknownDepartment => "Please choose the Doctor or Payments department.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Advance(BotState),
    Stay(Reprompt),
}

/// Transition table. `Err` means the input makes no sense in this state
/// (a UI bug rather than a user mistake).
pub fn next_state(state: BotState, input: &BotInput) -> Result<Transition> {
    use BotState::*;

    if *input == BotInput::BackToRoleChoice {
        return match state {
            Chat { .. } => Err(invalid(state, input)),
            _ => Ok(Transition::Advance(RoleChoice)),
        };
    }

    let transition = match (state, input) {
        (RoleChoice, BotInput::ChooseRole(ViewerRole::Customer)) => Transition::Advance(Welcome),
        (RoleChoice, BotInput::ChooseRole(ViewerRole::Agent)) => Transition::Advance(AgentHandoff),
        (Welcome, BotInput::Continue | BotInput::Text(_)) => Transition::Advance(AskName),
        (AskName, BotInput::Text(name)) => match normalize_name(name) {
            Some(_) => Transition::Advance(AskPhone),
            None => Transition::Stay(Reprompt::EmptyName),
        },
        (AskPhone, BotInput::Text(phone)) => match normalize_phone(phone) {
            Some(_) => Transition::Advance(AskLanguage),
            None => Transition::Stay(Reprompt::InvalidPhone),
        },
        (AskLanguage, BotInput::PickLanguage(lang)) if lang.is_supported() => {
            Transition::Advance(DepartmentSelection)
        }
        (AskLanguage, BotInput::PickLanguage(_)) => Transition::Stay(Reprompt::UnknownLanguage),
        (AskLanguage, BotInput::Text(text)) => match parse_language(text) {
            Some(_) => Transition::Advance(DepartmentSelection),
            None => Transition::Stay(Reprompt::UnknownLanguage),
        },
        (DepartmentSelection, BotInput::PickDepartment(department)) => {
            Transition::Advance(Chat { department: *department })
        }
        (DepartmentSelection, BotInput::Text(text)) => match parse_department(text) {
            Some(department) => Transition::Advance(Chat { department }),
            None => Transition::Stay(Reprompt::UnknownDepartment),
        },
        _ => return Err(invalid(state, input)),
    };
    Ok(transition)
}

fn invalid(state: BotState, input: &BotInput) -> ChatError {
    ChatError::InvalidTransition(format!("{:?} does not accept {:?}", state, input))
}

pub fn normalize_name(input: &str) -> Option<String> {
    let name = input.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

/// Digits plus the usual separators, with at least six digits.
pub fn normalize_phone(input: &str) -> Option<String> {
    let phone = input.trim();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (allowed && digits >= MIN_PHONE_DIGITS).then(|| phone.to_string())
}

/// Accepts a code ("es"), an English name ("Spanish") or a native name ("Español").
pub fn parse_language(input: &str) -> Option<Language> {
    let wanted = input.trim();
    if wanted.is_empty() {
        return None;
    }
    if let Some(info) = find_language(wanted) {
        return Some(Language::new(info.code));
    }
    SUPPORTED_LANGUAGES
        .iter()
        .find(|info| info.name.eq_ignore_ascii_case(wanted) || info.native_name.to_lowercase() == wanted.to_lowercase())
        .map(|info| Language::new(info.code))
}

fn parse_department(input: &str) -> Option<Department> {
    let wanted = input.trim();
    Department::all()
        .iter()
        .copied()
        .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
}

/// A line in the local pre-chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct BotLine {
    /// `bot-<n>` for bot prompts, `you-<n>` for the visitor's answers.
    pub id: String,
    pub sender_type: SenderType,
    pub text: String,
    /// Bot prompts are authored in English; answers have no fixed language.
    pub language: Option<Language>,
}

/// Answers collected by the time the flow reaches `Chat`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreChatProfile {
    pub name: String,
    pub phone: String,
    pub language: Language,
    pub department: Department,
}

impl PreChatProfile {
    pub fn contact(&self) -> CustomerContact {
        CustomerContact {
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotFlow {
    state: BotState,
    name: Option<String>,
    phone: Option<String>,
    language: Option<Language>,
    transcript: Vec<BotLine>,
    next_bot_id: u64,
    next_answer_id: u64,
}

impl Default for BotFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl BotFlow {
    pub fn new() -> Self {
        let mut flow = Self {
            state: BotState::RoleChoice,
            name: None,
            phone: None,
            language: None,
            transcript: Vec::new(),
            next_bot_id: 0,
            next_answer_id: 0,
        };
        flow.prompt_for_state();
        flow
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn transcript(&self) -> &[BotLine] {
        &self.transcript
    }

    /// Language picked so far, used to translate the bot's prompts.
    pub fn selected_language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Feed one input. Returns the new state.
    pub fn handle(&mut self, input: BotInput) -> Result<BotState> {
        let transition = next_state(self.state, &input)?;

        if input == BotInput::BackToRoleChoice {
            *self = Self::new();
            return Ok(self.state);
        }

        if let Some(echo) = answer_echo(&input) {
            self.push_answer(echo);
        }

        match transition {
            Transition::Stay(reprompt) => {
                self.push_bot(reprompt.text().to_string());
            }
            Transition::Advance(next) => {
                self.record_answer(&input);
                self.state = next;
                self.prompt_for_state();
            }
        }
        Ok(self.state)
    }

    /// The collected answers, once the flow has reached `Chat`.
    pub fn profile(&self) -> Option<PreChatProfile> {
        match self.state {
            BotState::Chat { department } => Some(PreChatProfile {
                name: self.name.clone()?,
                phone: self.phone.clone()?,
                language: self.language.clone()?,
                department,
            }),
            _ => None,
        }
    }

    fn record_answer(&mut self, input: &BotInput) {
        match (self.state, input) {
            (BotState::AskName, BotInput::Text(text)) => self.name = normalize_name(text),
            (BotState::AskPhone, BotInput::Text(text)) => self.phone = normalize_phone(text),
            (BotState::AskLanguage, BotInput::PickLanguage(lang)) => self.language = Some(lang.clone()),
            (BotState::AskLanguage, BotInput::Text(text)) => self.language = parse_language(text),
            _ => {}
        }
    }

    fn prompt_for_state(&mut self) {
        let text = match self.state {
            BotState::RoleChoice => "Hi! Are you a customer looking for help, or a support agent?".to_string(),
            BotState::Welcome => {
                "Welcome to Live Chat support! I'll ask a few quick questions before connecting you.".to_string()
            }
            BotState::AskName => "What's your name?".to_string(),
            BotState::AskPhone => match &self.name {
                Some(name) => format!("Thanks, {}. What phone number can we reach you on?", name),
                None => "What phone number can we reach you on?".to_string(),
            },
            BotState::AskLanguage => "Which language would you like to chat in?".to_string(),
            BotState::DepartmentSelection => {
                "Please select a department to start chatting with the next available agent.".to_string()
            }
            BotState::Chat { department } => {
                format!("Connecting you to the {} department...", department.label())
            }
            BotState::AgentHandoff => "Please sign in with your agent account.".to_string(),
        };
        self.push_bot(text);
    }

    fn push_bot(&mut self, text: String) {
        let id = format!("bot-{}", self.next_bot_id);
        self.next_bot_id += 1;
        self.transcript.push(BotLine {
            id,
            sender_type: SenderType::Bot,
            text,
            language: Some(Language::english()),
        });
    }

    fn push_answer(&mut self, text: String) {
        let id = format!("you-{}", self.next_answer_id);
        self.next_answer_id += 1;
        self.transcript.push(BotLine {
            id,
            sender_type: SenderType::Customer,
            text,
            language: None,
        });
    }
}

fn answer_echo(input: &BotInput) -> Option<String> {
    match input {
        BotInput::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        BotInput::PickLanguage(lang) => Some(lang.native_name().to_string()),
        BotInput::PickDepartment(department) => Some(department.label().to_string()),
        BotInput::ChooseRole(ViewerRole::Customer) => Some("I'm a customer".to_string()),
        BotInput::ChooseRole(ViewerRole::Agent) => Some("I'm an agent".to_string()),
        _ => None,
    }
}
