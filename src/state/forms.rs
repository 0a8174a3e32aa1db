//! Modal forms: one generic field editor plus the per-form conversions into
//! API payloads.

use std::fmt;
use tennis_api::phases::PhaseCatalog;
use tennis_api::recorder::MatchDraft;
use tennis_api::roster::Roster;
use tennis_api::{
    Credentials, NewPlayer, NewReferee, NewTournament, Referee, RefereeId, TeamId, TeamSignup,
    TournamentId, UserType, parse_timestamp,
};

const LEVEL_RANGE: (i64, i64) = (1, 10);

pub const EMAIL: &str = "Email";
pub const PASSWORD: &str = "Password";
pub const ROLE: &str = "Role";
pub const NAME: &str = "Name";
pub const LAST_NAME: &str = "Last name";
pub const FISCAL_CODE: &str = "Fiscal code";
pub const LEVEL: &str = "Level";
pub const EDITION: &str = "Edition";
pub const START_DATE: &str = "Start date";
pub const END_DATE: &str = "End date";
pub const MIN_LEVEL: &str = "Min player level";
pub const MIN_REFEREE_LEVEL: &str = "Min referee level";
pub const COURT_TYPE: &str = "Court type";
pub const PHASE: &str = "Phase";
pub const PLAYER_1: &str = "Player 1";
pub const PLAYER_2: &str = "Player 2";
pub const REFEREE: &str = "Referee";
pub const MATCH_DATE: &str = "Date";
pub const COURT_NUMBER: &str = "Court";
pub const SCORE: &str = "Score";
pub const WINNER: &str = "Winner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    Required(&'static str),
    NotNumeric(&'static str),
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    InvalidDate(&'static str),
    EndBeforeStart,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Required(field) => write!(f, "{field} is required"),
            FormError::NotNumeric(field) => write!(f, "{field} must be a number"),
            FormError::OutOfRange { field, min, max } => {
                write!(f, "{field} must be between {min} and {max}")
            }
            FormError::InvalidDate(field) => write!(f, "{field} must be a date (YYYY-MM-DD)"),
            FormError::EndBeforeStart => write!(f, "The end date is before the start date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }

    fn placeholder(label: &str) -> Self {
        Self::new("", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Number,
    /// Free text; `hint` is shown while the field is empty.
    Date { hint: &'static str },
    Choice(Vec<Choice>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    selected: usize,
}

impl FormField {
    fn new(label: &'static str, kind: FieldKind) -> Self {
        let mut field = Self { label, kind, value: String::new(), selected: 0 };
        field.sync_choice();
        field
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Text as shown in the form.
    pub fn display(&self) -> String {
        match &self.kind {
            FieldKind::Secret => "*".repeat(self.value.chars().count()),
            FieldKind::Date { hint } if self.value.is_empty() => format!("({hint})"),
            FieldKind::Choice(choices) => choices
                .get(self.selected)
                .map(|c| format!("< {} >", c.label))
                .unwrap_or_else(|| "< none >".to_string()),
            _ => self.value.clone(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice(_))
    }

    pub fn selected_label(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Choice(choices) => choices.get(self.selected).map(|c| c.label.as_str()),
            _ => None,
        }
    }

    fn sync_choice(&mut self) {
        if let FieldKind::Choice(choices) = &self.kind {
            self.value = choices
                .get(self.selected)
                .map(|c| c.value.clone())
                .unwrap_or_default();
        }
    }

    fn cycle(&mut self, forward: bool) {
        let FieldKind::Choice(choices) = &self.kind else {
            return;
        };
        if choices.is_empty() {
            return;
        }
        let len = choices.len();
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
        self.sync_choice();
    }

    /// Replace the options, keeping the current value when it is still offered.
    fn set_choices(&mut self, choices: Vec<Choice>) {
        self.selected = choices
            .iter()
            .position(|c| c.value == self.value)
            .unwrap_or(0);
        self.kind = FieldKind::Choice(choices);
        self.sync_choice();
    }

    fn push_char(&mut self, c: char) {
        match self.kind {
            FieldKind::Choice(_) => {}
            FieldKind::Number if !(c.is_ascii_digit() || (c == '-' && self.value.is_empty())) => {}
            _ => self.value.push(c),
        }
    }

    fn backspace(&mut self) {
        if !self.is_choice() {
            self.value.pop();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    TeamSignup,
    RefereeSignup,
    CreateTournament,
    RecordMatch { tournament_id: TournamentId },
    AddPlayer { team_id: TeamId },
    RefereeScore { referee_id: RefereeId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self { kind, title: title.into(), fields, focus: 0, error: None }
    }

    pub fn login() -> Self {
        Self::new(
            FormKind::Login,
            "Login",
            vec![
                FormField::new(EMAIL, FieldKind::Text),
                FormField::new(PASSWORD, FieldKind::Secret),
                FormField::new(
                    ROLE,
                    FieldKind::Choice(
                        [UserType::Team, UserType::Referee, UserType::Admin]
                            .into_iter()
                            .map(|t| Choice::new(t.as_str(), t.as_str()))
                            .collect(),
                    ),
                ),
            ],
        )
    }

    pub fn team_signup() -> Self {
        Self::new(
            FormKind::TeamSignup,
            "Register team",
            vec![
                FormField::new(NAME, FieldKind::Text),
                FormField::new(EMAIL, FieldKind::Text),
                FormField::new(PASSWORD, FieldKind::Secret),
            ],
        )
    }

    pub fn referee_signup() -> Self {
        Self::new(
            FormKind::RefereeSignup,
            "Register referee",
            vec![
                FormField::new(NAME, FieldKind::Text),
                FormField::new(LAST_NAME, FieldKind::Text),
                FormField::new(EMAIL, FieldKind::Text),
                FormField::new(PASSWORD, FieldKind::Secret),
                FormField::new(FISCAL_CODE, FieldKind::Text),
                FormField::new(LEVEL, FieldKind::Number).with_value("1"),
            ],
        )
    }

    pub fn create_tournament() -> Self {
        let courts = vec![
            Choice::placeholder("select a court type"),
            Choice::new("hard", "Hard court"),
            Choice::new("clay", "Clay court"),
            Choice::new("grass", "Grass court"),
        ];
        Self::new(
            FormKind::CreateTournament,
            "New tournament",
            vec![
                FormField::new(NAME, FieldKind::Text),
                FormField::new(EDITION, FieldKind::Text),
                FormField::new(START_DATE, FieldKind::Date { hint: "YYYY-MM-DD" }),
                FormField::new(END_DATE, FieldKind::Date { hint: "YYYY-MM-DD" }),
                FormField::new(MIN_LEVEL, FieldKind::Number).with_value("1"),
                FormField::new(MIN_REFEREE_LEVEL, FieldKind::Number).with_value("1"),
                FormField::new(COURT_TYPE, FieldKind::Choice(courts)),
            ],
        )
    }

    /// Match entry bound to the tournament's phases, roster and referees.
    pub fn record_match(
        tournament_id: TournamentId,
        catalog: &PhaseCatalog,
        roster: &Roster,
        referees: &[Referee],
    ) -> Self {
        let phases = std::iter::once(Choice::placeholder("select a phase"))
            .chain(
                catalog
                    .options()
                    .into_iter()
                    .map(|(id, name)| Choice::new(id.to_string(), name)),
            )
            .collect();
        let players: Vec<Choice> = std::iter::once(Choice::placeholder("select a player"))
            .chain(roster.entries.iter().map(|e| {
                Choice::new(e.player.id.to_string(), format!("{} (#{})", e.player.name, e.player.id))
            }))
            .collect();
        let referee_choices = std::iter::once(Choice::placeholder("select a referee"))
            .chain(
                referees
                    .iter()
                    .map(|r| Choice::new(r.id.to_string(), r.full_name())),
            )
            .collect();

        let mut phase = FormField::new(PHASE, FieldKind::Choice(phases));
        if let Some(selected) = catalog.selected_id() {
            phase.value = selected.to_string();
            if let FieldKind::Choice(choices) = phase.kind.clone() {
                phase.set_choices(choices);
            }
        }

        let mut form = Self::new(
            FormKind::RecordMatch { tournament_id },
            "Record match",
            vec![
                phase,
                FormField::new(PLAYER_1, FieldKind::Choice(players.clone())),
                FormField::new(PLAYER_2, FieldKind::Choice(players)),
                FormField::new(REFEREE, FieldKind::Choice(referee_choices)),
                FormField::new(MATCH_DATE, FieldKind::Date { hint: "now" }),
                FormField::new(COURT_NUMBER, FieldKind::Number),
                FormField::new(SCORE, FieldKind::Text),
                FormField::new(WINNER, FieldKind::Choice(vec![])),
            ],
        );
        form.refresh_winner_choices();
        form
    }

    pub fn add_player(team_id: TeamId) -> Self {
        Self::new(
            FormKind::AddPlayer { team_id },
            "Add player",
            vec![
                FormField::new(NAME, FieldKind::Text),
                FormField::new(LEVEL, FieldKind::Number).with_value("1"),
            ],
        )
    }

    pub fn referee_score(referee: &Referee) -> Self {
        Self::new(
            FormKind::RefereeScore { referee_id: referee.id },
            format!("Score for {}", referee.full_name()),
            vec![FormField::new(SCORE, FieldKind::Number).with_value(referee.score.to_string())],
        )
    }

    // -- editing --------------------------------------------------------------

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.push_char(c);
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.backspace();
        }
        self.error = None;
    }

    pub fn cycle_choice(&mut self, forward: bool) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.cycle(forward);
        }
        self.error = None;
        self.refresh_winner_choices();
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    /// Select a choice by value. Returns false when the value is not offered.
    pub fn choose(&mut self, label: &str, value: &str) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.label == label) else {
            return false;
        };
        let FieldKind::Choice(choices) = &field.kind else {
            return false;
        };
        let Some(idx) = choices.iter().position(|c| c.value == value) else {
            return false;
        };
        field.selected = idx;
        field.sync_choice();
        self.refresh_winner_choices();
        true
    }

    pub fn set_text(&mut self, label: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label && !f.is_choice()) {
            field.value = value.to_string();
        }
    }

    /// The winner can only be one of the players currently selected.
    fn refresh_winner_choices(&mut self) {
        if !matches!(self.kind, FormKind::RecordMatch { .. }) {
            return;
        }
        let participants: Vec<Choice> = [PLAYER_1, PLAYER_2]
            .into_iter()
            .filter_map(|label| self.fields.iter().find(|f| f.label == label))
            .filter(|f| !f.value.is_empty())
            .map(|f| Choice::new(f.value.clone(), f.selected_label().unwrap_or_default()))
            .collect();
        let choices = std::iter::once(Choice::placeholder("no winner"))
            .chain(participants)
            .collect();
        if let Some(winner) = self.fields.iter_mut().find(|f| f.label == WINNER) {
            winner.set_choices(choices);
        }
    }

    // -- conversions ----------------------------------------------------------

    pub fn credentials(&self) -> Result<Credentials, FormError> {
        Ok(Credentials {
            email: self.required(EMAIL)?,
            password: self.required(PASSWORD)?,
            user_type: UserType::parse(self.value(ROLE)).unwrap_or_default(),
        })
    }

    pub fn team_signup_payload(&self) -> Result<TeamSignup, FormError> {
        Ok(TeamSignup {
            name: self.required(NAME)?,
            email: self.required(EMAIL)?,
            password: self.required(PASSWORD)?,
        })
    }

    pub fn new_referee(&self) -> Result<NewReferee, FormError> {
        Ok(NewReferee {
            name: self.required(NAME)?,
            last_name: self.required(LAST_NAME)?,
            email: self.required(EMAIL)?,
            password: self.required(PASSWORD)?,
            fiscal_code: self.required(FISCAL_CODE)?.to_uppercase(),
            level: self.level(LEVEL)?,
        })
    }

    /// Dates are typed as days and sent as ISO-8601 timestamps.
    pub fn new_tournament(&self) -> Result<NewTournament, FormError> {
        let name = self.required(NAME)?;
        let edition = self.required(EDITION)?;
        let start = self.date(START_DATE)?;
        let end = self.date(END_DATE)?;
        if end < start {
            return Err(FormError::EndBeforeStart);
        }
        Ok(NewTournament {
            name,
            edition,
            start_date: start.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            end_date: end.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            min_level: self.level(MIN_LEVEL)?,
            min_referee_level: self.level(MIN_REFEREE_LEVEL)?,
            court_type: self.required(COURT_TYPE)?,
        })
    }

    pub fn match_draft(&self) -> MatchDraft {
        MatchDraft {
            phase_id: self.value(PHASE).to_string(),
            player1_id: self.value(PLAYER_1).to_string(),
            player2_id: self.value(PLAYER_2).to_string(),
            referee_id: self.value(REFEREE).to_string(),
            match_date: self.value(MATCH_DATE).to_string(),
            court_number: self.value(COURT_NUMBER).to_string(),
            score: self.value(SCORE).to_string(),
            winner_id: self.value(WINNER).to_string(),
        }
    }

    pub fn new_player(&self, team_id: TeamId) -> Result<NewPlayer, FormError> {
        Ok(NewPlayer {
            name: self.required(NAME)?,
            level: self.level(LEVEL)?,
            team_id,
        })
    }

    pub fn score(&self) -> Result<i64, FormError> {
        self.number(SCORE)
    }

    fn required(&self, label: &'static str) -> Result<String, FormError> {
        let value = self.value(label).trim();
        if value.is_empty() {
            return Err(FormError::Required(label));
        }
        Ok(value.to_string())
    }

    fn number(&self, label: &'static str) -> Result<i64, FormError> {
        self.required(label)?
            .parse::<i64>()
            .map_err(|_| FormError::NotNumeric(label))
    }

    fn level(&self, label: &'static str) -> Result<u8, FormError> {
        let (min, max) = LEVEL_RANGE;
        let value = self.number(label)?;
        if !(min..=max).contains(&value) {
            return Err(FormError::OutOfRange { field: label, min, max });
        }
        u8::try_from(value).map_err(|_| FormError::OutOfRange { field: label, min, max })
    }

    fn date(&self, label: &'static str) -> Result<chrono::DateTime<chrono::Utc>, FormError> {
        let raw = self.required(label)?;
        parse_timestamp(&raw).ok_or(FormError::InvalidDate(label))
    }
}
