//! Canonicalization of speaker names, session labels, and talk times.
//!
//! Catalog data spans five decades of editorial conventions. The same
//! speaker shows up as `"Elder Jeffrey R. Holland"`, `"By Elder Jeffrey R.
//! Holland"` or with non-breaking spaces, and the same session has half a
//! dozen historical spellings. Everything here is a pure function of its
//! input so the pipeline can be re-run without drift.
//!
//! # Session schedule
//!
//! A period's sessions are placed relative to the **anchor Sunday**, the
//! first Sunday on or after the 1st of the conference month:
//!
//! | Session | Days before anchor | Hour |
//! |---------|--------------------|------|
//! | general young women meeting | 8 | 18 |
//! | thursday morning / afternoon | 3 | 10 / 14 |
//! | friday morning / afternoon | 2 | 10 / 14 |
//! | saturday morning / afternoon | 1 | 10 / 14 |
//! | priesthood session | 1 | 18 |
//! | sunday morning / afternoon | 0 | 10 / 14 |
//! | general welfare session | 0 | 18 |
//! | tuesday morning / afternoon | -2 | 10 / 14 |
//!
//! Times are expressed in a fixed UTC−06:00 offset.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone};
use serde::{Serialize, Serializer};

use crate::filter::is_substantive;
use crate::models::{RawTalkRecord, TalkRecord};
use crate::period::Period;

/// Honorific and attribution prefixes removed from speaker names.
pub const DEFAULT_SPEAKER_PREFIXES: &[&str] =
    &["Presented by ", "By ", "President ", "Elder ", "Bishop "];

/// Seconds west of UTC for every computed talk time.
const REFERENCE_OFFSET_WEST_SECS: i32 = 6 * 3600;

/// The closed set of canonical conference sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Session {
    GeneralYoungWomenMeeting,
    ThursdayMorning,
    ThursdayAfternoon,
    FridayMorning,
    FridayAfternoon,
    SaturdayMorning,
    SaturdayAfternoon,
    Priesthood,
    SundayMorning,
    SundayAfternoon,
    GeneralWelfare,
    TuesdayMorning,
    TuesdayAfternoon,
}

impl Session {
    pub const ALL: [Session; 13] = [
        Session::GeneralYoungWomenMeeting,
        Session::ThursdayMorning,
        Session::ThursdayAfternoon,
        Session::FridayMorning,
        Session::FridayAfternoon,
        Session::SaturdayMorning,
        Session::SaturdayAfternoon,
        Session::Priesthood,
        Session::SundayMorning,
        Session::SundayAfternoon,
        Session::GeneralWelfare,
        Session::TuesdayMorning,
        Session::TuesdayAfternoon,
    ];

    /// The canonical lower-case label.
    pub fn label(self) -> &'static str {
        match self {
            Session::GeneralYoungWomenMeeting => "general young women meeting",
            Session::ThursdayMorning => "thursday morning session",
            Session::ThursdayAfternoon => "thursday afternoon session",
            Session::FridayMorning => "friday morning session",
            Session::FridayAfternoon => "friday afternoon session",
            Session::SaturdayMorning => "saturday morning session",
            Session::SaturdayAfternoon => "saturday afternoon session",
            Session::Priesthood => "priesthood session",
            Session::SundayMorning => "sunday morning session",
            Session::SundayAfternoon => "sunday afternoon session",
            Session::GeneralWelfare => "general welfare session",
            Session::TuesdayMorning => "tuesday morning session",
            Session::TuesdayAfternoon => "tuesday afternoon session",
        }
    }

    /// `(days before the anchor Sunday, hour of day)`.
    fn schedule(self) -> (i64, u32) {
        match self {
            Session::GeneralYoungWomenMeeting => (8, 18),
            Session::ThursdayMorning => (3, 10),
            Session::ThursdayAfternoon => (3, 14),
            Session::FridayMorning => (2, 10),
            Session::FridayAfternoon => (2, 14),
            Session::SaturdayMorning => (1, 10),
            Session::SaturdayAfternoon => (1, 14),
            Session::Priesthood => (1, 18),
            Session::SundayMorning => (0, 10),
            Session::SundayAfternoon => (0, 14),
            Session::GeneralWelfare => (0, 18),
            Session::TuesdayMorning => (-2, 10),
            Session::TuesdayAfternoon => (-2, 14),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Session {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Session::ALL
            .into_iter()
            .find(|session| session.label() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown session label: '{}'", s))
    }
}

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Historical spellings and their canonical session.
const SESSION_SYNONYMS: &[(&str, Session)] = &[
    ("priesthood", Session::Priesthood),
    ("general priesthood session", Session::Priesthood),
    ("general priesthood meeting", Session::Priesthood),
    ("welfare session", Session::GeneralWelfare),
    ("saturday morning", Session::SaturdayMorning),
    ("general women's meeting", Session::GeneralYoungWomenMeeting),
    ("general women\u{2019}s meeting", Session::GeneralYoungWomenMeeting),
    ("women's fireside address", Session::GeneralYoungWomenMeeting),
    ("general relief society meeting", Session::GeneralYoungWomenMeeting),
    ("general women's session", Session::GeneralYoungWomenMeeting),
    (
        "relief society sesquicentennial satellite broadcast",
        Session::GeneralYoungWomenMeeting,
    ),
];

/// Misspellings that occur inside otherwise canonical labels.
const SESSION_TYPOS: &[(&str, &str)] = &[("sesssion", "session"), ("preisthood", "priesthood")];

/// Result of [`clean_session`]: a canonical session, or the lower-cased
/// label when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLabel {
    Known(Session),
    Unknown(String),
}

impl SessionLabel {
    pub fn as_str(&self) -> &str {
        match self {
            SessionLabel::Known(session) => session.label(),
            SessionLabel::Unknown(label) => label,
        }
    }

    pub fn session(&self) -> Option<Session> {
        match self {
            SessionLabel::Known(session) => Some(*session),
            SessionLabel::Unknown(_) => None,
        }
    }
}

/// Strip honorific prefixes and non-breaking-space artifacts from a
/// speaker string, using [`DEFAULT_SPEAKER_PREFIXES`].
///
/// ```rust
/// use speakercast_core::canonical::clean_speaker;
///
/// assert_eq!(clean_speaker("By\u{a0}President Thomas S. Monson"), "Thomas S. Monson");
/// assert_eq!(clean_speaker("Elder Jeffrey R. Holland"), "Jeffrey R. Holland");
/// ```
pub fn clean_speaker(raw: &str) -> String {
    clean_speaker_with(raw, DEFAULT_SPEAKER_PREFIXES)
}

/// Like [`clean_speaker`] with an explicit prefix list.
///
/// Prefixes are removed from the front repeatedly, so stacked markers
/// (`"By President "`) collapse in any order.
pub fn clean_speaker_with<P: AsRef<str>>(raw: &str, prefixes: &[P]) -> String {
    let spaced: String = raw
        .chars()
        .filter(|c| *c != '\u{c2}')
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect();

    let mut rest = spaced.trim_start();
    'strip: loop {
        for prefix in prefixes {
            if let Some(stripped) = rest.strip_prefix(prefix.as_ref()) {
                rest = stripped.trim_start();
                continue 'strip;
            }
        }
        break;
    }
    rest.trim().to_string()
}

/// Map a raw session label onto the canonical session set.
///
/// ```rust
/// use speakercast_core::canonical::clean_session;
///
/// assert_eq!(clean_session("General Priesthood Meeting").as_str(), "priesthood session");
/// assert_eq!(clean_session("Women's Fireside Address").as_str(), "general young women meeting");
/// ```
pub fn clean_session(raw: &str) -> SessionLabel {
    let mut label = raw.trim().to_lowercase();
    for &(typo, fix) in SESSION_TYPOS {
        if label.contains(typo) {
            label = label.replace(typo, fix);
        }
    }

    if let Some((_, session)) = SESSION_SYNONYMS.iter().find(|(alias, _)| *alias == label) {
        return SessionLabel::Known(*session);
    }
    match label.parse::<Session>() {
        Ok(session) => SessionLabel::Known(session),
        Err(_) => SessionLabel::Unknown(label),
    }
}

/// Scheduled start of `session` in the conference held in `year`/`month`.
///
/// Returns `None` for unknown sessions or an invalid date.
pub fn compute_time(year: i32, month: u32, session: &SessionLabel) -> Option<DateTime<FixedOffset>> {
    let session = session.session()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days_ahead = 6 - i64::from(first.weekday().num_days_from_monday());
    let sunday = first + Duration::days(days_ahead);

    let (days_before, hour) = session.schedule();
    let local = (sunday - Duration::days(days_before)).and_hms_opt(hour, 0, 0)?;
    let zone = FixedOffset::west_opt(REFERENCE_OFFSET_WEST_SECS)?;
    zone.from_local_datetime(&local).single()
}

/// Why a raw record did not become a [`TalkRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No title, speaker, or page URL.
    Incomplete,
    MissingAudio,
    UnknownSession,
    NotSubstantive,
}

/// Canonicalizer configured with the active speaker-prefix list.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    prefixes: Vec<String>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Canonicalizer {
    /// Built-in prefixes followed by `extra_prefixes`.
    pub fn new(extra_prefixes: &[String]) -> Self {
        let mut prefixes: Vec<String> = DEFAULT_SPEAKER_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect();
        prefixes.extend(extra_prefixes.iter().filter(|p| !p.is_empty()).cloned());
        Self { prefixes }
    }

    pub fn clean_speaker(&self, raw: &str) -> String {
        clean_speaker_with(raw, &self.prefixes)
    }

    /// Turn one raw record from `period` into a stored talk, or say why not.
    pub fn normalize(&self, period: Period, raw: &RawTalkRecord) -> Result<TalkRecord, DropReason> {
        let speaker = self.clean_speaker(&raw.speaker);
        if speaker.is_empty() || raw.title.trim().is_empty() || raw.url.trim().is_empty() {
            return Err(DropReason::Incomplete);
        }
        let audio = raw
            .audio
            .as_ref()
            .filter(|audio| !audio.url.trim().is_empty())
            .ok_or(DropReason::MissingAudio)?;
        let session = clean_session(&raw.session);
        let scheduled_time = compute_time(period.year, period.month(), &session)
            .ok_or(DropReason::UnknownSession)?;
        let session = session.session().ok_or(DropReason::UnknownSession)?;
        if !is_substantive(raw) {
            return Err(DropReason::NotSubstantive);
        }

        Ok(TalkRecord {
            title: raw.title.clone(),
            speaker,
            session,
            scheduled_time,
            uri: raw.uri.clone(),
            url: raw.url.clone(),
            preview: raw.preview.clone(),
            audio_url: audio.url.clone(),
            audio_size: audio.size.unwrap_or(0),
        })
    }
}
