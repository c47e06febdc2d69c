//! The calendar month used to select transactions for every report.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// A calendar month from 1 (January) to 12 (December).
///
/// Reports match on the month of the sale date only, so a selector for March
/// covers March of every year in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthSelector(u8);

impl MonthSelector {
    /// The month shown when a page request does not pick one.
    pub const MARCH: MonthSelector = MonthSelector(3);

    /// Create a month selector from its number, 1 for January through 12 for December.
    ///
    /// # Errors
    /// Returns an error message if `number` is not between 1 and 12.
    pub fn new(number: u8) -> Result<Self, String> {
        if (1..=12).contains(&number) {
            Ok(Self(number))
        } else {
            Err(format!("month must be between 1 and 12, got {number}"))
        }
    }

    /// The month number, 1 for January through 12 for December.
    pub fn number(self) -> u8 {
        self.0
    }

    /// The English name of the month, e.g. "March".
    pub fn name(self) -> String {
        // The constructor guarantees the number is a valid month.
        time::Month::try_from(self.0)
            .map(|month| month.to_string())
            .unwrap_or_default()
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = MonthSelector> {
        (1..=12).map(MonthSelector)
    }
}

impl FromStr for MonthSelector {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let number = text.trim().parse::<u8>().map_err(|_| {
            format!("month must be a number between 1 and 12, got \"{text}\"")
        })?;

        Self::new(number)
    }
}

impl TryFrom<String> for MonthSelector {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthSelector> for String {
    fn from(month: MonthSelector) -> Self {
        month.to_string()
    }
}

/// Formats the month as two digits, e.g. "03", matching the month codes used in query strings.
impl Display for MonthSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}
