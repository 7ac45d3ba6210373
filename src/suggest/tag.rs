use std::fmt;

/// Conventional Commit type tags this tool produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Test,
    Chore,
    Perf,
}

impl CommitType {
    pub const ALL: [CommitType; 8] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Chore,
        CommitType::Perf,
    ];

    /// Tag used whenever a message carries no recognisable type.
    pub const DEFAULT: CommitType = CommitType::Feat;

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Test => "test",
            CommitType::Chore => "chore",
            CommitType::Perf => "perf",
        }
    }

    /// Case-insensitive exact lookup.
    pub fn lookup(word: &str) -> Option<Self> {
        let word = word.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(word))
    }

    /// Total parse: anything unrecognised maps to [`CommitType::DEFAULT`].
    pub fn parse(word: &str) -> Self {
        Self::lookup(word).unwrap_or(Self::DEFAULT)
    }

    /// Split a `type:` header off the front of a subject line.
    ///
    /// Accepts `type`, `type(scope)`, and `type!` forms with optional
    /// whitespace before the colon. Returns the tag and the trimmed remainder
    /// after the colon; the scope and bang are not preserved.
    pub fn split_header(line: &str) -> Option<(Self, &str)> {
        let colon = line.find(':')?;
        let head = line[..colon].trim_end();
        let head = head.strip_suffix('!').unwrap_or(head);
        let word = match head.find('(') {
            Some(open) if head.ends_with(')') => &head[..open],
            Some(_) => return None,
            None => head,
        };
        if word.is_empty() || word.chars().any(char::is_whitespace) {
            return None;
        }
        let tag = Self::lookup(word)?;
        Some((tag, line[colon + 1..].trim()))
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
